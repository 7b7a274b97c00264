//! Row records and the ordered collection backing one table view.

mod collection;
mod row;

pub use collection::RowCollection;
pub use row::Row;
