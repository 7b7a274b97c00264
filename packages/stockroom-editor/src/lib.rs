//! Optimistic cell editing for table views.
//!
//! A [`CellEditor`] owns the row collection of one view. Edits are applied to
//! the displayed rows immediately, sent to the collaborator as a partial
//! update, and rolled back when the response does not confirm the value.
//! Row creation and deletion are not optimistic: they only touch the rows
//! once the collaborator has confirmed them.

pub mod confirm;
pub mod editor;
pub mod error;
pub mod outcome;
pub mod reconcile;
pub mod reference;
mod tracking;

pub use confirm::Confirmation;
pub use editor::{CellEditor, EditorConfig, PendingEdit};
pub use error::{EditorError, Result};
pub use outcome::{CreateOutcome, DeleteOutcome, EditOutcome, RollbackReason};
pub use reconcile::{EchoMatches, ReconcilePredicate};
pub use reference::ReferenceList;
pub use tracking::EditToken;
