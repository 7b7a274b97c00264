//! Confirmation gate for destructive actions.

use stockroom_core::Row;

/// Asks the user whether a row may be deleted.
///
/// Answering `false` cancels the delete before any request is sent.
pub trait Confirmation {
    fn confirm(&self, row: &Row) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&Row) -> bool,
{
    fn confirm(&self, row: &Row) -> bool {
        self(row)
    }
}
