//! Ordered row collection with an epoch counter.

use super::Row;
use crate::error::{GridError, Result};
use crate::value::Pk;

/// In-memory ordered list of records backing one table view.
///
/// The epoch increases every time the contents are replaced wholesale, so
/// work started against an older fetch can tell that its rows are gone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowCollection {
    rows: Vec<Row>,
    epoch: u64,
}

impl RowCollection {
    /// Creates an empty collection at epoch 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all rows with a fetch result and starts a new epoch.
    ///
    /// # Returns
    /// The new epoch.
    pub fn replace(&mut self, rows: Vec<Row>) -> u64 {
        self.rows = rows;
        self.epoch += 1;
        self.epoch
    }

    /// Current epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row at a display index.
    ///
    /// # Returns
    /// `Err(GridError::RowOutOfRange)` if the index is past the end.
    pub fn get(&self, index: usize) -> Result<&Row> {
        self.rows.get(index).ok_or(GridError::RowOutOfRange {
            index,
            len: self.rows.len(),
        })
    }

    /// Returns the display index of the row with the given primary key.
    pub fn index_of(&self, pk: Pk) -> Option<usize> {
        self.rows.iter().position(|row| row.pk() == pk)
    }

    pub fn get_by_pk(&self, pk: Pk) -> Option<&Row> {
        self.rows.iter().find(|row| row.pk() == pk)
    }

    pub fn get_by_pk_mut(&mut self, pk: Pk) -> Option<&mut Row> {
        self.rows.iter_mut().find(|row| row.pk() == pk)
    }

    /// Inserts a row at the top of the view.
    ///
    /// A row whose primary key is already present replaces the old one.
    pub fn prepend(&mut self, row: Row) {
        self.rows.retain(|existing| existing.pk() != row.pk());
        self.rows.insert(0, row);
    }

    /// Removes the row with the given primary key.
    pub fn remove(&mut self, pk: Pk) -> Result<Row> {
        let index = self.index_of(pk).ok_or(GridError::RowNotFound(pk))?;
        Ok(self.rows.remove(index))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Returns the rows as a slice.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

impl<'a> IntoIterator for &'a RowCollection {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
