//! Per-cell bookkeeping of outstanding optimistic edits.
//!
//! Each edited cell keeps the last value the collaborator is known to hold
//! (the baseline) and its outstanding edits in issue order. A response only
//! settles its own edit, and the displayed value is always the newest edit
//! that has not been rejected, falling back to the baseline.

use serde_json::Value;

/// Identifies one optimistic edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditToken(pub(crate) u64);

impl EditToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Pending,
    Confirmed,
    Rejected,
}

#[derive(Debug, Clone)]
struct Outstanding {
    token: EditToken,
    display: Value,
    verdict: Verdict,
}

/// Baseline and outstanding edits of one cell.
#[derive(Debug, Clone)]
pub(crate) struct CellTrack {
    /// `None` when the field was absent from the row
    baseline: Option<Value>,
    /// Original value of a nested path's parent that was not an object
    /// (`Some(None)` when the key was absent)
    replaced_parent: Option<Option<Value>>,
    outstanding: Vec<Outstanding>,
}

impl CellTrack {
    pub(crate) fn new(baseline: Option<Value>) -> Self {
        Self {
            baseline,
            replaced_parent: None,
            outstanding: Vec::new(),
        }
    }

    /// Remembers the parent value the first edit of a nested cell replaced
    /// with an object.
    pub(crate) fn with_replaced_parent(mut self, parent: Option<Value>) -> Self {
        self.replaced_parent = Some(parent);
        self
    }

    pub(crate) fn replaced_parent(&self) -> Option<&Option<Value>> {
        self.replaced_parent.as_ref()
    }

    pub(crate) fn push(&mut self, token: EditToken, display: Value) {
        self.outstanding.push(Outstanding {
            token,
            display,
            verdict: Verdict::Pending,
        });
    }

    /// Records the verdict for one edit and folds settled leading edits into
    /// the baseline.
    ///
    /// # Returns
    /// `false` if the token is not outstanding on this cell.
    pub(crate) fn settle(&mut self, token: EditToken, confirmed: bool) -> bool {
        let Some(entry) = self.outstanding.iter_mut().find(|e| e.token == token) else {
            return false;
        };
        entry.verdict = if confirmed {
            Verdict::Confirmed
        } else {
            Verdict::Rejected
        };

        while let Some(first) = self.outstanding.first() {
            match first.verdict {
                Verdict::Pending => break,
                Verdict::Confirmed => {
                    let first = self.outstanding.remove(0);
                    self.baseline = Some(first.display);
                }
                Verdict::Rejected => {
                    self.outstanding.remove(0);
                }
            }
        }
        true
    }

    /// Value the cell should currently display.
    pub(crate) fn displayed(&self) -> Option<Value> {
        self.outstanding
            .iter()
            .rev()
            .find(|e| e.verdict != Verdict::Rejected)
            .map(|e| e.display.clone())
            .or_else(|| self.baseline.clone())
    }

    /// Returns true once no edit on this cell awaits a response.
    pub(crate) fn is_settled(&self) -> bool {
        self.outstanding.is_empty()
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding
            .iter()
            .filter(|e| e.verdict == Verdict::Pending)
            .count()
    }
}
