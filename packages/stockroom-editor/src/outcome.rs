//! Results of edit, create and delete operations.

use serde_json::Value;

use stockroom_client::ClientError;
use stockroom_core::{Pk, Row};

/// Why an optimistic edit was not confirmed.
#[derive(Debug, Clone, PartialEq)]
pub enum RollbackReason {
    /// The request failed or returned a non-2xx status
    Failed(ClientError),
    /// No response arrived within the response timeout
    TimedOut,
    /// The response was not a JSON object
    Malformed(String),
    /// The echoed value differs from what was sent
    Mismatch { sent: Value, echoed: Option<Value> },
}

/// Result of reconciling one optimistic edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The collaborator confirmed the value
    Committed { pk: Pk },
    /// The collaborator did not confirm the value
    RolledBack { pk: Pk, reason: RollbackReason },
    /// The view was refetched or the row deleted before the response arrived
    Discarded { pk: Pk },
}

impl EditOutcome {
    pub fn pk(&self) -> Pk {
        match self {
            EditOutcome::Committed { pk }
            | EditOutcome::RolledBack { pk, .. }
            | EditOutcome::Discarded { pk } => *pk,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, EditOutcome::Committed { .. })
    }
}

/// Result of a create request.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// The record was created and prepended to the view
    Created(Row),
    /// The response carried no server-assigned `pk`; rows are unchanged
    Rejected { response: Value },
}

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// The collaborator answered 204 and the row was removed
    Deleted { pk: Pk },
    /// The confirmation was declined; nothing was sent
    Cancelled,
    /// The collaborator answered with another success status; rows are unchanged
    Rejected { pk: Pk, status: u16 },
}
