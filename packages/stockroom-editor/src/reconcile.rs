//! Deciding whether a response confirms an optimistic edit.

use serde_json::Value;

use stockroom_core::value::{relation_pk, values_match};
use stockroom_core::FieldRef;

/// Decides whether an echoed value confirms the value that was sent.
pub trait ReconcilePredicate: Send + Sync {
    /// # Arguments
    /// * `field` - Edited field
    /// * `sent` - Value carried by the partial update (identifiers for relations)
    /// * `echoed` - Value reported back for the same path, if present
    fn accepts(&self, field: &FieldRef, sent: &Value, echoed: Option<&Value>) -> bool;
}

impl<F> ReconcilePredicate for F
where
    F: Fn(&FieldRef, &Value, Option<&Value>) -> bool + Send + Sync,
{
    fn accepts(&self, field: &FieldRef, sent: &Value, echoed: Option<&Value>) -> bool {
        self(field, sent, echoed)
    }
}

/// Default predicate: the echo must report the sent value.
///
/// Numbers compare by numeric value. Relation fields compare identifiers, so
/// both `7` and `{"pk": 7, ...}` confirm a sent `7`. A missing echo never
/// confirms.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoMatches;

impl ReconcilePredicate for EchoMatches {
    fn accepts(&self, field: &FieldRef, sent: &Value, echoed: Option<&Value>) -> bool {
        let Some(echoed) = echoed else {
            return false;
        };
        if field.relation().is_some() {
            if sent.is_null() {
                return echoed.is_null();
            }
            return match (relation_pk(sent), relation_pk(echoed)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
        }
        values_match(sent, echoed)
    }
}
