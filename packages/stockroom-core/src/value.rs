//! Cell value helpers shared by the editor and the backend.

use serde_json::Value;

/// Server-assigned row identifier.
pub type Pk = u64;

/// Name of the primary key field on every record.
pub const PK_FIELD: &str = "pk";

/// Compares a value sent to the backend against the value it echoed back.
///
/// Numbers and numeric strings compare by numeric value, since decimal
/// columns come back as strings (`25` matches `"25.00"`). Everything else
/// uses JSON equality.
pub fn values_match(sent: &Value, echoed: &Value) -> bool {
    if sent == echoed {
        return true;
    }
    match (as_number(sent), as_number(echoed)) {
        (Some(a), Some(b)) => (a - b).abs() < 1e-9,
        _ => false,
    }
}

/// Returns the identifier carried by a relation value.
///
/// Accepts a bare integer (`7`) or an expanded record (`{"pk": 7, ...}`).
pub fn relation_pk(value: &Value) -> Option<Pk> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::Object(map) => map.get(PK_FIELD).and_then(Value::as_u64),
        _ => None,
    }
}

/// Short name of a JSON value's type, for error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders a value the way it appears in a query string.
pub fn to_query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
