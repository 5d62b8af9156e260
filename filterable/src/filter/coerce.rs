//! Value coercion rules applied before predicates are emitted

use crate::utils::string::split_list;

use super::types::Value;

/// Length of a `YYYY-MM-DD` date literal
const DATE_ONLY_LEN: usize = 10;

/// Loose boolean interpretation of a filter value.
///
/// | input                                    | result  |
/// |------------------------------------------|---------|
/// | `true`, `1`, `"1"`, `"true"`, `"on"`, `"yes"` | `true`  |
/// | `false`, `0`, `"0"`, `"false"`, `"off"`, `"no"`, `""` | `false` |
/// | anything else                             | `false` |
///
/// Text is trimmed and compared case-insensitively.
pub fn loose_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Integer(i) => *i == 1,
        Value::Float(f) => *f == 1.0,
        Value::Text(s) => {
            let s = s.trim();
            ["1", "true", "on", "yes"]
                .iter()
                .any(|t| s.eq_ignore_ascii_case(t))
        }
        Value::Null | Value::List(_) => false,
    }
}

/// Coerce a value for the `in` operator.
///
/// Lists are taken as-is. Anything else is rendered as text and split on
/// `,` with each item trimmed, so `"25, 35"` and `[25, 35]` select the same
/// rows.
pub fn to_list(value: &Value) -> Vec<Value> {
    match value {
        Value::List(items) => items.clone(),
        Value::Text(s) => split_list(s).into_iter().map(Value::Text).collect(),
        other => vec![other.clone()],
    }
}

/// True when a `datetime` value should be compared on the date part only
pub fn is_date_only(value: &Value) -> bool {
    value.to_text().len() == DATE_ONLY_LEN
}
