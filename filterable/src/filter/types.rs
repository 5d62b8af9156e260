//! Filter type definitions
//!
//! Semantic field types, canonical operators and the scalar values carried by
//! a filter request.

use std::fmt;
use std::str::FromStr;

use super::error::FilterError;

// ============================================================================
// Semantic Types
// ============================================================================

/// Declared meaning of a field for filtering purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticType {
    Id,
    Integer,
    Float,
    String,
    Boolean,
    Date,
    DateTime,
    Json,
    Array,
    Relationship,
    Scope,
}

impl SemanticType {
    pub const ALL: [SemanticType; 11] = [
        Self::Id,
        Self::Integer,
        Self::Float,
        Self::String,
        Self::Boolean,
        Self::Date,
        Self::DateTime,
        Self::Json,
        Self::Array,
        Self::Relationship,
        Self::Scope,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Json => "json",
            Self::Array => "array",
            Self::Relationship => "relationship",
            Self::Scope => "scope",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| FilterError::UnsupportedFilterType(s.to_string()))
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Canonical filter operator (aliases are resolved before reaching this type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
    Is,
    Not,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Like,
        Self::In,
        Self::Is,
        Self::Not,
    ];

    /// Canonical token, as accepted in filter requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "like",
            Self::In => "in",
            Self::Is => "is",
            Self::Not => "not",
        }
    }

    /// SQL spelling of the operator for a plain comparison
    pub fn sql(&self) -> &'static str {
        match self.comparison() {
            Self::Like => "LIKE",
            Self::In => "IN",
            other => other.as_str(),
        }
    }

    /// Look up a canonical token (no alias or url-decoding applied)
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == token)
    }

    pub fn is_null_check(&self) -> bool {
        matches!(self, Self::Is | Self::Not)
    }

    /// Operator used when `is`/`not` carry a non-null value
    pub fn comparison(self) -> Self {
        match self {
            Self::Is => Self::Eq,
            Self::Not => Self::Ne,
            other => other,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Values
// ============================================================================

/// Untyped filter value as it arrives from the request
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    /// Convert a JSON value. Objects have no scalar meaning and yield `None`.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => Some(Self::Null),
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => Some(match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            }),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            serde_json::Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => (*b).into(),
            Self::Integer(i) => (*i).into(),
            Self::Float(f) => (*f).into(),
            Self::Text(s) => s.clone().into(),
            Self::List(items) => items.iter().map(Self::to_json).collect(),
        }
    }

    /// Literal text form of the value (lists are comma-joined)
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(Self::to_text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// True for JSON null and for the case-insensitive token `null`
    pub fn is_null_token(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().eq_ignore_ascii_case("null"),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_semantic_type_round_trips_through_tag() {
        for ty in SemanticType::ALL {
            assert_eq!(ty.as_str().parse::<SemanticType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_semantic_type_unknown_tag() {
        let err = "unsupported_type".parse::<SemanticType>().unwrap_err();
        assert_eq!(
            err,
            FilterError::UnsupportedFilterType("unsupported_type".to_string())
        );
        assert_eq!(err.to_string(), "Unsupported filter type unsupported_type");
    }

    #[test]
    fn test_operator_tokens() {
        assert_eq!(Operator::from_token(">="), Some(Operator::Gte));
        assert_eq!(Operator::from_token("like"), Some(Operator::Like));
        assert_eq!(Operator::from_token("gte"), None);
        assert_eq!(Operator::from_token("@"), None);
    }

    #[test]
    fn test_operator_sql() {
        assert_eq!(Operator::Like.sql(), "LIKE");
        assert_eq!(Operator::Ne.sql(), "<>");
        assert_eq!(Operator::Is.sql(), "=");
        assert_eq!(Operator::Not.sql(), "<>");
    }

    #[test]
    fn test_value_from_json() {
        assert_eq!(Value::from_json(&json!(25)), Some(Value::Integer(25)));
        assert_eq!(Value::from_json(&json!(1.5)), Some(Value::Float(1.5)));
        assert_eq!(Value::from_json(&json!("a")), Some(Value::from("a")));
        assert_eq!(
            Value::from_json(&json!([25, "b"])),
            Some(Value::List(vec![Value::Integer(25), Value::from("b")]))
        );
        assert_eq!(Value::from_json(&json!({"a": 1})), None);
        assert_eq!(Value::from_json(&json!([{"a": 1}])), None);
    }

    #[test]
    fn test_null_token() {
        assert!(Value::from("null").is_null_token());
        assert!(Value::from(" NuLl ").is_null_token());
        assert!(Value::Null.is_null_token());
        assert!(!Value::from("nil").is_null_token());
        assert!(!Value::Integer(0).is_null_token());
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::from(vec![25, 35]).to_json(), json!([25, 35]));
        assert_eq!(Value::from("a").to_json(), json!("a"));
        assert_eq!(Value::Null.to_json(), json!(null));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::from(vec![25, 35]).to_text(), "25,35");
        assert_eq!(Value::Bool(true).to_text(), "true");
        assert_eq!(Value::Null.to_text(), "");
    }
}
