//! Filter error types

use thiserror::Error;

use super::types::{Operator, SemanticType};

/// Errors raised while validating or translating a filter request.
///
/// Every variant is fatal for the call that produced it: processing stops at
/// the first error and no partially filtered query is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Strict mode only: the key is not declared in the filterable map
    #[error("Filter column '{0}' is not allowed.")]
    InvalidFilterColumn(String),

    #[error("Maximum one-level sub-query filtering supported (got '{key}').")]
    MaxRelationshipDepthExceeded { key: String },

    #[error("Illegal operator {0}")]
    IllegalOperator(String),

    #[error("Operator '{operator}' is not allowed for type '{semantic_type}'")]
    OperatorNotAllowedForType {
        operator: Operator,
        semantic_type: SemanticType,
    },

    #[error("Unsupported filter type {0}")]
    UnsupportedFilterType(String),

    #[error("Scope method '{prefixed}' or '{simple}' not found.")]
    UndefinedScopeMethod { prefixed: String, simple: String },

    /// The query builder has no relation registered under this accessor
    #[error("Relationship '{0}' is not defined.")]
    UnknownRelation(String),

    #[error("Invalid filter value for '{key}': {reason}")]
    InvalidFilterValue { key: String, reason: String },

    #[error("Filter JSON exceeds maximum size of {max} bytes")]
    FilterJsonTooLarge { max: usize },

    #[error("Maximum {max} filters allowed")]
    TooManyFilters { max: usize },

    #[error("Invalid filter JSON: {0}")]
    InvalidJson(String),
}

impl FilterError {
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilterValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, suitable for API error payloads
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFilterColumn(_) => "INVALID_FILTER_COLUMN",
            Self::MaxRelationshipDepthExceeded { .. } => "MAX_RELATIONSHIP_DEPTH_EXCEEDED",
            Self::IllegalOperator(_) => "ILLEGAL_OPERATOR",
            Self::OperatorNotAllowedForType { .. } => "OPERATOR_NOT_ALLOWED_FOR_TYPE",
            Self::UnsupportedFilterType(_) => "UNSUPPORTED_FILTER_TYPE",
            Self::UndefinedScopeMethod { .. } => "UNDEFINED_SCOPE_METHOD",
            Self::UnknownRelation(_) => "UNKNOWN_RELATION",
            Self::InvalidFilterValue { .. } => "INVALID_FILTER_VALUE",
            Self::FilterJsonTooLarge { .. } => "FILTER_JSON_TOO_LARGE",
            Self::TooManyFilters { .. } => "TOO_MANY_FILTERS",
            Self::InvalidJson(_) => "INVALID_FILTER_JSON",
        }
    }
}
