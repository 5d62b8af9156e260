//! Filter request ingestion
//!
//! A request is an ordered list of `key → value` entries. A scalar value
//! means "use the default operator"; an object value is an operator map whose
//! entries are applied in the order given.

use serde::{Deserialize, Deserializer};

use super::error::FilterError;
use super::types::Value;

/// Maximum size of filter JSON in bytes (64KB)
const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Maximum number of filters allowed
const MAX_FILTERS: usize = 50;

/// Value side of a request entry
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Filter with the default operator
    Bare(Value),
    /// `(operator token, value)` pairs, ANDed in order
    Operators(Vec<(String, Value)>),
}

impl FilterValue {
    pub fn bare(value: impl Into<Value>) -> Self {
        Self::Bare(value.into())
    }

    /// Operator map from `(token, value)` pairs
    pub fn ops<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Operators(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    fn from_json(key: &str, json: &serde_json::Value) -> Result<Self, FilterError> {
        match json {
            serde_json::Value::Object(ops) => ops
                .iter()
                .map(|(token, value)| {
                    Value::from_json(value)
                        .map(|v| (token.clone(), v))
                        .ok_or_else(|| {
                            FilterError::invalid_value(key, "nested objects are not supported")
                        })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Operators),
            serde_json::Value::Array(_) => Err(FilterError::invalid_value(
                key,
                "list values need an explicit operator, e.g. {\"in\": [...]}",
            )),
            scalar => Value::from_json(scalar)
                .map(Self::Bare)
                .ok_or_else(|| FilterError::invalid_value(key, "unsupported value")),
        }
    }
}

/// Ordered filter map, as received from a client
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRequest {
    entries: Vec<(String, FilterValue)>,
}

impl FilterRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; an existing entry with the same key is replaced in place
    pub fn with(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Shorthand for a bare value
    pub fn with_value(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(key, FilterValue::bare(value))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FilterValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build from a JSON object, keeping key order
    pub fn from_json(json: &serde_json::Value) -> Result<Self, FilterError> {
        let serde_json::Value::Object(map) = json else {
            return Err(FilterError::invalid_value(
                "filter",
                "filter must be a JSON object",
            ));
        };

        if map.len() > MAX_FILTERS {
            return Err(FilterError::TooManyFilters { max: MAX_FILTERS });
        }

        let mut request = Self::new();
        for (key, value) in map {
            request.insert(key.clone(), FilterValue::from_json(key, value)?);
        }
        Ok(request)
    }

    /// Parse filter JSON text
    ///
    /// Validates JSON size before parsing and the entry count after.
    pub fn parse_json(json_str: &str) -> Result<Self, FilterError> {
        if json_str.len() > MAX_FILTER_JSON_SIZE {
            return Err(FilterError::FilterJsonTooLarge {
                max: MAX_FILTER_JSON_SIZE,
            });
        }

        let json: serde_json::Value =
            serde_json::from_str(json_str).map_err(|e| FilterError::InvalidJson(e.to_string()))?;

        Self::from_json(&json)
    }
}

impl<'de> Deserialize<'de> for FilterRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&json).map_err(serde::de::Error::custom)
    }
}
