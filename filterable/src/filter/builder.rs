//! Query-building capability consumed by the filter engine
//!
//! The engine never renders SQL itself. Storage backends implement
//! [`QueryBuilder`] and the engine drives it one predicate at a time; every
//! predicate added at the top level is ANDed with the previous ones.

use super::error::FilterError;
use super::types::{Operator, Value};

/// Callback that adds predicates to a nested query (group or sub-query)
pub type SubQuery<'a, Q> = &'a mut dyn FnMut(&mut Q) -> Result<(), FilterError>;

/// How the predicates of a nested group are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Predicate sink implemented by query builders.
///
/// Fields may carry a JSON path in `column->a->b` form; implementations
/// decide how to extract it.
pub trait QueryBuilder: Sized {
    /// `field op value`
    fn where_cmp(&mut self, field: &str, op: Operator, value: &Value);

    /// `field IN (values...)`
    fn where_in(&mut self, field: &str, values: &[Value]);

    fn where_null(&mut self, field: &str);

    fn where_not_null(&mut self, field: &str);

    /// Compare only the date part of `field`
    fn where_date(&mut self, field: &str, op: Operator, value: &Value);

    /// `field` is a JSON array containing `value`
    fn where_json_contains(&mut self, field: &str, value: &Value);

    /// Nested group of predicates joined by `conjunction`
    fn where_group(
        &mut self,
        conjunction: Conjunction,
        build: SubQuery<'_, Self>,
    ) -> Result<(), FilterError>;

    /// At least one related row satisfies the sub-query
    fn where_has(&mut self, relation: &str, build: SubQuery<'_, Self>) -> Result<(), FilterError>;

    /// Number of related rows (optionally constrained) compared with `count`
    fn has(
        &mut self,
        relation: &str,
        op: Operator,
        count: &Value,
        constraint: Option<SubQuery<'_, Self>>,
    ) -> Result<(), FilterError>;
}

/// In-memory builder that records calls; used by unit tests
#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    #[derive(Debug, Default)]
    pub struct RecordingQuery {
        pub calls: Vec<String>,
    }

    impl RecordingQuery {
        pub fn new() -> Self {
            Self::default()
        }

        fn nested(&mut self, build: SubQuery<'_, Self>) -> Result<String, FilterError> {
            let mut inner = Self::new();
            build(&mut inner)?;
            Ok(inner.calls.join("; "))
        }
    }

    pub fn fmt_value(value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Text(s) => format!("'{}'", s),
            Value::List(items) => format!(
                "[{}]",
                items.iter().map(fmt_value).collect::<Vec<_>>().join(", ")
            ),
            other => other.to_text(),
        }
    }

    impl QueryBuilder for RecordingQuery {
        fn where_cmp(&mut self, field: &str, op: Operator, value: &Value) {
            self.calls
                .push(format!("where({}, {}, {})", field, op, fmt_value(value)));
        }

        fn where_in(&mut self, field: &str, values: &[Value]) {
            let values: Vec<String> = values.iter().map(fmt_value).collect();
            self.calls
                .push(format!("where_in({}, [{}])", field, values.join(", ")));
        }

        fn where_null(&mut self, field: &str) {
            self.calls.push(format!("where_null({})", field));
        }

        fn where_not_null(&mut self, field: &str) {
            self.calls.push(format!("where_not_null({})", field));
        }

        fn where_date(&mut self, field: &str, op: Operator, value: &Value) {
            self.calls
                .push(format!("where_date({}, {}, {})", field, op, fmt_value(value)));
        }

        fn where_json_contains(&mut self, field: &str, value: &Value) {
            self.calls
                .push(format!("where_json_contains({}, {})", field, fmt_value(value)));
        }

        fn where_group(
            &mut self,
            conjunction: Conjunction,
            build: SubQuery<'_, Self>,
        ) -> Result<(), FilterError> {
            let inner = self.nested(build)?;
            let name = match conjunction {
                Conjunction::And => "and",
                Conjunction::Or => "or",
            };
            self.calls.push(format!("{}{{{}}}", name, inner));
            Ok(())
        }

        fn where_has(
            &mut self,
            relation: &str,
            build: SubQuery<'_, Self>,
        ) -> Result<(), FilterError> {
            let inner = self.nested(build)?;
            self.calls.push(format!("where_has({}){{{}}}", relation, inner));
            Ok(())
        }

        fn has(
            &mut self,
            relation: &str,
            op: Operator,
            count: &Value,
            constraint: Option<SubQuery<'_, Self>>,
        ) -> Result<(), FilterError> {
            let mut call = format!("has({}, {}, {})", relation, op, fmt_value(count));
            if let Some(build) = constraint {
                call.push_str(&format!("{{{}}}", self.nested(build)?));
            }
            self.calls.push(call);
            Ok(())
        }
    }
}
