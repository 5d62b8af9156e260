//! Filter engine
//!
//! Orchestrates one `apply` call: strict-column validation, then per entry
//! key parsing, type lookup, scope dispatch or operator resolution, and
//! predicate emission. The engine is immutable once built; per-call state
//! (the relationship scope) lives in [`ScopedFilter`].

use std::fmt;

use super::builder::QueryBuilder;
use super::emitter::emit;
use super::error::FilterError;
use super::map::FilterableMap;
use super::name::FilterName;
use super::operator::OperatorTable;
use super::request::{FilterRequest, FilterValue};
use super::scope::ScopeRegistry;
use super::types::{Operator, SemanticType, Value};

/// Extra predicate ANDed into every relationship sub-query of one call
pub type RelationshipScope<'a, Q> = &'a dyn Fn(&mut Q) -> Result<(), FilterError>;

/// Per-resource engine options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Operator used for bare values
    pub default_operator: Operator,
    /// Reject keys missing from the filterable map instead of skipping them
    pub strict_columns: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            default_operator: Operator::Eq,
            strict_columns: false,
        }
    }
}

pub struct FilterEngine<Q> {
    map: FilterableMap,
    operators: OperatorTable,
    scopes: ScopeRegistry<Q>,
    options: FilterOptions,
}

impl<Q> fmt::Debug for FilterEngine<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEngine")
            .field("map", &self.map)
            .field("scopes", &self.scopes)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<Q: QueryBuilder> FilterEngine<Q> {
    /// Engine over `map` with the default operator table and options
    pub fn new(map: FilterableMap) -> Self {
        Self {
            map,
            operators: OperatorTable::default(),
            scopes: ScopeRegistry::new(),
            options: FilterOptions::default(),
        }
    }

    pub fn with_operators(mut self, operators: OperatorTable) -> Self {
        self.operators = operators;
        self
    }

    pub fn with_options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_default_operator(mut self, operator: Operator) -> Self {
        self.options.default_operator = operator;
        self
    }

    pub fn strict(mut self, strict_columns: bool) -> Self {
        self.options.strict_columns = strict_columns;
        self
    }

    /// Register a scope reachable from `scope`-typed fields
    pub fn with_scope<F>(mut self, name: &str, scope: F) -> Self
    where
        F: Fn(&mut Q, &FilterValue, &FilterRequest) -> Result<(), FilterError>
            + Send
            + Sync
            + 'static,
    {
        self.scopes.register(name, scope);
        self
    }

    pub fn map(&self) -> &FilterableMap {
        &self.map
    }

    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Bind a relationship scope for the calls made through the returned value
    pub fn with_relationship_scope<'a>(
        &'a self,
        scope: RelationshipScope<'a, Q>,
    ) -> ScopedFilter<'a, Q> {
        ScopedFilter {
            engine: self,
            relationship_scope: scope,
        }
    }

    /// Apply every entry of `request` to `query`.
    ///
    /// The query is consumed; on error it is dropped so no partially
    /// filtered query escapes.
    pub fn apply(&self, request: &FilterRequest, query: Q) -> Result<Q, FilterError> {
        self.apply_with(request, query, None)
    }

    /// Apply a single predicate without consulting the filterable map or the
    /// permission table. `operator` defaults to the configured default.
    pub fn apply_one(
        &self,
        semantic_type: SemanticType,
        raw_name: &str,
        value: &Value,
        operator: Option<Operator>,
        query: Q,
    ) -> Result<Q, FilterError> {
        self.apply_one_with(semantic_type, raw_name, value, operator, query, None)
    }

    fn apply_with(
        &self,
        request: &FilterRequest,
        mut query: Q,
        relationship_scope: Option<RelationshipScope<'_, Q>>,
    ) -> Result<Q, FilterError> {
        if request.is_empty() || self.map.is_empty() {
            return Ok(query);
        }

        if self.options.strict_columns {
            self.validate_columns(request)?;
        }

        for (key, value) in request.iter() {
            let name = FilterName::parse(key)?;
            let validation_key = name.validation_key();
            let Some(semantic_type) = self.map.get(&validation_key) else {
                tracing::debug!(key, "Skipping filter on non-filterable column");
                continue;
            };

            if semantic_type == SemanticType::Scope {
                self.scopes
                    .dispatch(&validation_key, &mut query, value, request)?;
                continue;
            }

            match value {
                FilterValue::Bare(value) => emit(
                    &mut query,
                    semantic_type,
                    &name,
                    self.options.default_operator,
                    value,
                    relationship_scope,
                )?,
                FilterValue::Operators(ops) => {
                    for (token, value) in ops {
                        let op = self.operators.resolve(token, semantic_type)?;
                        emit(
                            &mut query,
                            semantic_type,
                            &name,
                            op,
                            value,
                            relationship_scope,
                        )?;
                    }
                }
            }
        }

        Ok(query)
    }

    fn apply_one_with(
        &self,
        semantic_type: SemanticType,
        raw_name: &str,
        value: &Value,
        operator: Option<Operator>,
        mut query: Q,
        relationship_scope: Option<RelationshipScope<'_, Q>>,
    ) -> Result<Q, FilterError> {
        let name = FilterName::parse(raw_name)?;
        let op = operator.unwrap_or(self.options.default_operator);
        emit(
            &mut query,
            semantic_type,
            &name,
            op,
            value,
            relationship_scope,
        )?;
        Ok(query)
    }

    /// Strict mode: every key must be declared; first violation wins
    fn validate_columns(&self, request: &FilterRequest) -> Result<(), FilterError> {
        for (key, _) in request.iter() {
            let validation_key = FilterName::parse(key)?.validation_key();
            if !self.map.contains(&validation_key) {
                return Err(FilterError::InvalidFilterColumn(validation_key));
            }
        }
        Ok(())
    }
}

/// Engine view with a relationship scope bound for its calls
pub struct ScopedFilter<'a, Q> {
    engine: &'a FilterEngine<Q>,
    relationship_scope: RelationshipScope<'a, Q>,
}

impl<Q: QueryBuilder> ScopedFilter<'_, Q> {
    pub fn apply(&self, request: &FilterRequest, query: Q) -> Result<Q, FilterError> {
        self.engine
            .apply_with(request, query, Some(self.relationship_scope))
    }

    pub fn apply_one(
        &self,
        semantic_type: SemanticType,
        raw_name: &str,
        value: &Value,
        operator: Option<Operator>,
        query: Q,
    ) -> Result<Q, FilterError> {
        self.engine.apply_one_with(
            semantic_type,
            raw_name,
            value,
            operator,
            query,
            Some(self.relationship_scope),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::builder::recording::RecordingQuery;

    fn test_map() -> FilterableMap {
        FilterableMap::new()
            .field("id", SemanticType::Id)
            .field("name", SemanticType::String)
            .field("email", SemanticType::String)
            .field("age", SemanticType::Integer)
            .field("price", SemanticType::Float)
            .field("active", SemanticType::Boolean)
            .field("birth_date", SemanticType::Date)
            .field("created_at", SemanticType::DateTime)
            .field("settings", SemanticType::Json)
            .field("tags", SemanticType::Array)
            .field("user", SemanticType::Relationship)
            .field("user.email", SemanticType::String)
            .field("user.level", SemanticType::Integer)
            .field("activeUsers", SemanticType::Scope)
    }

    fn engine() -> FilterEngine<RecordingQuery> {
        FilterEngine::new(test_map()).with_scope("activeUsers", |q: &mut RecordingQuery, _, _| {
            q.where_cmp("active", Operator::Eq, &Value::Bool(true));
            q.where_has("user", &mut |sub: &mut RecordingQuery| {
                sub.where_cmp("level", Operator::Gt, &Value::Integer(5));
                Ok(())
            })
        })
    }

    fn calls(engine: &FilterEngine<RecordingQuery>, request: &FilterRequest) -> Vec<String> {
        engine.apply(request, RecordingQuery::new()).unwrap().calls
    }

    #[test]
    fn test_operator_map_entries_in_order() {
        let request = FilterRequest::new().with(
            "age",
            FilterValue::ops([(">=", 25), ("<", 35)]),
        );
        assert_eq!(
            calls(&engine(), &request),
            vec!["where(age, >=, 25)", "where(age, <, 35)"]
        );
    }

    #[test]
    fn test_bare_value_uses_default_operator() {
        let request = FilterRequest::new().with_value("name", "John");
        assert_eq!(calls(&engine(), &request), vec!["where(name, =, 'John')"]);

        let like = engine().with_default_operator(Operator::Like);
        let request = FilterRequest::new().with_value("name", "%oh%");
        assert_eq!(calls(&like, &request), vec!["where(name, like, '%oh%')"]);
    }

    #[test]
    fn test_bare_value_skips_permission_check() {
        // `like` is not permitted on integers, but bare values are not resolved
        let engine = engine().with_default_operator(Operator::Like);
        let request = FilterRequest::new().with_value("age", 25);
        assert_eq!(calls(&engine, &request), vec!["where(age, like, 25)"]);
    }

    #[test]
    fn test_alias_equivalence() {
        let engine = engine();
        for (alias, canonical) in [("gt", ">"), ("gte", ">="), ("lt", "<"), ("lte", "<="), ("ne", "<>"), ("eq", "=")] {
            let by_alias = FilterRequest::new().with("age", FilterValue::ops([(alias, 30)]));
            let by_canonical = FilterRequest::new().with("age", FilterValue::ops([(canonical, 30)]));
            assert_eq!(calls(&engine, &by_alias), calls(&engine, &by_canonical));
        }
    }

    #[test]
    fn test_url_encoded_operator() {
        let request = FilterRequest::new().with("age", FilterValue::ops([("%3E", 30)]));
        assert_eq!(calls(&engine(), &request), vec!["where(age, >, 30)"]);
    }

    #[test]
    fn test_unknown_column_skipped_when_not_strict() {
        let request = FilterRequest::new()
            .with_value("unknown", "x")
            .with_value("name", "John");
        assert_eq!(calls(&engine(), &request), vec!["where(name, =, 'John')"]);
    }

    #[test]
    fn test_unknown_column_rejected_when_strict() {
        let engine = engine().strict(true);
        let request = FilterRequest::new()
            .with_value("name", "John")
            .with_value("password", "x");
        let err = engine.apply(&request, RecordingQuery::new()).unwrap_err();
        assert_eq!(err, FilterError::InvalidFilterColumn("password".to_string()));
        assert_eq!(err.to_string(), "Filter column 'password' is not allowed.");
    }

    #[test]
    fn test_strict_validation_uses_base_column() {
        let engine = engine().strict(true);
        let request = FilterRequest::new()
            .with_value("settings->theme", "dark")
            .with_value("user.email", "a@x.io");
        assert_eq!(calls(&engine, &request).len(), 2);
    }

    #[test]
    fn test_strict_validation_runs_before_emission() {
        let engine = engine().strict(true);
        let request = FilterRequest::new()
            .with("age", FilterValue::ops([("@", 1)]))
            .with_value("nope", 1);
        let err = engine.apply(&request, RecordingQuery::new()).unwrap_err();
        assert_eq!(err, FilterError::InvalidFilterColumn("nope".to_string()));
    }

    #[test]
    fn test_depth_error() {
        let request = FilterRequest::new().with_value("user.posts.title", "x");
        let err = engine().apply(&request, RecordingQuery::new()).unwrap_err();
        assert!(err.to_string().contains("query filtering supported"));
    }

    #[test]
    fn test_illegal_and_disallowed_operators() {
        let request = FilterRequest::new().with("name", FilterValue::ops([("@", "x")]));
        assert_eq!(
            engine().apply(&request, RecordingQuery::new()).unwrap_err(),
            FilterError::IllegalOperator("@".to_string())
        );

        let request = FilterRequest::new().with("age", FilterValue::ops([("like", "%3%")]));
        assert_eq!(
            engine().apply(&request, RecordingQuery::new()).unwrap_err(),
            FilterError::OperatorNotAllowedForType {
                operator: Operator::Like,
                semantic_type: SemanticType::Integer,
            }
        );
    }

    #[test]
    fn test_scope_dispatch() {
        let request = FilterRequest::new().with_value("activeUsers", true);
        assert_eq!(
            calls(&engine(), &request),
            vec!["where(active, =, true)", "where_has(user){where(level, >, 5)}"]
        );
    }

    #[test]
    fn test_missing_scope() {
        let engine = FilterEngine::<RecordingQuery>::new(test_map());
        let request = FilterRequest::new().with_value("activeUsers", true);
        let err = engine.apply(&request, RecordingQuery::new()).unwrap_err();
        assert_eq!(
            err,
            FilterError::UndefinedScopeMethod {
                prefixed: "filter_active_users".to_string(),
                simple: "active_users".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_request_or_map_is_noop() {
        assert!(calls(&engine(), &FilterRequest::new()).is_empty());

        let engine = FilterEngine::<RecordingQuery>::new(FilterableMap::new()).strict(true);
        let request = FilterRequest::new().with_value("anything", 1);
        assert!(calls(&engine, &request).is_empty());
    }

    #[test]
    fn test_idempotent_across_calls() {
        let engine = engine();
        let request = FilterRequest::new()
            .with("age", FilterValue::ops([("in", "25,35")]))
            .with_value("user.level", 5)
            .with("user", FilterValue::ops([(">=", 1)]));
        assert_eq!(calls(&engine, &request), calls(&engine, &request));
    }

    #[test]
    fn test_relationship_scope_is_per_call() {
        let engine = engine();
        let only_active = |q: &mut RecordingQuery| -> Result<(), FilterError> {
            q.where_cmp("active", Operator::Eq, &Value::Bool(true));
            Ok(())
        };
        let request = FilterRequest::new().with_value("user.level", 5);

        let scoped = engine
            .with_relationship_scope(&only_active)
            .apply(&request, RecordingQuery::new())
            .unwrap();
        assert_eq!(
            scoped.calls,
            vec!["where_has(user){where(active, =, true); where(level, =, 5)}"]
        );

        // the engine itself keeps no scope
        assert_eq!(
            calls(&engine, &request),
            vec!["where_has(user){where(level, =, 5)}"]
        );
    }

    #[test]
    fn test_apply_one() {
        let query = engine()
            .apply_one(
                SemanticType::Integer,
                "age",
                &Value::Integer(30),
                Some(Operator::Gt),
                RecordingQuery::new(),
            )
            .unwrap();
        assert_eq!(query.calls, vec!["where(age, >, 30)"]);

        let query = engine()
            .apply_one(
                SemanticType::String,
                "nickname",
                &Value::from("Jo"),
                None,
                RecordingQuery::new(),
            )
            .unwrap();
        assert_eq!(query.calls, vec!["where(nickname, =, 'Jo')"]);
    }

    #[test]
    fn test_apply_one_scoped_relationship() {
        let engine = engine();
        let published = |q: &mut RecordingQuery| -> Result<(), FilterError> {
            q.where_cmp("published", Operator::Eq, &Value::Bool(true));
            Ok(())
        };
        let query = engine
            .with_relationship_scope(&published)
            .apply_one(
                SemanticType::Relationship,
                "posts",
                &Value::Integer(1),
                Some(Operator::Gte),
                RecordingQuery::new(),
            )
            .unwrap();
        assert_eq!(query.calls, vec!["has(posts, >=, 1){where(published, =, true)}"]);
    }

    #[test]
    fn test_apply_one_rejects_scope_type() {
        let err = engine()
            .apply_one(
                SemanticType::Scope,
                "activeUsers",
                &Value::Bool(true),
                None,
                RecordingQuery::new(),
            )
            .unwrap_err();
        assert_eq!(err, FilterError::UnsupportedFilterType("scope".to_string()));
    }
}
