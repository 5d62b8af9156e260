//! SQL rendering query builder
//!
//! [`SqlQuery`] collects filter predicates as SQL fragments with `?` markers
//! and bound values. Markers are renumbered for the target dialect only when
//! the final statement is rendered, so nested sub-queries can be assembled in
//! any order.

use std::sync::Arc;

use crate::filter::{Conjunction, FilterError, Operator, QueryBuilder, SubQuery, Value};
use crate::utils::sql::{number_placeholders, quote_identifier};

use super::schema::{Relation, Schema};
use super::sql::Backend;

/// Prefix of sub-query table aliases (`r1`, `r2`, ...)
const SUBQUERY_ALIAS_PREFIX: &str = "r";

/// Parameterized `SELECT` over one table
#[derive(Debug, Clone)]
pub struct SqlQuery {
    schema: Arc<Schema>,
    backend: Backend,
    table: String,
    alias: String,
    depth: usize,
    conjunction: Conjunction,
    conditions: Vec<String>,
    params: Vec<Value>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl SqlQuery {
    /// Query over `table` rendered for SQLite
    pub fn new(schema: impl Into<Arc<Schema>>, table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            schema: schema.into(),
            backend: Backend::default(),
            alias: table.clone(),
            table,
            depth: 0,
            conjunction: Conjunction::And,
            conditions: Vec::new(),
            params: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Bound values in marker order
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    /// Add a raw condition. `sql` must contain one `?` per value in `params`.
    pub fn where_raw(&mut self, sql: impl Into<String>, params: impl IntoIterator<Item = Value>) {
        self.conditions.push(sql.into());
        self.params.extend(params);
    }

    /// Conditions joined for the dialect (no `WHERE` keyword)
    pub fn where_clause(&self) -> String {
        self.number(&self.joined_conditions())
    }

    /// Full `SELECT *` statement and its bound values
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT * FROM {}", quote_identifier(&self.table));
        self.push_where(&mut sql);
        if self.limit.is_some() || self.offset.is_some() {
            // OFFSET is only valid after a LIMIT
            let limit = self.limit.unwrap_or(u32::MAX);
            sql.push(' ');
            sql.push_str(
                &self
                    .backend
                    .dialect()
                    .limit_offset(limit, self.offset.unwrap_or(0)),
            );
        }
        (self.number(&sql), self.params.clone())
    }

    /// `SELECT COUNT(*)` statement and its bound values
    pub fn count_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(&self.table));
        self.push_where(&mut sql);
        (self.number(&sql), self.params.clone())
    }

    fn push_where(&self, sql: &mut String) {
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.joined_conditions());
        }
    }

    fn joined_conditions(&self) -> String {
        self.conditions.join(self.conjunction.sql())
    }

    fn number(&self, sql: &str) -> String {
        let dialect = self.backend.dialect();
        number_placeholders(sql, |i| dialect.placeholder(i))
    }

    /// Qualified column expression plus any parameters it binds
    fn field_expr(&self, field: &str) -> (String, Vec<Value>) {
        let mut parts = field.split("->");
        let column = parts.next().unwrap_or(field);
        let qualified = format!(
            "{}.{}",
            quote_identifier(&self.alias),
            quote_identifier(column)
        );

        let segments: Vec<&str> = parts.collect();
        if segments.is_empty() {
            return (qualified, Vec::new());
        }

        let dialect = self.backend.dialect();
        (
            dialect.json_extract(&qualified),
            vec![Value::Text(dialect.json_path(&segments))],
        )
    }

    fn push(&mut self, sql: String, field_params: Vec<Value>, values: impl IntoIterator<Item = Value>) {
        self.conditions.push(sql);
        self.params.extend(field_params);
        self.params.extend(values);
    }

    /// Empty query sharing this query's table, used for nested groups
    fn group(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            backend: self.backend,
            table: self.table.clone(),
            alias: self.alias.clone(),
            depth: self.depth,
            conjunction: Conjunction::And,
            conditions: Vec::new(),
            params: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    fn relation(&self, name: &str) -> Result<Relation, FilterError> {
        self.schema
            .get(&self.table, name)
            .cloned()
            .ok_or_else(|| FilterError::UnknownRelation(name.to_string()))
    }

    /// Render `FROM related WHERE join [AND constraints]` for `relation`
    fn related_from(
        &self,
        relation: &Relation,
        build: Option<SubQuery<'_, Self>>,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let depth = self.depth + 1;
        let mut sub = Self {
            schema: Arc::clone(&self.schema),
            backend: self.backend,
            table: relation.table.clone(),
            alias: format!("{}{}", SUBQUERY_ALIAS_PREFIX, depth),
            depth,
            conjunction: Conjunction::And,
            conditions: Vec::new(),
            params: Vec::new(),
            limit: None,
            offset: None,
        };

        let (related_col, parent_col) = relation.join_columns();
        let join = format!(
            "{}.{} = {}.{}",
            quote_identifier(&sub.alias),
            quote_identifier(related_col),
            quote_identifier(&self.alias),
            quote_identifier(parent_col)
        );

        if let Some(build) = build {
            build(&mut sub)?;
        }

        let mut sql = format!(
            "FROM {} AS {} WHERE {}",
            quote_identifier(&relation.table),
            quote_identifier(&sub.alias),
            join
        );
        if !sub.conditions.is_empty() {
            sql.push_str(&format!(" AND ({})", sub.joined_conditions()));
        }
        Ok((sql, sub.params))
    }
}

/// Integer form of a relationship count, when it has one
fn count_value(count: &Value) -> Value {
    match count {
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| count.clone()),
        Value::Float(f) if f.fract() == 0.0 => Value::Integer(*f as i64),
        other => other.clone(),
    }
}

impl QueryBuilder for SqlQuery {
    fn where_cmp(&mut self, field: &str, op: Operator, value: &Value) {
        let (expr, field_params) = self.field_expr(field);
        match (value, op) {
            (Value::Null, Operator::Eq) => self.push(format!("{} IS NULL", expr), field_params, []),
            (Value::Null, Operator::Ne) => {
                self.push(format!("{} IS NOT NULL", expr), field_params, [])
            }
            _ => self.push(
                format!("{} {} ?", expr, op.sql()),
                field_params,
                [value.clone()],
            ),
        }
    }

    fn where_in(&mut self, field: &str, values: &[Value]) {
        if values.is_empty() {
            self.conditions.push("0 = 1".to_string());
            return;
        }
        let (expr, field_params) = self.field_expr(field);
        let markers = vec!["?"; values.len()].join(", ");
        self.push(
            format!("{} IN ({})", expr, markers),
            field_params,
            values.iter().cloned(),
        );
    }

    fn where_null(&mut self, field: &str) {
        let (expr, field_params) = self.field_expr(field);
        self.push(format!("{} IS NULL", expr), field_params, []);
    }

    fn where_not_null(&mut self, field: &str) {
        let (expr, field_params) = self.field_expr(field);
        self.push(format!("{} IS NOT NULL", expr), field_params, []);
    }

    fn where_date(&mut self, field: &str, op: Operator, value: &Value) {
        let (expr, field_params) = self.field_expr(field);
        let date = self.backend.dialect().date_only(&expr);
        self.push(
            format!("{} {} ?", date, op.sql()),
            field_params,
            [value.clone()],
        );
    }

    fn where_json_contains(&mut self, field: &str, value: &Value) {
        let (expr, field_params) = self.field_expr(field);
        let sql = self.backend.dialect().array_contains(&expr);
        self.push(sql, field_params, [value.clone()]);
    }

    fn where_group(
        &mut self,
        conjunction: Conjunction,
        build: SubQuery<'_, Self>,
    ) -> Result<(), FilterError> {
        let mut group = self.group();
        group.conjunction = conjunction;
        build(&mut group)?;
        if !group.conditions.is_empty() {
            self.push(format!("({})", group.joined_conditions()), group.params, []);
        }
        Ok(())
    }

    fn where_has(&mut self, relation: &str, build: SubQuery<'_, Self>) -> Result<(), FilterError> {
        let rel = self.relation(relation)?;
        let (from, params) = self.related_from(&rel, Some(build))?;
        self.push(format!("EXISTS (SELECT 1 {})", from), params, []);
        Ok(())
    }

    fn has(
        &mut self,
        relation: &str,
        op: Operator,
        count: &Value,
        constraint: Option<SubQuery<'_, Self>>,
    ) -> Result<(), FilterError> {
        let rel = self.relation(relation)?;
        let (from, params) = self.related_from(&rel, constraint)?;
        let count = count_value(count);

        let existence = match (op, &count) {
            (Operator::Gte, Value::Integer(1)) | (Operator::Gt, Value::Integer(0)) => Some(true),
            (Operator::Lt, Value::Integer(1))
            | (Operator::Lte, Value::Integer(0))
            | (Operator::Eq, Value::Integer(0)) => Some(false),
            _ => None,
        };

        match existence {
            Some(true) => self.push(format!("EXISTS (SELECT 1 {})", from), params, []),
            Some(false) => self.push(format!("NOT EXISTS (SELECT 1 {})", from), params, []),
            None => self.push(
                format!("(SELECT COUNT(*) {}) {} ?", from, op.sql()),
                params,
                [count],
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new()
            .relation("test_models", "user", Relation::belongs_to("users", "user_id"))
            .relation("users", "posts", Relation::has_many("posts", "user_id"))
            .relation("posts", "comments", Relation::has_many("comments", "post_id"))
    }

    fn query(table: &str) -> SqlQuery {
        SqlQuery::new(schema(), table)
    }

    #[test]
    fn test_simple_comparison() {
        let mut q = query("test_models");
        q.where_cmp("age", Operator::Gte, &Value::Integer(30));
        let (sql, params) = q.to_sql();
        assert_eq!(
            sql,
            "SELECT * FROM \"test_models\" WHERE \"test_models\".\"age\" >= ?"
        );
        assert_eq!(params, vec![Value::Integer(30)]);
    }

    #[test]
    fn test_no_conditions() {
        let (sql, params) = query("users").to_sql();
        assert_eq!(sql, "SELECT * FROM \"users\"");
        assert!(params.is_empty());
    }

    #[test]
    fn test_null_value_comparison_becomes_null_check() {
        let mut q = query("users");
        q.where_cmp("email", Operator::Eq, &Value::Null);
        q.where_cmp("name", Operator::Ne, &Value::Null);
        assert_eq!(
            q.where_clause(),
            "\"users\".\"email\" IS NULL AND \"users\".\"name\" IS NOT NULL"
        );
        assert!(q.params().is_empty());
    }

    #[test]
    fn test_where_in_and_empty_in() {
        let mut q = query("users");
        q.where_in("age", &[Value::Integer(25), Value::Integer(35)]);
        q.where_in("age", &[]);
        assert_eq!(q.where_clause(), "\"users\".\"age\" IN (?, ?) AND 0 = 1");
    }

    #[test]
    fn test_json_path_sqlite() {
        let mut q = query("test_models");
        q.where_cmp("settings->theme", Operator::Eq, &Value::from("dark"));
        assert_eq!(
            q.where_clause(),
            "json_extract(\"test_models\".\"settings\", ?) = ?"
        );
        assert_eq!(
            q.params(),
            &[Value::from("$.theme"), Value::from("dark")]
        );
    }

    #[test]
    fn test_json_path_postgres_numbering() {
        let mut q = query("test_models").with_backend(Backend::Postgres);
        q.where_cmp("settings->notify->email", Operator::Eq, &Value::from("on"));
        q.where_cmp("age", Operator::Gt, &Value::Integer(1));
        assert_eq!(
            q.where_clause(),
            "(\"test_models\".\"settings\" #>> CAST($1 AS TEXT[])) = $2 AND \"test_models\".\"age\" > $3"
        );
        assert_eq!(q.params()[0], Value::from("{\"notify\",\"email\"}"));
    }

    #[test]
    fn test_where_date() {
        let mut q = query("test_models");
        q.where_date("created_at", Operator::Lt, &Value::from("2024-01-15"));
        assert_eq!(q.where_clause(), "date(\"test_models\".\"created_at\") < ?");
    }

    #[test]
    fn test_or_group_of_json_contains() {
        let mut q = query("test_models");
        q.where_group(Conjunction::Or, &mut |g: &mut SqlQuery| {
            g.where_json_contains("tags", &Value::from("php"));
            g.where_json_contains("tags", &Value::from("rust"));
            Ok(())
        })
        .unwrap();
        assert_eq!(
            q.where_clause(),
            "(EXISTS (SELECT 1 FROM json_each(\"test_models\".\"tags\") WHERE value = ?) OR EXISTS (SELECT 1 FROM json_each(\"test_models\".\"tags\") WHERE value = ?))"
        );
        assert_eq!(q.params().len(), 2);
    }

    #[test]
    fn test_empty_group_adds_nothing() {
        let mut q = query("users");
        q.where_group(Conjunction::Or, &mut |_: &mut SqlQuery| Ok(()))
            .unwrap();
        assert!(!q.has_conditions());
    }

    #[test]
    fn test_where_has_belongs_to() {
        let mut q = query("test_models");
        q.where_has("user", &mut |sub: &mut SqlQuery| {
            sub.where_cmp("level", Operator::Gt, &Value::Integer(5));
            Ok(())
        })
        .unwrap();
        assert_eq!(
            q.where_clause(),
            "EXISTS (SELECT 1 FROM \"users\" AS \"r1\" WHERE \"r1\".\"id\" = \"test_models\".\"user_id\" AND (\"r1\".\"level\" > ?))"
        );
        assert_eq!(q.params(), &[Value::Integer(5)]);
    }

    #[test]
    fn test_has_existence_shortcuts() {
        let mut q = query("users");
        q.has("posts", Operator::Gte, &Value::from("1"), None).unwrap();
        q.has("posts", Operator::Lt, &Value::Integer(1), None).unwrap();
        assert_eq!(
            q.where_clause(),
            "EXISTS (SELECT 1 FROM \"posts\" AS \"r1\" WHERE \"r1\".\"user_id\" = \"users\".\"id\") AND NOT EXISTS (SELECT 1 FROM \"posts\" AS \"r1\" WHERE \"r1\".\"user_id\" = \"users\".\"id\")"
        );
    }

    #[test]
    fn test_has_count_with_constraint() {
        let mut q = query("users");
        let published: SubQuery<'_, SqlQuery> = &mut |sub| {
            sub.where_cmp("published", Operator::Eq, &Value::Bool(true));
            Ok(())
        };
        q.has("posts", Operator::Gte, &Value::from("2"), Some(published))
            .unwrap();
        assert_eq!(
            q.where_clause(),
            "(SELECT COUNT(*) FROM \"posts\" AS \"r1\" WHERE \"r1\".\"user_id\" = \"users\".\"id\" AND (\"r1\".\"published\" = ?)) >= ?"
        );
        assert_eq!(q.params(), &[Value::Bool(true), Value::Integer(2)]);
    }

    #[test]
    fn test_nested_relation_aliases() {
        let mut q = query("users");
        q.where_has("posts", &mut |posts: &mut SqlQuery| {
            posts.has("comments", Operator::Gt, &Value::Integer(3), None)
        })
        .unwrap();
        assert!(q.where_clause().contains(
            "FROM \"comments\" AS \"r2\" WHERE \"r2\".\"post_id\" = \"r1\".\"id\""
        ));
    }

    #[test]
    fn test_unknown_relation() {
        let mut q = query("users");
        let err = q
            .where_has("teams", &mut |_: &mut SqlQuery| Ok(()))
            .unwrap_err();
        assert_eq!(err, FilterError::UnknownRelation("teams".to_string()));
    }

    #[test]
    fn test_limit_offset_and_count() {
        let mut q = query("users").limit(10).offset(20);
        q.where_cmp("age", Operator::Gt, &Value::Integer(1));
        let (sql, _) = q.to_sql();
        assert!(sql.ends_with("LIMIT 10 OFFSET 20"));
        let (sql, params) = q.count_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM \"users\" WHERE \"users\".\"age\" > ?"
        );
        assert_eq!(params.len(), 1);
    }
}
