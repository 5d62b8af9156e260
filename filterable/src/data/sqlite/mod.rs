//! SQLite execution of rendered filter queries

use std::path::Path;

use serde_json::Map;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, Sqlite, SqlitePool};

use crate::filter::Value;

use super::error::DataError;
use super::query::SqlQuery;
use super::sql::Backend;


type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Open an existing database file read-only
pub async fn connect_read_only(path: &Path) -> Result<SqlitePool, DataError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    tracing::debug!(path = %path.display(), "Opened SQLite database");
    Ok(pool)
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &'q Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Integer(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.as_str()),
        Value::List(_) => query.bind(value.to_text()),
    }
}

fn bind_all<'q>(sql: &'q str, params: &'q [Value]) -> SqliteQuery<'q> {
    params
        .iter()
        .fold(sqlx::query(sql), |query, value| bind_value(query, value))
}

impl SqlQuery {
    fn ensure_sqlite(&self) -> Result<(), DataError> {
        if self.backend() != Backend::Sqlite {
            return Err(DataError::DialectMismatch {
                expected: Backend::Sqlite.name(),
                actual: self.backend().name(),
            });
        }
        Ok(())
    }

    /// Execute the query and return all matching rows
    pub async fn fetch_all(&self, pool: &SqlitePool) -> Result<Vec<SqliteRow>, DataError> {
        self.ensure_sqlite()?;
        let (sql, params) = self.to_sql();
        tracing::trace!(sql = %sql, params = params.len(), "Executing filter query");
        let rows = bind_all(&sql, &params).fetch_all(pool).await?;
        Ok(rows)
    }

    /// Count matching rows (ignores limit/offset)
    pub async fn count(&self, pool: &SqlitePool) -> Result<i64, DataError> {
        self.ensure_sqlite()?;
        let (sql, params) = self.count_sql();
        tracing::trace!(sql = %sql, params = params.len(), "Executing filter count");
        let row = bind_all(&sql, &params).fetch_one(pool).await?;
        Ok(row.try_get(0)?)
    }
}

/// Convert a row into a JSON object keyed by column name
pub fn row_to_json(row: &SqliteRow) -> Map<String, serde_json::Value> {
    let mut object = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        object.insert(column.name().to_string(), cell_to_json(row, i));
    }
    object
}

fn cell_to_json(row: &SqliteRow, index: usize) -> serde_json::Value {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map_or(serde_json::Value::Null, Into::into);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value.map_or(serde_json::Value::Null, Into::into);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.map_or(serde_json::Value::Null, Into::into);
    }
    match row.try_get::<Option<Vec<u8>>, _>(index) {
        Ok(Some(bytes)) => serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        _ => serde_json::Value::Null,
    }
}
