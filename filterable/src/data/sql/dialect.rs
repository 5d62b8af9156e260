//! SQL dialect trait for multi-database support
//!
//! Filter predicates are rendered with `?` markers; the dialect decides how
//! each marker is spelled and how JSON and date operations are expressed.

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - JSON path extraction
/// - JSON array membership
/// - Date-only comparison
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Extract a JSON path from a column; the path is bound as one parameter
    ///
    /// - SQLite: `json_extract(col, ?)`
    /// - PostgreSQL: `(col #>> CAST(? AS TEXT[]))`
    fn json_extract(&self, col: &str) -> String;

    /// Parameter value addressing `segments` for [`SqlDialect::json_extract`]
    ///
    /// - SQLite: `$.a.b[0]`
    /// - PostgreSQL: `{a,b,0}`
    fn json_path(&self, segments: &[&str]) -> String;

    /// Generate SQL checking that a JSON array column contains one bound value
    ///
    /// - SQLite: `EXISTS (SELECT 1 FROM json_each(col) WHERE value = ?)`
    /// - PostgreSQL: `EXISTS (SELECT 1 FROM jsonb_array_elements_text(...) ...)`
    fn array_contains(&self, array_col: &str) -> String;

    /// Reduce a date/timestamp expression to its date part
    ///
    /// - SQLite: `date(col)`
    /// - PostgreSQL: `CAST(col AS DATE)`
    fn date_only(&self, col: &str) -> String;

    /// Generate LIMIT/OFFSET clause
    ///
    /// Most databases use `LIMIT x OFFSET y`, but syntax may vary.
    fn limit_offset(&self, limit: u32, offset: u32) -> String {
        format!("LIMIT {} OFFSET {}", limit, offset)
    }
}
