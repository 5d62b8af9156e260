//! PostgreSQL SQL dialect implementation

use super::SqlDialect;

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn json_extract(&self, col: &str) -> String {
        format!("({} #>> CAST(? AS TEXT[]))", col)
    }

    fn json_path(&self, segments: &[&str]) -> String {
        let quoted: Vec<String> = segments
            .iter()
            .map(|s| format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")))
            .collect();
        format!("{{{}}}", quoted.join(","))
    }

    fn array_contains(&self, array_col: &str) -> String {
        format!(
            "EXISTS (SELECT 1 FROM jsonb_array_elements_text(CAST({} AS JSONB)) AS e(value) WHERE e.value = ?)",
            array_col
        )
    }

    fn date_only(&self, col: &str) -> String {
        format!("CAST({} AS DATE)", col)
    }
}
