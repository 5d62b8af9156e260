//! SQLite SQL dialect implementation

use super::SqlDialect;

/// SQLite SQL dialect
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn json_extract(&self, col: &str) -> String {
        format!("json_extract({}, ?)", col)
    }

    fn json_path(&self, segments: &[&str]) -> String {
        let mut path = String::from("$");
        for segment in segments {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                path.push_str(&format!("[{}]", segment));
            } else if is_plain_label(segment) {
                path.push('.');
                path.push_str(segment);
            } else {
                let escaped = segment.replace('\\', "\\\\").replace('"', "\\\"");
                path.push_str(&format!(".\"{}\"", escaped));
            }
        }
        path
    }

    fn array_contains(&self, array_col: &str) -> String {
        // SQLite stores arrays as JSON text, use json_each to search
        format!(
            "EXISTS (SELECT 1 FROM json_each({}) WHERE value = ?)",
            array_col
        )
    }

    fn date_only(&self, col: &str) -> String {
        format!("date({})", col)
    }
}

/// Labels SQLite accepts unquoted after `$.`
fn is_plain_label(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
