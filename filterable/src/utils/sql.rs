//! SQL utility functions

/// Quote an identifier with double quotes, doubling embedded quotes
///
/// # Example
///
/// ```
/// use filterable::utils::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("age"), "\"age\"");
/// assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
/// ```
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Rewrite `?` markers into dialect placeholders, numbered from 1.
///
/// Markers inside single-quoted literals or double-quoted identifiers are
/// left untouched.
pub fn number_placeholders<F>(sql: &str, placeholder: F) -> String
where
    F: Fn(usize) -> String,
{
    let mut out = String::with_capacity(sql.len());
    let mut index = 0;
    let mut in_single = false;
    let mut in_double = false;

    for c in sql.chars() {
        match c {
            '\'' if !in_double => {
                in_single = !in_single;
                out.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                out.push(c);
            }
            '?' if !in_single && !in_double => {
                index += 1;
                out.push_str(&placeholder(index));
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("posts"), "\"posts\"");
        assert_eq!(quote_identifier(""), "\"\"");
    }

    #[test]
    fn test_number_placeholders_postgres_style() {
        let sql = number_placeholders("\"a\" = ? AND \"b\" IN (?, ?)", |i| format!("${}", i));
        assert_eq!(sql, "\"a\" = $1 AND \"b\" IN ($2, $3)");
    }

    #[test]
    fn test_number_placeholders_skips_quoted() {
        let sql = number_placeholders("\"what?\" = ? AND x = '?'", |i| format!("${}", i));
        assert_eq!(sql, "\"what?\" = $1 AND x = '?'");
    }

    #[test]
    fn test_number_placeholders_identity() {
        let sql = number_placeholders("a = ? OR b = ?", |_| "?".to_string());
        assert_eq!(sql, "a = ? OR b = ?");
    }
}
