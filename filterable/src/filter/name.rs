//! Filter key parsing
//!
//! A raw filter key has the shape `[relation.]column[->json->path]`.
//! Parsing is two-stage and strictly ordered: the relation split (with its
//! depth check) always runs before the JSON-path split, so a key such as
//! `a.b.c->x` reports the depth violation even though it also carries a path.

use std::fmt;

use super::error::FilterError;

pub const RELATION_SEPARATOR: char = '.';
pub const JSON_PATH_SEPARATOR: &str = "->";

/// Parsed filter key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterName {
    pub relation: Option<String>,
    pub column: String,
    /// Opaque path after the first `->`; further `->` segments are kept verbatim
    pub json_path: Option<String>,
}

impl FilterName {
    pub fn parse(raw: &str) -> Result<Self, FilterError> {
        let (relation, rest) = match raw.split_once(RELATION_SEPARATOR) {
            Some(_) if raw.matches(RELATION_SEPARATOR).count() > 1 => {
                return Err(FilterError::MaxRelationshipDepthExceeded {
                    key: raw.to_string(),
                });
            }
            Some((relation, rest)) => (Some(relation.to_string()), rest),
            None => (None, raw),
        };

        let (column, json_path) = match rest.split_once(JSON_PATH_SEPARATOR) {
            Some((column, path)) => (column.to_string(), Some(path.to_string())),
            None => (rest.to_string(), None),
        };

        Ok(Self {
            relation,
            column,
            json_path,
        })
    }

    /// Key consulted in the filterable map: `relation.column` or `column`,
    /// never including the JSON path
    pub fn validation_key(&self) -> String {
        match &self.relation {
            Some(relation) => format!("{}{}{}", relation, RELATION_SEPARATOR, self.column),
            None => self.column.clone(),
        }
    }

    /// Field addressed on the current query (`column` or `column->path`)
    pub fn target(&self) -> String {
        match &self.json_path {
            Some(path) => format!("{}{}{}", self.column, JSON_PATH_SEPARATOR, path),
            None => self.column.clone(),
        }
    }

    /// Same name as seen from inside the relation's sub-query
    pub fn without_relation(&self) -> Self {
        Self {
            relation: None,
            column: self.column.clone(),
            json_path: self.json_path.clone(),
        }
    }
}

impl fmt::Display for FilterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(relation) = &self.relation {
            write!(f, "{}{}", relation, RELATION_SEPARATOR)?;
        }
        f.write_str(&self.target())
    }
}
