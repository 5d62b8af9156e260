//! Whitelist of filterable fields

use rustc_hash::FxHashMap;

use super::error::FilterError;
use super::name::FilterName;
use super::types::SemanticType;

/// Field name (`column` or `relation.column`) → semantic type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterableMap {
    fields: FxHashMap<String, SemanticType>,
}

impl FilterableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field; later declarations replace earlier ones
    pub fn field(mut self, name: impl Into<String>, semantic_type: SemanticType) -> Self {
        self.insert(name, semantic_type);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, semantic_type: SemanticType) {
        self.fields.insert(name.into(), semantic_type);
    }

    /// Build from `(name, tag)` pairs, rejecting unknown tags and keys that
    /// nest deeper than one relation
    pub fn from_tags<I, K, T>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: AsRef<str>,
    {
        let mut map = Self::new();
        for (name, tag) in pairs {
            let name = name.into();
            FilterName::parse(&name)?;
            map.insert(name, tag.as_ref().parse()?);
        }
        Ok(map)
    }

    pub fn get(&self, name: &str) -> Option<SemanticType> {
        self.fields.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields sorted by name
    pub fn entries(&self) -> Vec<(&str, SemanticType)> {
        let mut entries: Vec<_> = self
            .fields
            .iter()
            .map(|(name, ty)| (name.as_str(), *ty))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl<K: Into<String>> FromIterator<(K, SemanticType)> for FilterableMap {
    fn from_iter<I: IntoIterator<Item = (K, SemanticType)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, ty) in iter {
            map.insert(name, ty);
        }
        map
    }
}
