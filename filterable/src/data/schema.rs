//! Table relations used to render relationship predicates
//!
//! Relation names are stored in accessor (snake_case) form, the same form the
//! filter engine uses when it emits `where_has`/`has`.

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::utils::string::accessor_name;

/// Default primary key column
pub const DEFAULT_KEY: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Parent row holds the foreign key
    BelongsTo,
    /// Related rows hold the foreign key
    HasMany,
    HasOne,
}

/// How a parent table reaches a related table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub kind: RelationKind,
    pub table: String,
    pub foreign_key: String,
    /// Owner key on the related table (`belongs_to`) or local key on the
    /// parent (`has_many`/`has_one`)
    pub key: String,
}

impl Relation {
    pub fn belongs_to(table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::new(RelationKind::BelongsTo, table, foreign_key)
    }

    pub fn has_many(table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::new(RelationKind::HasMany, table, foreign_key)
    }

    pub fn has_one(table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::new(RelationKind::HasOne, table, foreign_key)
    }

    pub fn new(
        kind: RelationKind,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            table: table.into(),
            foreign_key: foreign_key.into(),
            key: DEFAULT_KEY.to_string(),
        }
    }

    /// Override the key the foreign key points at
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// `(related column, parent column)` pair joined by the sub-query
    pub fn join_columns(&self) -> (&str, &str) {
        match self.kind {
            RelationKind::BelongsTo => (&self.key, &self.foreign_key),
            RelationKind::HasMany | RelationKind::HasOne => (&self.foreign_key, &self.key),
        }
    }
}

/// Table name → relation accessor → relation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    tables: FxHashMap<String, FxHashMap<String, Relation>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relation(mut self, table: &str, name: &str, relation: Relation) -> Self {
        self.add_relation(table, name, relation);
        self
    }

    pub fn add_relation(&mut self, table: &str, name: &str, relation: Relation) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(accessor_name(name), relation);
    }

    /// Look up `name` (any casing) on `table`
    pub fn get(&self, table: &str, name: &str) -> Option<&Relation> {
        self.tables.get(table)?.get(&accessor_name(name))
    }

    /// Relations of `table`, sorted by accessor
    pub fn relations(&self, table: &str) -> Vec<(&str, &Relation)> {
        let mut relations: Vec<_> = self
            .tables
            .get(table)
            .map(|rels| rels.iter().map(|(n, r)| (n.as_str(), r)).collect())
            .unwrap_or_default();
        relations.sort_by(|a, b| a.0.cmp(b.0));
        relations
    }
}
