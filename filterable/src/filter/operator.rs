//! Operator permission and alias tables
//!
//! Resolution order for a raw token: url-decode, alias lookup, canonical
//! lookup, then the per-type permission check.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::utils::url::url_decode;

use super::error::FilterError;
use super::types::{Operator, SemanticType};

use SemanticType::{
    Array, Boolean, Date, DateTime, Float, Id, Integer, Json, Relationship, String as Str,
};

/// Types on which the comparison operators (`>`, `>=`, `<`, `<=`) are legal
const ORDERED_TYPES: &[SemanticType] = &[Integer, Date, DateTime, Id, Float, Relationship];

/// Every type except `scope`
const ALL_FILTER_TYPES: &[SemanticType] = &[
    Integer,
    Date,
    DateTime,
    Id,
    Float,
    Str,
    Relationship,
    Boolean,
    Json,
    Array,
];

const DEFAULT_ALIASES: &[(&str, Operator)] = &[
    ("gt", Operator::Gt),
    ("gte", Operator::Gte),
    ("lt", Operator::Lt),
    ("lte", Operator::Lte),
    ("ne", Operator::Ne),
    ("eq", Operator::Eq),
];

/// Operator → legal semantic types, plus alias → operator
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorTable {
    permissions: FxHashMap<Operator, FxHashSet<SemanticType>>,
    aliases: FxHashMap<String, Operator>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        let mut table = Self::empty()
            .allow(Operator::Ne, &[Integer, Id, Float, Str])
            .allow(Operator::Gte, ORDERED_TYPES)
            .allow(Operator::Lte, ORDERED_TYPES)
            .allow(Operator::Gt, ORDERED_TYPES)
            .allow(Operator::Lt, ORDERED_TYPES)
            .allow(Operator::Eq, ALL_FILTER_TYPES)
            .allow(Operator::Like, &[Str])
            .allow(Operator::In, &[Integer, Id, Float, Str, Json, Array])
            .allow(Operator::Is, ALL_FILTER_TYPES)
            .allow(Operator::Not, ALL_FILTER_TYPES);
        for (alias, operator) in DEFAULT_ALIASES {
            table.aliases.insert((*alias).to_string(), *operator);
        }
        table
    }
}

impl OperatorTable {
    /// Table with no operators and no aliases
    pub fn empty() -> Self {
        Self {
            permissions: FxHashMap::default(),
            aliases: FxHashMap::default(),
        }
    }

    /// Permit `operator` for `types` (adds to any existing permission)
    pub fn allow(mut self, operator: Operator, types: &[SemanticType]) -> Self {
        self.permissions
            .entry(operator)
            .or_default()
            .extend(types.iter().copied());
        self
    }

    /// Replace the permitted types of `operator`
    pub fn set_permission(&mut self, operator: Operator, types: &[SemanticType]) {
        self.permissions
            .insert(operator, types.iter().copied().collect());
    }

    pub fn alias(mut self, alias: impl Into<String>, operator: Operator) -> Self {
        self.aliases.insert(alias.into(), operator);
        self
    }

    pub fn set_alias(&mut self, alias: impl Into<String>, operator: Operator) {
        self.aliases.insert(alias.into(), operator);
    }

    pub fn is_allowed(&self, operator: Operator, semantic_type: SemanticType) -> bool {
        self.permissions
            .get(&operator)
            .is_some_and(|types| types.contains(&semantic_type))
    }

    /// Sorted list of types permitted for `operator`
    pub fn allowed_types(&self, operator: Operator) -> Vec<SemanticType> {
        let mut types: Vec<SemanticType> = self
            .permissions
            .get(&operator)
            .map(|types| types.iter().copied().collect())
            .unwrap_or_default();
        types.sort();
        types
    }

    /// Decode and alias-resolve a raw token into a known operator
    pub fn canonicalize(&self, token: &str) -> Result<Operator, FilterError> {
        let decoded = url_decode(token);
        let operator = self
            .aliases
            .get(decoded.as_ref())
            .copied()
            .or_else(|| Operator::from_token(&decoded))
            .filter(|op| self.permissions.contains_key(op));

        operator.ok_or_else(|| FilterError::IllegalOperator(decoded.into_owned()))
    }

    /// Resolve a raw token and check it is legal for `semantic_type`
    pub fn resolve(
        &self,
        token: &str,
        semantic_type: SemanticType,
    ) -> Result<Operator, FilterError> {
        let operator = self.canonicalize(token)?;
        if !self.is_allowed(operator, semantic_type) {
            return Err(FilterError::OperatorNotAllowedForType {
                operator,
                semantic_type,
            });
        }
        tracing::trace!(token, operator = %operator, semantic_type = %semantic_type, "Resolved operator");
        Ok(operator)
    }
}
