//! Named custom predicates ("scopes")

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::utils::string::accessor_name;

use super::error::FilterError;
use super::request::{FilterRequest, FilterValue};

/// Prefix tried before the plain scope name
pub const SCOPE_PREFIX: &str = "filter_";

/// Scope function: receives the query, the raw value of its own entry and
/// the whole request
pub type ScopeFn<Q> =
    Arc<dyn Fn(&mut Q, &FilterValue, &FilterRequest) -> Result<(), FilterError> + Send + Sync>;

/// Registry of scopes keyed by accessor (snake_case) name
pub struct ScopeRegistry<Q> {
    scopes: FxHashMap<String, ScopeFn<Q>>,
}

impl<Q> Default for ScopeRegistry<Q> {
    fn default() -> Self {
        Self {
            scopes: FxHashMap::default(),
        }
    }
}

impl<Q> Clone for ScopeRegistry<Q> {
    fn clone(&self) -> Self {
        Self {
            scopes: self.scopes.clone(),
        }
    }
}

impl<Q> fmt::Debug for ScopeRegistry<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.scopes.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ScopeRegistry").field("scopes", &names).finish()
    }
}

impl<Q> ScopeRegistry<Q> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scope; the name is normalized to accessor form
    pub fn register<F>(&mut self, name: &str, scope: F)
    where
        F: Fn(&mut Q, &FilterValue, &FilterRequest) -> Result<(), FilterError>
            + Send
            + Sync
            + 'static,
    {
        self.scopes.insert(accessor_name(name), Arc::new(scope));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scopes.contains_key(&accessor_name(name))
    }

    /// Find `filter_<name>`, falling back to `<name>`
    pub fn lookup(&self, field: &str) -> Result<&ScopeFn<Q>, FilterError> {
        let simple = accessor_name(field);
        let prefixed = format!("{}{}", SCOPE_PREFIX, simple);

        self.scopes
            .get(&prefixed)
            .or_else(|| self.scopes.get(&simple))
            .ok_or(FilterError::UndefinedScopeMethod { prefixed, simple })
    }

    /// Run the scope registered for `field`
    pub fn dispatch(
        &self,
        field: &str,
        query: &mut Q,
        value: &FilterValue,
        request: &FilterRequest,
    ) -> Result<(), FilterError> {
        let scope = self.lookup(field)?;
        tracing::trace!(field, "Dispatching filter scope");
        scope(query, value, request)
    }
}
