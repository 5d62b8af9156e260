//! String utility functions

use convert_case::{Case, Casing};

/// Normalize a filter or relation name to its accessor form (snake_case).
///
/// Scope and relation registries store names in this form, so `activeUsers`,
/// `ActiveUsers` and `active_users` all address the same entry.
pub fn accessor_name(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// Split a comma-separated value into trimmed items.
///
/// Unlike a JSON-array parse, empty items are preserved: `"a,,b"` yields
/// three items, so an explicit empty string stays filterable.
pub fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}
