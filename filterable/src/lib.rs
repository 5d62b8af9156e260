//! Whitelist-driven translation of HTTP filter maps into query predicates.
//!
//! See [`filter`] for the engine and [`data`] for the SQL query builder it
//! drives.

pub mod app;
pub mod core;
pub mod data;
pub mod filter;
pub mod utils;

pub use data::{Backend, Relation, Schema, SqlQuery};
pub use filter::{
    FilterEngine, FilterError, FilterRequest, FilterValue, FilterableMap, Operator,
    QueryBuilder, SemanticType, Value,
};
