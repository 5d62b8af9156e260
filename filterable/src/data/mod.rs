//! Storage side of filtering
//!
//! [`SqlQuery`] implements the filter engine's query builder by rendering
//! parameterized SQL for a [`Backend`]; the [`sqlite`] module executes it.

mod error;
mod query;
mod schema;

pub mod sql;
pub mod sqlite;

pub use error::DataError;
pub use query::SqlQuery;
pub use schema::{DEFAULT_KEY, Relation, RelationKind, Schema};
pub use sql::{Backend, SqlDialect};
