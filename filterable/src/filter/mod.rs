//! Declarative filter translation
//!
//! A [`FilterableMap`] whitelists fields and gives each one a
//! [`SemanticType`]. A [`FilterEngine`] built over that map validates an
//! untyped [`FilterRequest`] and drives a [`QueryBuilder`] with the matching
//! predicates.
//!
//! ```
//! use filterable::filter::{FilterEngine, FilterRequest, FilterValue, FilterableMap, SemanticType};
//! use filterable::data::{Schema, SqlQuery};
//!
//! let map = FilterableMap::new()
//!     .field("name", SemanticType::String)
//!     .field("age", SemanticType::Integer);
//! let engine = FilterEngine::new(map);
//!
//! let request = FilterRequest::new()
//!     .with_value("name", "John")
//!     .with("age", FilterValue::ops([("gte", 25)]));
//!
//! let query = engine.apply(&request, SqlQuery::new(Schema::new(), "users")).unwrap();
//! assert_eq!(
//!     query.where_clause(),
//!     "\"users\".\"name\" = ? AND \"users\".\"age\" >= ?"
//! );
//! ```

mod builder;
mod coerce;
mod emitter;
mod engine;
mod error;
mod map;
mod name;
mod operator;
mod request;
mod scope;
mod types;

pub use builder::{Conjunction, QueryBuilder, SubQuery};
pub use coerce::{is_date_only, loose_bool, to_list};
pub use engine::{FilterEngine, FilterOptions, RelationshipScope, ScopedFilter};
pub use error::FilterError;
pub use map::FilterableMap;
pub use name::{FilterName, JSON_PATH_SEPARATOR, RELATION_SEPARATOR};
pub use operator::OperatorTable;
pub use request::{FilterRequest, FilterValue};
pub use scope::{SCOPE_PREFIX, ScopeFn, ScopeRegistry};
pub use types::{Operator, SemanticType, Value};
