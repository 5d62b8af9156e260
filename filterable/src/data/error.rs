//! Error type for the data layer

use thiserror::Error;

use crate::filter::FilterError;

#[derive(Error, Debug)]
pub enum DataError {
    /// SQLite database error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// Filter translation failed before the query reached the database
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Query was rendered for a different backend than the one executing it
    #[error("Query rendered for {actual} cannot be executed on {expected}")]
    DialectMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}
