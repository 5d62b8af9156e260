//! Utility functions shared across the crate

pub mod sql;
pub mod string;
pub mod url;
