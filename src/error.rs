//! Errors surfaced by query terminal operations.

use crate::expression::ExpressionError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// An expression could not be compiled against the execution's sources
    #[error("Compilation error: {0}")]
    Compilation(#[source] ExpressionError),

    /// Enumeration, filtering, sorting or projection failed
    #[error("Execution error: {0}")]
    Execution(#[source] ExpressionError),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Source {0} is joined more than once")]
    DuplicateJoinTarget(String),

    #[error("Query has no join targets")]
    NoSources,
}

pub type Result<T> = std::result::Result<T, QueryError>;
