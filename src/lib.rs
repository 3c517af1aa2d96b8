//! In-memory query engine over named collections.
//!
//! Queries join any number of registered sources, filter the combinations
//! with a predicate, optionally order them and project each one to a value.
//! Execution is lazy and pull-based except for ordering.

pub mod access;
pub mod catalog;
pub mod error;
pub mod executor;
pub mod expression;
pub mod index;
pub mod planner;
pub mod query;

pub use access::{Tuple, Value};
pub use error::QueryError;
pub use expression::Expression;
pub use query::{OrderSpecifier, Query, QueryBuilder, QueryConfig};
