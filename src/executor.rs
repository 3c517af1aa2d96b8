//! Executor layer for query execution.
//!
//! This module implements the Volcano-style iterator model for the stages of
//! a query pipeline. Each executor produces tuples one at a time via the
//! `next()` method, so consumers pull exactly as much work as they need.
//! `SortExecutor` is the one stage that drains its child before producing
//! anything.

use crate::access::Tuple;
use crate::expression::ExpressionResult;

pub mod chain;
pub mod filter;
pub mod nested_loop_join;
pub mod peeked;
pub mod projection;
pub mod scan;
pub mod sort;

#[cfg(test)]
pub(crate) mod mock;

// Re-export executors
pub use chain::ChainExecutor;
pub use filter::FilterExecutor;
pub use nested_loop_join::NestedLoopJoinExecutor;
pub use peeked::PeekedExecutor;
pub use projection::ProjectionExecutor;
pub use scan::SourceScanExecutor;
pub use sort::{NullOrder, SortCriteria, SortExecutor, SortOrder};

/// Trait for all tuple-producing executors
pub trait Executor: Send {
    /// Initialize the executor. This must be called before `next()`.
    fn init(&mut self) -> ExpressionResult<()>;

    /// Get the next tuple from the executor.
    /// Returns None when there are no more tuples.
    fn next(&mut self) -> ExpressionResult<Option<Tuple>>;
}
