//! Access layer for row-oriented values.
//!
//! This module provides the data that flows through a query:
//!
//! - **Value**: Dynamically typed row values, including records for object rows
//! - **DataType**: The kind of a non-NULL value
//! - **Tuple**: One candidate combination across the join targets
//!
//! A tuple is positionally aligned with the join target list of the execution
//! that produced it: `tuple[i]` is the row bound to the i-th join target.

pub mod value;

pub use value::{DataType, Value};

/// One row combination, aligned to the join targets of an execution
pub type Tuple = Vec<Value>;
