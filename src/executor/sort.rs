//! Sort executor implementation.
//!
//! This executor sorts tuples from a child executor by an N-valued key.
//! It materializes all tuples from the child executor into memory before
//! sorting, then returns them in the sorted order.
//!
//! Supports:
//! - Multi-key sorting, compared lexicographically in key order
//! - ASC/DESC ordering per key
//! - NULL handling (NULLs first or last)
//!
//! The sort is stable: tuples with equal keys keep their input order.

use crate::access::{Tuple, Value};
use crate::executor::Executor;
use crate::expression::{CompiledExpression, ExpressionError, ExpressionResult};
use log::debug;
use std::cmp::Ordering;

/// Sort order for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// NULL ordering preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrder {
    First,
    Last,
}

/// Sort criteria for a single key position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortCriteria {
    /// Sort order (ASC/DESC)
    pub order: SortOrder,
    /// NULL ordering (FIRST/LAST)
    pub null_order: NullOrder,
}

impl SortCriteria {
    /// Create new sort criteria with default NULL ordering
    /// (NULLs first for ASC, NULLs last for DESC)
    pub fn new(order: SortOrder) -> Self {
        let null_order = match order {
            SortOrder::Asc => NullOrder::First,
            SortOrder::Desc => NullOrder::Last,
        };
        Self { order, null_order }
    }

    /// Create new sort criteria with explicit NULL ordering
    pub fn with_null_order(order: SortOrder, null_order: NullOrder) -> Self {
        Self { order, null_order }
    }
}

/// Executor that sorts tuples by a compiled key
pub struct SortExecutor {
    /// Child executor that produces tuples
    child: Box<dyn Executor>,
    /// Key evaluator producing one value per criteria entry
    key: CompiledExpression,
    /// Sort criteria (in order of precedence)
    criteria: Vec<SortCriteria>,
    /// Materialized and sorted tuples
    sorted_tuples: std::vec::IntoIter<Tuple>,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl SortExecutor {
    /// Create a new sort executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces tuples
    /// * `key` - Evaluator producing a tuple value with one entry per criteria
    /// * `criteria` - Sort criteria in order of precedence
    pub fn new(
        child: Box<dyn Executor>,
        key: CompiledExpression,
        criteria: Vec<SortCriteria>,
    ) -> Self {
        Self {
            child,
            key,
            criteria,
            sorted_tuples: Vec::new().into_iter(),
            initialized: false,
        }
    }

    /// Compare two values according to sort order and null handling
    fn compare_values(v1: &Value, v2: &Value, criteria: SortCriteria) -> ExpressionResult<Ordering> {
        // NULL placement does not flip with the direction
        let cmp = match (v1, v2) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => match criteria.null_order {
                NullOrder::First => Ordering::Less,
                NullOrder::Last => Ordering::Greater,
            },
            (_, Value::Null) => match criteria.null_order {
                NullOrder::First => Ordering::Greater,
                NullOrder::Last => Ordering::Less,
            },
            (v1, v2) => {
                let cmp = v1.compare(v2).ok_or_else(|| ExpressionError::Incomparable {
                    left_type: v1.data_type(),
                    right_type: v2.data_type(),
                })?;
                match criteria.order {
                    SortOrder::Asc => cmp,
                    SortOrder::Desc => cmp.reverse(),
                }
            }
        };
        Ok(cmp)
    }

    /// Compare two keys position by position, first difference wins
    fn compare_keys(
        k1: &[Value],
        k2: &[Value],
        criteria: &[SortCriteria],
    ) -> ExpressionResult<Ordering> {
        for ((v1, v2), c) in k1.iter().zip(k2.iter()).zip(criteria.iter()) {
            let cmp = Self::compare_values(v1, v2, *c)?;
            if cmp != Ordering::Equal {
                return Ok(cmp);
            }
        }
        Ok(Ordering::Equal)
    }

    fn sort_tuples(&self, tuples: Vec<Tuple>) -> ExpressionResult<Vec<Tuple>> {
        // Evaluate every key once, before sorting
        let mut keyed: Vec<(Vec<Value>, Tuple)> = tuples
            .into_iter()
            .map(|tuple| {
                let key = match self.key.evaluate(&tuple)? {
                    Value::Tuple(values) => values,
                    single => vec![single],
                };
                Ok((key, tuple))
            })
            .collect::<ExpressionResult<_>>()?;

        // Stable sort; the first comparison failure aborts the sort
        let mut failure = None;
        keyed.sort_by(|a, b| {
            if failure.is_some() {
                return Ordering::Equal;
            }
            Self::compare_keys(&a.0, &b.0, &self.criteria).unwrap_or_else(|e| {
                failure = Some(e);
                Ordering::Equal
            })
        });
        if let Some(e) = failure {
            return Err(e);
        }

        Ok(keyed.into_iter().map(|(_, tuple)| tuple).collect())
    }
}

impl Executor for SortExecutor {
    fn init(&mut self) -> ExpressionResult<()> {
        if self.initialized {
            return Ok(());
        }

        // Initialize child executor
        self.child.init()?;

        // Materialize all tuples from child
        let mut tuples = Vec::new();
        while let Some(tuple) = self.child.next()? {
            tuples.push(tuple);
        }

        debug!(
            "sorting {} tuples on {} keys",
            tuples.len(),
            self.criteria.len()
        );
        self.sorted_tuples = self.sort_tuples(tuples)?.into_iter();

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> ExpressionResult<Option<Tuple>> {
        if !self.initialized {
            self.init()?;
        }
        Ok(self.sorted_tuples.next())
    }
}
