//! Projection executor implementation.
//!
//! Maps every tuple of a child executor to one result value through a
//! compiled projection. It neither filters nor reorders, so the output has
//! exactly one value per input tuple, in input order.

use crate::access::Value;
use crate::executor::Executor;
use crate::expression::{CompiledExpression, ExpressionResult};

/// Executor that evaluates a projection over child tuples
pub struct ProjectionExecutor {
    /// Child executor that produces tuples
    child: Box<dyn Executor>,
    /// Projection compiled against the child's source order
    projection: CompiledExpression,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl ProjectionExecutor {
    /// Create a new projection executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces tuples
    /// * `projection` - Result expression compiled against the child's source order
    pub fn new(child: Box<dyn Executor>, projection: CompiledExpression) -> Self {
        Self {
            child,
            projection,
            initialized: false,
        }
    }

    pub fn init(&mut self) -> ExpressionResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.child.init()?;
        self.initialized = true;
        Ok(())
    }

    /// Get the next result value, or None when the child is exhausted
    pub fn next(&mut self) -> ExpressionResult<Option<Value>> {
        if !self.initialized {
            self.init()?;
        }
        match self.child.next()? {
            Some(tuple) => Ok(Some(self.projection.evaluate(&tuple)?)),
            None => Ok(None),
        }
    }
}
