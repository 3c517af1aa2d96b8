//! Lazy concatenation of executors.
//!
//! Children run one after another in the given order. A child is initialized
//! only when the previous one is exhausted, so later enumerations do no work
//! unless the consumer gets that far.

use crate::access::Tuple;
use crate::executor::Executor;
use crate::expression::ExpressionResult;
use std::collections::VecDeque;

/// Executor that yields all tuples of each child in turn
pub struct ChainExecutor {
    children: VecDeque<Box<dyn Executor>>,
    /// Whether the front child has been initialized
    front_ready: bool,
}

impl ChainExecutor {
    pub fn new(children: Vec<Box<dyn Executor>>) -> Self {
        Self {
            children: children.into(),
            front_ready: false,
        }
    }
}

impl Executor for ChainExecutor {
    fn init(&mut self) -> ExpressionResult<()> {
        if let Some(front) = self.children.front_mut() {
            front.init()?;
            self.front_ready = true;
        }
        Ok(())
    }

    fn next(&mut self) -> ExpressionResult<Option<Tuple>> {
        while let Some(front) = self.children.front_mut() {
            if !self.front_ready {
                front.init()?;
                self.front_ready = true;
            }
            if let Some(tuple) = front.next()? {
                return Ok(Some(tuple));
            }
            self.children.pop_front();
            self.front_ready = false;
        }
        Ok(None)
    }
}
