//! Executor with its first tuple already pulled.
//!
//! The planner pulls one tuple to decide whether a query is empty before it
//! builds the ordering and projection stages; this puts that tuple back in
//! front of the rest.

use crate::access::Tuple;
use crate::executor::Executor;
use crate::expression::ExpressionResult;

/// Replays a pulled tuple, then continues with the (already initialized) child
pub struct PeekedExecutor {
    first: Option<Tuple>,
    child: Box<dyn Executor>,
}

impl PeekedExecutor {
    pub fn new(first: Tuple, child: Box<dyn Executor>) -> Self {
        Self {
            first: Some(first),
            child,
        }
    }
}

impl Executor for PeekedExecutor {
    fn init(&mut self) -> ExpressionResult<()> {
        // The child was initialized when the first tuple was pulled
        Ok(())
    }

    fn next(&mut self) -> ExpressionResult<Option<Tuple>> {
        match self.first.take() {
            Some(tuple) => Ok(Some(tuple)),
            None => self.child.next(),
        }
    }
}
