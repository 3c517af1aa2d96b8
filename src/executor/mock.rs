//! Test doubles shared by executor tests.

use crate::access::{Tuple, Value};
use crate::executor::Executor;
use crate::expression::{ExpressionError, ExpressionResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock executor that produces a fixed set of tuples
pub struct MockExecutor {
    tuples: Vec<Tuple>,
    current: usize,
    initialized: bool,
    /// Fail instead of producing the tuple at this position
    fail_at: Option<usize>,
    pulls: Arc<AtomicUsize>,
}

impl MockExecutor {
    pub fn new(tuples: Vec<Tuple>) -> Self {
        Self {
            tuples,
            current: 0,
            initialized: false,
            fail_at: None,
            pulls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Single-value tuples from integers
    pub fn ints(values: &[i32]) -> Self {
        Self::new(values.iter().map(|v| vec![Value::Int32(*v)]).collect())
    }

    pub fn failing_at(mut self, position: usize) -> Self {
        self.fail_at = Some(position);
        self
    }

    /// Counter of `next()` calls, readable after the mock is boxed
    pub fn pulls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.pulls)
    }
}

impl Executor for MockExecutor {
    fn init(&mut self) -> ExpressionResult<()> {
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> ExpressionResult<Option<Tuple>> {
        assert!(self.initialized, "mock pulled before init");
        self.pulls.fetch_add(1, Ordering::SeqCst);

        if self.fail_at == Some(self.current) {
            return Err(ExpressionError::CustomFunction {
                name: "mock".to_string(),
                message: format!("failure at {}", self.current),
            });
        }
        let tuple = self.tuples.get(self.current).cloned();
        if tuple.is_some() {
            self.current += 1;
        }
        Ok(tuple)
    }
}

/// Initialize and drain an executor
pub fn drain(executor: &mut dyn Executor) -> ExpressionResult<Vec<Tuple>> {
    executor.init()?;
    let mut out = Vec::new();
    while let Some(tuple) = executor.next()? {
        out.push(tuple);
    }
    Ok(out)
}

/// Integer tuples as plain vectors, for compact assertions
pub fn ints(tuples: &[Tuple]) -> Vec<Vec<i32>> {
    tuples
        .iter()
        .map(|t| {
            t.iter()
                .map(|v| match v {
                    Value::Int32(i) => *i,
                    other => panic!("expected Int32, got {:?}", other),
                })
                .collect()
        })
        .collect()
}
