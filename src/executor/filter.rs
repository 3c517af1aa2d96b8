//! Filter executor implementation.
//!
//! This executor filters tuples from a child executor with a compiled
//! predicate. A tuple passes only when the predicate is exactly `true`;
//! NULL is treated as `false` and any other value is an error.

use crate::access::Tuple;
use crate::executor::Executor;
use crate::expression::{CompiledExpression, ExpressionResult};

/// Executor that filters tuples based on a compiled predicate
pub struct FilterExecutor {
    /// Child executor that produces tuples
    child: Box<dyn Executor>,
    /// Predicate compiled against the child's tuple layout
    predicate: CompiledExpression,
}

impl FilterExecutor {
    /// Create a new filter executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces tuples
    /// * `predicate` - Predicate compiled against the child's source order
    pub fn new(child: Box<dyn Executor>, predicate: CompiledExpression) -> Self {
        Self { child, predicate }
    }
}

impl Executor for FilterExecutor {
    fn init(&mut self) -> ExpressionResult<()> {
        self.child.init()
    }

    fn next(&mut self) -> ExpressionResult<Option<Tuple>> {
        // Keep pulling from the child until a tuple matches
        while let Some(tuple) = self.child.next()? {
            if self.predicate.evaluate_predicate(&tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Value;
    use crate::executor::mock::{drain, ints, MockExecutor};
    use crate::expression::{compile, Expression, ExpressionError};

    fn compiled(sources: &[&str], expr: &Expression) -> CompiledExpression {
        let sources: Vec<String> = sources.iter().map(|s| s.to_string()).collect();
        compile(&sources, expr).unwrap()
    }

    #[test]
    fn test_filter_single_value() -> ExpressionResult<()> {
        let predicate = compiled(
            &["s"],
            &Expression::gt(Expression::source("s"), Expression::int32(2)),
        );
        let mut filter =
            FilterExecutor::new(Box::new(MockExecutor::ints(&[5, 1, 3, 2])), predicate);

        assert_eq!(ints(&drain(&mut filter)?), vec![vec![5], vec![3]]);
        Ok(())
    }

    #[test]
    fn test_filter_across_positions() -> ExpressionResult<()> {
        let tuples = vec![
            vec![Value::Int32(1), Value::Int32(2)],
            vec![Value::Int32(2), Value::Int32(2)],
            vec![Value::Int32(3), Value::Int32(3)],
        ];
        let predicate = compiled(
            &["a", "b"],
            &Expression::eq(Expression::source("a"), Expression::source("b")),
        );
        let mut filter = FilterExecutor::new(Box::new(MockExecutor::new(tuples)), predicate);

        assert_eq!(ints(&drain(&mut filter)?), vec![vec![2, 2], vec![3, 3]]);
        Ok(())
    }

    #[test]
    fn test_filter_null_is_false() -> ExpressionResult<()> {
        let tuples = vec![vec![Value::Null], vec![Value::Int32(4)]];
        let predicate = compiled(
            &["s"],
            &Expression::gt(Expression::source("s"), Expression::int32(0)),
        );
        let mut filter = FilterExecutor::new(Box::new(MockExecutor::new(tuples)), predicate);

        assert_eq!(drain(&mut filter)?, vec![vec![Value::Int32(4)]]);
        Ok(())
    }

    #[test]
    fn test_filter_non_boolean_predicate() {
        let predicate = compiled(&["s"], &Expression::source("s"));
        let mut filter = FilterExecutor::new(Box::new(MockExecutor::ints(&[1])), predicate);

        assert!(matches!(
            drain(&mut filter),
            Err(ExpressionError::NonBooleanPredicate { .. })
        ));
    }

    #[test]
    fn test_filter_propagates_child_error() {
        let predicate = compiled(&["s"], &Expression::boolean(true));
        let child = MockExecutor::ints(&[1, 2, 3]).failing_at(1);
        let mut filter = FilterExecutor::new(Box::new(child), predicate);

        assert!(matches!(
            drain(&mut filter),
            Err(ExpressionError::CustomFunction { .. })
        ));
    }
}
