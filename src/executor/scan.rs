//! Single-source scan executor.
//!
//! Wraps every row of one source as a one-value tuple. Used for queries with
//! a single join target, where there is nothing to join or narrow against.

use crate::access::Tuple;
use crate::catalog::Rows;
use crate::executor::Executor;
use crate::expression::ExpressionResult;

/// Executor that yields each row of one source as a single-value tuple
pub struct SourceScanExecutor {
    rows: Rows,
    position: usize,
}

impl SourceScanExecutor {
    pub fn new(rows: Rows) -> Self {
        Self { rows, position: 0 }
    }
}

impl Executor for SourceScanExecutor {
    fn init(&mut self) -> ExpressionResult<()> {
        self.position = 0;
        Ok(())
    }

    fn next(&mut self) -> ExpressionResult<Option<Tuple>> {
        let Some(row) = self.rows.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        Ok(Some(vec![row.clone()]))
    }
}
