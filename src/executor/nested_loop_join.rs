//! Nested Loop Join executor implementation.
//!
//! This executor enumerates combinations across N sources, visiting sources
//! in join target order and the rows of each source in the order supplied
//! by index support. It comes in two variants:
//!
//! - plain: a full cross join, every combination is produced
//! - filtering: the conjuncts of the predicate are walked in AND order as
//!   the sources they read get bound, and a partial combination is
//!   abandoned as soon as one of them is false
//!
//! The filtering variant never reports an error the full predicate would
//! not report. A conjunct that fails to evaluate early only stops the walk;
//! the complete predicate is evaluated once every position is bound and
//! its result, error included, is what counts.

use crate::access::{Tuple, Value};
use crate::executor::Executor;
use crate::expression::{compile, CompiledExpression, Expression, ExpressionResult};
use crate::index::{Candidates, IndexedSources};
use log::debug;

/// Compiled predicate of a filtering join
struct JoinFilter {
    /// Top-level conjuncts in AND order
    conjuncts: Vec<CompiledExpression>,
    predicate: CompiledExpression,
}

/// How far the conjunct walk got for one partial combination
#[derive(Debug, Clone, Copy, Default)]
struct Settled {
    /// Leading conjuncts known to be true or NULL
    count: usize,
    /// A conjunct could not be decided early; nothing after it is checked
    blocked: bool,
}

impl JoinFilter {
    /// Continue the walk from `from` with positions up to `level` bound.
    ///
    /// `level` is `None` before any position is bound, where only constant
    /// conjuncts can be checked. Returns `None` when a conjunct is false.
    fn settle(&self, from: Settled, level: Option<usize>, tuple: &[Value]) -> Option<Settled> {
        let mut settled = from;
        if settled.blocked {
            return Some(settled);
        }

        for conjunct in &self.conjuncts[settled.count..] {
            if conjunct.max_slot() > level {
                break;
            }
            match conjunct.evaluate(tuple) {
                Ok(Value::Boolean(true)) | Ok(Value::Null) => settled.count += 1,
                Ok(Value::Boolean(false)) => return None,
                _ => {
                    settled.blocked = true;
                    break;
                }
            }
        }
        Some(settled)
    }
}

/// Executor that enumerates the join of all sources
pub struct NestedLoopJoinExecutor {
    /// Candidate access per join position
    sources: IndexedSources,
    /// `None` for the plain cross join
    filter: Option<JoinFilter>,
    /// One candidate cursor per bound position, plus the one being advanced
    cursors: Vec<Candidates>,
    /// Rows bound so far, aligned to join positions
    current: Tuple,
    /// Walk state after binding as many positions as the index
    settled: Vec<Settled>,
    initialized: bool,
}

impl NestedLoopJoinExecutor {
    /// Create a plain cross join enumerator
    pub fn new(sources: IndexedSources) -> Self {
        Self {
            sources,
            filter: None,
            cursors: Vec::new(),
            current: Vec::new(),
            settled: Vec::new(),
            initialized: false,
        }
    }

    /// Create a filtering enumerator.
    ///
    /// # Arguments
    /// * `sources` - Candidate access, usually narrowed for `predicate`
    /// * `source_names` - Join targets in enumeration order
    /// * `predicate` - Predicate every produced tuple must satisfy
    pub fn filtering(
        sources: IndexedSources,
        source_names: &[String],
        predicate: &Expression,
    ) -> ExpressionResult<Self> {
        let conjuncts = predicate
            .conjuncts()
            .into_iter()
            .map(|conjunct| compile(source_names, conjunct))
            .collect::<ExpressionResult<Vec<_>>>()?;
        let predicate = compile(source_names, predicate)?;

        Ok(Self {
            filter: Some(JoinFilter {
                conjuncts,
                predicate,
            }),
            ..Self::new(sources)
        })
    }

    /// Walk state for the row just bound at `level`, or `None` to abandon it
    fn settle(&self, level: usize) -> Option<Settled> {
        let from = self.settled[level];
        match &self.filter {
            Some(filter) => filter.settle(from, Some(level), &self.current),
            None => Some(from),
        }
    }

    /// Whether a complete combination passes the predicate
    fn accepts(&self) -> ExpressionResult<bool> {
        match &self.filter {
            Some(filter) => filter.predicate.evaluate_predicate(&self.current),
            None => Ok(true),
        }
    }
}

impl Executor for NestedLoopJoinExecutor {
    fn init(&mut self) -> ExpressionResult<()> {
        if self.initialized {
            return Ok(());
        }

        self.cursors.clear();
        self.current.clear();
        self.settled.clear();

        let start = match &self.filter {
            Some(filter) => filter.settle(Settled::default(), None, &[]),
            None => Some(Settled::default()),
        };
        match start {
            Some(start) if !self.sources.is_empty() => {
                self.settled.push(start);
                self.cursors.push(self.sources.candidates(0, &[], start.count));
            }
            Some(_) => {}
            None => debug!("constant conjunct is false, nothing to enumerate"),
        }

        debug!(
            "nested loop join over {} sources ({}, {} narrowed)",
            self.sources.len(),
            if self.filter.is_some() {
                "filtering"
            } else {
                "cross join"
            },
            (0..self.sources.len())
                .filter(|p| self.sources.is_narrowed(*p))
                .count()
        );

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> ExpressionResult<Option<Tuple>> {
        if !self.initialized {
            self.init()?;
        }

        let width = self.sources.len();
        while let Some(level) = self.cursors.len().checked_sub(1) {
            let Some(row) = self.cursors[level].next() else {
                // Position exhausted, backtrack to the previous one
                self.cursors.pop();
                continue;
            };

            self.current.truncate(level);
            self.current.push(row);
            self.settled.truncate(level + 1);

            if level + 1 == width {
                if self.accepts()? {
                    return Ok(Some(self.current.clone()));
                }
                continue;
            }

            let Some(settled) = self.settle(level) else {
                continue;
            };
            self.settled.push(settled);
            let candidates = self.sources.candidates(level + 1, &self.current, settled.count);
            self.cursors.push(candidates);
        }

        Ok(None)
    }
}
