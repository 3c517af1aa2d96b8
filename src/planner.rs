//! Query planner: strategy selection and pipeline assembly.
//!
//! A query over one join target scans that source and filters it. A join
//! reorders its targets, binds index support for that order and enumerates
//! combinations, either pruning them during the join or filtering a full
//! cross join afterwards. With OR decomposition a top-level `A OR B` runs as
//! two enumerations, `A` and then `NOT (A IS TRUE) AND B`, chained lazily.
//!
//! Ordering and projection are stacked on top only when the enumeration
//! produces at least one tuple.

pub mod source_order;

pub use source_order::{RegistrationOrder, SelectivitySourceSorter, SourceSorter};

use crate::error::{QueryError, Result};
use crate::executor::{
    ChainExecutor, Executor, FilterExecutor, NestedLoopJoinExecutor, PeekedExecutor,
    ProjectionExecutor, SortCriteria, SortExecutor, SourceScanExecutor,
};
use crate::expression::{compile, CompiledExpression, Expression, TypeChecker};
use crate::index::IndexSupport;
use crate::query::{QueryIter, QueryModel};
use log::{debug, trace, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// Tuples of one execution, aligned with `sources`
struct Enumeration {
    sources: Vec<String>,
    tuples: Box<dyn Executor>,
}

/// Plans and runs one execution of a query model
pub struct Planner<'a> {
    model: &'a QueryModel,
}

impl<'a> Planner<'a> {
    pub fn new(model: &'a QueryModel) -> Self {
        Self { model }
    }

    /// Run the query and return its lazy result sequence
    pub fn execute(&self, projection: &Expression) -> Result<QueryIter> {
        let Enumeration {
            sources,
            mut tuples,
        } = self.enumerate()?;

        let order = self.compile_order(&sources)?;
        let projection = compile(&sources, projection).map_err(QueryError::Compilation)?;

        tuples.init().map_err(QueryError::Execution)?;
        let Some(first) = tuples.next().map_err(QueryError::Execution)? else {
            debug!("No tuples matched, skipping ordering and projection");
            return Ok(QueryIter::empty());
        };

        let mut tuples: Box<dyn Executor> = Box::new(PeekedExecutor::new(first, tuples));
        if let Some((key, criteria)) = order {
            debug!("Ordering by {} key(s)", criteria.len());
            tuples = Box::new(SortExecutor::new(tuples, key, criteria));
        }

        let mut results = ProjectionExecutor::new(tuples, projection);
        results.init().map_err(QueryError::Execution)?;
        Ok(QueryIter::new(results))
    }

    /// Count the tuples surviving join and filter
    pub fn count(&self) -> Result<u64> {
        let Enumeration { mut tuples, .. } = self.enumerate()?;
        tuples.init().map_err(QueryError::Execution)?;
        let mut count = 0;
        while tuples.next().map_err(QueryError::Execution)?.is_some() {
            count += 1;
        }
        debug!("Counted {} tuple(s)", count);
        Ok(count)
    }

    fn enumerate(&self) -> Result<Enumeration> {
        if let Some(predicate) = self.model.predicate() {
            TypeChecker::new(self.model.join_targets())
                .check_filter_predicate(predicate)
                .map_err(QueryError::Compilation)?;
        }
        match self.model.join_targets() {
            [single] => self.single_source(single),
            _ => self.multi_source(),
        }
    }

    fn single_source(&self, name: &str) -> Result<Enumeration> {
        let rows = self
            .model
            .catalog()
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::UnknownSource(name.to_string()))?;
        let sources = vec![name.to_string()];

        let scan: Box<dyn Executor> = Box::new(SourceScanExecutor::new(rows));
        let tuples: Box<dyn Executor> = match self.model.predicate() {
            Some(predicate) => {
                debug!("Single source {} filtered by {}", name, predicate);
                let predicate = compile(&sources, predicate).map_err(QueryError::Compilation)?;
                Box::new(FilterExecutor::new(scan, predicate))
            }
            None => {
                debug!("Single source {} without predicate", name);
                scan
            }
        };
        Ok(Enumeration { sources, tuples })
    }

    fn multi_source(&self) -> Result<Enumeration> {
        let predicate = self.model.predicate();
        let sources = self.join_order(predicate);
        debug!("Join order: {:?}", sources);

        let support = IndexSupport::build(self.model.catalog(), &sources)
            .map_err(QueryError::Compilation)?;

        let tuples: Box<dyn Executor> = match predicate.and_then(Expression::as_or) {
            Some((a, b)) if self.model.config().or_union => {
                debug!("Decomposing OR into {} and {}", a, b);
                let first = self.join(&support, &sources, Some(a))?;
                // A is checked first so B only runs where A OR B would run it
                let rest = Expression::and(
                    Expression::not_expr(Expression::is_true(a.clone())),
                    b.clone(),
                );
                let second = self.join(&support, &sources, Some(&rest))?;
                Box::new(ChainExecutor::new(vec![first, second]))
            }
            _ => self.join(&support, &sources, predicate)?,
        };
        Ok(Enumeration { sources, tuples })
    }

    /// Join targets in enumeration order
    fn join_order(&self, predicate: Option<&Expression>) -> Vec<String> {
        let targets = self.model.join_targets();
        if !self.model.config().sort_sources {
            return targets.to_vec();
        }

        let sorted = self.model.source_sorter().sort_sources(targets, predicate);
        let expected: HashSet<&String> = targets.iter().collect();
        let actual: HashSet<&String> = sorted.iter().collect();
        if sorted.len() != targets.len() || expected != actual {
            warn!(
                "Source sorter returned {:?}, not a permutation of {:?}; keeping registration order",
                sorted, targets
            );
            return targets.to_vec();
        }
        sorted
    }

    /// One join enumeration under `predicate`
    fn join(
        &self,
        support: &Arc<IndexSupport>,
        sources: &[String],
        predicate: Option<&Expression>,
    ) -> Result<Box<dyn Executor>> {
        let tuples: Box<dyn Executor> = match predicate {
            Some(predicate) if self.model.config().filter_during_join => {
                let narrowed = support
                    .child_for(Some(predicate))
                    .map_err(QueryError::Compilation)?;
                trace!("Filtering join under {}", predicate);
                Box::new(
                    NestedLoopJoinExecutor::filtering(narrowed, sources, predicate)
                        .map_err(QueryError::Compilation)?,
                )
            }
            Some(predicate) => {
                let full = support.child_for(None).map_err(QueryError::Compilation)?;
                let compiled = compile(sources, predicate).map_err(QueryError::Compilation)?;
                trace!("Cross join filtered by {}", predicate);
                Box::new(FilterExecutor::new(
                    Box::new(NestedLoopJoinExecutor::new(full)),
                    compiled,
                ))
            }
            None => {
                let full = support.child_for(None).map_err(QueryError::Compilation)?;
                trace!("Cross join without predicate");
                Box::new(NestedLoopJoinExecutor::new(full))
            }
        };
        Ok(tuples)
    }

    /// Compile all order specifiers into one tuple-valued key
    fn compile_order(
        &self,
        sources: &[String],
    ) -> Result<Option<(CompiledExpression, Vec<SortCriteria>)>> {
        let specs = self.model.order_by();
        if specs.is_empty() {
            return Ok(None);
        }
        let key = Expression::tuple(specs.iter().map(|spec| spec.target.clone()).collect());
        let key = compile(sources, &key).map_err(QueryError::Compilation)?;
        let criteria = specs.iter().map(|spec| spec.criteria).collect();
        Ok(Some((key, criteria)))
    }
}
