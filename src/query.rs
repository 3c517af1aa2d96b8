//! Query model and terminal operations.
//!
//! A `QueryBuilder` accumulates sources, join targets, predicates, ordering
//! and projection, and `build()` freezes them into an immutable
//! `QueryModel`. Every terminal operation on `Query` plans and runs the
//! pipeline from scratch over that model.

pub mod builder;
pub mod config;

pub use builder::{Conjunction, QueryBuilder};
pub use config::QueryConfig;

use crate::access::Value;
use crate::catalog::SourceCatalog;
use crate::error::{QueryError, Result};
use crate::executor::{NullOrder, ProjectionExecutor, SortCriteria, SortOrder};
use crate::expression::Expression;
use crate::planner::{Planner, SourceSorter};
use std::fmt;
use std::sync::Arc;

/// One ordering key: an expression over the join targets and its direction
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpecifier {
    pub target: Expression,
    pub criteria: SortCriteria,
}

impl OrderSpecifier {
    pub fn new(target: Expression, order: SortOrder) -> Self {
        Self {
            target,
            criteria: SortCriteria::new(order),
        }
    }

    pub fn asc(target: Expression) -> Self {
        Self::new(target, SortOrder::Asc)
    }

    pub fn desc(target: Expression) -> Self {
        Self::new(target, SortOrder::Desc)
    }

    pub fn nulls_first(mut self) -> Self {
        self.criteria.null_order = NullOrder::First;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.criteria.null_order = NullOrder::Last;
        self
    }
}

/// Immutable description of a query
pub struct QueryModel {
    pub(crate) catalog: SourceCatalog,
    pub(crate) join_targets: Vec<String>,
    pub(crate) predicate: Option<Expression>,
    pub(crate) order_by: Vec<OrderSpecifier>,
    pub(crate) projection: Option<Expression>,
    pub(crate) config: QueryConfig,
    pub(crate) source_sorter: Arc<dyn SourceSorter>,
}

impl QueryModel {
    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    /// Join targets in registration order
    pub fn join_targets(&self) -> &[String] {
        &self.join_targets
    }

    /// The AND of every filter added to the builder
    pub fn predicate(&self) -> Option<&Expression> {
        self.predicate.as_ref()
    }

    pub fn order_by(&self) -> &[OrderSpecifier] {
        &self.order_by
    }

    pub fn config(&self) -> QueryConfig {
        self.config
    }

    pub fn source_sorter(&self) -> &dyn SourceSorter {
        self.source_sorter.as_ref()
    }

    /// The selected projection, or the default one.
    ///
    /// By default a query over one join target yields that target's rows and
    /// a join yields a tuple of all join targets in registration order.
    pub fn projection(&self) -> Expression {
        if let Some(projection) = &self.projection {
            return projection.clone();
        }
        match self.join_targets.as_slice() {
            [single] => Expression::source(single.clone()),
            targets => Expression::tuple(targets.iter().cloned().map(Expression::source).collect()),
        }
    }
}

impl fmt::Debug for QueryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryModel")
            .field("join_targets", &self.join_targets)
            .field("predicate", &self.predicate.as_ref().map(|p| p.to_string()))
            .field("order_by", &self.order_by.len())
            .field("config", &self.config)
            .finish()
    }
}

/// A built query; each terminal operation runs it anew
#[derive(Debug)]
pub struct Query {
    model: QueryModel,
}

impl Query {
    pub(crate) fn new(model: QueryModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &QueryModel {
        &self.model
    }

    /// Lazily iterate the results of the default projection
    pub fn iterate(&self) -> Result<QueryIter> {
        self.iterate_as(&self.model.projection())
    }

    /// Lazily iterate the results of `projection`.
    ///
    /// Compilation errors and failures while sorting are returned here.
    /// Failures during lazy iteration are yielded once by the iterator.
    pub fn iterate_as(&self, projection: &Expression) -> Result<QueryIter> {
        Planner::new(&self.model).execute(projection)
    }

    pub fn list(&self) -> Result<Vec<Value>> {
        self.iterate()?.collect()
    }

    pub fn list_as(&self, projection: &Expression) -> Result<Vec<Value>> {
        self.iterate_as(projection)?.collect()
    }

    /// The first result, or None when nothing matches
    pub fn unique_result(&self) -> Result<Option<Value>> {
        self.iterate()?.next().transpose()
    }

    pub fn unique_result_as(&self, projection: &Expression) -> Result<Option<Value>> {
        self.iterate_as(projection)?.next().transpose()
    }

    /// Number of matching tuples. Ordering and projection are never run.
    pub fn count(&self) -> Result<u64> {
        Planner::new(&self.model).count()
    }
}

/// Lazy result sequence of one query execution.
///
/// Yields at most one error, after which it is exhausted.
pub struct QueryIter {
    results: Option<ProjectionExecutor>,
}

impl QueryIter {
    pub(crate) fn new(results: ProjectionExecutor) -> Self {
        Self {
            results: Some(results),
        }
    }

    pub(crate) fn empty() -> Self {
        Self { results: None }
    }
}

impl Iterator for QueryIter {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let results = self.results.as_mut()?;
        match results.next() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.results = None;
                None
            }
            Err(e) => {
                self.results = None;
                Some(Err(QueryError::Execution(e)))
            }
        }
    }
}

impl std::iter::FusedIterator for QueryIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn two_sources() -> QueryBuilder {
        QueryBuilder::new()
            .from("s1", [1, 2, 3])
            .from("s2", [2, 3, 4])
    }

    #[test]
    fn test_default_projection() -> Result<()> {
        let single = QueryBuilder::new().from("s", [1]).build()?;
        assert_eq!(single.model().projection(), Expression::source("s"));

        let joined = two_sources().build()?;
        assert_eq!(
            joined.model().projection(),
            Expression::tuple(vec![Expression::source("s1"), Expression::source("s2")])
        );

        let selected = two_sources().select(Expression::source("s2")).build()?;
        assert_eq!(selected.model().projection(), Expression::source("s2"));
        Ok(())
    }

    #[test]
    fn test_order_specifier() {
        let spec = OrderSpecifier::desc(Expression::source("s"));
        assert_eq!(spec.criteria.order, SortOrder::Desc);
        assert_eq!(spec.criteria.null_order, NullOrder::Last);
        assert_eq!(spec.nulls_first().criteria.null_order, NullOrder::First);

        let spec = OrderSpecifier::asc(Expression::source("s"));
        assert_eq!(spec.criteria.null_order, NullOrder::First);
    }

    #[test]
    fn test_unique_result() -> Result<()> {
        let query = two_sources()
            .filter(Expression::eq(Expression::source("s1"), Expression::source("s2")))
            .order_by(OrderSpecifier::desc(Expression::source("s1")))
            .build()?;
        assert_eq!(
            query.unique_result_as(&Expression::source("s1"))?,
            Some(Value::Int32(3))
        );

        let empty = two_sources()
            .filter(Expression::gt(Expression::source("s1"), Expression::int32(10)))
            .build()?;
        assert_eq!(empty.unique_result()?, None);
        Ok(())
    }

    #[test]
    fn test_iterator_fuses_after_error() -> Result<()> {
        // 1 / (s - 2) fails on the second row
        let query = QueryBuilder::new()
            .from("s", [3, 2, 1])
            .select(Expression::div_expr(
                Expression::int32(1),
                Expression::sub_expr(Expression::source("s"), Expression::int32(2)),
            ))
            .build()?;

        let mut iter = query.iterate()?;
        assert_eq!(iter.next(), Some(Ok(Value::Int32(1))));
        assert_eq!(
            iter.next(),
            Some(Err(QueryError::Execution(
                crate::expression::ExpressionError::DivisionByZero
            )))
        );
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
        Ok(())
    }

    #[test]
    fn test_list_stops_at_first_error() -> Result<()> {
        let query = QueryBuilder::new()
            .from("s", [3, 2, 1])
            .select(Expression::div_expr(
                Expression::int32(1),
                Expression::sub_expr(Expression::source("s"), Expression::int32(2)),
            ))
            .build()?;
        assert!(matches!(query.list(), Err(QueryError::Execution(_))));
        Ok(())
    }

    #[test]
    fn test_count_ignores_projection_failures() -> Result<()> {
        let query = QueryBuilder::new()
            .from("s", [3, 2, 1])
            .select(Expression::div_expr(
                Expression::int32(1),
                Expression::sub_expr(Expression::source("s"), Expression::int32(2)),
            ))
            .build()?;
        assert_eq!(query.count()?, 3);
        Ok(())
    }
}
