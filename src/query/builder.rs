//! Fluent query construction.

use crate::access::Value;
use crate::catalog::SourceCatalog;
use crate::error::{QueryError, Result};
use crate::expression::Expression;
use crate::planner::{SelectivitySourceSorter, SourceSorter};
use crate::query::{OrderSpecifier, Query, QueryConfig, QueryModel};
use std::collections::HashSet;
use std::sync::Arc;

/// Accumulates predicates into a left-deep AND
#[derive(Debug, Clone, Default)]
pub struct Conjunction {
    terms: Vec<Expression>,
}

impl Conjunction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(&mut self, term: Expression) -> &mut Self {
        self.terms.push(term);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The combined predicate, or None if nothing was added
    pub fn create(&self) -> Option<Expression> {
        self.terms.iter().cloned().reduce(Expression::and)
    }
}

/// Builder for `Query`
pub struct QueryBuilder {
    catalog: SourceCatalog,
    join_targets: Vec<String>,
    predicate: Conjunction,
    order_by: Vec<OrderSpecifier>,
    projection: Option<Expression>,
    config: QueryConfig,
    source_sorter: Arc<dyn SourceSorter>,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            catalog: SourceCatalog::new(),
            join_targets: Vec::new(),
            predicate: Conjunction::new(),
            order_by: Vec::new(),
            projection: None,
            config: QueryConfig::default(),
            source_sorter: Arc::new(SelectivitySourceSorter),
        }
    }

    /// Bind `name` to `rows` without joining it
    pub fn register_source<I>(mut self, name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.catalog.register(name, rows);
        self
    }

    /// Join a registered source
    pub fn add_join_target(mut self, name: impl Into<String>) -> Self {
        self.join_targets.push(name.into());
        self
    }

    /// Register `rows` as `name` and join it
    pub fn from<I>(self, name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let name = name.into();
        self.register_source(name.clone(), rows)
            .add_join_target(name)
    }

    /// Add a predicate. Repeated calls are combined with AND.
    pub fn filter(mut self, predicate: Expression) -> Self {
        self.predicate.and(predicate);
        self
    }

    pub fn order_by(mut self, spec: OrderSpecifier) -> Self {
        self.order_by.push(spec);
        self
    }

    /// Set the projection used by `iterate`, `list` and `unique_result`
    pub fn select(mut self, projection: Expression) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sort_sources(mut self, enabled: bool) -> Self {
        self.config.sort_sources = enabled;
        self
    }

    pub fn filter_during_join(mut self, enabled: bool) -> Self {
        self.config.filter_during_join = enabled;
        self
    }

    pub fn or_union(mut self, enabled: bool) -> Self {
        self.config.or_union = enabled;
        self
    }

    /// Replace the join target reordering strategy
    pub fn source_sorter(mut self, sorter: impl SourceSorter + 'static) -> Self {
        self.source_sorter = Arc::new(sorter);
        self
    }

    pub fn build(self) -> Result<Query> {
        if self.join_targets.is_empty() {
            return Err(QueryError::NoSources);
        }
        let mut seen = HashSet::new();
        for name in &self.join_targets {
            if !self.catalog.contains(name) {
                return Err(QueryError::UnknownSource(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(QueryError::DuplicateJoinTarget(name.clone()));
            }
        }

        Ok(Query::new(QueryModel {
            catalog: self.catalog,
            join_targets: self.join_targets,
            predicate: self.predicate.create(),
            order_by: self.order_by,
            projection: self.projection,
            config: self.config,
            source_sorter: self.source_sorter,
        }))
    }
}
