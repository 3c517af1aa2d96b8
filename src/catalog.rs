//! Registry of named in-memory sources.

use crate::access::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared, immutable rows of one source
pub type Rows = Arc<Vec<Value>>;

/// Maps source identifiers to their row collections.
///
/// Rows are frozen at registration; executions share them without copying.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: HashMap<String, Rows>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the rows bound to `name`
    pub fn register<I>(&mut self, name: impl Into<String>, rows: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let rows: Vec<Value> = rows.into_iter().map(Into::into).collect();
        self.sources.insert(name.into(), Arc::new(rows));
    }

    pub fn get(&self, name: &str) -> Option<&Rows> {
        self.sources.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
