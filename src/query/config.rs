//! Strategy switches for query execution.
//!
//! None of these flags change which results a query returns, only how they
//! are computed.

/// Execution strategy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// Reorder join targets with the query's source sorter
    pub sort_sources: bool,
    /// Prune combinations during the join instead of filtering a full cross join
    pub filter_during_join: bool,
    /// Run a top-level `A OR B` predicate as two enumerations, `A` then `B` where
    /// `A` is not true
    pub or_union: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            sort_sources: true,
            filter_during_join: true,
            or_union: false,
        }
    }
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort_sources(mut self, enabled: bool) -> Self {
        self.sort_sources = enabled;
        self
    }

    pub fn with_filter_during_join(mut self, enabled: bool) -> Self {
        self.filter_during_join = enabled;
        self
    }

    pub fn with_or_union(mut self, enabled: bool) -> Self {
        self.or_union = enabled;
        self
    }
}
