//! Join target ordering.
//!
//! A `SourceSorter` picks the order in which the join enumerator visits the
//! join targets. Every stage downstream derives tuple positions from the
//! returned order, so any permutation yields the same result set.

use crate::expression::{BinaryOperator, Expression};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Strategy for reordering join targets before enumeration
pub trait SourceSorter: Send + Sync {
    /// Return a permutation of `join_targets`
    fn sort_sources(&self, join_targets: &[String], predicate: Option<&Expression>)
        -> Vec<String>;
}

/// Keeps join targets in registration order
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistrationOrder;

impl SourceSorter for RegistrationOrder {
    fn sort_sources(&self, join_targets: &[String], _: Option<&Expression>) -> Vec<String> {
        join_targets.to_vec()
    }
}

/// Moves join targets restricted by single-source conjuncts to the front.
///
/// Each top-level conjunct that references exactly one join target scores
/// that target: 2 for an equality against a constant, 1 otherwise. Targets
/// are stably sorted by descending score.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectivitySourceSorter;

impl SelectivitySourceSorter {
    fn score(conjunct: &Expression) -> usize {
        match conjunct {
            Expression::BinaryOp {
                op: BinaryOperator::Eq,
                left,
                right,
            } if left.is_constant() != right.is_constant() => 2,
            _ => 1,
        }
    }
}

impl SourceSorter for SelectivitySourceSorter {
    fn sort_sources(
        &self,
        join_targets: &[String],
        predicate: Option<&Expression>,
    ) -> Vec<String> {
        let mut scores: HashMap<&str, usize> = HashMap::new();
        if let Some(predicate) = predicate {
            for conjunct in predicate.conjuncts() {
                let referenced = conjunct.referenced_sources();
                if referenced.len() != 1 {
                    continue;
                }
                if let Some(name) = referenced.into_iter().next() {
                    *scores.entry(name).or_default() += Self::score(conjunct);
                }
            }
        }

        let mut ordered = join_targets.to_vec();
        ordered.sort_by_key(|name| Reverse(scores.get(name.as_str()).copied().unwrap_or(0)));
        ordered
    }
}
