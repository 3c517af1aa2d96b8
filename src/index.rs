//! Index support for join enumeration.
//!
//! An `IndexSupport` is built once per execution for the execution's source
//! order. `child_for` derives, from one predicate, a lookup plan per join
//! position: an equality conjunct `key == value` where `key` is the source at
//! that position (or one of its fields) and `value` only reads earlier
//! positions. Hash indexes are built the first time a lookup needs them and
//! are shared by every child of the same execution.
//!
//! A lookup only drops rows for which the equality is definitely false.
//! Rows whose key is NULL, cannot be read, or has a different kind than the
//! looked up value stay candidates, so evaluating the predicate on them behaves as it
//! would without the index.

use crate::access::{DataType, Value};
use crate::catalog::{Rows, SourceCatalog};
use crate::expression::{
    compile, BinaryOperator, CompiledExpression, Expression, ExpressionError, ExpressionResult,
};
use log::{debug, trace};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// What an index is keyed on: a whole source row or one of its fields
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IndexKey {
    position: usize,
    field: Option<String>,
}

/// Row positions of one source grouped by key
#[derive(Debug, Default)]
struct ValueIndex {
    by_key: HashMap<Value, Vec<usize>>,
    by_kind: HashMap<DataType, Vec<usize>>,
    /// Rows whose key is NULL or not readable as a field
    unkeyed: Vec<usize>,
}

impl ValueIndex {
    /// Positions of every row the equality with `wanted` does not rule out,
    /// in source order
    fn lookup(&self, wanted: &Value) -> Vec<usize> {
        let kind = wanted.data_type();
        let mut picks = self.by_key.get(wanted).cloned().unwrap_or_default();
        for (other, positions) in &self.by_kind {
            if Some(*other) != kind {
                picks.extend_from_slice(positions);
            }
        }
        picks.extend_from_slice(&self.unkeyed);
        picks.sort_unstable();
        picks
    }
}

/// Per-execution access to source rows, with lazily built hash indexes
pub struct IndexSupport {
    sources: Vec<String>,
    /// Rows aligned with `sources`
    rows: Vec<Rows>,
    indexes: Mutex<HashMap<IndexKey, Arc<ValueIndex>>>,
}

impl IndexSupport {
    /// Bind the rows of each source in `sources` from the catalog
    pub fn build(catalog: &SourceCatalog, sources: &[String]) -> ExpressionResult<Arc<Self>> {
        let rows = sources
            .iter()
            .map(|name| {
                catalog
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ExpressionError::UnknownSource {
                        name: name.clone(),
                        available: sources.to_vec(),
                    })
            })
            .collect::<ExpressionResult<Vec<_>>>()?;

        Ok(Arc::new(Self {
            sources: sources.to_vec(),
            rows,
            indexes: Mutex::new(HashMap::new()),
        }))
    }

    /// All rows of the source at `position`
    pub fn rows(&self, position: usize) -> Rows {
        Arc::clone(&self.rows[position])
    }

    /// Number of hash indexes built so far
    pub fn built_indexes(&self) -> usize {
        self.indexes.lock().len()
    }

    /// Derive lookup plans for enumerating under `predicate`.
    ///
    /// Without a predicate every position is a full scan. A conjunct only
    /// narrows position `p` when every conjunct before it reads positions
    /// below `p`, so those can be decided before the lookup runs.
    pub fn child_for(
        self: &Arc<Self>,
        predicate: Option<&Expression>,
    ) -> ExpressionResult<IndexedSources> {
        let mut lookups: Vec<Option<Lookup>> = vec![None; self.sources.len()];

        if let Some(predicate) = predicate {
            // Highest position read by the conjuncts seen so far
            let mut reads_up_to: Option<usize> = None;

            for (conjunct_index, conjunct) in predicate.conjuncts().into_iter().enumerate() {
                let reads = compile(&self.sources, conjunct)?.max_slot();

                if let Expression::BinaryOp {
                    op: BinaryOperator::Eq,
                    left,
                    right,
                } = conjunct
                {
                    for (key_side, value_side) in [(left, right), (right, left)] {
                        let Some(key) = self.key_of(key_side) else {
                            continue;
                        };
                        let position = key.position;
                        if lookups[position].is_some()
                            || reads_up_to.is_some_and(|slot| slot >= position)
                        {
                            continue;
                        }
                        let value = compile(&self.sources, value_side)?;
                        if value.max_slot().map_or(true, |slot| slot < position) {
                            debug!(
                                "lookup on {} via {}",
                                self.describe(&key),
                                value_side
                            );
                            lookups[position] = Some(Lookup {
                                key,
                                value,
                                conjunct: conjunct_index,
                            });
                            break;
                        }
                    }
                }

                reads_up_to = reads_up_to.max(reads);
            }
        }

        Ok(IndexedSources {
            support: Arc::clone(self),
            lookups,
        })
    }

    fn key_of(&self, expr: &Expression) -> Option<IndexKey> {
        let (source, field) = match expr {
            Expression::Source(source) => (source, None),
            Expression::Field { base, name } => match base.as_ref() {
                Expression::Source(source) => (source, Some(name.clone())),
                _ => return None,
            },
            _ => return None,
        };
        let position = self.sources.iter().position(|s| *s == source.name)?;
        Some(IndexKey { position, field })
    }

    fn describe(&self, key: &IndexKey) -> String {
        match &key.field {
            Some(field) => format!("{}.{}", self.sources[key.position], field),
            None => self.sources[key.position].clone(),
        }
    }

    fn index_for(&self, key: &IndexKey) -> Arc<ValueIndex> {
        let mut indexes = self.indexes.lock();
        if let Some(index) = indexes.get(key) {
            return Arc::clone(index);
        }

        let mut index = ValueIndex::default();
        for (position, row) in self.rows[key.position].iter().enumerate() {
            let value = match &key.field {
                Some(field) => row.field(field),
                None => Some(row),
            };
            match value.and_then(|v| v.data_type().map(|kind| (v, kind))) {
                Some((value, kind)) => {
                    index.by_key.entry(value.clone()).or_default().push(position);
                    index.by_kind.entry(kind).or_default().push(position);
                }
                None => index.unkeyed.push(position),
            }
        }

        debug!(
            "built index on {} with {} keys, {} unkeyed rows",
            self.describe(key),
            index.by_key.len(),
            index.unkeyed.len()
        );
        let index = Arc::new(index);
        indexes.insert(key.clone(), Arc::clone(&index));
        index
    }
}

#[derive(Debug, Clone)]
struct Lookup {
    key: IndexKey,
    value: CompiledExpression,
    /// Position of the equality among the predicate's conjuncts
    conjunct: usize,
}

/// Candidate access for each join position under one predicate
pub struct IndexedSources {
    support: Arc<IndexSupport>,
    lookups: Vec<Option<Lookup>>,
}

impl IndexedSources {
    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }

    /// Whether candidates at `position` may come from an index lookup
    pub fn is_narrowed(&self, position: usize) -> bool {
        self.lookups[position].is_some()
    }

    /// Candidate rows for `position`, given the rows bound to earlier positions.
    ///
    /// `settled` is the number of leading conjuncts already known to be true
    /// or NULL for `prefix`. The lookup is used only when every conjunct
    /// before its equality is settled. Otherwise, or when the looked up value
    /// is NULL or fails to evaluate, all rows are candidates.
    pub fn candidates(&self, position: usize, prefix: &[Value], settled: usize) -> Candidates {
        let all = || Candidates::new(self.support.rows(position));
        let Some(lookup) = &self.lookups[position] else {
            return all();
        };
        if lookup.conjunct > settled {
            return all();
        }

        let wanted = match lookup.value.evaluate(prefix) {
            Ok(wanted) if !wanted.is_null() => wanted,
            Ok(_) => return all(),
            Err(e) => {
                trace!("lookup for position {} failed ({}), scanning", position, e);
                return all();
            }
        };
        let index = self.support.index_for(&lookup.key);
        Candidates::picked(self.support.rows(position), index.lookup(&wanted))
    }
}

/// Cursor over shared candidate rows
#[derive(Debug, Clone)]
pub struct Candidates {
    rows: Rows,
    /// Positions to visit, or every row when absent
    picks: Option<Vec<usize>>,
    next: usize,
}

impl Candidates {
    fn new(rows: Rows) -> Self {
        Self {
            rows,
            picks: None,
            next: 0,
        }
    }

    fn picked(rows: Rows, picks: Vec<usize>) -> Self {
        Self {
            rows,
            picks: Some(picks),
            next: 0,
        }
    }
}

impl Iterator for Candidates {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let position = match &self.picks {
            Some(picks) => *picks.get(self.next)?,
            None => self.next,
        };
        let row = self.rows.get(position)?.clone();
        self.next += 1;
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn catalog() -> SourceCatalog {
        let mut catalog = SourceCatalog::new();
        catalog.register("a", [1, 2, 3]);
        catalog.register("b", [2, 3, 3, 4]);
        catalog.register(
            "p",
            [
                Value::record([("id", Value::Int32(1)), ("dept", Value::from("x"))]),
                Value::record([("id", Value::Int32(2)), ("dept", Value::from("y"))]),
                Value::record([("id", Value::Int32(3)), ("dept", Value::Null)]),
            ],
        );
        catalog
    }

    #[test]
    fn test_build_rejects_unknown_source() {
        assert!(matches!(
            IndexSupport::build(&catalog(), &names(&["a", "zz"])),
            Err(ExpressionError::UnknownSource { .. })
        ));
    }

    #[test]
    fn test_no_predicate_is_full_scan() -> ExpressionResult<()> {
        let support = IndexSupport::build(&catalog(), &names(&["a", "b"]))?;
        let child = support.child_for(None)?;

        assert!(!child.is_narrowed(0));
        assert!(!child.is_narrowed(1));
        assert_eq!(child.candidates(1, &[Value::Int32(1)], 0).count(), 4);
        assert_eq!(support.built_indexes(), 0);
        Ok(())
    }

    #[test]
    fn test_equality_join_narrows_later_position() -> ExpressionResult<()> {
        let support = IndexSupport::build(&catalog(), &names(&["a", "b"]))?;
        let predicate = Expression::eq(Expression::source("a"), Expression::source("b"));
        let child = support.child_for(Some(&predicate))?;

        // Only the later position can look up values of the earlier one
        assert!(!child.is_narrowed(0));
        assert!(child.is_narrowed(1));

        let rows: Vec<Value> = child.candidates(1, &[Value::Int32(3)], 0).collect();
        assert_eq!(rows, vec![Value::Int32(3), Value::Int32(3)]);
        assert_eq!(child.candidates(1, &[Value::Int32(9)], 0).count(), 0);
        assert_eq!(support.built_indexes(), 1);
        Ok(())
    }

    #[test]
    fn test_constant_lookup_narrows_first_position() -> ExpressionResult<()> {
        let support = IndexSupport::build(&catalog(), &names(&["a", "b"]))?;
        let predicate = Expression::and(
            Expression::eq(Expression::int32(2), Expression::source("a")),
            Expression::gt(Expression::source("b"), Expression::int32(0)),
        );
        let child = support.child_for(Some(&predicate))?;

        assert!(child.is_narrowed(0));
        assert!(!child.is_narrowed(1));
        let rows: Vec<Value> = child.candidates(0, &[], 0).collect();
        assert_eq!(rows, vec![Value::Int32(2)]);
        Ok(())
    }

    #[test]
    fn test_field_index_keeps_null_keys() -> ExpressionResult<()> {
        let support = IndexSupport::build(&catalog(), &names(&["a", "p"]))?;
        let predicate = Expression::eq(
            Expression::field(Expression::source("p"), "id"),
            Expression::source("a"),
        );
        let child = support.child_for(Some(&predicate))?;
        assert!(child.is_narrowed(1));

        let rows: Vec<Value> = child.candidates(1, &[Value::Int32(2)], 0).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field("dept"), Some(&Value::from("y")));

        // Looking up NULL rules nothing out
        assert_eq!(child.candidates(1, &[Value::Null], 0).count(), 3);

        // The row with a NULL dept is still a candidate
        let by_dept = Expression::eq(
            Expression::field(Expression::source("p"), "dept"),
            Expression::string("x"),
        );
        let child = support.child_for(Some(&by_dept))?;
        let ids: Vec<Value> = child
            .candidates(1, &[Value::Int32(0)], 0)
            .map(|row| row.field("id").cloned().unwrap_or(Value::Null))
            .collect();
        assert_eq!(ids, vec![Value::Int32(1), Value::Int32(3)]);
        Ok(())
    }

    #[test]
    fn test_rows_of_other_kinds_stay_candidates() -> ExpressionResult<()> {
        let mut catalog = catalog();
        catalog.register(
            "mixed",
            vec![
                Value::Int32(1),
                Value::from("x"),
                Value::record([("k", Value::Int32(1))]),
                Value::Int32(2),
                Value::Null,
            ],
        );
        let support = IndexSupport::build(&catalog, &names(&["a", "mixed"]))?;

        let whole = Expression::eq(Expression::source("mixed"), Expression::source("a"));
        let child = support.child_for(Some(&whole))?;
        let rows: Vec<Value> = child.candidates(1, &[Value::Int32(1)], 0).collect();
        assert_eq!(
            rows,
            vec![
                Value::Int32(1),
                Value::from("x"),
                Value::record([("k", Value::Int32(1))]),
                Value::Null,
            ]
        );

        // Rows that are not records cannot be keyed on a field
        let by_field = Expression::eq(
            Expression::field(Expression::source("mixed"), "k"),
            Expression::source("a"),
        );
        let child = support.child_for(Some(&by_field))?;
        assert_eq!(child.candidates(1, &[Value::Int32(2)], 0).count(), 4);
        assert_eq!(child.candidates(1, &[Value::Int32(1)], 0).count(), 5);
        Ok(())
    }

    #[test]
    fn test_failing_lookup_value_scans_everything() -> ExpressionResult<()> {
        let support = IndexSupport::build(&catalog(), &names(&["a", "b"]))?;
        let predicate = Expression::eq(
            Expression::source("b"),
            Expression::div_expr(Expression::int32(6), Expression::source("a")),
        );
        let child = support.child_for(Some(&predicate))?;
        assert_eq!(child.candidates(1, &[Value::Int32(3)], 0).count(), 1);
        assert_eq!(child.candidates(1, &[Value::Int32(0)], 0).count(), 4);
        Ok(())
    }

    #[test]
    fn test_lookup_waits_for_earlier_conjuncts() -> ExpressionResult<()> {
        let support = IndexSupport::build(&catalog(), &names(&["a", "b"]))?;

        // The first conjunct reads b, so b cannot be narrowed by the second
        let predicate = Expression::and(
            Expression::gt(Expression::source("b"), Expression::int32(2)),
            Expression::eq(Expression::source("b"), Expression::source("a")),
        );
        assert!(!support.child_for(Some(&predicate))?.is_narrowed(1));

        // Reading only a, it can be decided first
        let predicate = Expression::and(
            Expression::gt(Expression::source("a"), Expression::int32(0)),
            Expression::eq(Expression::source("b"), Expression::source("a")),
        );
        let child = support.child_for(Some(&predicate))?;
        assert!(child.is_narrowed(1));
        assert_eq!(child.candidates(1, &[Value::Int32(3)], 1).count(), 2);
        // Until the first conjunct is settled every row is a candidate
        assert_eq!(child.candidates(1, &[Value::Int32(3)], 0).count(), 4);
        Ok(())
    }

    #[test]
    fn test_indexes_are_shared_between_children() -> ExpressionResult<()> {
        let support = IndexSupport::build(&catalog(), &names(&["a", "b"]))?;
        let p1 = Expression::eq(Expression::source("b"), Expression::source("a"));
        let p2 = Expression::and(
            Expression::eq(Expression::source("a"), Expression::source("b")),
            Expression::lt(Expression::source("a"), Expression::int32(3)),
        );

        support.child_for(Some(&p1))?.candidates(1, &[Value::Int32(2)], 0);
        support.child_for(Some(&p2))?.candidates(1, &[Value::Int32(2)], 0);
        assert_eq!(support.built_indexes(), 1);
        Ok(())
    }

    #[test]
    fn test_disjunction_is_not_pushed_down() -> ExpressionResult<()> {
        let support = IndexSupport::build(&catalog(), &names(&["a", "b"]))?;
        let predicate = Expression::or(
            Expression::eq(Expression::source("a"), Expression::source("b")),
            Expression::eq(Expression::source("b"), Expression::int32(4)),
        );
        let child = support.child_for(Some(&predicate))?;
        assert!(!child.is_narrowed(0));
        assert!(!child.is_narrowed(1));
        Ok(())
    }
}
