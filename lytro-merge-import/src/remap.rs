//! Id translation bookkeeping for one merge run.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// A primary key value from one of the merged tables.
///
/// Three of the tables use integer rowids; `imported_pictures` keys off
/// content hashes, so text keys are first-class here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(v) => write!(f, "{v}"),
            RowId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RowId {
    fn from(v: i64) -> Self {
        RowId::Int(v)
    }
}

/// Mapping from (table name, old id) to the id the destination assigned.
///
/// Append-only within a run: one entry per successfully inserted row. A
/// missing entry means the row has not been processed yet, or was skipped
/// as a duplicate.
#[derive(Debug, Default)]
pub struct IdRemap {
    tables: HashMap<&'static str, HashMap<RowId, RowId>>,
}

impl IdRemap {
    pub fn record(&mut self, table: &'static str, old: RowId, new: RowId) {
        self.tables.entry(table).or_default().insert(old, new);
    }

    pub fn lookup(&self, table: &str, old: &RowId) -> Option<&RowId> {
        self.tables.get(table)?.get(old)
    }

    /// Look up the destination id for an integer source key.
    pub fn lookup_int(&self, table: &str, old: i64) -> Option<i64> {
        match self.lookup(table, &RowId::Int(old))? {
            RowId::Int(v) => Some(*v),
            RowId::Text(_) => None,
        }
    }

    /// All integer ids this run assigned in `table`.
    pub fn minted_ids(&self, table: &str) -> HashSet<i64> {
        self.tables
            .get(table)
            .map(|ids| {
                ids.values()
                    .filter_map(|id| match id {
                        RowId::Int(v) => Some(*v),
                        RowId::Text(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of rows recorded for `table`.
    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, HashMap::len)
    }
}

/// Source row indices (scoped to `imported_pictures`) whose insert hit a
/// uniqueness constraint. The `pictures` row at the same index is skipped.
#[derive(Debug, Default)]
pub struct DuplicateSet(HashSet<usize>);

impl DuplicateSet {
    pub fn insert(&mut self, index: usize) {
        self.0.insert(index);
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
