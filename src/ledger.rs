// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! In-process versioned ledger.
//!
//! [`MemoryLedger`] keeps an ordered world state where every value carries the
//! height of the commit that wrote it. A transaction ([`TxContext`]) reads
//! from an immutable snapshot taken at [`MemoryLedger::begin`], buffers its
//! writes, and records what it read. [`TxContext::commit`] re-validates those
//! reads against the current state under an exclusive lock:
//!
//! ```text
//!  begin ──► snapshot reads + buffered writes ──► commit
//!                                                   │
//!                    read set unchanged? ──yes──► apply writes, height += 1
//!                                       └──no───► StoreError::Conflict
//! ```
//!
//! Reads inside a transaction do not observe that transaction's own writes.
//!
//! # Example
//!
//! ```
//! use warehouse_tariff_ledger::{LedgerStore, MemoryLedger};
//!
//! let ledger = MemoryLedger::new();
//! let mut tx = ledger.begin();
//! tx.put("item-1", b"{}".to_vec()).unwrap();
//! tx.commit().unwrap();
//!
//! assert_eq!(ledger.height(), 1);
//! assert_eq!(ledger.get_committed("item-1"), Some(b"{}".to_vec()));
//! ```

use crate::error::StoreError;
use crate::store::{KeyValue, LedgerStore, Scan, check_range};
use crossbeam::queue::SegQueue;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Height of the commit that last wrote a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(pub u64);

#[derive(Debug, Clone)]
struct VersionedValue {
    value: Vec<u8>,
    version: Version,
}

type WorldState = BTreeMap<String, VersionedValue>;

#[derive(Debug)]
struct LedgerData {
    state: Arc<WorldState>,
    height: u64,
}

/// Record of one applied commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Ledger height after the commit.
    pub height: u64,
    /// Keys written, in ascending order.
    pub keys: Vec<String>,
}

/// Thread-safe in-memory ledger with snapshot isolation.
#[derive(Debug)]
pub struct MemoryLedger {
    inner: RwLock<LedgerData>,
    /// Applied commits in height order, until drained.
    commits: SegQueue<CommitRecord>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerData {
                state: Arc::new(WorldState::new()),
                height: 0,
            }),
            commits: SegQueue::new(),
        }
    }

    /// Opens a transaction over the current committed state.
    pub fn begin(&self) -> TxContext<'_> {
        let snapshot = Arc::clone(&self.inner.read().state);
        TxContext {
            ledger: self,
            snapshot,
            reads: RefCell::new(ReadSet::default()),
            writes: BTreeMap::new(),
        }
    }

    /// Runs `f` in a fresh transaction and commits it if `f` succeeds.
    ///
    /// When `f` fails the transaction is dropped and nothing is written.
    pub fn execute<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut TxContext<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut tx = self.begin();
        let value = f(&mut tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Writes a single key in its own transaction.
    pub fn seed(&self, key: &str, value: Vec<u8>) -> Result<CommitRecord, StoreError> {
        let mut tx = self.begin();
        tx.put(key, value)?;
        tx.commit()
    }

    /// Number of commits that wrote at least one key.
    pub fn height(&self) -> u64 {
        self.inner.read().height
    }

    /// Number of keys holding a value.
    pub fn len(&self) -> usize {
        self.inner.read().state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Committed value of `key`, outside of any transaction.
    pub fn get_committed(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.read().state.get(key).map(|v| v.value.clone())
    }

    /// Version of the committed value of `key`.
    pub fn version(&self, key: &str) -> Option<Version> {
        self.inner.read().state.get(key).map(|v| v.version)
    }

    /// Removes and returns every commit record applied so far, oldest first.
    pub fn drain_commits(&self) -> Vec<CommitRecord> {
        let mut out = Vec::with_capacity(self.commits.len());
        while let Some(record) = self.commits.pop() {
            out.push(record);
        }
        out
    }

    fn apply(
        &self,
        reads: ReadSet,
        writes: BTreeMap<String, Vec<u8>>,
    ) -> Result<CommitRecord, StoreError> {
        let mut data = self.inner.write();

        if let Err(err) = reads.validate(&data.state) {
            warn!(height = data.height, error = %err, "transaction rejected");
            return Err(err);
        }

        if writes.is_empty() {
            return Ok(CommitRecord {
                height: data.height,
                keys: Vec::new(),
            });
        }

        let height = data.height + 1;
        let version = Version(height);
        let state = Arc::make_mut(&mut data.state);
        let mut keys = Vec::with_capacity(writes.len());
        for (key, value) in writes {
            keys.push(key.clone());
            state.insert(key, VersionedValue { value, version });
        }
        data.height = height;

        let record = CommitRecord { height, keys };
        // Pushed under the write lock so the queue stays in height order.
        self.commits.push(record.clone());
        info!(height, keys = record.keys.len(), "transaction committed");
        Ok(record)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct RangeRead {
    start: String,
    end: String,
    observed: Vec<(String, Version)>,
}

#[derive(Debug, Default)]
struct ReadSet {
    points: BTreeMap<String, Option<Version>>,
    ranges: Vec<RangeRead>,
}

impl ReadSet {
    fn validate(&self, state: &WorldState) -> Result<(), StoreError> {
        for (key, seen) in &self.points {
            let current = state.get(key).map(|v| v.version);
            if current != *seen {
                return Err(StoreError::Conflict { key: key.clone() });
            }
        }

        for range in &self.ranges {
            let mut current = scan_range(state, &range.start, &range.end)
                .map(|(key, v)| (key.as_str(), v.version));
            let mut observed = range.observed.iter().map(|(key, v)| (key.as_str(), *v));
            loop {
                match (current.next(), observed.next()) {
                    (None, None) => break,
                    (Some(now), Some(then)) if now == then => continue,
                    (Some((key, _)), _) | (None, Some((key, _))) => {
                        return Err(StoreError::Conflict { key: key.to_owned() });
                    }
                }
            }
        }

        Ok(())
    }
}

fn scan_range<'s>(
    state: &'s WorldState,
    start: &str,
    end: &str,
) -> std::collections::btree_map::Range<'s, String, VersionedValue> {
    let upper = if end.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(end)
    };
    state.range::<str, _>((Bound::Included(start), upper))
}

/// A transaction against a [`MemoryLedger`] snapshot.
///
/// Dropping a context without calling [`TxContext::commit`] rolls it back.
#[derive(Debug)]
pub struct TxContext<'l> {
    ledger: &'l MemoryLedger,
    snapshot: Arc<WorldState>,
    reads: RefCell<ReadSet>,
    writes: BTreeMap<String, Vec<u8>>,
}

impl TxContext<'_> {
    /// Validates the read set and applies the write set atomically.
    pub fn commit(self) -> Result<CommitRecord, StoreError> {
        let TxContext {
            ledger,
            reads,
            writes,
            ..
        } = self;
        ledger.apply(reads.into_inner(), writes)
    }
}

impl LedgerStore for TxContext<'_> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let entry = self.snapshot.get(key);
        self.reads
            .borrow_mut()
            .points
            .entry(key.to_owned())
            .or_insert_with(|| entry.map(|v| v.version));
        Ok(entry.map(|v| v.value.clone()))
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        debug!(key, bytes = value.len(), "buffered write");
        self.writes.insert(key.to_owned(), value);
        Ok(())
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Scan<'_>, StoreError> {
        check_range(start, end)?;
        let observed = scan_range(&self.snapshot, start, end)
            .map(|(key, v)| (key.clone(), v.version))
            .collect();
        self.reads.borrow_mut().ranges.push(RangeRead {
            start: start.to_owned(),
            end: end.to_owned(),
            observed,
        });

        let iter = scan_range(&self.snapshot, start, end).map(|(key, v)| {
            Ok::<_, StoreError>(KeyValue {
                key: key.clone(),
                value: v.value.clone(),
            })
        });
        Ok(Box::new(iter))
    }
}
