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

//! The ledger capability the contract runs against.
//!
//! Contract operations are written against [`LedgerStore`] only. The
//! surrounding runtime hands each invocation a store bound to one consistent
//! snapshot; commit, rollback and conflict detection happen outside the
//! contract. [`crate::ledger::MemoryLedger`] is the in-process implementation.

use crate::error::StoreError;

/// One entry yielded by a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// Lazy, key-ordered iteration over a half-open key range.
///
/// Dropping the scan releases it.
pub type Scan<'a> = Box<dyn Iterator<Item = Result<KeyValue, StoreError>> + 'a>;

/// Get/put/range-scan over a versioned key-value ledger.
pub trait LedgerStore {
    /// Reads `key`. `Ok(None)` when the key holds no value.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Iterates keys in `[start, end)` in ascending byte order.
    ///
    /// An empty `end` leaves the range unbounded above.
    fn range_scan(&self, start: &str, end: &str) -> Result<Scan<'_>, StoreError>;

    /// True when `key` holds a value.
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Scan<'_>, StoreError> {
        (**self).range_scan(start, end)
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Scan<'_>, StoreError> {
        (**self).range_scan(start, end)
    }
}

/// Rejects inverted bounds before a scan is opened.
pub(crate) fn check_range(start: &str, end: &str) -> Result<(), StoreError> {
    if !end.is_empty() && start > end {
        return Err(StoreError::InvalidRange {
            start: start.to_owned(),
            end: end.to_owned(),
        });
    }
    Ok(())
}
