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

//! Record store adapter: typed get/put/scan over a [`LedgerStore`], applying
//! each entity's namespace.

use crate::codec::{self, Entity};
use crate::error::ContractError;
use crate::store::LedgerStore;
use tracing::{debug, warn};

/// Result of scanning one namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome<E> {
    /// Decoded records in ledger key order.
    pub records: Vec<E>,
    /// Entries in the namespace that failed to decode.
    pub skipped: usize,
}

/// Stored bytes of entity `id`, verbatim.
pub fn read_raw<E, S>(store: &S, id: &str) -> Result<Vec<u8>, ContractError>
where
    E: Entity,
    S: LedgerStore + ?Sized,
{
    store
        .get(&E::NAMESPACE.key(id))?
        .ok_or_else(|| ContractError::not_found(E::KIND, id))
}

pub fn read<E, S>(store: &S, id: &str) -> Result<E, ContractError>
where
    E: Entity,
    S: LedgerStore + ?Sized,
{
    let key = E::NAMESPACE.key(id);
    let bytes = store
        .get(&key)?
        .ok_or_else(|| ContractError::not_found(E::KIND, id))?;
    codec::decode(&key, &bytes)
}

pub fn exists<E, S>(store: &S, id: &str) -> Result<bool, ContractError>
where
    E: Entity,
    S: LedgerStore + ?Sized,
{
    Ok(store.contains(&E::NAMESPACE.key(id))?)
}

pub fn write<E, S>(store: &mut S, entity: &E) -> Result<(), ContractError>
where
    E: Entity,
    S: LedgerStore + ?Sized,
{
    let key = entity.key();
    let bytes = codec::encode(entity)?;
    debug!(kind = %E::KIND, key = %key, "writing record");
    store.put(&key, bytes)?;
    Ok(())
}

/// Decodes every record in the namespace of `E`.
///
/// Entries that fail to decode are skipped and counted. Failing to open the
/// scan, or an error while iterating it, aborts the whole scan.
pub fn scan<E, S>(store: &S) -> Result<ScanOutcome<E>, ContractError>
where
    E: Entity,
    S: LedgerStore + ?Sized,
{
    let mut records = Vec::new();
    let skipped = for_each_decoded::<E, S, _>(store, |record| {
        records.push(record);
        Ok(())
    })?;
    Ok(ScanOutcome { records, skipped })
}

/// Drains the namespace scan of `E`, handing each decodable record to `f`.
///
/// Returns the number of skipped entries.
pub(crate) fn for_each_decoded<E, S, F>(store: &S, mut f: F) -> Result<usize, ContractError>
where
    E: Entity,
    S: LedgerStore + ?Sized,
    F: FnMut(E) -> Result<(), ContractError>,
{
    let (start, end) = E::NAMESPACE.range();
    let mut skipped = 0;
    for entry in store.range_scan(&start, &end)? {
        let entry = entry?;
        match codec::decode::<E>(&entry.key, &entry.value) {
            Ok(record) => f(record)?,
            Err(err) => {
                warn!(kind = %E::KIND, key = %entry.key, error = %err, "skipping undecodable record");
                skipped += 1;
            }
        }
    }
    Ok(skipped)
}
