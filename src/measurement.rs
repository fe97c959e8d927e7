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

//! Item measurements.
//!
//! A measurement is written once per item id and read many times. Recording
//! the same id again overwrites the previous measurement.

use crate::base::{EntityKind, ItemId};
use crate::clock::Clock;
use crate::codec::Entity;
use crate::contract::WarehouseContract;
use crate::error::ContractError;
use crate::keys::{self, MEASUREMENTS, Namespace};
use crate::records;
use crate::store::LedgerStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Physical dimensions and weight of an item, in whole units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub length: i64,
    pub width: i64,
    pub height: i64,
    pub weight: i64,
}

impl Dimensions {
    pub fn new(length: i64, width: i64, height: i64, weight: i64) -> Self {
        Self {
            length,
            width,
            height,
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Measurement {
    pub id: ItemId,
    pub length: i64,
    pub width: i64,
    pub height: i64,
    pub weight: i64,
    pub organization_id: String,
    /// Set by the contract when the measurement is recorded.
    pub timestamp: DateTime<Utc>,
}

impl Measurement {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.length, self.width, self.height, self.weight)
    }
}

impl Entity for Measurement {
    const KIND: EntityKind = EntityKind::Measurement;
    const NAMESPACE: Namespace = MEASUREMENTS;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl<C: Clock> WarehouseContract<C> {
    /// Records the measurements of `id`, stamped with the contract clock.
    ///
    /// There is no existence check: an earlier measurement under the same id
    /// is replaced.
    ///
    /// # Errors
    ///
    /// - [`ContractError::InvalidArgument`] - `id` starts with a prefix owned
    ///   by policies or disputes.
    #[instrument(skip_all, fields(item = %id))]
    pub fn record_measurement<S: LedgerStore + ?Sized>(
        &self,
        store: &mut S,
        id: ItemId,
        dimensions: Dimensions,
        organization_id: impl Into<String>,
    ) -> Result<Measurement, ContractError> {
        check_measurement_id(id.as_str())?;
        let measurement = Measurement {
            id,
            length: dimensions.length,
            width: dimensions.width,
            height: dimensions.height,
            weight: dimensions.weight,
            organization_id: organization_id.into(),
            timestamp: self.now(),
        };
        records::write(store, &measurement)?;
        Ok(measurement)
    }

    /// # Errors
    ///
    /// - [`ContractError::NotFound`] - Nothing is stored under `id`.
    /// - [`ContractError::Decode`] - The stored value is not a measurement.
    pub fn get_measurement<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        id: &ItemId,
    ) -> Result<Measurement, ContractError> {
        records::read(store, id.as_str())
    }

    /// Stored bytes of the measurement, exactly as written.
    ///
    /// Repeated calls without intervening writes return identical bytes.
    pub fn get_measurement_raw<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        id: &ItemId,
    ) -> Result<Vec<u8>, ContractError> {
        records::read_raw::<Measurement, S>(store, id.as_str())
    }

    pub fn measurement_exists<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        id: &ItemId,
    ) -> Result<bool, ContractError> {
        records::exists::<Measurement, S>(store, id.as_str())
    }
}

/// Rejects ids whose raw key would land in another kind's namespace.
pub(crate) fn check_measurement_id(id: &str) -> Result<(), ContractError> {
    match keys::reserved_namespace(id) {
        Some(ns) => Err(ContractError::InvalidArgument(format!(
            "measurement id must not start with {:?}",
            ns.prefix()
        ))),
        None => Ok(()),
    }
}
