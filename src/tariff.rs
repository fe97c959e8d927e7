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

//! Tariff calculation engine.
//!
//! Prices one measured item against every active policy in the ledger:
//!
//! | Unit     | Charge                              |
//! |----------|-------------------------------------|
//! | `weight` | `weight * rate`                     |
//! | `volume` | `length * width * height * rate`    |
//! | `item`   | `rate`                              |
//! | other    | skipped                             |
//!
//! Charges are summed in policy key order with checked decimal arithmetic,
//! so every execution over the same snapshot yields the same total. The
//! result is returned to the caller and never written back.

use crate::base::ItemId;
use crate::clock::Clock;
use crate::contract::WarehouseContract;
use crate::error::ContractError;
use crate::measurement::Measurement;
use crate::policy::{TariffPolicy, UnitKind};
use crate::records;
use crate::store::LedgerStore;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffCalculationResult {
    pub item_id: ItemId,
    pub total_tariff: Decimal,
    /// Policies that produced a charge, in key order. Zero charges count.
    pub applied_policies: Vec<TariffPolicy>,
    pub calculated_at: DateTime<Utc>,
    /// Policy entries that failed to decode and were left out.
    #[serde(skip)]
    pub skipped: usize,
}

/// Charge of `policy` for `measurement`, or `None` for an unknown unit.
///
/// # Errors
///
/// - [`ContractError::Overflow`] - The product does not fit a [`Decimal`].
pub fn policy_charge(
    measurement: &Measurement,
    policy: &TariffPolicy,
) -> Result<Option<Decimal>, ContractError> {
    let overflow = || ContractError::Overflow {
        item: measurement.id.to_string(),
    };

    let charge = match policy.unit {
        UnitKind::Weight => Decimal::from(measurement.weight)
            .checked_mul(policy.rate)
            .ok_or_else(overflow)?,
        UnitKind::Volume => Decimal::from(measurement.length)
            .checked_mul(Decimal::from(measurement.width))
            .and_then(|area| area.checked_mul(Decimal::from(measurement.height)))
            .and_then(|volume| volume.checked_mul(policy.rate))
            .ok_or_else(overflow)?,
        UnitKind::Item => policy.rate,
        UnitKind::Other(_) => return Ok(None),
    };
    Ok(Some(charge))
}

impl<C: Clock> WarehouseContract<C> {
    /// Computes the tariff of `item_id` from its measurement and all active
    /// policies.
    ///
    /// `organization_id` is recorded on the span only; policies are not
    /// filtered by organization.
    ///
    /// # Errors
    ///
    /// - [`ContractError::NotFound`] - No measurement for `item_id`.
    /// - [`ContractError::Overflow`] - A charge or the total overflowed.
    /// - [`ContractError::Store`] - The measurement read or the policy scan failed.
    #[instrument(skip_all, fields(item = %item_id, organization = organization_id))]
    pub fn calculate_tariff<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        item_id: &ItemId,
        organization_id: &str,
    ) -> Result<TariffCalculationResult, ContractError> {
        let measurement: Measurement = records::read(store, item_id.as_str())?;

        let mut total = Decimal::ZERO;
        let mut applied = Vec::new();
        let skipped = records::for_each_decoded::<TariffPolicy, S, _>(store, |policy| {
            if !policy.active {
                return Ok(());
            }
            let Some(charge) = policy_charge(&measurement, &policy)? else {
                debug!(policy = %policy.id, unit = %policy.unit, "ignoring unknown unit");
                return Ok(());
            };
            total = total
                .checked_add(charge)
                .ok_or_else(|| ContractError::Overflow {
                    item: item_id.to_string(),
                })?;
            debug!(policy = %policy.id, %charge, "policy applied");
            applied.push(policy);
            Ok(())
        })?;

        debug!(total = %total, applied = applied.len(), skipped, "tariff calculated");
        Ok(TariffCalculationResult {
            item_id: item_id.clone(),
            total_tariff: total,
            applied_policies: applied,
            calculated_at: self.now(),
            skipped,
        })
    }
}
