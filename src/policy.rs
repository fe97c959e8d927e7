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

//! Tariff policies.
//!
//! A policy prices items by one unit kind. Policies are created once, then
//! updated wholesale any number of times; they are never deleted. Setting
//! `active` to false takes a policy out of tariff calculation while keeping
//! its record.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use warehouse_tariff_ledger::{MemoryLedger, PolicyId, PolicyTerms, UnitKind, WarehouseContract};
//!
//! let contract = WarehouseContract::new();
//! let ledger = MemoryLedger::new();
//!
//! let terms = PolicyTerms::new("Weight", dec!(5), UnitKind::Weight, "standard");
//! ledger
//!     .execute(|tx| contract.create_tariff_policy(tx, PolicyId::from("weight"), terms, "admin"))
//!     .unwrap();
//!
//! let policy = contract
//!     .get_tariff_policy(&ledger.begin(), &PolicyId::from("weight"))
//!     .unwrap();
//! assert!(policy.active);
//! ```

use crate::base::{EntityKind, PolicyId, open_enum};
use crate::clock::Clock;
use crate::codec::Entity;
use crate::contract::WarehouseContract;
use crate::error::ContractError;
use crate::keys::{Namespace, TARIFF_POLICIES};
use crate::records::{self, ScanOutcome};
use crate::store::LedgerStore;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

open_enum!(
    /// Pricing basis of a tariff policy.
    UnitKind {
        /// Rate per unit of weight.
        Weight => "weight",
        /// Rate per unit of volume (`length * width * height`).
        Volume => "volume",
        /// Flat rate per item.
        Item => "item",
    }
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TariffPolicy {
    pub id: PolicyId,
    pub name: String,
    pub description: String,
    /// Currency per unit of `unit`.
    pub rate: Decimal,
    pub unit: UnitKind,
    pub category: String,
    pub active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for TariffPolicy {
    const KIND: EntityKind = EntityKind::TariffPolicy;
    const NAMESPACE: Namespace = TARIFF_POLICIES;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// The mutable fields of a policy, supplied in full on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTerms {
    pub name: String,
    pub description: String,
    pub rate: Decimal,
    pub unit: UnitKind,
    pub category: String,
}

impl PolicyTerms {
    pub fn new(
        name: impl Into<String>,
        rate: Decimal,
        unit: UnitKind,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            rate,
            unit,
            category: category.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl<C: Clock> WarehouseContract<C> {
    /// Creates an active policy.
    ///
    /// # Errors
    ///
    /// - [`ContractError::AlreadyExists`] - A policy with `id` is already stored.
    #[instrument(skip_all, fields(policy = %id))]
    pub fn create_tariff_policy<S: LedgerStore + ?Sized>(
        &self,
        store: &mut S,
        id: PolicyId,
        terms: PolicyTerms,
        created_by: impl Into<String>,
    ) -> Result<TariffPolicy, ContractError> {
        if records::exists::<TariffPolicy, S>(store, id.as_str())? {
            return Err(ContractError::already_exists(EntityKind::TariffPolicy, id.as_str()));
        }

        let policy = TariffPolicy {
            id,
            name: terms.name,
            description: terms.description,
            rate: terms.rate,
            unit: terms.unit,
            category: terms.category,
            active: true,
            created_by: created_by.into(),
            created_at: self.now(),
        };
        records::write(store, &policy)?;
        Ok(policy)
    }

    /// # Errors
    ///
    /// - [`ContractError::NotFound`] - No policy with `id`.
    /// - [`ContractError::Decode`] - The stored value is not a policy.
    pub fn get_tariff_policy<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        id: &PolicyId,
    ) -> Result<TariffPolicy, ContractError> {
        records::read(store, id.as_str())
    }

    pub fn get_tariff_policy_raw<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        id: &PolicyId,
    ) -> Result<Vec<u8>, ContractError> {
        records::read_raw::<TariffPolicy, S>(store, id.as_str())
    }

    pub fn tariff_policy_exists<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        id: &PolicyId,
    ) -> Result<bool, ContractError> {
        records::exists::<TariffPolicy, S>(store, id.as_str())
    }

    /// Overwrites every mutable field of an existing policy.
    ///
    /// `id`, `created_by` and `created_at` are kept from the stored record.
    ///
    /// # Errors
    ///
    /// - [`ContractError::NotFound`] - No policy with `id`.
    #[instrument(skip_all, fields(policy = %id, active = active))]
    pub fn update_tariff_policy<S: LedgerStore + ?Sized>(
        &self,
        store: &mut S,
        id: &PolicyId,
        terms: PolicyTerms,
        active: bool,
    ) -> Result<TariffPolicy, ContractError> {
        let mut policy: TariffPolicy = records::read(store, id.as_str())?;
        policy.name = terms.name;
        policy.description = terms.description;
        policy.rate = terms.rate;
        policy.unit = terms.unit;
        policy.category = terms.category;
        policy.active = active;

        records::write(store, &policy)?;
        debug!(unit = %policy.unit, rate = %policy.rate, "policy updated");
        Ok(policy)
    }

    /// Every decodable policy, in ledger key order.
    pub fn list_tariff_policies<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<ScanOutcome<TariffPolicy>, ContractError> {
        records::scan(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ledger::MemoryLedger;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn contract() -> WarehouseContract<ManualClock> {
        let start = DateTime::from_timestamp(1_735_689_600, 0).unwrap();
        WarehouseContract::with_clock(ManualClock::new(start, Duration::seconds(1)))
    }

    fn weight_terms() -> PolicyTerms {
        PolicyTerms::new("Weight", dec!(5), UnitKind::Weight, "standard")
            .with_description("per kg")
    }

    #[test]
    fn unit_kind_parses_known_values() {
        assert_eq!(UnitKind::from("weight"), UnitKind::Weight);
        assert_eq!(UnitKind::from("volume"), UnitKind::Volume);
        assert_eq!(UnitKind::from("item"), UnitKind::Item);
        assert_eq!(UnitKind::from("pallet"), UnitKind::Other("pallet".into()));
    }

    #[test]
    fn policies_live_in_their_namespace() {
        let contract = contract();
        let ledger = MemoryLedger::new();
        ledger
            .execute(|tx| contract.create_tariff_policy(tx, "w".into(), weight_terms(), "admin"))
            .unwrap();

        assert!(ledger.get_committed("tariff_w").is_some());
        assert!(ledger.get_committed("w").is_none());
    }

    #[test]
    fn rate_is_stored_as_exact_string() {
        let contract = contract();
        let ledger = MemoryLedger::new();
        let terms = PolicyTerms::new("Fine", dec!(0.125), UnitKind::Item, "c");
        ledger
            .execute(|tx| contract.create_tariff_policy(tx, "f".into(), terms, "admin"))
            .unwrap();

        let raw = String::from_utf8(ledger.get_committed("tariff_f").unwrap()).unwrap();
        assert!(raw.contains(r#""rate":"0.125""#), "{raw}");
        assert!(raw.contains(r#""unit":"item""#), "{raw}");
    }

    #[test]
    fn create_rejects_existing_id() {
        let contract = contract();
        let ledger = MemoryLedger::new();
        ledger
            .execute(|tx| contract.create_tariff_policy(tx, "w".into(), weight_terms(), "admin"))
            .unwrap();

        let result = ledger
            .execute(|tx| contract.create_tariff_policy(tx, "w".into(), weight_terms(), "other"));
        assert_eq!(
            result,
            Err(ContractError::already_exists(EntityKind::TariffPolicy, "w"))
        );
    }

    #[test]
    fn update_keeps_identity_fields() {
        let contract = contract();
        let ledger = MemoryLedger::new();
        let created = ledger
            .execute(|tx| contract.create_tariff_policy(tx, "w".into(), weight_terms(), "admin"))
            .unwrap();

        let terms = PolicyTerms::new("Volume", dec!(2), UnitKind::Volume, "bulk");
        let updated = ledger
            .execute(|tx| contract.update_tariff_policy(tx, &"w".into(), terms, false))
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_by, "admin");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.name, "Volume");
        assert_eq!(updated.description, "");
        assert_eq!(updated.unit, UnitKind::Volume);
        assert!(!updated.active);
    }

    #[test]
    fn update_missing_policy_is_not_found() {
        let contract = contract();
        let ledger = MemoryLedger::new();
        let result = ledger
            .execute(|tx| contract.update_tariff_policy(tx, &"nope".into(), weight_terms(), true));
        assert_eq!(
            result,
            Err(ContractError::not_found(EntityKind::TariffPolicy, "nope"))
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn list_returns_policies_in_key_order() {
        let contract = contract();
        let ledger = MemoryLedger::new();
        for id in ["b", "a", "c"] {
            ledger
                .execute(|tx| contract.create_tariff_policy(tx, id.into(), weight_terms(), "x"))
                .unwrap();
        }
        ledger.seed("tariff_zz", b"garbage".to_vec()).unwrap();

        let listed = contract.list_tariff_policies(&ledger.begin()).unwrap();
        let ids: Vec<_> = listed.records.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(listed.skipped, 1);
    }
}
