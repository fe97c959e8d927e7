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

//! # Warehouse Tariff Ledger
//!
//! A deterministic state-transition contract for warehouse operations: item
//! measurements, tariff policies, tariff calculation and the dispute
//! lifecycle, kept in a versioned key-value ledger.
//!
//! ## Core Components
//!
//! - [`WarehouseContract`]: Every named operation, bound to a configuration and a clock
//! - [`LedgerStore`]: The key-value capability the contract runs against
//! - [`MemoryLedger`]: In-process ledger with snapshot-isolated transactions
//! - [`Invocation`]: JSON-tagged requests dispatched by [`WarehouseContract::invoke`]
//! - [`ContractError`]: Error types for contract operation failures
//!
//! ## Example
//!
//! ```
//! use warehouse_tariff_ledger::{
//!     Dimensions, LedgerStore, MemoryLedger, PolicyTerms, UnitKind, WarehouseContract,
//! };
//! use rust_decimal_macros::dec;
//!
//! let contract = WarehouseContract::new();
//! let ledger = MemoryLedger::new();
//!
//! // Record an item and two pricing policies in one transaction
//! ledger
//!     .execute(|tx| {
//!         contract.record_measurement(tx, "item-1".into(), Dimensions::new(2, 3, 4, 10), "org1")?;
//!         contract.create_tariff_policy(
//!             tx,
//!             "weight".into(),
//!             PolicyTerms::new("Weight", dec!(5), UnitKind::Weight, "standard"),
//!             "admin",
//!         )?;
//!         contract.create_tariff_policy(
//!             tx,
//!             "volume".into(),
//!             PolicyTerms::new("Volume", dec!(2), UnitKind::Volume, "standard"),
//!             "admin",
//!         )
//!     })
//!     .unwrap();
//!
//! // Calculate against a fresh snapshot
//! let tx = ledger.begin();
//! let result = contract.calculate_tariff(&tx, &"item-1".into(), "org1").unwrap();
//! assert_eq!(result.total_tariff, dec!(98));
//! assert!(tx.contains("tariff_weight").unwrap());
//! ```
//!
//! ## Determinism
//!
//! Operations are pure functions of their arguments, the ledger snapshot and
//! the contract [`Clock`]. Bulk reads follow ledger key order and money is
//! exact decimal arithmetic, so re-executing an operation on the same
//! snapshot with a [`ManualClock`] yields byte-identical output.

pub mod base;
pub mod clock;
pub mod codec;
pub mod config;
pub mod contract;
pub mod dispute;
pub mod error;
pub mod invocation;
pub mod keys;
pub mod ledger;
pub mod measurement;
pub mod policy;
pub mod records;
pub mod store;
pub mod tariff;

pub use base::{DisputeId, EntityKind, ItemId, PolicyId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClockConfig, ClockMode, ConfigError, ContractConfig, DisputeConfig, TransitionPolicy};
pub use contract::WarehouseContract;
pub use dispute::{Dispute, DisputeList, DisputeStatus, DisputeType};
pub use error::{ContractError, StoreError};
pub use invocation::Invocation;
pub use ledger::{CommitRecord, MemoryLedger, TxContext, Version};
pub use measurement::{Dimensions, Measurement};
pub use policy::{PolicyTerms, TariffPolicy, UnitKind};
pub use records::ScanOutcome;
pub use store::{KeyValue, LedgerStore};
pub use tariff::TariffCalculationResult;
