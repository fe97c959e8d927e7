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

//! Warehouse contract.
//!
//! The [`WarehouseContract`] is the central component every named operation
//! hangs off. It owns no ledger state: each operation takes the
//! [`LedgerStore`](crate::LedgerStore) of the current transaction, so the
//! outcome is a function of the arguments, the snapshot and the clock only.
//!
//! # Operations
//!
//! | Service | Operations |
//! |---------|------------|
//! | Measurements | `record_measurement`, `get_measurement` |
//! | Tariff policies | `create_tariff_policy`, `get_tariff_policy`, `update_tariff_policy`, `list_tariff_policies` |
//! | Tariff engine | `calculate_tariff` |
//! | Disputes | `create_dispute`, `get_dispute`, `update_dispute_status`, `get_all_disputes` |
//!
//! Each service lives in its own module; [`crate::invocation`] exposes the
//! same operations as JSON-in, JSON-out entry points.

use crate::clock::{Clock, SystemClock};
use crate::config::ContractConfig;
use chrono::{DateTime, Utc};

/// Stateless contract logic bound to a configuration and a clock.
///
/// # Invariants
///
/// - Every timestamp the contract writes comes from its clock.
/// - Tariff policies and disputes are only reachable through their namespaces.
/// - Nothing is cached between invocations.
#[derive(Debug)]
pub struct WarehouseContract<C = SystemClock> {
    config: ContractConfig,
    clock: C,
}

impl WarehouseContract<SystemClock> {
    /// Creates a contract with the default configuration and wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for WarehouseContract<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl WarehouseContract<Box<dyn Clock>> {
    /// Builds a contract whose clock is chosen by `config`.
    pub fn from_config(config: ContractConfig) -> Self {
        let clock = config.clock.build();
        Self::with_config(config, clock)
    }
}

impl<C: Clock> WarehouseContract<C> {
    pub fn with_clock(clock: C) -> Self {
        Self::with_config(ContractConfig::default(), clock)
    }

    pub fn with_config(config: ContractConfig, clock: C) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
