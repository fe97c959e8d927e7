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

//! Named-operation entry points.
//!
//! An [`Invocation`] is one call of a contract method with primitive
//! arguments, as it arrives from the surrounding runtime. It deserializes
//! from JSON tagged by `operation`:
//!
//! ```json
//! {"operation":"calculateTariff","itemId":"item-1","organizationId":"org1"}
//! ```
//!
//! [`WarehouseContract::invoke`] validates the request, runs it and returns
//! a JSON payload. Single-entity reads return the stored bytes verbatim,
//! writes return the written entity and bulk reads return a JSON array.
//! Rates are accepted as JSON numbers or decimal strings (`"rate":2.5` or
//! `"rate":"2.5"`).

use crate::base::{DisputeId, EntityKind, ItemId, PolicyId};
use crate::clock::Clock;
use crate::codec::{self, encode};
use crate::contract::WarehouseContract;
use crate::dispute::{DisputeStatus, DisputeType};
use crate::error::ContractError;
use crate::measurement::{Dimensions, check_measurement_id};
use crate::policy::{PolicyTerms, UnitKind};
use crate::store::LedgerStore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Invocation {
    RecordMeasurement {
        id: ItemId,
        length: i64,
        width: i64,
        height: i64,
        weight: i64,
        #[serde(default)]
        organization_id: String,
    },
    GetMeasurement {
        id: ItemId,
    },
    MeasurementExists {
        id: ItemId,
    },
    CreateTariffPolicy {
        id: PolicyId,
        name: String,
        #[serde(default)]
        description: String,
        rate: Decimal,
        unit: UnitKind,
        category: String,
        #[serde(default)]
        created_by: String,
    },
    GetTariffPolicy {
        id: PolicyId,
    },
    UpdateTariffPolicy {
        id: PolicyId,
        name: String,
        #[serde(default)]
        description: String,
        rate: Decimal,
        unit: UnitKind,
        category: String,
        active: bool,
    },
    TariffPolicyExists {
        id: PolicyId,
    },
    ListTariffPolicies,
    CalculateTariff {
        item_id: ItemId,
        #[serde(default)]
        organization_id: String,
    },
    CreateDispute {
        id: DisputeId,
        item_id: ItemId,
        dispute_type: DisputeType,
        description: String,
        raised_by: String,
    },
    GetDispute {
        id: DisputeId,
    },
    UpdateDisputeStatus {
        id: DisputeId,
        status: DisputeStatus,
        #[serde(default)]
        resolution: String,
        #[serde(default)]
        assigned_to: String,
    },
    GetAllDisputes {
        /// Empty means no filter.
        #[serde(default)]
        status: String,
    },
}

impl Invocation {
    /// Operation name as it appears in the `operation` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RecordMeasurement { .. } => "recordMeasurement",
            Self::GetMeasurement { .. } => "getMeasurement",
            Self::MeasurementExists { .. } => "measurementExists",
            Self::CreateTariffPolicy { .. } => "createTariffPolicy",
            Self::GetTariffPolicy { .. } => "getTariffPolicy",
            Self::UpdateTariffPolicy { .. } => "updateTariffPolicy",
            Self::TariffPolicyExists { .. } => "tariffPolicyExists",
            Self::ListTariffPolicies => "listTariffPolicies",
            Self::CalculateTariff { .. } => "calculateTariff",
            Self::CreateDispute { .. } => "createDispute",
            Self::GetDispute { .. } => "getDispute",
            Self::UpdateDisputeStatus { .. } => "updateDisputeStatus",
            Self::GetAllDisputes { .. } => "getAllDisputes",
        }
    }

    /// True if the operation never writes to the ledger.
    pub fn is_read_only(&self) -> bool {
        !matches!(
            self,
            Self::RecordMeasurement { .. }
                | Self::CreateTariffPolicy { .. }
                | Self::UpdateTariffPolicy { .. }
                | Self::CreateDispute { .. }
                | Self::UpdateDisputeStatus { .. }
        )
    }

    /// Rejects requests with empty required fields.
    ///
    /// # Errors
    ///
    /// - [`ContractError::InvalidArgument`] - Naming the first missing field,
    ///   or a measurement id inside a reserved key prefix.
    pub fn validate(&self) -> Result<(), ContractError> {
        match self {
            Self::RecordMeasurement { id, .. } => {
                require("id", id.as_str())?;
                check_measurement_id(id.as_str())
            }
            Self::GetMeasurement { id } | Self::MeasurementExists { id } => {
                require("id", id.as_str())
            }
            Self::GetTariffPolicy { id } | Self::TariffPolicyExists { id } => {
                require("id", id.as_str())
            }
            Self::CreateTariffPolicy {
                id,
                name,
                unit,
                category,
                ..
            }
            | Self::UpdateTariffPolicy {
                id,
                name,
                unit,
                category,
                ..
            } => {
                require("id", id.as_str())?;
                require("name", name)?;
                require("unit", unit.as_str())?;
                require("category", category)
            }
            Self::CalculateTariff { item_id, .. } => require("itemId", item_id.as_str()),
            Self::CreateDispute {
                id,
                item_id,
                dispute_type,
                description,
                raised_by,
            } => {
                require("id", id.as_str())?;
                require("itemId", item_id.as_str())?;
                require("disputeType", dispute_type.as_str())?;
                require("description", description)?;
                require("raisedBy", raised_by)
            }
            Self::GetDispute { id } => require("id", id.as_str()),
            Self::UpdateDisputeStatus { id, status, .. } => {
                require("id", id.as_str())?;
                require("status", status.as_str())
            }
            Self::ListTariffPolicies | Self::GetAllDisputes { .. } => Ok(()),
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), ContractError> {
    if value.is_empty() {
        return Err(ContractError::InvalidArgument(format!("{field} is required")));
    }
    Ok(())
}

impl<C: Clock> WarehouseContract<C> {
    /// Validates and runs one invocation, returning its JSON payload.
    ///
    /// # Errors
    ///
    /// - [`ContractError::InvalidArgument`] - A required field is empty.
    /// - Otherwise whatever the underlying operation returns.
    #[instrument(skip_all, fields(operation = invocation.name()))]
    pub fn invoke<S: LedgerStore + ?Sized>(
        &self,
        store: &mut S,
        invocation: Invocation,
    ) -> Result<Vec<u8>, ContractError> {
        invocation.validate()?;

        match invocation {
            Invocation::RecordMeasurement {
                id,
                length,
                width,
                height,
                weight,
                organization_id,
            } => {
                let dimensions = Dimensions::new(length, width, height, weight);
                encode(&self.record_measurement(store, id, dimensions, organization_id)?)
            }
            Invocation::GetMeasurement { id } => self.get_measurement_raw(store, &id),
            Invocation::MeasurementExists { id } => codec::encode_payload(
                EntityKind::Measurement,
                &self.measurement_exists(store, &id)?,
            ),
            Invocation::CreateTariffPolicy {
                id,
                name,
                description,
                rate,
                unit,
                category,
                created_by,
            } => {
                let terms = PolicyTerms::new(name, rate, unit, category).with_description(description);
                encode(&self.create_tariff_policy(store, id, terms, created_by)?)
            }
            Invocation::GetTariffPolicy { id } => self.get_tariff_policy_raw(store, &id),
            Invocation::UpdateTariffPolicy {
                id,
                name,
                description,
                rate,
                unit,
                category,
                active,
            } => {
                let terms = PolicyTerms::new(name, rate, unit, category).with_description(description);
                encode(&self.update_tariff_policy(store, &id, terms, active)?)
            }
            Invocation::TariffPolicyExists { id } => codec::encode_payload(
                EntityKind::TariffPolicy,
                &self.tariff_policy_exists(store, &id)?,
            ),
            Invocation::ListTariffPolicies => codec::encode_payload(
                EntityKind::TariffPolicy,
                &self.list_tariff_policies(store)?.records,
            ),
            Invocation::CalculateTariff {
                item_id,
                organization_id,
            } => codec::encode_payload(
                EntityKind::TariffPolicy,
                &self.calculate_tariff(store, &item_id, &organization_id)?,
            ),
            Invocation::CreateDispute {
                id,
                item_id,
                dispute_type,
                description,
                raised_by,
            } => encode(&self.create_dispute(
                store,
                id,
                item_id,
                dispute_type,
                description,
                raised_by,
            )?),
            Invocation::GetDispute { id } => self.get_dispute_raw(store, &id),
            Invocation::UpdateDisputeStatus {
                id,
                status,
                resolution,
                assigned_to,
            } => encode(&self.update_dispute_status(store, &id, status, resolution, assigned_to)?),
            Invocation::GetAllDisputes { status } => {
                let filter = (!status.is_empty()).then(|| DisputeStatus::from(status));
                codec::encode_payload(
                    EntityKind::Dispute,
                    &self.get_all_disputes(store, filter.as_ref())?.disputes,
                )
            }
        }
    }
}
