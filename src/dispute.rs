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

//! Dispute lifecycle.
//!
//! Disputes are raised against an item and driven through a status machine:
//!
//! ```text
//! open -> investigating -> resolved -> closed
//! ```
//!
//! Whether updates must follow that order is decided by
//! [`TransitionPolicy`]. Under the default
//! [`TransitionPolicy::Permissive`] any status may follow any other and
//! out-of-order moves are only logged; [`TransitionPolicy::ForwardOnly`]
//! rejects them.
//!
//! # Example
//!
//! ```
//! use warehouse_tariff_ledger::{DisputeStatus, DisputeType, MemoryLedger, WarehouseContract};
//!
//! let contract = WarehouseContract::new();
//! let ledger = MemoryLedger::new();
//!
//! ledger
//!     .execute(|tx| {
//!         contract.create_dispute(
//!             tx,
//!             "d1".into(),
//!             "item-1".into(),
//!             DisputeType::Measurement,
//!             "height looks wrong",
//!             "carrier",
//!         )
//!     })
//!     .unwrap();
//!
//! let open = contract
//!     .get_all_disputes(&ledger.begin(), Some(&DisputeStatus::Open))
//!     .unwrap();
//! assert_eq!(open.disputes.len(), 1);
//! ```

use crate::base::{DisputeId, EntityKind, ItemId, open_enum};
use crate::clock::Clock;
use crate::codec::Entity;
use crate::config::TransitionPolicy;
use crate::contract::WarehouseContract;
use crate::error::ContractError;
use crate::keys::{DISPUTES, Namespace};
use crate::records;
use crate::store::LedgerStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

open_enum!(
    /// What a dispute is about.
    DisputeType {
        Measurement => "measurement",
        Tariff => "tariff",
        Payment => "payment",
    }
);

open_enum!(
    /// Lifecycle state of a dispute.
    DisputeStatus {
        Open => "open",
        Investigating => "investigating",
        Resolved => "resolved",
        Closed => "closed",
    }
);

impl DisputeStatus {
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Open => Some(0),
            Self::Investigating => Some(1),
            Self::Resolved => Some(2),
            Self::Closed => Some(3),
            Self::Other(_) => None,
        }
    }

    /// True if `next` is this status or the one directly after it.
    ///
    /// Unknown statuses may only be rewritten to themselves.
    pub fn can_transition_to(&self, next: &DisputeStatus) -> bool {
        if self == next {
            return true;
        }
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to == from + 1,
            _ => false,
        }
    }

    /// True once the dispute is closed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Dispute {
    pub id: DisputeId,
    pub item_id: ItemId,
    pub dispute_type: DisputeType,
    pub description: String,
    pub status: DisputeStatus,
    pub raised_by: String,
    /// Empty until the dispute is triaged.
    pub assigned_to: String,
    /// Empty until the dispute is resolved.
    pub resolution: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every status update.
    pub updated_at: DateTime<Utc>,
}

impl Entity for Dispute {
    const KIND: EntityKind = EntityKind::Dispute;
    const NAMESPACE: Namespace = DISPUTES;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// Disputes returned by a bulk query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeList {
    /// Matching disputes in ledger key order.
    pub disputes: Vec<Dispute>,
    /// Dispute entries that failed to decode.
    pub skipped: usize,
}

impl<C: Clock> WarehouseContract<C> {
    /// Raises a dispute with status `open`.
    ///
    /// There is no existence check: reusing an id replaces the earlier
    /// dispute.
    #[instrument(skip_all, fields(dispute = %id, item = %item_id))]
    pub fn create_dispute<S: LedgerStore + ?Sized>(
        &self,
        store: &mut S,
        id: DisputeId,
        item_id: ItemId,
        dispute_type: DisputeType,
        description: impl Into<String>,
        raised_by: impl Into<String>,
    ) -> Result<Dispute, ContractError> {
        let now = self.now();
        let dispute = Dispute {
            id,
            item_id,
            dispute_type,
            description: description.into(),
            status: DisputeStatus::Open,
            raised_by: raised_by.into(),
            assigned_to: String::new(),
            resolution: String::new(),
            created_at: now,
            updated_at: now,
        };
        records::write(store, &dispute)?;
        Ok(dispute)
    }

    /// # Errors
    ///
    /// - [`ContractError::NotFound`] - No dispute with `id`.
    pub fn get_dispute<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        id: &DisputeId,
    ) -> Result<Dispute, ContractError> {
        records::read(store, id.as_str())
    }

    pub fn get_dispute_raw<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        id: &DisputeId,
    ) -> Result<Vec<u8>, ContractError> {
        records::read_raw::<Dispute, S>(store, id.as_str())
    }

    /// Moves a dispute to `status`, replacing its resolution and assignee.
    ///
    /// # Errors
    ///
    /// - [`ContractError::NotFound`] - No dispute with `id`.
    /// - [`ContractError::InvalidTransition`] - The move is out of order and
    ///   the contract is configured with [`TransitionPolicy::ForwardOnly`].
    #[instrument(skip_all, fields(dispute = %id, status = %status))]
    pub fn update_dispute_status<S: LedgerStore + ?Sized>(
        &self,
        store: &mut S,
        id: &DisputeId,
        status: DisputeStatus,
        resolution: impl Into<String>,
        assigned_to: impl Into<String>,
    ) -> Result<Dispute, ContractError> {
        let mut dispute: Dispute = records::read(store, id.as_str())?;

        if !dispute.status.can_transition_to(&status) {
            match self.config().disputes.transitions {
                TransitionPolicy::Permissive => {
                    warn!(from = %dispute.status, to = %status, "out-of-order dispute transition");
                }
                TransitionPolicy::ForwardOnly => {
                    return Err(ContractError::InvalidTransition {
                        from: dispute.status.to_string(),
                        to: status.to_string(),
                    });
                }
            }
        }

        dispute.status = status;
        dispute.resolution = resolution.into();
        dispute.assigned_to = assigned_to.into();
        dispute.updated_at = self.now();

        records::write(store, &dispute)?;
        Ok(dispute)
    }

    /// Every decodable dispute, optionally restricted to one status.
    pub fn get_all_disputes<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        status: Option<&DisputeStatus>,
    ) -> Result<DisputeList, ContractError> {
        let mut disputes = Vec::new();
        let skipped = records::for_each_decoded::<Dispute, S, _>(store, |dispute| {
            if status.is_none_or(|wanted| dispute.status == *wanted) {
                disputes.push(dispute);
            }
            Ok(())
        })?;
        debug!(matched = disputes.len(), skipped, "disputes listed");
        Ok(DisputeList { disputes, skipped })
    }
}
