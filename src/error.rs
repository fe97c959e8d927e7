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

//! Error types for ledger access and contract operations.

use crate::base::EntityKind;
use thiserror::Error;

/// Failures of the underlying key-value ledger.
///
/// Always propagated to the caller as-is; the contract never retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store rejected or failed the request
    #[error("ledger backend failure: {0}")]
    Backend(String),

    /// A key read by the transaction was changed by a concurrent commit
    #[error("read conflict on key {key:?}")]
    Conflict { key: String },

    /// Keys must be non-empty
    #[error("ledger keys must not be empty")]
    EmptyKey,

    /// Range scan bounds are inverted
    #[error("invalid scan range {start:?}..{end:?}")]
    InvalidRange { start: String, end: String },
}

/// Contract operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Entity absent at its expected key
    #[error("{kind} {id} does not exist")]
    NotFound { kind: EntityKind, id: String },

    /// Creation on an occupied key
    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: EntityKind, id: String },

    /// Stored bytes do not parse as the expected schema
    #[error("failed to decode {kind} at key {key:?}: {reason}")]
    Decode {
        kind: EntityKind,
        key: String,
        reason: String,
    },

    /// Entity could not be serialized
    #[error("failed to encode {kind}: {reason}")]
    Encode { kind: EntityKind, reason: String },

    /// Ledger get/put/scan failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Status change rejected by the configured transition rules
    #[error("dispute cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Charge arithmetic exceeded the representable range
    #[error("tariff arithmetic overflow for item {item}")]
    Overflow { item: String },

    /// Request rejected before touching the ledger
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ContractError {
    pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn already_exists(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            id: id.into(),
        }
    }

    /// True for [`ContractError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
