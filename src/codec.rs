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

//! Entity codec.
//!
//! Entities are stored as JSON objects with camelCase field names. Decoding is
//! strict: every field is required and unknown fields are rejected, so a value
//! of one kind never parses as another kind sharing the key space.

use crate::base::EntityKind;
use crate::error::ContractError;
use crate::keys::Namespace;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A record type the contract persists in the ledger.
pub trait Entity: Serialize + DeserializeOwned {
    const KIND: EntityKind;
    const NAMESPACE: Namespace;

    /// Caller-supplied identifier, without namespace prefix.
    fn id(&self) -> &str;

    /// Ledger key the entity is stored under.
    fn key(&self) -> String {
        Self::NAMESPACE.key(self.id())
    }
}

pub fn encode<E: Entity>(entity: &E) -> Result<Vec<u8>, ContractError> {
    encode_payload(E::KIND, entity)
}

pub fn decode<E: Entity>(key: &str, bytes: &[u8]) -> Result<E, ContractError> {
    serde_json::from_slice(bytes).map_err(|e| ContractError::Decode {
        kind: E::KIND,
        key: key.to_owned(),
        reason: e.to_string(),
    })
}

/// Serializes any response value that is built from entities of `kind`.
pub fn encode_payload<T: Serialize + ?Sized>(
    kind: EntityKind,
    value: &T,
) -> Result<Vec<u8>, ContractError> {
    serde_json::to_vec(value).map_err(|e| ContractError::Encode {
        kind,
        reason: e.to_string(),
    })
}
