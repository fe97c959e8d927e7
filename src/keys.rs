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

//! Key namespaces.
//!
//! The ledger is one flat, lexicographically ordered key space. Each entity
//! kind owns a prefix; both the storage key and the scan bounds of a kind are
//! derived from the same [`Namespace`], so the half-open range
//! `[prefix, successor(prefix))` enumerates exactly that kind.
//!
//! ```
//! use warehouse_tariff_ledger::keys::DISPUTES;
//!
//! assert_eq!(DISPUTES.key("d1"), "dispute_d1");
//! assert_eq!(DISPUTES.range(), ("dispute_".to_string(), "dispute`".to_string()));
//! ```

/// A key prefix reserved for one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    prefix: &'static str,
}

/// Measurements are keyed by the raw item id.
pub const MEASUREMENTS: Namespace = Namespace::new("");

pub const TARIFF_POLICIES: Namespace = Namespace::new("tariff_");

pub const DISPUTES: Namespace = Namespace::new("dispute_");

/// Prefixes owned by a kind other than measurements.
pub const RESERVED: [Namespace; 2] = [TARIFF_POLICIES, DISPUTES];

/// The reserved namespace a raw id would fall into, if any.
///
/// A measurement stored under such an id would share a key with a policy or
/// dispute record.
pub fn reserved_namespace(id: &str) -> Option<Namespace> {
    RESERVED.into_iter().find(|ns| ns.strip(id).is_some())
}

impl Namespace {
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Ledger key for `id` in this namespace.
    pub fn key(&self, id: &str) -> String {
        let mut key = String::with_capacity(self.prefix.len() + id.len());
        key.push_str(self.prefix);
        key.push_str(id);
        key
    }

    /// Recovers the id from a key of this namespace.
    pub fn strip<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.prefix)
    }

    /// Half-open scan bounds covering every key of this namespace.
    ///
    /// An empty end bound means "to the end of the key space".
    pub fn range(&self) -> (String, String) {
        let end = prefix_successor(self.prefix).unwrap_or_default();
        (self.prefix.to_owned(), end)
    }
}

/// Smallest string greater than every string starting with `prefix`.
///
/// `None` when no such string exists (empty prefix, or a prefix made only of
/// `char::MAX`).
pub fn prefix_successor(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        if let Some(next) = next_char(last) {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}

fn next_char(c: char) -> Option<char> {
    match c {
        char::MAX => None,
        '\u{D7FF}' => Some('\u{E000}'),
        _ => char::from_u32(c as u32 + 1),
    }
}
