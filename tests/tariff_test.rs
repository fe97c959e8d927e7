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

//! Tariff calculation integration tests.

use chrono::{DateTime, Duration};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use warehouse_tariff_ledger::{
    ContractError, Dimensions, ItemId, ManualClock, MemoryLedger, PolicyTerms, UnitKind,
    WarehouseContract,
};

fn make_contract() -> WarehouseContract<ManualClock> {
    let start = DateTime::from_timestamp(1_735_689_600, 0).unwrap();
    WarehouseContract::with_clock(ManualClock::new(start, Duration::seconds(1)))
}

fn setup(dims: Dimensions, policies: &[(&str, Decimal, UnitKind, bool)]) -> (WarehouseContract<ManualClock>, MemoryLedger) {
    let contract = make_contract();
    let ledger = MemoryLedger::new();
    ledger
        .execute(|tx| contract.record_measurement(tx, "item-1".into(), dims, "org1"))
        .unwrap();
    for (id, rate, unit, active) in policies {
        let terms = PolicyTerms::new(*id, *rate, unit.clone(), "standard");
        ledger
            .execute(|tx| contract.create_tariff_policy(tx, (*id).into(), terms.clone(), "admin"))
            .unwrap();
        if !active {
            ledger
                .execute(|tx| contract.update_tariff_policy(tx, &(*id).into(), terms, false))
                .unwrap();
        }
    }
    (contract, ledger)
}

#[test]
fn weight_and_volume_sum_to_98() {
    let (contract, ledger) = setup(
        Dimensions::new(2, 3, 4, 10),
        &[
            ("weight", dec!(5), UnitKind::Weight, true),
            ("volume", dec!(2), UnitKind::Volume, true),
            ("item-flat", dec!(1000), UnitKind::Item, false),
        ],
    );

    let result = contract
        .calculate_tariff(&ledger.begin(), &ItemId::from("item-1"), "org1")
        .unwrap();
    assert_eq!(result.total_tariff, dec!(98));
    assert_eq!(result.applied_policies.len(), 2);
    assert!(result.applied_policies.iter().all(|p| p.active));
}

#[test]
fn stored_numeric_rate_is_applied() {
    let (contract, ledger) = setup(Dimensions::new(2, 3, 4, 10), &[]);
    ledger
        .seed(
            "tariff_w",
            br#"{"id":"w","name":"W","description":"","rate":5,"unit":"weight","category":"c","active":true,"createdBy":"admin","createdAt":"2025-01-01T00:00:00Z"}"#.to_vec(),
        )
        .unwrap();

    let result = contract
        .calculate_tariff(&ledger.begin(), &ItemId::from("item-1"), "org1")
        .unwrap();
    assert_eq!(result.total_tariff, dec!(50));
    assert_eq!(result.applied_policies.len(), 1);
    assert_eq!(result.applied_policies[0].rate, dec!(5));
    assert_eq!(result.skipped, 0);
}

#[test]
fn unknown_units_are_ignored() {
    let (contract, ledger) = setup(
        Dimensions::new(1, 1, 1, 1),
        &[
            ("flat", dec!(3.50), UnitKind::Item, true),
            ("pallet", dec!(100), UnitKind::from("pallet"), true),
        ],
    );

    let result = contract
        .calculate_tariff(&ledger.begin(), &"item-1".into(), "org1")
        .unwrap();
    assert_eq!(result.total_tariff, dec!(3.50));
    let ids: Vec<_> = result.applied_policies.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["flat"]);
}

#[test]
fn organization_is_not_a_filter() {
    let (contract, ledger) = setup(
        Dimensions::new(1, 1, 1, 2),
        &[("weight", dec!(1.5), UnitKind::Weight, true)],
    );

    let tx = ledger.begin();
    let own = contract.calculate_tariff(&tx, &"item-1".into(), "org1").unwrap();
    let other = contract.calculate_tariff(&tx, &"item-1".into(), "org2").unwrap();
    assert_eq!(own.total_tariff, dec!(3.0));
    assert_eq!(own.total_tariff, other.total_tariff);
    assert_eq!(own.applied_policies, other.applied_policies);
}

#[test]
fn calculation_writes_nothing_and_is_fresh_each_time() {
    let (contract, ledger) = setup(
        Dimensions::new(1, 1, 1, 1),
        &[("flat", dec!(2), UnitKind::Item, true)],
    );
    let height = ledger.height();

    let first = ledger
        .execute(|tx| contract.calculate_tariff(tx, &"item-1".into(), "org1"))
        .unwrap();
    let second = ledger
        .execute(|tx| contract.calculate_tariff(tx, &"item-1".into(), "org1"))
        .unwrap();

    assert_eq!(ledger.height(), height);
    assert_eq!(first.total_tariff, second.total_tariff);
    assert!(second.calculated_at > first.calculated_at);
}

#[test]
fn policy_changes_are_picked_up() {
    let (contract, ledger) = setup(
        Dimensions::new(1, 1, 1, 4),
        &[("weight", dec!(1), UnitKind::Weight, true)],
    );
    ledger
        .execute(|tx| {
            contract.update_tariff_policy(
                tx,
                &"weight".into(),
                PolicyTerms::new("weight", dec!(2.5), UnitKind::Weight, "standard"),
                true,
            )
        })
        .unwrap();

    let result = contract
        .calculate_tariff(&ledger.begin(), &"item-1".into(), "org1")
        .unwrap();
    assert_eq!(result.total_tariff, dec!(10.0));
}

#[test]
fn huge_dimensions_overflow_instead_of_wrapping() {
    let (contract, ledger) = setup(
        Dimensions::new(i64::MAX, i64::MAX, 2, 0),
        &[("volume", dec!(1), UnitKind::Volume, true)],
    );

    let err = contract
        .calculate_tariff(&ledger.begin(), &"item-1".into(), "org1")
        .unwrap_err();
    assert_eq!(err, ContractError::Overflow { item: "item-1".into() });
}

#[test]
fn no_policies_gives_zero_total() {
    let (contract, ledger) = setup(Dimensions::new(5, 5, 5, 5), &[]);
    let result = contract
        .calculate_tariff(&ledger.begin(), &"item-1".into(), "org1")
        .unwrap();
    assert_eq!(result.total_tariff, Decimal::ZERO);
    assert!(result.applied_policies.is_empty());
}
