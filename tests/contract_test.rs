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

//! Contract public API integration tests: measurements, tariff policies and
//! the invocation surface.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use warehouse_tariff_ledger::{
    ContractError, Dimensions, DisputeType, EntityKind, Invocation, ItemId, LedgerStore, ManualClock,
    MemoryLedger, PolicyId, PolicyTerms, TariffPolicy, UnitKind, WarehouseContract,
};

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_735_689_600, 0).unwrap()
}

fn make_contract() -> WarehouseContract<ManualClock> {
    WarehouseContract::with_clock(ManualClock::new(start(), Duration::seconds(1)))
}

fn make_terms(name: &str, rate: Decimal, unit: UnitKind) -> PolicyTerms {
    PolicyTerms::new(name, rate, unit, "standard").with_description(format!("{name} pricing"))
}

fn create_policy(
    contract: &WarehouseContract<ManualClock>,
    ledger: &MemoryLedger,
    id: &str,
    terms: PolicyTerms,
) -> Result<TariffPolicy, ContractError> {
    ledger.execute(|tx| contract.create_tariff_policy(tx, PolicyId::from(id), terms, "admin"))
}

// === Measurements ===

#[test]
fn measurement_round_trips_with_server_timestamp() {
    let contract = make_contract();
    let ledger = MemoryLedger::new();
    contract.clock().advance(Duration::hours(3));

    ledger
        .execute(|tx| {
            contract.record_measurement(tx, "item-1".into(), Dimensions::new(12, 8, 5, 40), "org1")
        })
        .unwrap();

    let stored = contract
        .get_measurement(&ledger.begin(), &ItemId::from("item-1"))
        .unwrap();
    assert_eq!(stored.dimensions(), Dimensions::new(12, 8, 5, 40));
    assert_eq!(stored.organization_id, "org1");
    assert_eq!(stored.timestamp, start() + Duration::hours(3));
}

#[test]
fn recording_twice_overwrites() {
    let contract = make_contract();
    let ledger = MemoryLedger::new();
    for weight in [1, 2] {
        ledger
            .execute(|tx| {
                contract.record_measurement(tx, "item-1".into(), Dimensions::new(1, 1, 1, weight), "org1")
            })
            .unwrap();
    }

    let stored = contract
        .get_measurement(&ledger.begin(), &ItemId::from("item-1"))
        .unwrap();
    assert_eq!(stored.weight, 2);
    assert_eq!(ledger.len(), 1);
}

#[test]
fn repeated_reads_are_byte_identical() {
    let contract = make_contract();
    let ledger = MemoryLedger::new();
    ledger
        .execute(|tx| {
            contract.record_measurement(tx, "item-1".into(), Dimensions::new(1, 2, 3, 4), "org1")
        })
        .unwrap();
    create_policy(&contract, &ledger, "p1", make_terms("P1", dec!(1.25), UnitKind::Item)).unwrap();

    let first = ledger.begin();
    let second = ledger.begin();
    assert_eq!(
        contract.get_measurement_raw(&first, &"item-1".into()).unwrap(),
        contract.get_measurement_raw(&second, &"item-1".into()).unwrap()
    );
    assert_eq!(
        contract.get_tariff_policy_raw(&first, &"p1".into()).unwrap(),
        contract.get_tariff_policy_raw(&second, &"p1".into()).unwrap()
    );
}

// === Tariff policies ===

#[test]
fn policy_round_trips_every_field() {
    let contract = make_contract();
    let ledger = MemoryLedger::new();
    let created =
        create_policy(&contract, &ledger, "p1", make_terms("Weight", dec!(0.75), UnitKind::Weight))
            .unwrap();

    let stored = contract
        .get_tariff_policy(&ledger.begin(), &PolicyId::from("p1"))
        .unwrap();
    assert_eq!(stored, created);
    assert!(stored.active);
    assert_eq!(stored.rate, dec!(0.75));
    assert_eq!(stored.description, "Weight pricing");
    assert_eq!(stored.created_by, "admin");
    assert_eq!(stored.created_at, start());
}

#[test]
fn duplicate_policy_is_rejected_and_original_kept() {
    let contract = make_contract();
    let ledger = MemoryLedger::new();
    create_policy(&contract, &ledger, "p1", make_terms("First", dec!(1), UnitKind::Item)).unwrap();

    let result = create_policy(&contract, &ledger, "p1", make_terms("Second", dec!(2), UnitKind::Item));
    assert!(matches!(
        result,
        Err(ContractError::AlreadyExists { kind: EntityKind::TariffPolicy, .. })
    ));

    let stored = contract.get_tariff_policy(&ledger.begin(), &"p1".into()).unwrap();
    assert_eq!(stored.name, "First");
}

#[test]
fn policy_and_measurement_ids_do_not_collide() {
    let contract = make_contract();
    let ledger = MemoryLedger::new();
    ledger
        .execute(|tx| {
            contract.record_measurement(tx, "shared".into(), Dimensions::new(1, 1, 1, 1), "org1")
        })
        .unwrap();
    create_policy(&contract, &ledger, "shared", make_terms("S", dec!(1), UnitKind::Item)).unwrap();

    let tx = ledger.begin();
    assert!(contract.get_measurement(&tx, &"shared".into()).is_ok());
    assert!(contract.get_tariff_policy(&tx, &"shared".into()).is_ok());
    assert!(tx.contains("tariff_shared").unwrap());
}

#[test]
fn measurements_cannot_overwrite_policies_or_disputes() {
    let contract = make_contract();
    let ledger = MemoryLedger::new();
    create_policy(&contract, &ledger, "w", make_terms("W", dec!(5), UnitKind::Weight)).unwrap();
    ledger
        .execute(|tx| {
            contract.create_dispute(tx, "x".into(), "item".into(), DisputeType::Payment, "d", "c")
        })
        .unwrap();
    let height = ledger.height();

    for id in ["tariff_w", "dispute_x"] {
        let result = ledger.execute(|tx| {
            contract.record_measurement(tx, id.into(), Dimensions::new(1, 1, 1, 1), "org1")
        });
        assert!(matches!(result, Err(ContractError::InvalidArgument(_))), "{id}: {result:?}");
    }

    assert_eq!(ledger.height(), height);
    let tx = ledger.begin();
    assert_eq!(contract.get_tariff_policy(&tx, &"w".into()).unwrap().rate, dec!(5));
    assert!(contract.get_dispute(&tx, &"x".into()).is_ok());
}

#[test]
fn update_requires_existing_policy() {
    let contract = make_contract();
    let ledger = MemoryLedger::new();
    let result = ledger.execute(|tx| {
        contract.update_tariff_policy(tx, &"ghost".into(), make_terms("G", dec!(1), UnitKind::Item), true)
    });
    assert_eq!(
        result.unwrap_err().to_string(),
        "tariff policy ghost does not exist"
    );
}

#[test]
fn update_overwrites_all_mutable_fields() {
    let contract = make_contract();
    let ledger = MemoryLedger::new();
    create_policy(&contract, &ledger, "p1", make_terms("Weight", dec!(5), UnitKind::Weight)).unwrap();

    ledger
        .execute(|tx| {
            contract.update_tariff_policy(
                tx,
                &"p1".into(),
                PolicyTerms::new("Flat", dec!(9.99), UnitKind::Item, "express"),
                false,
            )
        })
        .unwrap();

    let stored = contract.get_tariff_policy(&ledger.begin(), &"p1".into()).unwrap();
    assert_eq!(stored.name, "Flat");
    assert_eq!(stored.description, "");
    assert_eq!(stored.rate, dec!(9.99));
    assert_eq!(stored.unit, UnitKind::Item);
    assert_eq!(stored.category, "express");
    assert!(!stored.active);
    assert_eq!(stored.created_at, start());
}

#[test]
fn exists_helpers() {
    let contract = make_contract();
    let ledger = MemoryLedger::new();
    create_policy(&contract, &ledger, "p1", make_terms("P", dec!(1), UnitKind::Item)).unwrap();

    let tx = ledger.begin();
    assert!(contract.tariff_policy_exists(&tx, &"p1".into()).unwrap());
    assert!(!contract.tariff_policy_exists(&tx, &"p2".into()).unwrap());
    assert!(!contract.measurement_exists(&tx, &"p1".into()).unwrap());
}

// === Invocations ===

fn invoke(
    contract: &WarehouseContract<ManualClock>,
    ledger: &MemoryLedger,
    json: &str,
) -> Result<serde_json::Value, ContractError> {
    let invocation: Invocation = serde_json::from_str(json).unwrap();
    let payload = ledger.execute(|tx| contract.invoke(tx, invocation))?;
    Ok(serde_json::from_slice(&payload).unwrap())
}

#[test]
fn invocations_drive_full_flow() {
    let contract = make_contract();
    let ledger = MemoryLedger::new();

    invoke(&contract, &ledger, r#"{"operation":"recordMeasurement","id":"item-1","length":2,"width":3,"height":4,"weight":10,"organizationId":"org1"}"#).unwrap();
    invoke(&contract, &ledger, r#"{"operation":"createTariffPolicy","id":"w","name":"W","rate":"5","unit":"weight","category":"std","createdBy":"admin"}"#).unwrap();
    invoke(&contract, &ledger, r#"{"operation":"createTariffPolicy","id":"v","name":"V","rate":"2","unit":"volume","category":"std","createdBy":"admin"}"#).unwrap();

    let result = invoke(&contract, &ledger, r#"{"operation":"calculateTariff","itemId":"item-1","organizationId":"org1"}"#).unwrap();
    assert_eq!(result["itemId"], "item-1");
    assert_eq!(result["totalTariff"], "98");
    assert_eq!(result["appliedPolicies"].as_array().unwrap().len(), 2);

    invoke(&contract, &ledger, r#"{"operation":"createDispute","id":"d1","itemId":"item-1","disputeType":"tariff","description":"too high","raisedBy":"customer"}"#).unwrap();
    let updated = invoke(&contract, &ledger, r#"{"operation":"updateDisputeStatus","id":"d1","status":"investigating","assignedTo":"agent"}"#).unwrap();
    assert_eq!(updated["status"], "investigating");
    assert_eq!(updated["assignedTo"], "agent");

    let open = invoke(&contract, &ledger, r#"{"operation":"getAllDisputes","status":"open"}"#).unwrap();
    assert_eq!(open, serde_json::json!([]));
    let all = invoke(&contract, &ledger, r#"{"operation":"getAllDisputes","status":""}"#).unwrap();
    assert_eq!(all[0]["id"], "d1");
}

#[test]
fn invocation_validation_mirrors_required_fields() {
    let contract = make_contract();
    let ledger = MemoryLedger::new();

    let err = invoke(&contract, &ledger, r#"{"operation":"createTariffPolicy","id":"p","name":"","rate":"1","unit":"item","category":"c"}"#).unwrap_err();
    assert_eq!(err, ContractError::InvalidArgument("name is required".into()));

    let err = invoke(&contract, &ledger, r#"{"operation":"calculateTariff","itemId":""}"#).unwrap_err();
    assert_eq!(err, ContractError::InvalidArgument("itemId is required".into()));

    assert!(ledger.is_empty());
}
