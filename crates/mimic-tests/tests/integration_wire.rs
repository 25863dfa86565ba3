// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Wire codec round-trip and malformed-payload coverage across both formats.

use mimic_core::operation::{Operation, OperationResult};
use mimic_core::types::DataSet;
use mimic_tests::prelude::*;
use mimic_wire::{
    decode_operation, decode_operation_result, encode_operation, encode_operation_result,
    WireError, WireFormat,
};
use serde_json::json;

fn every_operation() -> Vec<Operation> {
    vec![
        Operation::open_connection(properties(&[("username", "tester"), ("database", "testdb")])),
        Operation::open_connection(vec![]),
        Operation::CloseConnection {},
        Operation::CreateStatement {},
        Operation::create_prepared_statement("INSERT INTO t VALUES (?, ?)"),
        Operation::CloseStatement {},
        Operation::execute("SELECT * FROM t WHERE note = 'a & b < c'"),
        Operation::TransactionStarted {},
        Operation::TransactionCommitted {},
        Operation::TransactionRollback {},
    ]
}

fn every_result() -> Vec<OperationResult> {
    vec![
        OperationResult::success(),
        OperationResult::success().with_affected_rows(5),
        OperationResult::success().with_data_set(dataset(vec![
            row(&[("id", json!(1)), ("name", json!("alice")), ("active", json!(true))]),
            row(&[("id", json!(2)), ("score", json!(9.5)), ("note", json!(null))]),
        ])),
        OperationResult::success()
            .with_affected_rows(0)
            .with_data_set(DataSet::empty()),
        OperationResult::failure("deadlock detected"),
    ]
}

#[test]
fn every_variant_round_trips_in_both_formats() {
    for format in [WireFormat::Json, WireFormat::Xml] {
        for op in every_operation() {
            let text = encode_operation(&op, format).unwrap();
            assert_eq!(
                decode_operation(&text, format).unwrap(),
                op,
                "{} payload: {text}",
                format.as_str()
            );
        }
        for result in every_result() {
            let text = encode_operation_result(&result, format).unwrap();
            assert_eq!(
                decode_operation_result(&text, format).unwrap(),
                result,
                "{} payload: {text}",
                format.as_str()
            );
        }
    }
}

#[test]
fn json_wire_shapes_match_the_documented_examples() {
    let op: Operation =
        decode_operation(r#"{"openConnection":{"properties":[]}}"#, WireFormat::Json).unwrap();
    assert_eq!(op, Operation::open_connection(vec![]));

    let result =
        decode_operation_result(r#"{"success":true,"affectedRows":5}"#, WireFormat::Json)
            .unwrap();
    assert!(result.success);
    assert_eq!(result.affected_rows, Some(5));
}

#[test]
fn xml_wire_shapes_match_the_documented_examples() {
    let op = decode_operation(
        "<operation><open-connection/></operation>",
        WireFormat::Xml,
    )
    .unwrap();
    assert_eq!(op, Operation::open_connection(vec![]));

    let result = decode_operation_result(
        r#"<operation-result affected-rows="5"><success>true</success></operation-result>"#,
        WireFormat::Xml,
    )
    .unwrap();
    assert!(result.success);
    assert_eq!(result.affected_rows, Some(5));
}

#[test]
fn malformed_payloads_are_rejected_in_both_formats() {
    let cases: Vec<(&str, WireFormat)> = vec![
        // unknown discriminator
        (r#"{"dropTable":{}}"#, WireFormat::Json),
        ("<operation><drop-table/></operation>", WireFormat::Xml),
        // zero discriminators
        ("{}", WireFormat::Json),
        ("<operation></operation>", WireFormat::Xml),
        // multiple discriminators
        (
            r#"{"closeConnection":{},"createStatement":{}}"#,
            WireFormat::Json,
        ),
        (
            "<operation><close-connection/><create-statement/></operation>",
            WireFormat::Xml,
        ),
        // missing required field
        (r#"{"execute":{}}"#, WireFormat::Json),
        ("<operation><execute/></operation>", WireFormat::Xml),
        // not even the right document
        ("garbage", WireFormat::Json),
        ("<operation-result/>", WireFormat::Xml),
    ];
    for (payload, format) in cases {
        let err = decode_operation(payload, format).unwrap_err();
        assert!(
            matches!(err, WireError::Malformed { .. }),
            "expected malformed for {payload}"
        );
    }
}

#[test]
fn dataset_with_value_less_columns_survives_xml() {
    // A declared column no row populates must survive the round trip.
    let ds = DataSet::new(
        vec!["id".into(), "reserved".into()],
        vec![row(&[("id", json!("7"))])],
    )
    .unwrap();
    let result = OperationResult::success().with_data_set(ds.clone());
    let text = encode_operation_result(&result, WireFormat::Xml).unwrap();
    let back = decode_operation_result(&text, WireFormat::Xml).unwrap();
    assert_eq!(back.data_set.unwrap().columns(), ds.columns());
}

#[test]
fn cross_format_decoding_fails_cleanly() {
    let op = Operation::execute("SELECT 1");
    let as_json = encode_operation(&op, WireFormat::Json).unwrap();
    let as_xml = encode_operation(&op, WireFormat::Xml).unwrap();
    assert!(decode_operation(&as_json, WireFormat::Xml).is_err());
    assert!(decode_operation(&as_xml, WireFormat::Json).is_err());
}
