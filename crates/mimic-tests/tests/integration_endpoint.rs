// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! End-to-end endpoint tests: a driver session on one side, a scripted
//! responder on the other, with the real gateway and codec in between.

use std::time::{Duration, Instant};

use mimic_tests::prelude::*;
use mimic_wire::WireFormat;

#[tokio::test]
async fn fully_scripted_session_round_trip() {
    init_test_logging();
    let config = ConfigBuilder::new().fully_scripted().build();
    let mut harness = EndpointHarness::new(config);

    harness.spawn_script(|request| {
        if request.payload.contains("\"execute\"") {
            Some(r#"{"success":true,"dataSet":{"columns":["id","name"],"rows":[{"id":1,"name":"alice"}]}}"#.to_string())
        } else {
            Some(r#"{"success":true}"#.to_string())
        }
    });
    let endpoint = harness.endpoint;

    let (result, connection) = endpoint
        .open_connection(properties(&[("username", "tester")]))
        .await;
    assert!(result.success, "open failed: {:?}", result.exception);
    let connection = connection.unwrap();

    let (result, statement) = endpoint.create_statement(&connection).await;
    assert!(result.success);
    assert!(statement.is_some());

    let result = endpoint.execute(&connection, "SELECT id, name FROM users").await;
    assert!(result.success);
    let ds = result.data_set.unwrap();
    assert_eq!(ds.columns(), ["id", "name"]);
    assert_eq!(ds.get(0, "name"), Some(&serde_json::json!("alice")));

    assert!(endpoint.close_statement(&connection).await.success);
    assert!(endpoint.close_connection(&connection).await.success);
    assert_eq!(endpoint.registry().open_connections(), 0);
    assert_eq!(endpoint.stats().forwarded, 5);
}

#[tokio::test]
async fn silent_script_times_out_with_labeled_failure() {
    init_test_logging();
    let config = ConfigBuilder::new()
        .fully_scripted()
        .timeout_ms(150)
        .polling_interval_ms(25)
        .build();
    let mut harness = EndpointHarness::new(config);
    // Keep the channel alive but never answer.
    let _script = harness.take_script();

    let started = Instant::now();
    let (result, connection) = harness.endpoint.open_connection(vec![]).await;
    let elapsed = started.elapsed();

    assert!(!result.success);
    assert!(result
        .exception
        .unwrap()
        .starts_with("timeout waiting for test response"));
    assert!(connection.is_none());
    assert!(elapsed >= Duration::from_millis(150));
    assert!(elapsed < Duration::from_secs(2), "hung past the timeout");
    // The attempted transition was not applied.
    assert_eq!(harness.endpoint.registry().open_connections(), 0);
}

#[tokio::test]
async fn late_reply_is_dropped_after_the_caller_is_released() {
    init_test_logging();
    let config = ConfigBuilder::new()
        .fully_scripted()
        .timeout_ms(100)
        .polling_interval_ms(25)
        .build();
    let mut harness = EndpointHarness::new(config);
    let mut script = harness.take_script();

    let (result, _) = harness.endpoint.open_connection(vec![]).await;
    assert!(!result.success);

    // The request is still in the channel; answering now finds no waiter.
    let request = script.recv().await.unwrap();
    let delivered = script
        .respond(&request.correlation_id, r#"{"success":true}"#)
        .unwrap();
    assert!(!delivered);
}

#[tokio::test]
async fn capacity_ceiling_holds_across_a_session() {
    init_test_logging();
    let config = ConfigBuilder::new().max_connections(3).build();
    let harness = EndpointHarness::new(config);
    let endpoint = &harness.endpoint;

    let mut connections = Vec::new();
    for _ in 0..3 {
        let (result, id) = endpoint.open_connection(vec![]).await;
        assert!(result.success);
        connections.push(id.unwrap());
    }

    let (result, id) = endpoint.open_connection(vec![]).await;
    assert!(!result.success);
    assert!(result
        .exception
        .unwrap()
        .starts_with("max connections exceeded"));
    assert!(id.is_none());
    assert_eq!(endpoint.registry().open_connections(), 3);

    // Closing one frees capacity.
    assert!(endpoint.close_connection(&connections[0]).await.success);
    let (result, _) = endpoint.open_connection(vec![]).await;
    assert!(result.success);
}

#[tokio::test]
async fn default_patterns_auto_handle_validation_queries() {
    init_test_logging();
    let harness = EndpointHarness::new(ConfigBuilder::new().build());
    let endpoint = &harness.endpoint;

    let (_, connection) = endpoint.open_connection(vec![]).await;
    let connection = connection.unwrap();
    endpoint.create_statement(&connection).await;

    for sql in ["SELECT 1", "Select 1", "SELECT USER from DUAL"] {
        let result = endpoint.execute(&connection, sql).await;
        assert!(result.success, "{sql} should be auto-handled");
        assert_eq!(result.affected_rows, Some(0));
        assert!(result.data_set.unwrap().is_empty());
    }
    assert_eq!(endpoint.stats().auto_handled, 3);
    assert_eq!(endpoint.stats().forwarded, 0);
}

#[tokio::test]
async fn xml_wire_format_end_to_end() {
    init_test_logging();
    let config = ConfigBuilder::new().fully_scripted().build();
    let mut harness = EndpointHarness::with_format(config, WireFormat::Xml);
    let mut script = harness.take_script();
    let endpoint = harness.endpoint.clone();

    let session = tokio::spawn(async move {
        let (result, connection) = endpoint.open_connection(vec![]).await;
        assert!(result.success);
        let connection = connection.unwrap();
        endpoint.create_statement(&connection).await;
        endpoint.execute(&connection, "DELETE FROM t").await
    });

    // openConnection
    let request = script.recv().await.unwrap();
    assert!(request.payload.starts_with("<operation>"));
    script
        .respond(
            &request.correlation_id,
            "<operation-result><success>true</success></operation-result>",
        )
        .unwrap();

    // createStatement
    let request = script.recv().await.unwrap();
    let op = script.operation(&request).unwrap();
    assert_eq!(op.name(), "createStatement");
    script
        .respond(
            &request.correlation_id,
            "<operation-result><success>true</success></operation-result>",
        )
        .unwrap();

    // execute
    let request = script.recv().await.unwrap();
    let op = script.operation(&request).unwrap();
    assert_eq!(op.sql(), Some("DELETE FROM t"));
    script
        .respond(
            &request.correlation_id,
            r#"<operation-result affected-rows="2"><success>true</success></operation-result>"#,
        )
        .unwrap();

    let result = session.await.unwrap();
    assert!(result.success);
    assert_eq!(result.rows_updated(), 2);
}

#[tokio::test]
async fn script_can_answer_with_a_bare_dataset_payload() {
    init_test_logging();
    let config = ConfigBuilder::new().fully_scripted().build();
    let mut harness = EndpointHarness::new(config);

    harness.spawn_script(|request| {
        if request.payload.contains("\"execute\"") {
            Some(r#"[{"foo":"bar"}]"#.to_string())
        } else {
            Some(r#"{"success":true}"#.to_string())
        }
    });
    let endpoint = harness.endpoint;

    let (_, connection) = endpoint.open_connection(vec![]).await;
    let connection = connection.unwrap();
    endpoint.create_statement(&connection).await;
    let result = endpoint.execute(&connection, "SELECT foo FROM bar").await;

    assert!(result.success);
    let ds = result.data_set.unwrap();
    assert_eq!(ds.columns(), ["foo"]);
    assert_eq!(ds.get(0, "foo"), Some(&serde_json::json!("bar")));
}

#[tokio::test]
async fn scripted_failure_surfaces_as_the_exception_string() {
    init_test_logging();
    let config = ConfigBuilder::new().fully_scripted().build();
    let mut harness = EndpointHarness::new(config);

    harness.spawn_script(|request| {
        if request.payload.contains("\"execute\"") {
            Some(r#"{"success":false,"exception":"ORA-00942: table or view does not exist"}"#.to_string())
        } else {
            Some(r#"{"success":true}"#.to_string())
        }
    });
    let endpoint = harness.endpoint;

    let (_, connection) = endpoint.open_connection(vec![]).await;
    let connection = connection.unwrap();
    endpoint.create_statement(&connection).await;
    let result = endpoint.execute(&connection, "SELECT * FROM missing").await;

    assert!(!result.success);
    assert_eq!(
        result.exception.as_deref(),
        Some("ORA-00942: table or view does not exist")
    );
}

#[tokio::test]
async fn concurrent_connections_keep_their_replies_apart() {
    init_test_logging();
    let config = ConfigBuilder::new().fully_scripted().build();
    let mut harness = EndpointHarness::new(config);

    // Answer opens immediately; answer executes with the correlation id so
    // each driver can verify it got its own reply.
    harness.spawn_script(|request| {
        if request.payload.contains("\"execute\"") {
            Some(format!(
                r#"[{{"conn":"{}"}}]"#,
                request.correlation_id
            ))
        } else {
            Some(r#"{"success":true}"#.to_string())
        }
    });
    let endpoint = harness.endpoint;

    let mut sessions = Vec::new();
    for _ in 0..4 {
        let endpoint = endpoint.clone();
        sessions.push(tokio::spawn(async move {
            let (_, connection) = endpoint.open_connection(vec![]).await;
            let connection = connection.unwrap();
            endpoint.create_statement(&connection).await;
            let result = endpoint.execute(&connection, "SELECT conn FROM dual2").await;
            (connection, result)
        }));
    }

    for session in sessions {
        let (connection, result) = session.await.unwrap();
        assert!(result.success);
        let ds = result.data_set.unwrap();
        assert_eq!(
            ds.get(0, "conn"),
            Some(&serde_json::json!(connection.as_str()))
        );
    }
}
