// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Wire codec for MIMIC.
//!
//! Operations and results cross the script boundary as text, in one of two
//! self-describing formats: JSON (serde external tagging, one-key objects)
//! or XML (a fixed element vocabulary). Encoding is deterministic, and
//! `decode(encode(x)) == x` holds for every valid value in both formats.
//!
//! Anything that cannot be decoded unambiguously, an unknown discriminator,
//! zero or several discriminators, missing required fields, or an exception
//! on a successful result, is a [`WireError::Malformed`].
//!
//! # Examples
//!
//! ```
//! use mimic_core::operation::Operation;
//! use mimic_wire::{decode_operation, encode_operation, WireFormat};
//!
//! let op = Operation::execute("SELECT 1");
//! let text = encode_operation(&op, WireFormat::Json).unwrap();
//! assert_eq!(decode_operation(&text, WireFormat::Json).unwrap(), op);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

use mimic_core::operation::{Operation, OperationResult};

mod error;
mod json;
mod xml;

pub use error::WireError;

/// The two supported wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// JSON with an external variant tag.
    #[default]
    Json,
    /// XML with a fixed element vocabulary.
    Xml,
}

impl WireFormat {
    /// Returns the format name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

/// Encodes an operation in the given format.
pub fn encode_operation(op: &Operation, format: WireFormat) -> Result<String, WireError> {
    match format {
        WireFormat::Json => json::encode_operation(op),
        WireFormat::Xml => Ok(xml::encode_operation(op)),
    }
}

/// Decodes an operation from text in the given format.
pub fn decode_operation(input: &str, format: WireFormat) -> Result<Operation, WireError> {
    match format {
        WireFormat::Json => json::decode_operation(input),
        WireFormat::Xml => xml::decode_operation(input),
    }
}

/// Encodes an operation result in the given format.
pub fn encode_operation_result(
    result: &OperationResult,
    format: WireFormat,
) -> Result<String, WireError> {
    match format {
        WireFormat::Json => json::encode_operation_result(result),
        WireFormat::Xml => Ok(xml::encode_operation_result(result)),
    }
}

/// Decodes an operation result from text in the given format.
pub fn decode_operation_result(
    input: &str,
    format: WireFormat,
) -> Result<OperationResult, WireError> {
    let result = match format {
        WireFormat::Json => json::decode_operation_result(input)?,
        WireFormat::Xml => xml::decode_operation_result(input)?,
    };
    if result.success && result.exception.is_some() {
        return Err(WireError::malformed(
            "exception present on a successful result",
        ));
    }
    Ok(result)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_core::types::{ConnectionProperty, DataSet, Row};
    use serde_json::json;

    fn sample_operations() -> Vec<Operation> {
        vec![
            Operation::open_connection(vec![
                ConnectionProperty::new("username", "mimic"),
                ConnectionProperty::new("database", "testdb"),
            ]),
            Operation::open_connection(vec![]),
            Operation::CloseConnection {},
            Operation::CreateStatement {},
            Operation::create_prepared_statement("SELECT * FROM t WHERE id = ?"),
            Operation::CloseStatement {},
            Operation::execute("SELECT a < b & c FROM \"t\""),
            Operation::TransactionStarted {},
            Operation::TransactionCommitted {},
            Operation::TransactionRollback {},
        ]
    }

    fn sample_results() -> Vec<OperationResult> {
        let mut row = Row::new();
        row.set("id", json!(1));
        row.set("name", json!("al<ce"));
        row.set("active", json!(true));
        row.set("score", json!(2.5));
        row.set("note", json!(null));
        let ds = DataSet::new(
            vec![
                "id".into(),
                "name".into(),
                "active".into(),
                "score".into(),
                "note".into(),
                "unused".into(),
            ],
            vec![row, Row::new()],
        )
        .unwrap();
        vec![
            OperationResult::success(),
            OperationResult::success().with_affected_rows(7),
            OperationResult::success().with_data_set(ds),
            OperationResult::success()
                .with_affected_rows(0)
                .with_data_set(DataSet::empty()),
            OperationResult::failure("table 'users' does not exist"),
        ]
    }

    #[test]
    fn operations_round_trip_in_both_formats() {
        for format in [WireFormat::Json, WireFormat::Xml] {
            for op in sample_operations() {
                let text = encode_operation(&op, format).unwrap();
                let back = decode_operation(&text, format).unwrap();
                assert_eq!(back, op, "format {:?}, payload {text}", format);
            }
        }
    }

    #[test]
    fn results_round_trip_in_both_formats() {
        for format in [WireFormat::Json, WireFormat::Xml] {
            for result in sample_results() {
                let text = encode_operation_result(&result, format).unwrap();
                let back = decode_operation_result(&text, format).unwrap();
                assert_eq!(back, result, "format {:?}, payload {text}", format);
            }
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let op = Operation::execute("SELECT 1");
        for format in [WireFormat::Json, WireFormat::Xml] {
            assert_eq!(
                encode_operation(&op, format).unwrap(),
                encode_operation(&op, format).unwrap()
            );
        }
    }

    #[test]
    fn successful_result_with_exception_is_malformed() {
        let err =
            decode_operation_result(r#"{"success":true,"exception":"x"}"#, WireFormat::Json)
                .unwrap_err();
        assert!(err.to_string().contains("successful"));
        let err = decode_operation_result(
            "<operation-result><success>true</success><exception>x</exception></operation-result>",
            WireFormat::Xml,
        )
        .unwrap_err();
        assert!(err.to_string().contains("successful"));
    }
}
