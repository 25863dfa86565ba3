// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! XML wire form.
//!
//! Operations are wrapped in an `<operation>` root holding exactly one
//! variant element (`<execute>`, `<open-connection>`, ...). Results are an
//! `<operation-result>` root with the affected-row count as an attribute and
//! a lossless `<data-set>` body: the column list is written explicitly so
//! column order and value-less columns survive a round trip. Each cell is a
//! `<cell column="…">` element; the column name lives in an attribute
//! because names like `my col` or `count(*)` are valid columns but not XML
//! element names. Non-string cells carry a `type` attribute.
//!
//! Writing is plain string assembly over `quick_xml::escape`; the element
//! vocabulary is small and fixed, and this keeps the output byte-for-byte
//! deterministic. Reading goes through the shared element tree.

use std::fmt::Write as _;

use quick_xml::escape::escape;

use mimic_core::operation::{Operation, OperationResult};
use mimic_core::types::{ConnectionProperty, DataSet, Row};
use mimic_core::xml::XmlElement;

use crate::error::WireError;

// =============================================================================
// Encoding
// =============================================================================

pub(crate) fn encode_operation(op: &Operation) -> String {
    let mut out = String::from("<operation>");
    match op {
        Operation::OpenConnection { properties } => {
            if properties.is_empty() {
                out.push_str("<open-connection/>");
            } else {
                out.push_str("<open-connection>");
                for property in properties {
                    out.push_str("<property><name>");
                    out.push_str(&escape(&property.name));
                    out.push_str("</name><value>");
                    out.push_str(&escape(&property.value));
                    out.push_str("</value></property>");
                }
                out.push_str("</open-connection>");
            }
        }
        Operation::CloseConnection {} => out.push_str("<close-connection/>"),
        Operation::CreateStatement {} => out.push_str("<create-statement/>"),
        Operation::CreatePreparedStatement { sql } => {
            out.push_str("<create-prepared-statement><sql>");
            out.push_str(&escape(sql));
            out.push_str("</sql></create-prepared-statement>");
        }
        Operation::CloseStatement {} => out.push_str("<close-statement/>"),
        Operation::Execute { sql } => {
            out.push_str("<execute><sql>");
            out.push_str(&escape(sql));
            out.push_str("</sql></execute>");
        }
        Operation::TransactionStarted {} => out.push_str("<transaction-started/>"),
        Operation::TransactionCommitted {} => out.push_str("<transaction-committed/>"),
        Operation::TransactionRollback {} => out.push_str("<transaction-rollback/>"),
    }
    out.push_str("</operation>");
    out
}

pub(crate) fn encode_operation_result(result: &OperationResult) -> String {
    let mut out = String::from("<operation-result");
    if let Some(rows) = result.affected_rows {
        let _ = write!(out, r#" affected-rows="{rows}""#);
    }
    out.push('>');
    out.push_str(if result.success {
        "<success>true</success>"
    } else {
        "<success>false</success>"
    });
    if let Some(exception) = &result.exception {
        out.push_str("<exception>");
        out.push_str(&escape(exception));
        out.push_str("</exception>");
    }
    if let Some(data_set) = &result.data_set {
        encode_data_set(&mut out, data_set);
    }
    out.push_str("</operation-result>");
    out
}

fn encode_data_set(out: &mut String, data_set: &DataSet) {
    out.push_str("<data-set><columns>");
    for column in data_set.columns() {
        out.push_str("<column>");
        out.push_str(&escape(column));
        out.push_str("</column>");
    }
    out.push_str("</columns><rows>");
    for row in data_set.rows() {
        if row.is_empty() {
            out.push_str("<row/>");
            continue;
        }
        out.push_str("<row>");
        // Cells are written in declared column order; absent cells are
        // simply omitted.
        for column in data_set.columns() {
            if let Some(value) = row.get(column) {
                encode_cell(out, column, value);
            }
        }
        out.push_str("</row>");
    }
    out.push_str("</rows></data-set>");
}

fn encode_cell(out: &mut String, column: &str, value: &serde_json::Value) {
    let column = escape(column);
    match value {
        serde_json::Value::String(s) => {
            let _ = write!(out, r#"<cell column="{column}">{}</cell>"#, escape(s));
        }
        serde_json::Value::Null => {
            let _ = write!(out, r#"<cell column="{column}" type="null"/>"#);
        }
        serde_json::Value::Bool(b) => {
            let _ = write!(out, r#"<cell column="{column}" type="boolean">{b}</cell>"#);
        }
        serde_json::Value::Number(n) => {
            let _ = write!(out, r#"<cell column="{column}" type="number">{n}</cell>"#);
        }
        other => {
            let _ = write!(
                out,
                r#"<cell column="{column}" type="json">{}</cell>"#,
                escape(&other.to_string())
            );
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

pub(crate) fn decode_operation(input: &str) -> Result<Operation, WireError> {
    let root = XmlElement::parse(input)?;
    if root.name != "operation" {
        return Err(WireError::malformed(format!(
            "expected <operation> root, found <{}>",
            root.name
        )));
    }
    if root.children.len() != 1 {
        return Err(WireError::malformed(
            "expected exactly one operation element",
        ));
    }
    let element = &root.children[0];
    match element.name.as_str() {
        "open-connection" => {
            let mut properties = Vec::new();
            for property in element.children_named("property") {
                let name = property
                    .child("name")
                    .ok_or_else(|| WireError::malformed("property is missing <name>"))?
                    .text
                    .clone();
                let value = property
                    .child("value")
                    .ok_or_else(|| WireError::malformed("property is missing <value>"))?
                    .text
                    .clone();
                properties.push(ConnectionProperty { name, value });
            }
            Ok(Operation::OpenConnection { properties })
        }
        "close-connection" => Ok(Operation::CloseConnection {}),
        "create-statement" => Ok(Operation::CreateStatement {}),
        "create-prepared-statement" => Ok(Operation::CreatePreparedStatement {
            sql: required_sql(element)?,
        }),
        "close-statement" => Ok(Operation::CloseStatement {}),
        "execute" => Ok(Operation::Execute {
            sql: required_sql(element)?,
        }),
        "transaction-started" => Ok(Operation::TransactionStarted {}),
        "transaction-committed" => Ok(Operation::TransactionCommitted {}),
        "transaction-rollback" => Ok(Operation::TransactionRollback {}),
        other => Err(WireError::malformed(format!(
            "unknown operation '{other}'"
        ))),
    }
}

fn required_sql(element: &XmlElement) -> Result<String, WireError> {
    element
        .child("sql")
        .map(|sql| sql.text.clone())
        .ok_or_else(|| WireError::malformed(format!("<{}> is missing <sql>", element.name)))
}

pub(crate) fn decode_operation_result(input: &str) -> Result<OperationResult, WireError> {
    let root = XmlElement::parse(input)?;
    if root.name != "operation-result" {
        return Err(WireError::malformed(format!(
            "expected <operation-result> root, found <{}>",
            root.name
        )));
    }
    let success = match root
        .child("success")
        .ok_or_else(|| WireError::malformed("result is missing <success>"))?
        .text
        .as_str()
    {
        "true" => true,
        "false" => false,
        other => {
            return Err(WireError::malformed(format!(
                "invalid <success> value '{other}'"
            )))
        }
    };
    let exception = root.child("exception").map(|e| e.text.clone());
    let affected_rows = root
        .attribute("affected-rows")
        .map(|raw| {
            raw.parse::<i64>().map_err(|_| {
                WireError::malformed(format!("invalid affected-rows value '{raw}'"))
            })
        })
        .transpose()?;
    let data_set = root.child("data-set").map(decode_data_set).transpose()?;
    Ok(OperationResult {
        success,
        exception,
        affected_rows,
        data_set,
    })
}

fn decode_data_set(element: &XmlElement) -> Result<DataSet, WireError> {
    let columns: Vec<String> = element
        .child("columns")
        .ok_or_else(|| WireError::malformed("data-set is missing <columns>"))?
        .children_named("column")
        .map(|c| c.text.clone())
        .collect();
    let rows_element = element
        .child("rows")
        .ok_or_else(|| WireError::malformed("data-set is missing <rows>"))?;
    let mut rows = Vec::new();
    for row_element in rows_element.children_named("row") {
        let mut row = Row::new();
        for cell in &row_element.children {
            if cell.name != "cell" {
                return Err(WireError::malformed(format!(
                    "expected <cell>, found <{}>",
                    cell.name
                )));
            }
            let column = cell.attribute("column").ok_or_else(|| {
                WireError::malformed("cell is missing the column attribute")
            })?;
            row.set(column.to_string(), decode_cell(cell)?);
        }
        rows.push(row);
    }
    DataSet::new(columns, rows).map_err(|e| WireError::malformed(e.to_string()))
}

fn decode_cell(cell: &XmlElement) -> Result<serde_json::Value, WireError> {
    match cell.attribute("type") {
        None | Some("string") => Ok(serde_json::Value::String(cell.text.clone())),
        Some("null") => Ok(serde_json::Value::Null),
        Some("boolean") => match cell.text.as_str() {
            "true" => Ok(serde_json::Value::Bool(true)),
            "false" => Ok(serde_json::Value::Bool(false)),
            other => Err(WireError::malformed(format!(
                "invalid boolean cell '{other}'"
            ))),
        },
        Some("number") => {
            let value: serde_json::Value = serde_json::from_str(&cell.text)
                .map_err(|e| WireError::malformed(e.to_string()))?;
            if value.is_number() {
                Ok(value)
            } else {
                Err(WireError::malformed(format!(
                    "invalid number cell '{}'",
                    cell.text
                )))
            }
        }
        Some("json") => {
            serde_json::from_str(&cell.text).map_err(|e| WireError::malformed(e.to_string()))
        }
        Some(other) => Err(WireError::malformed(format!(
            "unknown cell type '{other}'"
        ))),
    }
}

// =============================================================================
// Tests
// =============================================================================
