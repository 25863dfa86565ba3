// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! DataSet builder.
//!
//! Test scripts answer `execute` operations with payloads in whichever shape
//! is convenient: a pre-built dataset, a full result wrapper, a JSON array of
//! row objects, or an XML `<dataset>` document. The builder normalizes all of
//! them into a [`DataSet`].
//!
//! Format resolution order: the payload's own type, then a declared format,
//! then sniffing the first non-whitespace byte (`[`/`{` for JSON, `<` for
//! XML). An empty payload always yields an empty dataset; a payload whose
//! format cannot be determined yields an empty dataset with a warning.

use tracing::warn;

use crate::error::DataSetError;
use crate::operation::OperationResult;
use crate::types::{DataSet, Row};
use crate::xml::XmlElement;

/// Declared payload format, when the script states one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// JSON array of flat row objects.
    Json,
    /// XML `<dataset>` document.
    Xml,
}

/// A script-supplied payload in one of the accepted shapes.
#[derive(Debug, Clone)]
pub enum DataSetPayload {
    /// A pre-built dataset, passed through untouched.
    DataSet(DataSet),
    /// A result wrapper; its embedded dataset is extracted (empty if absent).
    Result(OperationResult),
    /// Raw text to be parsed per the declared or sniffed format.
    Text(String),
}

/// Normalizes script payloads into datasets.
pub struct DataSetBuilder;

impl DataSetBuilder {
    /// Builds a dataset from `payload`, honoring `declared` for text
    /// payloads.
    pub fn build(
        payload: DataSetPayload,
        declared: Option<PayloadFormat>,
    ) -> Result<DataSet, DataSetError> {
        match payload {
            DataSetPayload::DataSet(ds) => Ok(ds),
            DataSetPayload::Result(result) => Ok(result.data_set.unwrap_or_default()),
            DataSetPayload::Text(text) => Self::from_text(&text, declared),
        }
    }

    /// Builds a dataset from raw text.
    pub fn from_text(
        text: &str,
        declared: Option<PayloadFormat>,
    ) -> Result<DataSet, DataSetError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(DataSet::empty());
        }
        match declared {
            Some(PayloadFormat::Json) => Self::from_json(trimmed),
            Some(PayloadFormat::Xml) => Self::from_xml(trimmed),
            None => match trimmed.as_bytes()[0] {
                b'[' | b'{' => Self::from_json(trimmed),
                b'<' => Self::from_xml(trimmed),
                _ => {
                    warn!("unrecognized dataset payload, returning empty dataset");
                    Ok(DataSet::empty())
                }
            },
        }
    }

    /// Parses a JSON array of flat row objects.
    ///
    /// Column order is the first-seen order across rows; later rows may omit
    /// columns or introduce new ones.
    pub fn from_json(text: &str) -> Result<DataSet, DataSetError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| DataSetError::format(e.to_string()))?;
        let serde_json::Value::Array(items) = value else {
            return Err(DataSetError::format("expected a JSON array of row objects"));
        };
        let mut rows = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let serde_json::Value::Object(map) = item else {
                return Err(DataSetError::format(format!(
                    "row {i} is not a JSON object"
                )));
            };
            rows.push(Row::from(map));
        }
        Ok(DataSet::from_rows(rows))
    }

    /// Parses an XML `<dataset>` document: `<row>` children whose leaf
    /// elements are column/value pairs. Cell values are read as strings.
    pub fn from_xml(text: &str) -> Result<DataSet, DataSetError> {
        let root = XmlElement::parse(text).map_err(|e| DataSetError::format(e.to_string()))?;
        if root.name != "dataset" {
            return Err(DataSetError::format(format!(
                "expected <dataset> root, found <{}>",
                root.name
            )));
        }
        let mut rows = Vec::new();
        for child in &root.children {
            if child.name != "row" {
                return Err(DataSetError::format(format!(
                    "expected <row>, found <{}>",
                    child.name
                )));
            }
            let mut row = Row::new();
            for cell in &child.children {
                row.set(
                    cell.name.clone(),
                    serde_json::Value::String(cell.text.clone()),
                );
            }
            rows.push(row);
        }
        Ok(DataSet::from_rows(rows))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_payload_yields_empty_dataset() {
        let ds = DataSetBuilder::from_text("", None).unwrap();
        assert!(ds.is_empty());
        let ds = DataSetBuilder::from_text("   \n", Some(PayloadFormat::Json)).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn prebuilt_dataset_passes_through() {
        let mut row = Row::new();
        row.set("a", json!(1));
        let ds = DataSet::from_rows(vec![row]);
        let built = DataSetBuilder::build(DataSetPayload::DataSet(ds.clone()), None).unwrap();
        assert_eq!(built, ds);
    }

    #[test]
    fn result_wrapper_is_unwrapped() {
        let mut row = Row::new();
        row.set("a", json!(1));
        let ds = DataSet::from_rows(vec![row]);
        let result = OperationResult::success().with_data_set(ds.clone());
        let built = DataSetBuilder::build(DataSetPayload::Result(result), None).unwrap();
        assert_eq!(built, ds);

        let bare = OperationResult::success();
        let built = DataSetBuilder::build(DataSetPayload::Result(bare), None).unwrap();
        assert!(built.is_empty());
    }

    #[test]
    fn json_rows_union_columns_first_seen() {
        let ds = DataSetBuilder::from_json(
            r#"[{"id":1,"name":"alice"},{"name":"bob","age":30}]"#,
        )
        .unwrap();
        assert_eq!(ds.columns(), ["id", "name", "age"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.get(1, "age"), Some(&json!(30)));
        assert_eq!(ds.get(1, "id"), None);
    }

    #[test]
    fn json_non_array_is_rejected() {
        let err = DataSetBuilder::from_json(r#"{"id":1}"#).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn json_non_object_row_is_rejected() {
        let err = DataSetBuilder::from_json("[1,2]").unwrap_err();
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn xml_dataset_document_is_parsed() {
        let ds = DataSetBuilder::from_xml(
            "<dataset><row><id>1</id><name>alice</name></row><row><id>2</id></row></dataset>",
        )
        .unwrap();
        assert_eq!(ds.columns(), ["id", "name"]);
        assert_eq!(ds.get(0, "name"), Some(&json!("alice")));
        assert_eq!(ds.get(1, "name"), None);
    }

    #[test]
    fn xml_wrong_root_is_rejected() {
        let err = DataSetBuilder::from_xml("<rows><row/></rows>").unwrap_err();
        assert!(err.to_string().contains("<dataset>"));
    }

    #[test]
    fn sniffing_routes_by_first_byte() {
        let ds = DataSetBuilder::from_text(r#"[{"a":1}]"#, None).unwrap();
        assert_eq!(ds.columns(), ["a"]);
        let ds = DataSetBuilder::from_text("<dataset><row><a>1</a></row></dataset>", None)
            .unwrap();
        assert_eq!(ds.columns(), ["a"]);
    }

    #[test]
    fn unrecognized_payload_yields_empty_dataset() {
        let ds = DataSetBuilder::from_text("id,name\n1,alice", None).unwrap();
        assert!(ds.is_empty());
    }
}
