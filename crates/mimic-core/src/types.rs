// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types for MIMIC.
//!
//! This module provides the identifiers and tabular data types shared by the
//! operation model, the dataset builder, and the lifecycle registry.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DataSetError;

// =============================================================================
// Identifiers
// =============================================================================

/// A unique identifier for a virtual connection.
///
/// Connection IDs are allocated by the registry and are unique within an
/// endpoint instance. They double as the correlation ID on the script side.
///
/// # Examples
///
/// ```
/// use mimic_core::types::ConnectionId;
///
/// let id = ConnectionId::new("conn-1");
/// assert_eq!(id.as_str(), "conn-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Creates a new connection ID.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns the inner string.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ConnectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A unique identifier for a statement opened on a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementId(String);

impl StatementId {
    /// Creates a new statement ID.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns the inner string.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StatementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StatementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for StatementId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Connection properties
// =============================================================================

/// A single named connection property, as sent by the driver when opening a
/// connection (e.g. `username`, `database`).
///
/// Properties are kept as an ordered list rather than a map so the wire
/// encoding is deterministic and duplicates (last-wins at the consumer's
/// discretion) survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProperty {
    /// Property name.
    pub name: String,
    /// Property value.
    pub value: String,
}

impl ConnectionProperty {
    /// Creates a new connection property.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Rows and datasets
// =============================================================================

/// A single result row: an ordered mapping from column name to cell value.
///
/// Cell values are loosely typed (`serde_json::Value`) since the scripted
/// database has no schema. Insertion order is preserved, which is what keeps
/// dataset column order deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(serde_json::Map<String, serde_json::Value>);

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `column`, if present.
    pub fn get(&self, column: &str) -> Option<&serde_json::Value> {
        self.0.get(column)
    }

    /// Sets the value for `column`, preserving first-insertion order.
    pub fn set(&mut self, column: impl Into<String>, value: serde_json::Value) {
        self.0.insert(column.into(), value);
    }

    /// Returns the column names present in this row, in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over `(column, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of cells in this row.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if this row has no cells.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Row {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, serde_json::Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A tabular query result: an ordered column list plus zero or more rows.
///
/// Invariants enforced by [`DataSet::new`]:
///
/// - column names are unique
/// - every row references only declared columns (rows may omit columns)
///
/// # Examples
///
/// ```
/// use mimic_core::types::{DataSet, Row};
///
/// let mut row = Row::new();
/// row.set("id", serde_json::json!(1));
/// row.set("name", serde_json::json!("alice"));
///
/// let ds = DataSet::new(vec!["id".into(), "name".into()], vec![row]).unwrap();
/// assert_eq!(ds.row_count(), 1);
/// assert_eq!(ds.columns(), ["id", "name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl DataSet {
    /// Creates an empty dataset (no columns, no rows).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a dataset, validating the column/row shape.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, DataSetError> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(DataSetError::invalid_shape(format!(
                    "duplicate column '{column}'"
                )));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            for column in row.columns() {
                if !columns.iter().any(|c| c == column) {
                    return Err(DataSetError::invalid_shape(format!(
                        "row {i} references undeclared column '{column}'"
                    )));
                }
            }
        }
        Ok(Self { columns, rows })
    }

    /// Creates a dataset from rows alone. The column list is the union of the
    /// row keys in first-seen order.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for column in row.columns() {
                if !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
        }
        Self { columns, rows }
    }

    /// Returns the column names in declaration order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the dataset has no columns and no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Returns the cell at (`row`, `column`), if present.
    pub fn get(&self, row: usize, column: &str) -> Option<&serde_json::Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}

// =============================================================================
// Tests
// =============================================================================
