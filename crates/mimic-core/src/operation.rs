// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The operation model: the closed set of driver operations and the single
//! result shape every operation produces.
//!
//! `Operation` is serialized with an external tag so the JSON wire form is a
//! one-key object (`{"execute":{"sql":"..."}}`), and the variant set is the
//! complete protocol vocabulary. Adding a variant is a wire format change.

use serde::{Deserialize, Serialize};

use crate::types::{ConnectionProperty, DataSet};

// =============================================================================
// Operation
// =============================================================================

/// A driver-originated operation forwarded to (or short-circuited by) the
/// endpoint.
///
/// # Examples
///
/// ```
/// use mimic_core::operation::Operation;
///
/// let op = Operation::execute("SELECT 1");
/// let json = serde_json::to_string(&op).unwrap();
/// assert_eq!(json, r#"{"execute":{"sql":"SELECT 1"}}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Open a new virtual connection with the given properties.
    OpenConnection {
        /// Driver-supplied connection properties (may be empty).
        #[serde(default)]
        properties: Vec<ConnectionProperty>,
    },
    /// Close the current connection.
    CloseConnection {},
    /// Create a plain statement on the current connection.
    CreateStatement {},
    /// Create a prepared statement for `sql`.
    CreatePreparedStatement {
        /// The SQL text the statement is prepared for.
        sql: String,
    },
    /// Close the most recently created open statement.
    CloseStatement {},
    /// Execute `sql` on the current statement.
    Execute {
        /// The SQL text to execute.
        sql: String,
    },
    /// The driver started a transaction.
    TransactionStarted {},
    /// The driver committed the active transaction.
    TransactionCommitted {},
    /// The driver rolled back the active transaction.
    TransactionRollback {},
}

impl Operation {
    /// Creates an `OpenConnection` operation.
    pub fn open_connection(properties: Vec<ConnectionProperty>) -> Self {
        Self::OpenConnection { properties }
    }

    /// Creates an `Execute` operation.
    pub fn execute(sql: impl Into<String>) -> Self {
        Self::Execute { sql: sql.into() }
    }

    /// Creates a `CreatePreparedStatement` operation.
    pub fn create_prepared_statement(sql: impl Into<String>) -> Self {
        Self::CreatePreparedStatement { sql: sql.into() }
    }

    /// Returns the wire discriminator for this operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenConnection { .. } => "openConnection",
            Self::CloseConnection {} => "closeConnection",
            Self::CreateStatement {} => "createStatement",
            Self::CreatePreparedStatement { .. } => "createPreparedStatement",
            Self::CloseStatement {} => "closeStatement",
            Self::Execute { .. } => "execute",
            Self::TransactionStarted {} => "transactionStarted",
            Self::TransactionCommitted {} => "transactionCommitted",
            Self::TransactionRollback {} => "transactionRollback",
        }
    }

    /// Returns the SQL text carried by this operation, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Execute { sql } | Self::CreatePreparedStatement { sql } => Some(sql),
            _ => None,
        }
    }
}

// =============================================================================
// OperationResult
// =============================================================================

/// The outcome of an operation.
///
/// Exactly one shape is used for every operation: a success flag, an optional
/// exception message (only meaningful on failure), an optional affected-row
/// count, and an optional dataset. `affected_rows` and `data_set` are
/// independent; an update result typically carries only the former and a
/// query result only the latter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure detail. Present only when `success` is `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    /// Number of rows changed by an update, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<i64>,
    /// Result rows for a query, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set: Option<DataSet>,
}

impl OperationResult {
    /// Creates a bare success result.
    pub fn success() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// Creates a failure result carrying `exception`.
    pub fn failure(exception: impl Into<String>) -> Self {
        Self {
            success: false,
            exception: Some(exception.into()),
            ..Self::default()
        }
    }

    /// Attaches an affected-row count.
    pub fn with_affected_rows(mut self, rows: i64) -> Self {
        self.affected_rows = Some(rows);
        self
    }

    /// Attaches a dataset.
    pub fn with_data_set(mut self, data_set: DataSet) -> Self {
        self.data_set = Some(data_set);
        self
    }

    /// Returns `true` if the operation succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the affected-row count, defaulting to zero when unreported.
    pub fn rows_updated(&self) -> i64 {
        self.affected_rows.unwrap_or(0)
    }
}

// =============================================================================
// Tests
// =============================================================================
