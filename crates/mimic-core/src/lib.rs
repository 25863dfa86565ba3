// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core domain model for MIMIC, a virtual database endpoint.
//!
//! MIMIC impersonates a relational database server so that integration tests
//! can script exact responses to the JDBC-style operations an application
//! under test performs. This crate holds the pieces that are independent of
//! any transport or test runner:
//!
//! - [`operation`] - the closed set of driver operations and their results
//! - [`types`] - identifiers, connection properties, rows, and datasets
//! - [`rules`] - the auto-handle engine that answers trivial queries locally
//! - [`dataset`] - the builder that turns script payloads into datasets
//! - [`registry`] - connection/statement/transaction lifecycle tracking
//! - [`xml`] - a minimal element-tree reader shared with the wire codec
//!
//! # Examples
//!
//! ```
//! use mimic_core::operation::{Operation, OperationResult};
//!
//! let op = Operation::execute("SELECT name FROM users");
//! assert_eq!(op.sql(), Some("SELECT name FROM users"));
//!
//! let result = OperationResult::success().with_affected_rows(3);
//! assert_eq!(result.rows_updated(), 3);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod dataset;
pub mod error;
pub mod operation;
pub mod registry;
pub mod rules;
pub mod types;
pub mod xml;

pub use dataset::{DataSetBuilder, DataSetPayload, PayloadFormat};
pub use error::{DataSetError, RegistryError, RuleError};
pub use operation::{Operation, OperationResult};
pub use registry::{ConnectionRegistry, RegistrySnapshot};
pub use rules::AutoHandleRules;
pub use types::{ConnectionId, ConnectionProperty, DataSet, Row, StatementId};
