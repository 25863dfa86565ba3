// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The MIMIC endpoint: the piece that faces both sides.
//!
//! - [`gateway`] - the correlation gateway bridging the synchronous
//!   driver-facing side to the asynchronous, script-driven responder
//! - [`endpoint`] - the driver-facing adapter: lifecycle enforcement,
//!   auto-handle short-circuits, and error-to-result conversion
//! - [`error`] - gateway and endpoint errors
//!
//! # Examples
//!
//! ```
//! use mimic_config::EndpointConfig;
//! use mimic_endpoint::DatabaseEndpoint;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (endpoint, _script) = DatabaseEndpoint::new(EndpointConfig::default()).unwrap();
//! let (result, connection) = endpoint.open_connection(vec![]).await;
//! assert!(result.success);
//!
//! // "SELECT 1" is auto-handled; no script interaction needed.
//! let connection = connection.unwrap();
//! endpoint.create_statement(&connection).await;
//! let result = endpoint.execute(&connection, "SELECT 1").await;
//! assert!(result.success);
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod endpoint;
pub mod error;
pub mod gateway;

pub use endpoint::{DatabaseEndpoint, EndpointStats};
pub use error::{EndpointError, GatewayError};
pub use gateway::{
    CorrelationGateway, GatewayConfig, GatewayStats, OperationResponder, ScriptChannel,
    ScriptRequest,
};
