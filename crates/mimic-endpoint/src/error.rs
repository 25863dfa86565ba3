// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Gateway and endpoint errors.
//!
//! At the driver-facing boundary every error becomes
//! `OperationResult { success: false, exception }`; nothing is thrown across
//! the wire. Most variants are transparent so the exception string the test
//! asserts on is the domain message itself ("max connections exceeded ...",
//! "timeout waiting for test response ...").

use std::time::Duration;
use thiserror::Error;

use mimic_core::error::{DataSetError, RegistryError, RuleError};
use mimic_core::operation::OperationResult;
use mimic_wire::WireError;

// =============================================================================
// GatewayError
// =============================================================================

/// Errors raised by the correlation gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No scripted reply arrived within the configured timeout.
    #[error("timeout waiting for test response after {timeout:?}")]
    Timeout {
        /// The configured wait.
        timeout: Duration,
    },

    /// The script-facing channel is gone.
    #[error("script channel closed")]
    ChannelClosed,

    /// The operation could not be encoded for the wire.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl GatewayError {
    /// Returns the error type as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::ChannelClosed => "channel_closed",
            Self::Wire(_) => "wire",
        }
    }
}

// =============================================================================
// EndpointError
// =============================================================================

/// Everything that can go wrong while serving a driver operation.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The endpoint has not been started.
    #[error("endpoint is not started")]
    NotStarted,

    /// Lifecycle violation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Gateway failure (timeout, closed channel, codec).
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Dataset construction failure.
    #[error(transparent)]
    DataSet(#[from] DataSetError),

    /// Auto-handle pattern compilation failure.
    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl EndpointError {
    /// Converts this error into the failure result the driver sees.
    pub fn to_operation_result(&self) -> OperationResult {
        OperationResult::failure(self.to_string())
    }

    /// Returns the error type as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Registry(_) => "registry",
            Self::Gateway(e) => e.error_type(),
            Self::DataSet(_) => "dataset",
            Self::Rule(_) => "rule",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_is_distinguishable() {
        let err = GatewayError::Timeout {
            timeout: Duration::from_millis(5000),
        };
        assert!(err.to_string().starts_with("timeout waiting for test response"));
    }

    #[test]
    fn registry_message_passes_through_unprefixed() {
        let err = EndpointError::from(RegistryError::capacity_exceeded(20));
        let result = err.to_operation_result();
        assert!(!result.success);
        assert!(result
            .exception
            .unwrap()
            .starts_with("max connections exceeded"));
    }
}
