// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the core domain model.
//!
//! These errors stay inside the endpoint process; at the driver boundary they
//! are converted into `OperationResult { success: false, exception }` so the
//! application under test sees an ordinary database error.

use thiserror::Error;

// =============================================================================
// RegistryError
// =============================================================================

/// Lifecycle errors raised by the connection registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The connection ceiling was reached.
    #[error("max connections exceeded ({max} open)")]
    CapacityExceeded {
        /// The configured ceiling.
        max: usize,
    },

    /// An operation was attempted in a state that does not permit it.
    #[error("invalid lifecycle transition: {message}")]
    InvalidTransition {
        /// What was attempted and why it is invalid.
        message: String,
    },
}

impl RegistryError {
    /// Creates a `CapacityExceeded` error.
    pub fn capacity_exceeded(max: usize) -> Self {
        Self::CapacityExceeded { max }
    }

    /// Creates an `InvalidTransition` error.
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::InvalidTransition {
            message: message.into(),
        }
    }

    /// Returns the error type as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::InvalidTransition { .. } => "invalid_transition",
        }
    }
}

// =============================================================================
// DataSetError
// =============================================================================

/// Errors raised while building or validating datasets.
#[derive(Debug, Error)]
pub enum DataSetError {
    /// A payload could not be parsed in its (declared or sniffed) format.
    #[error("malformed dataset payload: {message}")]
    Format {
        /// Parse failure detail.
        message: String,
    },

    /// A dataset violated the column/row shape invariants.
    #[error("invalid dataset shape: {message}")]
    InvalidShape {
        /// Shape violation detail.
        message: String,
    },
}

impl DataSetError {
    /// Creates a `Format` error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Creates an `InvalidShape` error.
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        Self::InvalidShape {
            message: message.into(),
        }
    }

    /// Returns the error type as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Format { .. } => "format",
            Self::InvalidShape { .. } => "invalid_shape",
        }
    }
}

// =============================================================================
// RuleError
// =============================================================================

/// Errors raised while compiling auto-handle patterns.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A configured pattern is not a valid regular expression.
    #[error("invalid auto-handle pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern as configured.
        pattern: String,
        /// Compile failure detail.
        message: String,
    },
}

impl RuleError {
    /// Creates an `InvalidPattern` error.
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
