// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Codec errors.

use thiserror::Error;

/// Wire codec errors.
///
/// Every decode failure is `Malformed`; the codec never guesses at a payload
/// it cannot interpret unambiguously.
#[derive(Debug, Error)]
pub enum WireError {
    /// The payload could not be decoded.
    #[error("malformed operation payload: {message}")]
    Malformed {
        /// Decode failure detail.
        message: String,
    },
}

impl WireError {
    /// Creates a `Malformed` error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for WireError {
    fn from(e: serde_json::Error) -> Self {
        Self::malformed(e.to_string())
    }
}

impl From<mimic_core::xml::XmlError> for WireError {
    fn from(e: mimic_core::xml::XmlError) -> Self {
        Self::malformed(e.to_string())
    }
}
