// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JSON wire form.
//!
//! Operations serialize via serde's external tagging, so the wire form is an
//! object with exactly one key (the operation discriminator). serde already
//! rejects zero-key and multi-key objects and unknown discriminators, which
//! is precisely the malformed-payload contract.

use mimic_core::operation::{Operation, OperationResult};

use crate::error::WireError;

pub(crate) fn encode_operation(op: &Operation) -> Result<String, WireError> {
    Ok(serde_json::to_string(op)?)
}

pub(crate) fn decode_operation(input: &str) -> Result<Operation, WireError> {
    Ok(serde_json::from_str(input)?)
}

pub(crate) fn encode_operation_result(result: &OperationResult) -> Result<String, WireError> {
    Ok(serde_json::to_string(result)?)
}

pub(crate) fn decode_operation_result(input: &str) -> Result<OperationResult, WireError> {
    Ok(serde_json::from_str(input)?)
}

// =============================================================================
// Tests
// =============================================================================
