// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # MIMIC Integration Tests
//!
//! This crate provides integration tests for the MIMIC virtual database
//! endpoint, plus the shared utilities they are written with.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `builders`: Helpers for constructing configs, rows, and datasets
//!   - `harness`: An endpoint + scripted-responder pair for end-to-end tests
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p mimic-tests
//!
//! # Run specific test suite
//! cargo test -p mimic-tests --test integration_endpoint
//! cargo test -p mimic-tests --test integration_wire
//! cargo test -p mimic-tests --test integration_dataset
//! cargo test -p mimic-tests --test integration_config
//! cargo test -p mimic-tests --test integration_env
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::builders::*;
    pub use crate::common::harness::*;
    pub use crate::common::*;
}
