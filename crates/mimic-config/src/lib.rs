// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration for MIMIC.
//!
//! - [`schema`] - the endpoint configuration surface and its defaults
//! - [`loader`] - file loading (YAML/TOML/JSON), env overrides, validation
//! - [`error`] - configuration errors

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, ConfigFormat, ConfigLoader};
pub use schema::EndpointConfig;
