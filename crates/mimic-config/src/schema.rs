// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Endpoint configuration schema.
//!
//! Every knob has a default, so an empty document is a valid configuration.
//! Unknown fields are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use mimic_core::rules::{self, AutoHandleRules};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Defaults
// =============================================================================

/// Default listen port of the impersonated database server.
pub const DEFAULT_PORT: u16 = 4567;
/// Default connection ceiling.
pub const DEFAULT_MAX_CONNECTIONS: usize = 20;
/// Default script-side polling interval in milliseconds.
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 500;
/// Default reply timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_database_name() -> String {
    "testdb".to_string()
}

fn default_true() -> bool {
    true
}

fn default_auto_handle_queries() -> Vec<String> {
    rules::default_patterns()
}

fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

fn default_polling_interval_ms() -> u64 {
    DEFAULT_POLLING_INTERVAL_MS
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

// =============================================================================
// EndpointConfig
// =============================================================================

/// Configuration surface of a virtual database endpoint.
///
/// # Examples
///
/// ```
/// use mimic_config::EndpointConfig;
///
/// let config = EndpointConfig::default();
/// assert_eq!(config.port, 4567);
/// assert_eq!(config.max_connections, 20);
/// assert!(config.auto_connect);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Hostname the impersonated server claims to run on.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the impersonated server claims to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Name of the impersonated database.
    #[serde(default = "default_database_name")]
    pub database_name: String,

    /// Whether the endpoint accepts driver calls immediately.
    #[serde(default = "default_true")]
    pub auto_start: bool,

    /// Confirm connection open/close locally instead of asking the script.
    #[serde(default = "default_true")]
    pub auto_connect: bool,

    /// Confirm statement create/close locally instead of asking the script.
    #[serde(default = "default_true")]
    pub auto_create_statement: bool,

    /// Patterns for queries the endpoint answers locally.
    #[serde(default = "default_auto_handle_queries")]
    pub auto_handle_queries: Vec<String>,

    /// Maximum number of simultaneously open connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Script-side polling interval in milliseconds.
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,

    /// How long the endpoint waits for a scripted reply, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Wrap driver work in implicit transactions instead of forwarding
    /// transaction boundaries to the script.
    #[serde(default = "default_true")]
    pub auto_transaction_handling: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_name: default_database_name(),
            auto_start: true,
            auto_connect: true,
            auto_create_statement: true,
            auto_handle_queries: default_auto_handle_queries(),
            max_connections: default_max_connections(),
            polling_interval_ms: default_polling_interval_ms(),
            timeout_ms: default_timeout_ms(),
            auto_transaction_handling: true,
        }
    }
}

impl EndpointConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.is_empty() {
            return Err(ConfigError::validation("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::validation("port", "must be non-zero"));
        }
        if self.database_name.is_empty() {
            return Err(ConfigError::validation(
                "database_name",
                "must not be empty",
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "max_connections",
                "must be at least 1",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::validation("timeout_ms", "must be non-zero"));
        }
        if self.polling_interval_ms == 0 {
            return Err(ConfigError::validation(
                "polling_interval_ms",
                "must be non-zero",
            ));
        }
        if self.polling_interval_ms > self.timeout_ms {
            return Err(ConfigError::validation(
                "polling_interval_ms",
                "must not exceed timeout_ms",
            ));
        }
        AutoHandleRules::new(&self.auto_handle_queries).map_err(|e| {
            ConfigError::validation("auto_handle_queries", e.to_string())
        })?;
        Ok(())
    }

    /// Returns the reply timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the polling interval as a `Duration`.
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    /// Returns the `host:port` the endpoint impersonates.
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EndpointConfig::default();
        config.validate().unwrap();
        assert_eq!(config.server_address(), "localhost:4567");
        assert_eq!(config.timeout(), Duration::from_millis(5000));
        assert_eq!(config.polling_interval(), Duration::from_millis(500));
        assert!(config.auto_transaction_handling);
    }

    #[test]
    fn empty_document_parses_to_defaults() {
        let config: EndpointConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.auto_handle_queries.len(), 3);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = toml::from_str::<EndpointConfig>("max_connection = 5").unwrap_err();
        assert!(err.to_string().contains("max_connection"));
    }

    #[test]
    fn zero_port_fails_validation() {
        let mut config = EndpointConfig::default();
        config.port = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn zero_max_connections_fails_validation() {
        let mut config = EndpointConfig::default();
        config.max_connections = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_connections"));
    }

    #[test]
    fn polling_interval_must_fit_in_timeout() {
        let mut config = EndpointConfig::default();
        config.polling_interval_ms = 6000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_auto_handle_pattern_fails_validation() {
        let mut config = EndpointConfig::default();
        config.auto_handle_queries = vec!["SELECT (".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auto_handle_queries"));
    }
}
