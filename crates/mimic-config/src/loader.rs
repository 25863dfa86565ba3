// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading and processing.
//!
//! # Loading Pipeline
//!
//! 1. Parse the YAML/TOML/JSON file (by extension)
//! 2. Resolve `${VAR}` / `${VAR:default}` placeholders in the raw content
//! 3. Apply `MIMIC_*` environment variable overrides
//! 4. Validate the configuration
//!
//! The auto-handle pattern list has its own process-wide override
//! (`MIMIC_AUTO_HANDLE_QUERIES`), applied by the endpoint when it compiles
//! the rule set, not here.
//!
//! # Environment Variable Override
//!
//! ```text
//! MIMIC_HOST=db.internal
//! MIMIC_PORT=5432
//! MIMIC_MAX_CONNECTIONS=50
//! MIMIC_AUTO_CONNECT=false
//! ```

use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::EndpointConfig;

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format (`.yaml`, `.yml`).
    Yaml,
    /// TOML format (`.toml`).
    Toml,
    /// JSON format (`.json`).
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        match extension.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::unsupported_format(other)),
        }
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader for MIMIC.
///
/// # Examples
///
/// ```no_run
/// use mimic_config::loader::ConfigLoader;
///
/// let loader = ConfigLoader::new();
/// let config = loader.load("endpoint.yaml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix.
    env_prefix: String,

    /// Whether to resolve environment variables.
    resolve_env_vars: bool,
}

impl ConfigLoader {
    /// Creates a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            env_prefix: "MIMIC".to_string(),
            resolve_env_vars: true,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Loads configuration from a file.
    ///
    /// The file format is determined by the file extension:
    /// - `.yaml` or `.yml` - YAML format
    /// - `.toml` - TOML format
    /// - `.json` - JSON format
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<EndpointConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = self.read_file(path)?;
        let format = ConfigFormat::from_path(path)?;
        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(&content)
        } else {
            content
        };
        let mut config: EndpointConfig =
            parse_str(&content, format).map_err(|e| match e {
                ConfigError::Serialization { message } => ConfigError::parse(path, message),
                other => other,
            })?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        config.validate()?;

        info!(
            server = %config.server_address(),
            database = %config.database_name,
            "Configuration loaded successfully"
        );
        debug!(
            max_connections = config.max_connections,
            timeout_ms = config.timeout_ms,
            "Endpoint limits"
        );

        Ok(config)
    }

    /// Loads configuration from a string.
    pub fn load_from_str(
        &self,
        content: &str,
        format: ConfigFormat,
    ) -> ConfigResult<EndpointConfig> {
        let mut config = parse_str(content, format)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    /// Resolves environment variable placeholders in content.
    ///
    /// Supports the format: `${VAR_NAME}` or `${VAR_NAME:default}`
    fn resolve_env_placeholders(&self, content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut chars = content.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // consume '{'

                let mut var_content = String::new();
                let mut found_close = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        found_close = true;
                        break;
                    }
                    var_content.push(c);
                }

                if !found_close {
                    result.push('$');
                    result.push('{');
                    result.push_str(&var_content);
                    continue;
                }

                let (var_name, default_value) = if let Some(idx) = var_content.find(':') {
                    (&var_content[..idx], Some(&var_content[idx + 1..]))
                } else {
                    (var_content.as_str(), None)
                };

                match env::var(var_name) {
                    Ok(value) => result.push_str(&value),
                    Err(_) => {
                        if let Some(default) = default_value {
                            result.push_str(default);
                        } else {
                            warn!("Environment variable '{}' not found", var_name);
                            result.push_str(&format!("${{{var_name}}}"));
                        }
                    }
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Applies `<prefix>_*` environment variable overrides.
    fn apply_env_overrides(&self, config: &mut EndpointConfig) -> ConfigResult<()> {
        if let Ok(value) = env::var(self.var("HOST")) {
            config.host = value;
        }
        if let Ok(value) = env::var(self.var("PORT")) {
            config.port = value.parse().map_err(|_| {
                ConfigError::invalid_env_var(self.var("PORT"), "expected valid port number")
            })?;
        }
        if let Ok(value) = env::var(self.var("DATABASE_NAME")) {
            config.database_name = value;
        }
        if let Ok(value) = env::var(self.var("MAX_CONNECTIONS")) {
            config.max_connections = value.parse().map_err(|_| {
                ConfigError::invalid_env_var(self.var("MAX_CONNECTIONS"), "expected valid number")
            })?;
        }
        if let Ok(value) = env::var(self.var("POLLING_INTERVAL_MS")) {
            config.polling_interval_ms = value.parse().map_err(|_| {
                ConfigError::invalid_env_var(
                    self.var("POLLING_INTERVAL_MS"),
                    "expected valid number",
                )
            })?;
        }
        if let Ok(value) = env::var(self.var("TIMEOUT_MS")) {
            config.timeout_ms = value.parse().map_err(|_| {
                ConfigError::invalid_env_var(self.var("TIMEOUT_MS"), "expected valid number")
            })?;
        }
        if let Ok(value) = env::var(self.var("AUTO_START")) {
            config.auto_start = parse_bool(&value);
        }
        if let Ok(value) = env::var(self.var("AUTO_CONNECT")) {
            config.auto_connect = parse_bool(&value);
        }
        if let Ok(value) = env::var(self.var("AUTO_CREATE_STATEMENT")) {
            config.auto_create_statement = parse_bool(&value);
        }
        if let Ok(value) = env::var(self.var("AUTO_TRANSACTION_HANDLING")) {
            config.auto_transaction_handling = parse_bool(&value);
        }
        Ok(())
    }

    fn var(&self, name: &str) -> String {
        format!("{}_{}", self.env_prefix, name)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_str<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> ConfigResult<T> {
    match format {
        ConfigFormat::Yaml => {
            let config = config::Config::builder()
                .add_source(config::File::from_str(content, config::FileFormat::Yaml))
                .build()
                .map_err(|e| ConfigError::serialization(e.to_string()))?;
            config
                .try_deserialize()
                .map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

/// Parses a boolean-ish environment value.
fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

/// Loads configuration from a file with default settings.
///
/// # Examples
///
/// ```no_run
/// use mimic_config::loader::load_config;
///
/// let config = load_config("endpoint.yaml").unwrap();
/// ```
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<EndpointConfig> {
    ConfigLoader::new().load(path)
}

// =============================================================================
// Tests
// =============================================================================
