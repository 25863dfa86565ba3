// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Builders
//!
//! Small construction helpers so tests read as scenarios, not plumbing.

use mimic_config::EndpointConfig;
use mimic_core::types::{ConnectionProperty, DataSet, Row};

/// Builder for endpoint configurations.
///
/// Starts from defaults; each setter overrides one knob.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: EndpointConfig,
}

impl ConfigBuilder {
    /// Creates a builder over the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connection ceiling.
    pub fn max_connections(mut self, max: usize) -> Self {
        self.config.max_connections = max;
        self
    }

    /// Sets the reply timeout in milliseconds.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    /// Sets the polling interval in milliseconds.
    pub fn polling_interval_ms(mut self, polling_interval_ms: u64) -> Self {
        self.config.polling_interval_ms = polling_interval_ms;
        self
    }

    /// Sets `auto_start`.
    pub fn auto_start(mut self, enabled: bool) -> Self {
        self.config.auto_start = enabled;
        self
    }

    /// Sets `auto_connect`.
    pub fn auto_connect(mut self, enabled: bool) -> Self {
        self.config.auto_connect = enabled;
        self
    }

    /// Sets `auto_create_statement`.
    pub fn auto_create_statement(mut self, enabled: bool) -> Self {
        self.config.auto_create_statement = enabled;
        self
    }

    /// Sets `auto_transaction_handling`.
    pub fn auto_transaction_handling(mut self, enabled: bool) -> Self {
        self.config.auto_transaction_handling = enabled;
        self
    }

    /// Replaces the auto-handle pattern list.
    pub fn auto_handle_queries<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.auto_handle_queries = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Disables every auto-* shortcut so all operations reach the script.
    pub fn fully_scripted(self) -> Self {
        self.auto_connect(false)
            .auto_create_statement(false)
            .auto_transaction_handling(false)
            .auto_handle_queries(Vec::<String>::new())
    }

    /// Returns the finished configuration.
    pub fn build(self) -> EndpointConfig {
        self.config
    }
}

/// Builds a [`Row`] from `(column, value)` pairs.
pub fn row(cells: &[(&str, serde_json::Value)]) -> Row {
    let mut row = Row::new();
    for (column, value) in cells {
        row.set(*column, value.clone());
    }
    row
}

/// Builds a [`DataSet`] from rows, deriving columns in first-seen order.
pub fn dataset(rows: Vec<Row>) -> DataSet {
    DataSet::from_rows(rows)
}

/// Builds a connection-property list from `(name, value)` pairs.
pub fn properties(pairs: &[(&str, &str)]) -> Vec<ConnectionProperty> {
    pairs
        .iter()
        .map(|(name, value)| ConnectionProperty::new(*name, *value))
        .collect()
}
