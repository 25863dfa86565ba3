// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The driver-facing adapter.
//!
//! [`DatabaseEndpoint`] is what the impersonated server hands to the driver
//! side: one method per operation, each returning an [`OperationResult`]
//! (never an error), with lifecycle enforcement against the registry and the
//! auto-* short-circuits applied per configuration:
//!
//! - `auto_connect` confirms connection open/close locally
//! - `auto_create_statement` confirms statement create/close locally
//! - `auto_handle_queries` answers matching `Execute`s locally
//! - `auto_transaction_handling` brackets each `Execute` in an implicit
//!   transaction and keeps driver transaction boundaries away from the script
//!
//! Registry transitions implied by a forwarded operation are applied only
//! after the script confirms it; on timeout or scripted failure no state
//! rolls forward.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use mimic_config::EndpointConfig;
use mimic_core::operation::{Operation, OperationResult};
use mimic_core::registry::ConnectionRegistry;
use mimic_core::rules::AutoHandleRules;
use mimic_core::types::{ConnectionId, ConnectionProperty, DataSet, StatementId};
use mimic_wire::WireFormat;

use crate::error::EndpointError;
use crate::gateway::{CorrelationGateway, GatewayConfig, OperationResponder, ScriptChannel};

// =============================================================================
// Statistics
// =============================================================================

#[derive(Debug, Default)]
struct AtomicEndpointStats {
    operations: AtomicU64,
    auto_handled: AtomicU64,
    forwarded: AtomicU64,
    failures: AtomicU64,
}

/// A point-in-time snapshot of endpoint counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EndpointStats {
    /// Driver operations served.
    pub operations: u64,
    /// Executes answered locally by the rule engine.
    pub auto_handled: u64,
    /// Operations forwarded to the script.
    pub forwarded: u64,
    /// Operations that came back as failures.
    pub failures: u64,
}

// =============================================================================
// DatabaseEndpoint
// =============================================================================

/// A virtual database endpoint.
///
/// # Examples
///
/// ```
/// use mimic_config::EndpointConfig;
/// use mimic_endpoint::DatabaseEndpoint;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (endpoint, _script) = DatabaseEndpoint::new(EndpointConfig::default()).unwrap();
/// let (result, connection) = endpoint.open_connection(vec![]).await;
/// assert!(result.success);
/// assert!(connection.is_some());
/// # }
/// ```
pub struct DatabaseEndpoint {
    config: EndpointConfig,
    registry: ConnectionRegistry,
    rules: AutoHandleRules,
    responder: Arc<dyn OperationResponder>,
    started: AtomicBool,
    stats: AtomicEndpointStats,
}

impl DatabaseEndpoint {
    /// Creates an endpoint wired to a fresh script channel, using the JSON
    /// wire format.
    pub fn new(config: EndpointConfig) -> Result<(Self, ScriptChannel), EndpointError> {
        Self::with_format(config, WireFormat::default())
    }

    /// Creates an endpoint wired to a fresh script channel in the given
    /// wire format.
    pub fn with_format(
        config: EndpointConfig,
        format: WireFormat,
    ) -> Result<(Self, ScriptChannel), EndpointError> {
        let gateway_config = GatewayConfig {
            timeout: config.timeout(),
            polling_interval: config.polling_interval(),
            format,
            ..GatewayConfig::default()
        };
        let (gateway, channel) = CorrelationGateway::channel(gateway_config);
        let endpoint = Self::with_responder(config, Arc::new(gateway))?;
        Ok((endpoint, channel))
    }

    /// Creates an endpoint over an arbitrary responder. This is the seam
    /// tests use to substitute canned replies for a live script channel.
    pub fn with_responder(
        config: EndpointConfig,
        responder: Arc<dyn OperationResponder>,
    ) -> Result<Self, EndpointError> {
        let rules = AutoHandleRules::from_env(&config.auto_handle_queries)?;
        let registry = ConnectionRegistry::new(config.max_connections);
        let started = config.auto_start;
        let endpoint = Self {
            config,
            registry,
            rules,
            responder,
            started: AtomicBool::new(started),
            stats: AtomicEndpointStats::default(),
        };
        if started {
            info!(
                server = %endpoint.config.server_address(),
                database = %endpoint.config.database_name,
                max_connections = endpoint.config.max_connections,
                "virtual database endpoint started"
            );
        }
        Ok(endpoint)
    }

    /// Marks the endpoint started (a no-op when `auto_start` already did).
    pub fn start(&self) {
        if !self.started.swap(true, Ordering::SeqCst) {
            info!(
                server = %self.config.server_address(),
                database = %self.config.database_name,
                "virtual database endpoint started"
            );
        }
    }

    /// Marks the endpoint stopped; subsequent driver calls fail.
    pub fn stop(&self) {
        if self.started.swap(false, Ordering::SeqCst) {
            info!(server = %self.config.server_address(), "virtual database endpoint stopped");
        }
    }

    /// Returns whether the endpoint accepts driver calls.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Returns the endpoint configuration.
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Returns the lifecycle registry.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Returns a snapshot of the endpoint counters.
    pub fn stats(&self) -> EndpointStats {
        EndpointStats {
            operations: self.stats.operations.load(Ordering::Relaxed),
            auto_handled: self.stats.auto_handled.load(Ordering::Relaxed),
            forwarded: self.stats.forwarded.load(Ordering::Relaxed),
            failures: self.stats.failures.load(Ordering::Relaxed),
        }
    }

    // =========================================================================
    // Driver surface
    // =========================================================================

    /// Opens a connection. Returns the result and, on success, its id.
    pub async fn open_connection(
        &self,
        properties: Vec<ConnectionProperty>,
    ) -> (OperationResult, Option<ConnectionId>) {
        self.record_operation();
        match self.try_open_connection(properties).await {
            Ok(outcome) => self.finish_with_id(outcome),
            Err(e) => (self.fail("openConnection", e), None),
        }
    }

    async fn try_open_connection(
        &self,
        properties: Vec<ConnectionProperty>,
    ) -> Result<(OperationResult, Option<ConnectionId>), EndpointError> {
        self.ensure_started()?;
        let id = self.registry.allocate_connection_id();
        if !self.config.auto_connect {
            let reply = self
                .confirm(id.as_str(), Operation::open_connection(properties.clone()))
                .await?;
            if !reply.success {
                return Ok((reply, None));
            }
        }
        // Ceiling check happens here, after the script has confirmed.
        self.registry.open_connection(&id, properties)?;
        Ok((OperationResult::success(), Some(id)))
    }

    /// Closes a connection. Closing an unknown or already-closed id is a
    /// no-op success.
    pub async fn close_connection(&self, connection: &ConnectionId) -> OperationResult {
        self.record_operation();
        match self.try_close_connection(connection).await {
            Ok(result) => self.finish(result),
            Err(e) => self.fail("closeConnection", e),
        }
    }

    async fn try_close_connection(
        &self,
        connection: &ConnectionId,
    ) -> Result<OperationResult, EndpointError> {
        self.ensure_started()?;
        if !self.config.auto_connect {
            let reply = self
                .confirm(connection.as_str(), Operation::CloseConnection {})
                .await?;
            if !reply.success {
                return Ok(reply);
            }
        }
        // With auto transaction handling off, the driver never cleaned up
        // statements explicitly, so they are dropped with the connection.
        let drop_statements = !self.config.auto_transaction_handling;
        self.registry.close_connection(connection, drop_statements)?;
        Ok(OperationResult::success())
    }

    /// Creates a plain statement on `connection`.
    pub async fn create_statement(
        &self,
        connection: &ConnectionId,
    ) -> (OperationResult, Option<StatementId>) {
        self.record_operation();
        match self.try_create_statement(connection, None).await {
            Ok(outcome) => self.finish_with_id(outcome),
            Err(e) => (self.fail("createStatement", e), None),
        }
    }

    /// Creates a prepared statement for `sql` on `connection`.
    pub async fn create_prepared_statement(
        &self,
        connection: &ConnectionId,
        sql: &str,
    ) -> (OperationResult, Option<StatementId>) {
        self.record_operation();
        match self
            .try_create_statement(connection, Some(sql.to_string()))
            .await
        {
            Ok(outcome) => self.finish_with_id(outcome),
            Err(e) => (self.fail("createPreparedStatement", e), None),
        }
    }

    async fn try_create_statement(
        &self,
        connection: &ConnectionId,
        sql: Option<String>,
    ) -> Result<(OperationResult, Option<StatementId>), EndpointError> {
        self.ensure_started()?;
        self.registry.ensure_open(connection)?;
        if !self.config.auto_create_statement {
            let operation = match &sql {
                Some(sql) => Operation::create_prepared_statement(sql.clone()),
                None => Operation::CreateStatement {},
            };
            let reply = self.confirm(connection.as_str(), operation).await?;
            if !reply.success {
                return Ok((reply, None));
            }
        }
        let id = self.registry.create_statement(connection, sql)?;
        Ok((OperationResult::success(), Some(id)))
    }

    /// Closes the most recently created open statement on `connection`.
    pub async fn close_statement(&self, connection: &ConnectionId) -> OperationResult {
        self.record_operation();
        match self.try_close_statement(connection).await {
            Ok(result) => self.finish(result),
            Err(e) => self.fail("closeStatement", e),
        }
    }

    async fn try_close_statement(
        &self,
        connection: &ConnectionId,
    ) -> Result<OperationResult, EndpointError> {
        self.ensure_started()?;
        let statement = self.registry.current_statement(connection)?;
        if !self.config.auto_create_statement {
            let reply = self
                .confirm(connection.as_str(), Operation::CloseStatement {})
                .await?;
            if !reply.success {
                return Ok(reply);
            }
        }
        self.registry.close_statement(connection, &statement)?;
        Ok(OperationResult::success())
    }

    /// Executes `sql` on the current statement of `connection`.
    pub async fn execute(&self, connection: &ConnectionId, sql: &str) -> OperationResult {
        self.record_operation();
        match self.try_execute(connection, sql).await {
            Ok(result) => self.finish(result),
            Err(e) => self.fail("execute", e),
        }
    }

    async fn try_execute(
        &self,
        connection: &ConnectionId,
        sql: &str,
    ) -> Result<OperationResult, EndpointError> {
        self.ensure_started()?;
        self.registry.ensure_open(connection)?;
        self.registry.current_statement(connection)?;

        // Implicit transaction bracketing, hidden from the script side.
        let implicit_tx = self.config.auto_transaction_handling
            && !self.registry.transaction_active(connection)?;
        if implicit_tx {
            self.registry.begin_transaction(connection)?;
        }

        let result = if self.rules.matches(sql) {
            self.stats.auto_handled.fetch_add(1, Ordering::Relaxed);
            debug!(connection = %connection, sql, "query auto-handled");
            OperationResult::success()
                .with_affected_rows(0)
                .with_data_set(DataSet::empty())
        } else {
            match self.confirm(connection.as_str(), Operation::execute(sql)).await {
                Ok(reply) => reply,
                Err(e) => {
                    if implicit_tx {
                        let _ = self.registry.rollback_transaction(connection);
                    }
                    return Err(e);
                }
            }
        };

        if implicit_tx {
            if result.success {
                self.registry.commit_transaction(connection)?;
            } else {
                self.registry.rollback_transaction(connection)?;
            }
        }
        Ok(result)
    }

    /// Starts a transaction on `connection`.
    pub async fn start_transaction(&self, connection: &ConnectionId) -> OperationResult {
        self.record_operation();
        match self
            .try_transaction(connection, Operation::TransactionStarted {})
            .await
        {
            Ok(result) => self.finish(result),
            Err(e) => self.fail("transactionStarted", e),
        }
    }

    /// Commits the active transaction on `connection`.
    pub async fn commit_transaction(&self, connection: &ConnectionId) -> OperationResult {
        self.record_operation();
        match self
            .try_transaction(connection, Operation::TransactionCommitted {})
            .await
        {
            Ok(result) => self.finish(result),
            Err(e) => self.fail("transactionCommitted", e),
        }
    }

    /// Rolls back the active transaction on `connection`.
    pub async fn rollback_transaction(&self, connection: &ConnectionId) -> OperationResult {
        self.record_operation();
        match self
            .try_transaction(connection, Operation::TransactionRollback {})
            .await
        {
            Ok(result) => self.finish(result),
            Err(e) => self.fail("transactionRollback", e),
        }
    }

    async fn try_transaction(
        &self,
        connection: &ConnectionId,
        operation: Operation,
    ) -> Result<OperationResult, EndpointError> {
        self.ensure_started()?;
        self.registry.ensure_open(connection)?;
        // With auto transaction handling on, driver-issued boundaries are
        // tracked locally and never reach the script.
        if !self.config.auto_transaction_handling {
            let reply = self.confirm(connection.as_str(), operation.clone()).await?;
            if !reply.success {
                return Ok(reply);
            }
        }
        match operation {
            Operation::TransactionStarted {} => self.registry.begin_transaction(connection)?,
            Operation::TransactionCommitted {} => {
                self.registry.commit_transaction(connection)?
            }
            Operation::TransactionRollback {} => {
                self.registry.rollback_transaction(connection)?
            }
            _ => unreachable!("try_transaction called with a non-transaction operation"),
        }
        Ok(OperationResult::success())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn confirm(
        &self,
        correlation_id: &str,
        operation: Operation,
    ) -> Result<OperationResult, EndpointError> {
        self.stats.forwarded.fetch_add(1, Ordering::Relaxed);
        Ok(self.responder.respond(correlation_id, &operation).await?)
    }

    fn ensure_started(&self) -> Result<(), EndpointError> {
        if self.is_started() {
            Ok(())
        } else {
            Err(EndpointError::NotStarted)
        }
    }

    fn record_operation(&self) {
        self.stats.operations.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self, result: OperationResult) -> OperationResult {
        if !result.success {
            self.stats.failures.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    fn finish_with_id<T>(
        &self,
        (result, id): (OperationResult, Option<T>),
    ) -> (OperationResult, Option<T>) {
        (self.finish(result), id)
    }

    fn fail(&self, operation: &str, error: EndpointError) -> OperationResult {
        self.stats.failures.fetch_add(1, Ordering::Relaxed);
        warn!(
            operation,
            error = %error,
            error_type = error.error_type(),
            "operation failed"
        );
        error.to_operation_result()
    }
}

// =============================================================================
// Tests
// =============================================================================
