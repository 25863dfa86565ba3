// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Connection, statement, and transaction lifecycle registry.
//!
//! The registry is the single synchronization point for endpoint state. All
//! lifecycle transitions take one `parking_lot::Mutex` around the connection
//! map; id allocation uses atomic counters so ids stay unique even when
//! allocation happens before the script confirms the open.
//!
//! Transition rules:
//!
//! - opening a connection respects the `max_connections` ceiling
//! - closing an unknown or already-closed connection is a no-op
//! - statements require an open connection; `execute` targets the most
//!   recently created open statement
//! - a connection has at most one active transaction; commit/rollback require
//!   one, begin requires none

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::error::RegistryError;
use crate::types::{ConnectionId, ConnectionProperty, StatementId};

// =============================================================================
// Entries
// =============================================================================

#[derive(Debug)]
struct StatementRecord {
    id: StatementId,
    sql: Option<String>,
}

#[derive(Debug)]
struct ConnectionEntry {
    properties: Vec<ConnectionProperty>,
    statements: Vec<StatementRecord>,
    transaction_active: bool,
}

#[derive(Default)]
struct RegistryInner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

/// A point-in-time view of registry occupancy, for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    /// Number of open connections.
    pub open_connections: usize,
    /// Number of open statements across all connections.
    pub open_statements: usize,
    /// Number of connections with an active transaction.
    pub active_transactions: usize,
}

// =============================================================================
// ConnectionRegistry
// =============================================================================

/// Tracks the lifecycle state of every virtual connection.
///
/// # Examples
///
/// ```
/// use mimic_core::registry::ConnectionRegistry;
///
/// let registry = ConnectionRegistry::new(20);
/// let id = registry.allocate_connection_id();
/// registry.open_connection(&id, vec![]).unwrap();
/// assert_eq!(registry.snapshot().open_connections, 1);
/// ```
pub struct ConnectionRegistry {
    max_connections: usize,
    connection_seq: AtomicU64,
    statement_seq: AtomicU64,
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    /// Creates a registry with the given connection ceiling.
    pub fn new(max_connections: usize) -> Self {
        Self {
            max_connections,
            connection_seq: AtomicU64::new(0),
            statement_seq: AtomicU64::new(0),
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// Returns the configured connection ceiling.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Allocates the next connection id without opening it. The ceiling is
    /// checked at [`open_connection`](Self::open_connection), after the
    /// script has confirmed the open.
    pub fn allocate_connection_id(&self) -> ConnectionId {
        let n = self.connection_seq.fetch_add(1, Ordering::Relaxed) + 1;
        ConnectionId::new(format!("conn-{n}"))
    }

    /// Registers `id` as open.
    pub fn open_connection(
        &self,
        id: &ConnectionId,
        properties: Vec<ConnectionProperty>,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        if inner.connections.len() >= self.max_connections {
            return Err(RegistryError::capacity_exceeded(self.max_connections));
        }
        if inner.connections.contains_key(id) {
            return Err(RegistryError::invalid_transition(format!(
                "connection '{id}' is already open"
            )));
        }
        inner.connections.insert(
            id.clone(),
            ConnectionEntry {
                properties,
                statements: Vec::new(),
                transaction_active: false,
            },
        );
        debug!(connection = %id, open = inner.connections.len(), "connection opened");
        Ok(())
    }

    /// Closes `id`. Closing an unknown or already-closed connection is a
    /// no-op. When `drop_statements` is `false`, closing a connection that
    /// still has open statements is an invalid transition.
    pub fn close_connection(
        &self,
        id: &ConnectionId,
        drop_statements: bool,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.connections.get(id) else {
            debug!(connection = %id, "close of unknown connection ignored");
            return Ok(());
        };
        if !entry.statements.is_empty() && !drop_statements {
            return Err(RegistryError::invalid_transition(format!(
                "connection '{id}' still has {} open statement(s)",
                entry.statements.len()
            )));
        }
        inner.connections.remove(id);
        debug!(connection = %id, open = inner.connections.len(), "connection closed");
        Ok(())
    }

    /// Returns an error unless `id` is open.
    pub fn ensure_open(&self, id: &ConnectionId) -> Result<(), RegistryError> {
        let inner = self.inner.lock();
        if inner.connections.contains_key(id) {
            Ok(())
        } else {
            Err(RegistryError::invalid_transition(format!(
                "connection '{id}' is not open"
            )))
        }
    }

    /// Creates a statement on `connection`. `sql` is recorded for prepared
    /// statements.
    pub fn create_statement(
        &self,
        connection: &ConnectionId,
        sql: Option<String>,
    ) -> Result<StatementId, RegistryError> {
        let mut inner = self.inner.lock();
        let entry = inner.connections.get_mut(connection).ok_or_else(|| {
            RegistryError::invalid_transition(format!("connection '{connection}' is not open"))
        })?;
        let n = self.statement_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let id = StatementId::new(format!("stmt-{n}"));
        entry.statements.push(StatementRecord {
            id: id.clone(),
            sql,
        });
        debug!(connection = %connection, statement = %id, "statement created");
        Ok(id)
    }

    /// Closes `statement` on `connection`.
    pub fn close_statement(
        &self,
        connection: &ConnectionId,
        statement: &StatementId,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        let entry = inner.connections.get_mut(connection).ok_or_else(|| {
            RegistryError::invalid_transition(format!("connection '{connection}' is not open"))
        })?;
        let position = entry
            .statements
            .iter()
            .position(|s| &s.id == statement)
            .ok_or_else(|| {
                RegistryError::invalid_transition(format!(
                    "statement '{statement}' is not open on connection '{connection}'"
                ))
            })?;
        entry.statements.remove(position);
        debug!(connection = %connection, statement = %statement, "statement closed");
        Ok(())
    }

    /// Returns the most recently created open statement on `connection`.
    pub fn current_statement(
        &self,
        connection: &ConnectionId,
    ) -> Result<StatementId, RegistryError> {
        let inner = self.inner.lock();
        let entry = inner.connections.get(connection).ok_or_else(|| {
            RegistryError::invalid_transition(format!("connection '{connection}' is not open"))
        })?;
        entry
            .statements
            .last()
            .map(|s| s.id.clone())
            .ok_or_else(|| {
                RegistryError::invalid_transition(format!(
                    "no open statement on connection '{connection}'"
                ))
            })
    }

    /// Returns the SQL a prepared statement was created with, if any.
    pub fn statement_sql(
        &self,
        connection: &ConnectionId,
        statement: &StatementId,
    ) -> Option<String> {
        let inner = self.inner.lock();
        inner
            .connections
            .get(connection)?
            .statements
            .iter()
            .find(|s| &s.id == statement)?
            .sql
            .clone()
    }

    /// Returns the properties `connection` was opened with.
    pub fn connection_properties(
        &self,
        connection: &ConnectionId,
    ) -> Option<Vec<ConnectionProperty>> {
        let inner = self.inner.lock();
        inner
            .connections
            .get(connection)
            .map(|e| e.properties.clone())
    }

    /// Marks a transaction active on `connection`.
    pub fn begin_transaction(&self, connection: &ConnectionId) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        let entry = inner.connections.get_mut(connection).ok_or_else(|| {
            RegistryError::invalid_transition(format!("connection '{connection}' is not open"))
        })?;
        if entry.transaction_active {
            return Err(RegistryError::invalid_transition(format!(
                "transaction already active on connection '{connection}'"
            )));
        }
        entry.transaction_active = true;
        debug!(connection = %connection, "transaction started");
        Ok(())
    }

    /// Commits the active transaction on `connection`.
    pub fn commit_transaction(&self, connection: &ConnectionId) -> Result<(), RegistryError> {
        self.end_transaction(connection, "commit")
    }

    /// Rolls back the active transaction on `connection`.
    pub fn rollback_transaction(&self, connection: &ConnectionId) -> Result<(), RegistryError> {
        self.end_transaction(connection, "rollback")
    }

    fn end_transaction(
        &self,
        connection: &ConnectionId,
        verb: &str,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        let entry = inner.connections.get_mut(connection).ok_or_else(|| {
            RegistryError::invalid_transition(format!("connection '{connection}' is not open"))
        })?;
        if !entry.transaction_active {
            return Err(RegistryError::invalid_transition(format!(
                "{verb} without an active transaction on connection '{connection}'"
            )));
        }
        entry.transaction_active = false;
        debug!(connection = %connection, "transaction {}", verb);
        Ok(())
    }

    /// Returns whether `connection` has an active transaction.
    pub fn transaction_active(&self, connection: &ConnectionId) -> Result<bool, RegistryError> {
        let inner = self.inner.lock();
        inner
            .connections
            .get(connection)
            .map(|e| e.transaction_active)
            .ok_or_else(|| {
                RegistryError::invalid_transition(format!(
                    "connection '{connection}' is not open"
                ))
            })
    }

    /// Returns the number of open connections.
    pub fn open_connections(&self) -> usize {
        self.inner.lock().connections.len()
    }

    /// Takes a point-in-time occupancy snapshot.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.inner.lock();
        RegistrySnapshot {
            open_connections: inner.connections.len(),
            open_statements: inner
                .connections
                .values()
                .map(|e| e.statements.len())
                .sum(),
            active_transactions: inner
                .connections
                .values()
                .filter(|e| e.transaction_active)
                .count(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
