// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Correlation gateway between the driver-facing side and the test script.
//!
//! The driver-facing adapter makes one blocking call per operation. The test
//! script drains a single shared channel and replies whenever it likes. The
//! gateway bridges the two:
//!
//! - [`CorrelationGateway::submit`] encodes the operation, registers a
//!   oneshot reply slot under the operation's correlation id, publishes a
//!   [`ScriptRequest`], and awaits the slot with a timeout
//! - [`ScriptChannel`] is the script's end: receive requests, send replies
//!
//! Reply matching is FIFO per correlation id: a reply completes the *oldest*
//! outstanding request for that id. Replies for an id with no outstanding
//! request are dropped with a warning; a caller that timed out withdraws its
//! slot, so a late reply can never reach a released caller.
//!
//! # Architecture
//!
//! ```text
//! driver side                                script side
//! ───────────                                ───────────
//! submit(id, op) ──┐
//!                  │ encode      ScriptRequest
//!                  ├────────── mpsc ──────────▶ recv()
//!   await oneshot ◀┤                            ...
//!     (timeout)    │ OperationResult            respond(id, payload)
//!                  └◀───────── oneshot ─────────┘
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use mimic_core::dataset::{DataSetBuilder, PayloadFormat};
use mimic_core::operation::{Operation, OperationResult};
use mimic_wire::{
    decode_operation, decode_operation_result, encode_operation, WireError, WireFormat,
};

use crate::error::{EndpointError, GatewayError};

// =============================================================================
// ScriptRequest
// =============================================================================

/// An encoded operation published on the script-facing channel.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptRequest {
    /// Unique request id.
    pub id: Uuid,
    /// Correlation id (the originating connection's id).
    pub correlation_id: String,
    /// The wire-encoded operation.
    pub payload: String,
    /// When the request was submitted.
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// GatewayConfig
// =============================================================================

/// Gateway tuning knobs.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// How long `submit` waits for a scripted reply.
    pub timeout: Duration,
    /// Script-side polling cadence (used by [`ScriptChannel::poll`]).
    pub polling_interval: Duration,
    /// Capacity of the script-facing channel.
    pub capacity: usize,
    /// Wire format for encoded requests and decoded replies.
    pub format: WireFormat,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            polling_interval: Duration::from_millis(500),
            capacity: 64,
            format: WireFormat::Json,
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

#[derive(Debug, Default)]
struct AtomicGatewayStats {
    submitted: AtomicU64,
    completed: AtomicU64,
    timed_out: AtomicU64,
    dropped: AtomicU64,
}

/// A point-in-time snapshot of gateway counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GatewayStats {
    /// Requests published to the script channel.
    pub submitted: u64,
    /// Replies delivered to a waiting caller.
    pub completed: u64,
    /// Requests that timed out waiting.
    pub timed_out: u64,
    /// Replies dropped for want of an outstanding request.
    pub dropped: u64,
}

// =============================================================================
// OperationResponder
// =============================================================================

/// The seam between the driver-facing adapter and whatever answers
/// operations. Production code uses the [`CorrelationGateway`]; tests may
/// substitute a canned responder.
#[async_trait]
pub trait OperationResponder: Send + Sync {
    /// Resolves `operation` under `correlation_id` to a result.
    async fn respond(
        &self,
        correlation_id: &str,
        operation: &Operation,
    ) -> Result<OperationResult, GatewayError>;
}

// =============================================================================
// CorrelationGateway
// =============================================================================

struct PendingReply {
    token: Uuid,
    tx: oneshot::Sender<OperationResult>,
}

struct GatewayShared {
    pending: DashMap<String, VecDeque<PendingReply>>,
    stats: AtomicGatewayStats,
}

impl GatewayShared {
    /// Delivers `result` to the oldest outstanding request for
    /// `correlation_id`. Returns `false` when nothing was waiting.
    fn complete(&self, correlation_id: &str, result: OperationResult) -> bool {
        if let Some(mut queue) = self.pending.get_mut(correlation_id) {
            while let Some(reply) = queue.pop_front() {
                // A dead receiver means that caller already timed out
                // between withdrawal and now; try the next one.
                if reply.tx.send(result.clone()).is_ok() {
                    self.stats.completed.fetch_add(1, Ordering::Relaxed);
                    return true;
                }
            }
        }
        self.stats.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(
            correlation_id,
            "reply with no outstanding request dropped"
        );
        false
    }

    /// Removes a caller's own reply slot after a timeout.
    fn withdraw(&self, correlation_id: &str, token: Uuid) {
        if let Some(mut queue) = self.pending.get_mut(correlation_id) {
            queue.retain(|p| p.token != token);
        }
    }
}

/// The driver-facing half of the gateway. Cheap to clone.
#[derive(Clone)]
pub struct CorrelationGateway {
    shared: Arc<GatewayShared>,
    outbound: mpsc::Sender<ScriptRequest>,
    config: GatewayConfig,
}

impl CorrelationGateway {
    /// Creates a connected gateway / script-channel pair.
    pub fn channel(config: GatewayConfig) -> (Self, ScriptChannel) {
        let (tx, rx) = mpsc::channel(config.capacity);
        let shared = Arc::new(GatewayShared {
            pending: DashMap::new(),
            stats: AtomicGatewayStats::default(),
        });
        let gateway = Self {
            shared: Arc::clone(&shared),
            outbound: tx,
            config: config.clone(),
        };
        let channel = ScriptChannel {
            inbound: rx,
            shared,
            format: config.format,
            polling_interval: config.polling_interval,
        };
        (gateway, channel)
    }

    /// Publishes `operation` for the script and blocks (asynchronously) for
    /// the correlated reply, up to the configured timeout.
    pub async fn submit(
        &self,
        correlation_id: &str,
        operation: &Operation,
    ) -> Result<OperationResult, GatewayError> {
        let payload = encode_operation(operation, self.config.format)?;
        let token = Uuid::now_v7();
        let (tx, rx) = oneshot::channel();

        self.shared
            .pending
            .entry(correlation_id.to_string())
            .or_default()
            .push_back(PendingReply { token, tx });

        let request = ScriptRequest {
            id: token,
            correlation_id: correlation_id.to_string(),
            payload,
            timestamp: Utc::now(),
        };
        if self.outbound.send(request).await.is_err() {
            self.shared.withdraw(correlation_id, token);
            return Err(GatewayError::ChannelClosed);
        }
        self.shared.stats.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(
            correlation_id,
            operation = operation.name(),
            "operation published to script channel"
        );

        match tokio::time::timeout(self.config.timeout, rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(GatewayError::ChannelClosed),
            Err(_) => {
                self.shared.withdraw(correlation_id, token);
                self.shared.stats.timed_out.fetch_add(1, Ordering::Relaxed);
                warn!(
                    correlation_id,
                    operation = operation.name(),
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "no scripted reply within timeout"
                );
                Err(GatewayError::Timeout {
                    timeout: self.config.timeout,
                })
            }
        }
    }

    /// Returns a snapshot of the gateway counters.
    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            submitted: self.shared.stats.submitted.load(Ordering::Relaxed),
            completed: self.shared.stats.completed.load(Ordering::Relaxed),
            timed_out: self.shared.stats.timed_out.load(Ordering::Relaxed),
            dropped: self.shared.stats.dropped.load(Ordering::Relaxed),
        }
    }

    /// Returns the wire format in use.
    pub fn format(&self) -> WireFormat {
        self.config.format
    }
}

#[async_trait]
impl OperationResponder for CorrelationGateway {
    async fn respond(
        &self,
        correlation_id: &str,
        operation: &Operation,
    ) -> Result<OperationResult, GatewayError> {
        self.submit(correlation_id, operation).await
    }
}

// =============================================================================
// ScriptChannel
// =============================================================================

/// The script-facing half of the gateway: the test drains requests from here
/// and replies through here.
pub struct ScriptChannel {
    inbound: mpsc::Receiver<ScriptRequest>,
    shared: Arc<GatewayShared>,
    format: WireFormat,
    polling_interval: Duration,
}

impl ScriptChannel {
    /// Receives the next request, waiting as long as it takes.
    pub async fn recv(&mut self) -> Option<ScriptRequest> {
        self.inbound.recv().await
    }

    /// Receives the next request without waiting.
    pub fn try_recv(&mut self) -> Option<ScriptRequest> {
        self.inbound.try_recv().ok()
    }

    /// Receives the next request, waiting at most `wait`.
    pub async fn recv_timeout(&mut self, wait: Duration) -> Option<ScriptRequest> {
        tokio::time::timeout(wait, self.inbound.recv())
            .await
            .ok()
            .flatten()
    }

    /// Receives the next request, waiting one polling interval.
    pub async fn poll(&mut self) -> Option<ScriptRequest> {
        let wait = self.polling_interval;
        self.recv_timeout(wait).await
    }

    /// Decodes the operation carried by `request`.
    pub fn operation(&self, request: &ScriptRequest) -> Result<Operation, WireError> {
        decode_operation(&request.payload, self.format)
    }

    /// Replies to the oldest outstanding request under `correlation_id` with
    /// a raw payload.
    ///
    /// The payload is first decoded as a wire `OperationResult`; failing
    /// that, it is treated as a bare dataset payload (JSON rows or an XML
    /// `<dataset>` document) and wrapped in a success result. Returns whether
    /// a waiting caller received the reply.
    pub fn respond(
        &self,
        correlation_id: &str,
        payload: &str,
    ) -> Result<bool, EndpointError> {
        let result = match decode_operation_result(payload, self.format) {
            Ok(result) => result,
            Err(_) => {
                let format = match self.format {
                    WireFormat::Json => PayloadFormat::Json,
                    WireFormat::Xml => PayloadFormat::Xml,
                };
                let data_set = DataSetBuilder::from_text(payload, Some(format))?;
                OperationResult::success().with_data_set(data_set)
            }
        };
        Ok(self.complete(correlation_id, result))
    }

    /// Replies with an already-built result. Returns whether a waiting
    /// caller received it.
    pub fn complete(&self, correlation_id: &str, result: OperationResult) -> bool {
        self.shared.complete(correlation_id, result)
    }

    /// Returns the wire format in use.
    pub fn format(&self) -> WireFormat {
        self.format
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> GatewayConfig {
        GatewayConfig {
            timeout: Duration::from_millis(200),
            polling_interval: Duration::from_millis(20),
            capacity: 16,
            format: WireFormat::Json,
        }
    }

    #[tokio::test]
    async fn submit_returns_the_scripted_reply() {
        let (gateway, mut script) = CorrelationGateway::channel(fast_config());

        let handle = tokio::spawn(async move {
            gateway
                .submit("conn-1", &Operation::execute("SELECT name FROM users"))
                .await
        });

        let request = script.recv().await.unwrap();
        assert_eq!(request.correlation_id, "conn-1");
        let op = script.operation(&request).unwrap();
        assert_eq!(op.sql(), Some("SELECT name FROM users"));

        let delivered = script
            .respond("conn-1", r#"[{"name":"alice"},{"name":"bob"}]"#)
            .unwrap();
        assert!(delivered);

        let result = handle.await.unwrap().unwrap();
        assert!(result.success);
        assert_eq!(result.data_set.unwrap().row_count(), 2);
    }

    #[tokio::test]
    async fn submit_times_out_without_a_reply() {
        let (gateway, mut script) = CorrelationGateway::channel(fast_config());

        let started = tokio::time::Instant::now();
        let err = gateway
            .submit("conn-1", &Operation::CloseConnection {})
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Timeout { .. }));
        assert!(started.elapsed() >= Duration::from_millis(200));

        // The request was still published.
        assert!(script.try_recv().is_some());
        assert_eq!(gateway.stats().timed_out, 1);
    }

    #[tokio::test]
    async fn late_reply_after_timeout_is_dropped() {
        let (gateway, mut script) = CorrelationGateway::channel(fast_config());

        let _ = gateway
            .submit("conn-1", &Operation::execute("UPDATE t SET x = 1"))
            .await
            .unwrap_err();
        let _ = script.recv().await.unwrap();

        let delivered = script.complete("conn-1", OperationResult::success());
        assert!(!delivered);
        assert_eq!(gateway.stats().dropped, 1);
    }

    #[tokio::test]
    async fn replies_match_oldest_request_first() {
        let (gateway, mut script) = CorrelationGateway::channel(fast_config());

        let g1 = gateway.clone();
        let first = tokio::spawn(async move {
            g1.submit("conn-1", &Operation::execute("first")).await
        });
        let req1 = script.recv().await.unwrap();
        assert!(req1.payload.contains("first"));

        let g2 = gateway.clone();
        let second = tokio::spawn(async move {
            g2.submit("conn-1", &Operation::execute("second")).await
        });
        let _req2 = script.recv().await.unwrap();

        script.complete("conn-1", OperationResult::success().with_affected_rows(1));
        script.complete("conn-1", OperationResult::success().with_affected_rows(2));

        assert_eq!(first.await.unwrap().unwrap().affected_rows, Some(1));
        assert_eq!(second.await.unwrap().unwrap().affected_rows, Some(2));
    }

    #[tokio::test]
    async fn different_correlation_ids_do_not_interfere() {
        let (gateway, mut script) = CorrelationGateway::channel(fast_config());

        let g1 = gateway.clone();
        let a = tokio::spawn(
            async move { g1.submit("conn-1", &Operation::execute("a")).await },
        );
        let g2 = gateway.clone();
        let b = tokio::spawn(
            async move { g2.submit("conn-2", &Operation::execute("b")).await },
        );
        let _ = script.recv().await.unwrap();
        let _ = script.recv().await.unwrap();

        script.complete("conn-2", OperationResult::failure("nope"));
        script.complete("conn-1", OperationResult::success());

        assert!(a.await.unwrap().unwrap().success);
        assert!(!b.await.unwrap().unwrap().success);
    }

    #[tokio::test]
    async fn respond_accepts_full_result_payloads() {
        let (gateway, mut script) = CorrelationGateway::channel(fast_config());

        let handle = tokio::spawn(async move {
            gateway
                .submit("conn-1", &Operation::execute("DELETE FROM t"))
                .await
        });
        let _ = script.recv().await.unwrap();
        script
            .respond("conn-1", r#"{"success":true,"affectedRows":3}"#)
            .unwrap();
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.rows_updated(), 3);
    }

    #[tokio::test]
    async fn submit_fails_when_script_channel_is_gone() {
        let (gateway, script) = CorrelationGateway::channel(fast_config());
        drop(script);
        let err = gateway
            .submit("conn-1", &Operation::CreateStatement {})
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ChannelClosed));
    }
}
