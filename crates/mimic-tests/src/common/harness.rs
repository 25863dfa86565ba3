// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! An endpoint wired to its script channel, with helpers to run the script
//! side as a background task so tests read like a driver session.

use std::sync::Arc;

use tokio::task::JoinHandle;

use mimic_config::EndpointConfig;
use mimic_endpoint::{DatabaseEndpoint, ScriptChannel, ScriptRequest};
use mimic_wire::WireFormat;

/// A connected endpoint / script pair for end-to-end tests.
pub struct EndpointHarness {
    /// The driver-facing endpoint under test.
    pub endpoint: Arc<DatabaseEndpoint>,
    script: Option<ScriptChannel>,
}

impl EndpointHarness {
    /// Creates a harness in the JSON wire format.
    pub fn new(config: EndpointConfig) -> Self {
        Self::with_format(config, WireFormat::Json)
    }

    /// Creates a harness in the given wire format.
    pub fn with_format(config: EndpointConfig, format: WireFormat) -> Self {
        let (endpoint, script) =
            DatabaseEndpoint::with_format(config, format).expect("valid test configuration");
        Self {
            endpoint: Arc::new(endpoint),
            script: Some(script),
        }
    }

    /// Takes ownership of the script channel for manual driving.
    ///
    /// # Panics
    ///
    /// Panics if the channel was already taken or spawned.
    pub fn take_script(&mut self) -> ScriptChannel {
        self.script.take().expect("script channel already taken")
    }

    /// Runs the script side in a background task. Each incoming request is
    /// passed to `reply`; `Some(payload)` answers it, `None` leaves it
    /// unanswered (simulating a silent script). Returns a handle yielding
    /// the number of answered requests once the endpoint side is dropped.
    pub fn spawn_script<F>(&mut self, mut reply: F) -> JoinHandle<u64>
    where
        F: FnMut(&ScriptRequest) -> Option<String> + Send + 'static,
    {
        let mut script = self.take_script();
        tokio::spawn(async move {
            let mut answered = 0;
            while let Some(request) = script.recv().await {
                if let Some(payload) = reply(&request) {
                    let _ = script.respond(&request.correlation_id, &payload);
                    answered += 1;
                }
            }
            answered
        })
    }

    /// Runs a script that answers every request with the same payload.
    pub fn spawn_echo_script(&mut self, payload: impl Into<String>) -> JoinHandle<u64> {
        let payload = payload.into();
        self.spawn_script(move |_| Some(payload.clone()))
    }
}
