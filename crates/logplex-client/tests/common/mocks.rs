// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock transports for driving the client without a network.

use logplex_client::transport::{Transport, TransportError};
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;

/// Records each request's message count and holds it open until released.
pub struct HoldingTransport {
    gate: Semaphore,
    started: AtomicUsize,
    pub message_counts: Mutex<Vec<String>>,
}

impl HoldingTransport {
    pub fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
            message_counts: Mutex::new(Vec::new()),
        }
    }

    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for HoldingTransport {
    async fn post(
        &self,
        _url: &Url,
        headers: HeaderMap,
        _body: Vec<u8>,
    ) -> Result<StatusCode, TransportError> {
        let count = headers
            .get("logplex-msg-count")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.message_counts.lock().unwrap().push(count);
        self.started.fetch_add(1, Ordering::SeqCst);

        self.gate
            .acquire()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?
            .forget();
        Ok(StatusCode::NO_CONTENT)
    }
}
