// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Transports with scripted behavior for unit tests.

use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// Answers every request with the same status.
pub(crate) struct StaticTransport {
    status: StatusCode,
    calls: AtomicUsize,
}

impl StaticTransport {
    pub(crate) fn new(status: StatusCode) -> Self {
        Self {
            status,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn post(
        &self,
        _url: &Url,
        _headers: HeaderMap,
        _body: Vec<u8>,
    ) -> Result<StatusCode, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.status)
    }
}

/// Never completes an exchange.
pub(crate) struct FailingTransport;

#[async_trait]
impl Transport for FailingTransport {
    async fn post(
        &self,
        _url: &Url,
        _headers: HeaderMap,
        _body: Vec<u8>,
    ) -> Result<StatusCode, TransportError> {
        Err(TransportError::Connection("connection reset".to_string()))
    }
}

/// Holds each exchange open until the test releases it, then answers 204.
pub(crate) struct GatedTransport {
    gate: Semaphore,
    started: AtomicUsize,
}

impl GatedTransport {
    pub(crate) fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
        }
    }

    /// Let `n` held exchanges complete.
    pub(crate) fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub(crate) fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn post(
        &self,
        _url: &Url,
        _headers: HeaderMap,
        _body: Vec<u8>,
    ) -> Result<StatusCode, TransportError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        match self.gate.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => return Err(TransportError::Connection("gate closed".to_string())),
        }
        Ok(StatusCode::NO_CONTENT)
    }
}
