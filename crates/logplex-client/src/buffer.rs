// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Ownership of the active bundle.
//!
//! Appends and swaps share one lock, so frames inside a bundle keep the order
//! they were appended in and a swap never observes half a frame. `post` sends
//! a bundle that has already been swapped out; it does not touch the lock.
//! Callers own the task a `post` runs on, so waiting for sends to finish is
//! waiting for those tasks.

use crate::bundle::{BufferStats, Bundle};
use crate::config::Config;
use crate::errors::Creation;
use crate::frame::write_frame;
use crate::transport::{bundle_headers, Transport, TransportError};
use chrono::{DateTime, TimeZone};
use reqwest::{StatusCode, Url};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::trace;

pub struct BufferStore {
    url: Url,
    token: String,
    transport: Arc<dyn Transport>,
    request_timeout: Option<Duration>,
    active: Mutex<Bundle>,
}

impl BufferStore {
    pub fn new(config: &Config) -> Result<Self, Creation> {
        Ok(Self {
            url: config.authorized_url()?,
            token: config.token.clone(),
            transport: Arc::clone(&config.transport),
            request_timeout: config.request_timeout,
            active: Mutex::new(Bundle::new()),
        })
    }

    /// Frame `log` into the active bundle and return the bundle's running
    /// statistics, so the caller can decide whether to send without taking
    /// the lock again.
    pub fn append<Tz: TimeZone>(
        &self,
        when: &DateTime<Tz>,
        host: &str,
        proc_id: &str,
        log: &[u8],
    ) -> BufferStats {
        #[allow(clippy::expect_used)]
        let mut active = self.active.lock().expect("lock poisoned");
        write_frame(active.record_frame(), when, host, &self.token, proc_id, log);
        active.stats()
    }

    /// Replace the active bundle with an empty one and hand back the old one.
    pub fn swap(&self) -> Bundle {
        #[allow(clippy::expect_used)]
        let mut active = self.active.lock().expect("lock poisoned");
        std::mem::take(&mut *active)
    }

    pub fn statistics(&self) -> BufferStats {
        #[allow(clippy::expect_used)]
        let active = self.active.lock().expect("lock poisoned");
        active.stats()
    }

    /// POST a swapped-out bundle, giving up after `request_timeout` if set.
    pub async fn post(&self, bundle: Bundle) -> Result<StatusCode, TransportError> {
        let headers = bundle_headers(bundle.message_count());
        trace!(
            "Posting {} messages ({} bytes)",
            bundle.message_count(),
            bundle.len()
        );
        let exchange = self.transport.post(&self.url, headers, bundle.into_body());

        match self.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, exchange).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(limit)),
            },
            None => exchange.await,
        }
    }
}
