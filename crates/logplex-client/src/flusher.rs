// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The delivery worker.
//!
//! One call to [`Flusher::deliver`] is one delivery attempt:
//!
//! ```text
//! swap ── empty ──> done, nothing recorded
//!   │
//! try_acquire ── none ──> Dropped
//!   │
//! post ── transport error ──> Cancelled
//!   │ ── status != 204 ──> Rejected
//!   │ ── 204 ──> Successful
//!   │
//! permit released
//! ```
//!
//! Failed and dropped bundles are not retried.

use crate::buffer::BufferStore;
use crate::limiter::Limiter;
use crate::stats::{Outcome, StatsAggregator};
use crate::transport::TransportError;
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Flusher {
    store: Arc<BufferStore>,
    limiter: Limiter,
    stats: Arc<StatsAggregator>,
}

impl Flusher {
    pub fn new(store: Arc<BufferStore>, limiter: Limiter, stats: Arc<StatsAggregator>) -> Self {
        Self {
            store,
            limiter,
            stats,
        }
    }

    /// Swap out the active bundle and try to deliver it. Returns the recorded
    /// outcome, or `None` if there was nothing to send.
    pub async fn deliver(&self) -> Option<Outcome> {
        let bundle = self.store.swap();
        if bundle.is_empty() {
            return None;
        }
        let message_count = bundle.message_count();

        let Some(_permit) = self.limiter.try_acquire() else {
            warn!("No delivery capacity left, dropping {message_count} messages");
            self.stats.record(Outcome::Dropped, message_count);
            return Some(Outcome::Dropped);
        };
        let _live = self.stats.enter_worker();

        let outcome = classify(self.store.post(bundle).await);
        match outcome {
            Outcome::Successful => debug!("Delivered {message_count} messages"),
            _ => warn!("{outcome:?}: {message_count} messages were not delivered"),
        }
        self.stats.record(outcome, message_count);
        Some(outcome)
    }
}

/// Map the result of one exchange to its outcome. Only 204 counts as
/// delivered; any other completed exchange means the batch was not durably
/// accepted.
pub fn classify(result: Result<StatusCode, TransportError>) -> Outcome {
    match result {
        Ok(StatusCode::NO_CONTENT) => Outcome::Successful,
        Ok(status) => {
            debug!("{status}: Logplex did not accept the batch");
            Outcome::Rejected
        }
        Err(e) => {
            debug!("Error shipping logs: {e}");
            Outcome::Cancelled
        }
    }
}
