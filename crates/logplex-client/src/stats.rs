// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery outcome accounting.
//!
//! Every non-empty delivery attempt lands in exactly one outcome, recorded
//! together with the totals under a single lock so a snapshot always
//! satisfies `total == dropped + cancelled + rejected + successful` (and the
//! same for the request-level counters).

use serde::Serialize;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Delivery workers running when the snapshot was taken.
    pub concurrency: i32,

    /// Messages in every attempted bundle.
    pub total: u64,
    /// Messages discarded because no delivery permit was free.
    pub dropped: u64,
    /// Messages whose POST could not be completed.
    pub cancelled: u64,
    /// Messages the endpoint answered with anything but 204.
    pub rejected: u64,
    /// Messages the endpoint accepted.
    pub successful: u64,

    pub total_requests: u64,
    pub dropped_requests: u64,
    pub cancel_requests: u64,
    pub reject_requests: u64,
    pub success_requests: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Dropped,
    Cancelled,
    Rejected,
    Successful,
}

#[derive(Debug, Default)]
pub struct StatsAggregator {
    counters: Mutex<Stats>,
    concurrency: AtomicI32,
}

impl StatsAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: Outcome, message_count: u64) {
        #[allow(clippy::expect_used)]
        let mut stats = self.counters.lock().expect("lock poisoned");
        stats.total += message_count;
        stats.total_requests += 1;

        match outcome {
            Outcome::Dropped => {
                stats.dropped += message_count;
                stats.dropped_requests += 1;
            }
            Outcome::Cancelled => {
                stats.cancelled += message_count;
                stats.cancel_requests += 1;
            }
            Outcome::Rejected => {
                stats.rejected += message_count;
                stats.reject_requests += 1;
            }
            Outcome::Successful => {
                stats.successful += message_count;
                stats.success_requests += 1;
            }
        }
    }

    pub fn snapshot(&self) -> Stats {
        #[allow(clippy::expect_used)]
        let stats = self.counters.lock().expect("lock poisoned");
        Stats {
            concurrency: self.concurrency.load(Ordering::Acquire),
            ..*stats
        }
    }

    #[must_use]
    pub fn concurrency(&self) -> i32 {
        self.concurrency.load(Ordering::Acquire)
    }

    /// Count a running delivery worker until the guard is dropped.
    pub fn enter_worker(&self) -> ConcurrencyGuard<'_> {
        self.concurrency.fetch_add(1, Ordering::AcqRel);
        ConcurrencyGuard { gauge: &self.concurrency }
    }
}

#[must_use]
pub struct ConcurrencyGuard<'a> {
    gauge: &'a AtomicI32,
}

impl Drop for ConcurrencyGuard<'_> {
    fn drop(&mut self) {
        self.gauge.fetch_sub(1, Ordering::AcqRel);
    }
}
