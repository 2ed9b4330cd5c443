// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The batching client and its delivery triggers.
//!
//! A delivery worker is spawned when:
//! - an append leaves the active bundle at or above `request_size_trigger`
//!   bytes,
//! - an append happens while `target_log_latency` is zero (no ticker runs,
//!   so every append is sent right away),
//! - the ticker fires and the active bundle is not empty.
//!
//! Closing the client rejects further appends, stops the ticker and waits
//! for running workers. The bundle being accrued at that point is not sent;
//! call [`Client::flush`] first to ship it.

use crate::buffer::BufferStore;
use crate::bundle::BufferStats;
use crate::config::Config;
use crate::errors::{Append, Creation};
use crate::flusher::Flusher;
use crate::limiter::Limiter;
use crate::stats::{Stats, StatsAggregator};
use chrono::{DateTime, TimeZone};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error};

pub struct Client {
    store: Arc<BufferStore>,
    flusher: Flusher,
    stats: Arc<StatsAggregator>,
    request_size_trigger: usize,
    runtime: Handle,
    workers: TaskTracker,
    finalize: CancellationToken,
    ticker: Mutex<Option<JoinHandle<()>>>,
    periodic: bool,
}

impl Client {
    /// Build a client. Must be called from within a tokio runtime; delivery
    /// workers and the ticker run on that runtime.
    pub fn new(config: Config) -> Result<Self, Creation> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| Creation::NoRuntime)?;

        let store = Arc::new(BufferStore::new(&config)?);
        let stats = Arc::new(StatsAggregator::new());
        let flusher = Flusher::new(
            Arc::clone(&store),
            Limiter::new(config.concurrency),
            Arc::clone(&stats),
        );
        let workers = TaskTracker::new();
        let finalize = CancellationToken::new();

        let periodic = !config.target_log_latency.is_zero();
        let ticker = periodic.then(|| {
            runtime.spawn(run_ticker(
                config.target_log_latency,
                Arc::clone(&store),
                flusher.clone(),
                workers.clone(),
                finalize.clone(),
            ))
        });

        debug!("Created Logplex client: {config:?}");

        Ok(Self {
            store,
            flusher,
            stats,
            request_size_trigger: config.request_size_trigger,
            runtime,
            workers,
            finalize,
            ticker: Mutex::new(ticker),
            periodic,
        })
    }

    /// Buffer one log line for best-effort delivery.
    ///
    /// The only error is [`Append::Closed`]; delivery failures show up in
    /// [`Client::statistics`] instead.
    pub fn buffer_message<Tz: TimeZone>(
        &self,
        when: &DateTime<Tz>,
        host: &str,
        proc_id: &str,
        log: &[u8],
    ) -> Result<(), Append> {
        if self.finalize.is_cancelled() {
            return Err(Append::Closed);
        }

        let buffered = self.store.append(when, host, proc_id, log);
        if buffered.buffered >= self.request_size_trigger || !self.periodic {
            self.spawn_worker();
        }
        Ok(())
    }

    /// Send whatever is buffered now, without waiting for a trigger.
    pub fn flush(&self) -> Result<(), Append> {
        if self.finalize.is_cancelled() {
            return Err(Append::Closed);
        }
        if self.store.statistics().number_framed > 0 {
            self.spawn_worker();
        }
        Ok(())
    }

    #[must_use]
    pub fn statistics(&self) -> Stats {
        self.stats.snapshot()
    }

    #[must_use]
    pub fn buffer_statistics(&self) -> BufferStats {
        self.store.statistics()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.finalize.is_cancelled()
    }

    /// Stop accepting messages and wait for running deliveries to finish.
    ///
    /// The wait is unbounded; wrap the call in `tokio::time::timeout` to cap
    /// it. Closing more than once is allowed and later calls only wait.
    pub async fn close(&self) {
        self.finalize.cancel();

        let ticker = {
            #[allow(clippy::expect_used)]
            let mut ticker = self.ticker.lock().expect("lock poisoned");
            ticker.take()
        };
        if let Some(ticker) = ticker {
            if let Err(e) = ticker.await {
                error!("Logplex ticker task failed: {e}");
            }
        }

        self.workers.close();
        self.workers.wait().await;

        let abandoned = self.store.statistics();
        if abandoned.number_framed > 0 {
            debug!(
                "Closed with {} unsent messages ({} bytes)",
                abandoned.number_framed, abandoned.buffered
            );
        }
    }

    fn spawn_worker(&self) {
        spawn_worker(&self.workers, &self.runtime, self.flusher.clone());
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Lets the ticker exit if the client is dropped without close().
        self.finalize.cancel();
    }
}

fn spawn_worker(workers: &TaskTracker, runtime: &Handle, flusher: Flusher) {
    workers.spawn_on(
        async move {
            flusher.deliver().await;
        },
        runtime,
    );
}

async fn run_ticker(
    period: Duration,
    store: Arc<BufferStore>,
    flusher: Flusher,
    workers: TaskTracker,
    finalize: CancellationToken,
) {
    let runtime = Handle::current();
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = finalize.cancelled() => break,
            _ = interval.tick() => {}
        }

        if store.statistics().number_framed > 0 {
            spawn_worker(&workers, &runtime, flusher.clone());
        }
    }

    debug!("Logplex ticker stopped");
}
