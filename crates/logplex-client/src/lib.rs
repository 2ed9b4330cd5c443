// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Client-side shipping of log lines to a Logplex endpoint.
//!
//! Log lines are framed into the length-prefixed syslog format Logplex
//! accepts, accrued into a [`bundle::Bundle`], and POSTed in batches. A
//! batch is sent once the active bundle crosses a byte threshold or on a
//! periodic tick for low-volume streams. The number of simultaneous POSTs
//! is capped; when no capacity is left the batch is dropped and counted
//! rather than queued.
//!
//! ```text
//!   buffer_message ──> BufferStore ──(size or tick)──> flusher::deliver
//!                                                       │
//!                                    Limiter::try_acquire ── none ──> Dropped
//!                                                       │
//!                                              Transport::post
//!                                                       │
//!                                  Successful / Rejected / Cancelled ──> Stats
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod buffer;
pub mod bundle;
pub mod client;
pub mod config;
pub mod errors;
pub mod flusher;
pub mod frame;
pub mod limiter;
pub mod stats;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::Client;
pub use config::Config;
pub use stats::Stats;
