// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod config;

use chrono::Utc;
use logplex_client::{Client, Stats};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ForwarderConfig;

const STATS_REPORT_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

#[tokio::main]
pub async fn main() {
    let config = match ForwarderConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading logplex-forwarder configuration: {e}");
            std::process::exit(2);
        }
    };

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", config.log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let client = match Client::new(config.client_config()) {
        Ok(c) => c,
        Err(e) => {
            error!("Error creating Logplex client: {e}");
            std::process::exit(2);
        }
    };

    info!(
        "Forwarding stdin to {} as {}/{}",
        config.url.host_str().unwrap_or_default(),
        config.host,
        config.proc_id
    );

    let interrupted = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupted, shutting down"),
            Err(e) => {
                error!("Unable to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    forward_lines(
        BufReader::new(tokio::io::stdin()),
        &client,
        &config,
        interrupted,
    )
    .await;

    // Ship what is left before closing; close alone abandons it.
    if let Err(e) = client.flush() {
        warn!("Final flush skipped: {e}");
    }
    if timeout(config.shutdown_timeout, client.close()).await.is_err() {
        warn!(
            "Timed out after {:?} waiting for in-flight deliveries",
            config.shutdown_timeout
        );
    }

    report(&client.statistics());
}

/// Buffer each line of `input` until it ends, fails, or `shutdown` resolves.
/// Lines are shipped as raw bytes; they need not be UTF-8.
async fn forward_lines<R>(
    input: R,
    client: &Client,
    config: &ForwarderConfig,
    shutdown: impl Future<Output = ()>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.split(b'\n');
    let mut report_interval = interval(STATS_REPORT_INTERVAL);
    report_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    report_interval.tick().await;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_segment() => match line {
                Ok(Some(line)) => {
                    if let Err(e) = client.buffer_message(
                        &Utc::now(),
                        &config.host,
                        &config.proc_id,
                        trim_line_ending(&line),
                    ) {
                        error!("{e}");
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Reached end of input");
                    break;
                }
                Err(e) => {
                    error!("Failed to read input: {e}");
                    break;
                }
            },
            _ = report_interval.tick() => report(&client.statistics()),
            () = &mut shutdown => break,
        }
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn report(stats: &Stats) {
    match serde_json::to_string(stats) {
        Ok(json) => info!("Delivery statistics: {json}"),
        Err(e) => error!("Failed to serialize statistics: {e}"),
    }
    if stats.dropped > 0 || stats.rejected > 0 || stats.cancelled > 0 {
        warn!(
            "{} of {} messages were not delivered",
            stats.dropped + stats.rejected + stats.cancelled,
            stats.total
        );
    }
}
