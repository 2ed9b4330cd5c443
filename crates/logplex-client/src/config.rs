// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::errors::Creation;
use crate::transport::Transport;
use reqwest::Url;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_REQUEST_SIZE_TRIGGER: usize = 100 * 1024;
pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_TARGET_LOG_LATENCY: Duration = Duration::from_secs(1);

/// Username injected into the endpoint URL when it carries no credentials.
const DEFAULT_URL_USER: &str = "token";

/// Configuration of a [`crate::Client`].
///
/// The client takes the configuration by value, so later changes to a copy
/// held by the caller never reach a running client.
#[derive(Clone)]
pub struct Config {
    /// Logplex endpoint. Credentials may be given as URL userinfo; otherwise
    /// the token is used as the password.
    pub url: Url,
    /// Logplex token, also written into every frame.
    pub token: String,
    pub transport: Arc<dyn Transport>,
    /// Buffered byte count at which an append triggers a delivery.
    pub request_size_trigger: usize,
    /// Maximum number of simultaneous POSTs.
    pub concurrency: usize,
    /// Tick period for flushing low-volume streams. Zero sends on every append.
    pub target_log_latency: Duration,
    /// Upper bound on a single exchange; a request running longer is cancelled.
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Defaults with a fresh `reqwest::Client` as transport.
    #[must_use]
    pub fn new(url: Url, token: impl Into<String>) -> Self {
        Self {
            url,
            token: token.into(),
            transport: Arc::new(reqwest::Client::new()),
            request_size_trigger: DEFAULT_REQUEST_SIZE_TRIGGER,
            concurrency: DEFAULT_CONCURRENCY,
            target_log_latency: DEFAULT_TARGET_LOG_LATENCY,
            request_timeout: None,
        }
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    #[must_use]
    pub fn with_request_size_trigger(mut self, bytes: usize) -> Self {
        self.request_size_trigger = bytes;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn with_target_log_latency(mut self, latency: Duration) -> Self {
        self.target_log_latency = latency;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), Creation> {
        if self.concurrency == 0 {
            return Err(Creation::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }

        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(Creation::InvalidConfig(format!(
                "unsupported URL scheme '{}'",
                self.url.scheme()
            )));
        }

        if self.token.contains(char::is_whitespace) {
            // The token is a field of every frame.
            return Err(Creation::InvalidConfig(
                "token must not contain whitespace".to_string(),
            ));
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(Creation::InvalidConfig(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// The endpoint with credentials filled in.
    pub(crate) fn authorized_url(&self) -> Result<Url, Creation> {
        let mut url = self.url.clone();
        if url.username().is_empty() && url.password().is_none() {
            url.set_username(DEFAULT_URL_USER)
                .and_then(|()| url.set_password(Some(&self.token)))
                .map_err(|()| {
                    Creation::InvalidConfig(format!("URL '{}' cannot carry credentials", self.url))
                })?;
        }
        Ok(url)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut redacted = self.url.clone();
        if redacted.password().is_some() {
            let _ = redacted.set_password(Some("redacted"));
        }
        f.debug_struct("Config")
            .field("url", &redacted.as_str())
            .field("request_size_trigger", &self.request_size_trigger)
            .field("concurrency", &self.concurrency)
            .field("target_log_latency", &self.target_log_latency)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}
