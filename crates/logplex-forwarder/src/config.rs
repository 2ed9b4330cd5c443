// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use logplex_client::config::{
    DEFAULT_CONCURRENCY, DEFAULT_REQUEST_SIZE_TRIGGER, DEFAULT_TARGET_LOG_LATENCY,
};
use logplex_client::Config;
use reqwest::Url;
use std::fmt;
use std::time::Duration;

const DEFAULT_PROC_ID: &str = "forwarder";
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the forwarder, read from `LOGPLEX_*` environment variables.
#[derive(Clone)]
pub struct ForwarderConfig {
    pub url: Url,
    pub token: String,
    pub host: String,
    pub proc_id: String,
    pub request_size_trigger: usize,
    pub concurrency: usize,
    pub target_log_latency: Duration,
    pub shutdown_timeout: Duration,
    pub log_level: String,
}

impl ForwarderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup("LOGPLEX_URL").ok_or(ConfigError::Missing("LOGPLEX_URL"))?;
        let url = Url::parse(&url)
            .map_err(|e| ConfigError::Invalid(format!("LOGPLEX_URL '{url}': {e}")))?;
        let token = lookup("LOGPLEX_TOKEN").ok_or(ConfigError::Missing("LOGPLEX_TOKEN"))?;

        let host = lookup("LOGPLEX_HOST")
            .or_else(|| lookup("HOSTNAME"))
            .unwrap_or_else(|| "localhost".to_string());
        let proc_id = lookup("LOGPLEX_PROC_ID").unwrap_or_else(|| DEFAULT_PROC_ID.to_string());

        let request_size_trigger = lookup("LOGPLEX_REQUEST_SIZE_TRIGGER")
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_REQUEST_SIZE_TRIGGER);
        let concurrency = lookup("LOGPLEX_CONCURRENCY")
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_CONCURRENCY);
        let target_log_latency = lookup("LOGPLEX_TARGET_LATENCY_MS")
            .and_then(|val| val.parse::<u64>().ok())
            .map_or(DEFAULT_TARGET_LOG_LATENCY, Duration::from_millis);
        let shutdown_timeout = lookup("LOGPLEX_SHUTDOWN_TIMEOUT_MS")
            .and_then(|val| val.parse::<u64>().ok())
            .map_or(DEFAULT_SHUTDOWN_TIMEOUT, Duration::from_millis);
        let log_level = lookup("LOGPLEX_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|| "info".to_string());

        let config = Self {
            url,
            token,
            host,
            proc_id,
            request_size_trigger,
            concurrency,
            target_log_latency,
            shutdown_timeout,
            log_level,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("LOGPLEX_HOST", &self.host), ("LOGPLEX_PROC_ID", &self.proc_id)] {
            if value.is_empty() || value.contains(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a single non-empty word, got '{value}'"
                )));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        self.client_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn client_config(&self) -> Config {
        Config::new(self.url.clone(), self.token.clone())
            .with_request_size_trigger(self.request_size_trigger)
            .with_concurrency(self.concurrency)
            .with_target_log_latency(self.target_log_latency)
    }
}

impl fmt::Debug for ForwarderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut redacted = self.url.clone();
        if redacted.password().is_some() {
            let _ = redacted.set_password(Some("redacted"));
        }
        f.debug_struct("ForwarderConfig")
            .field("url", &redacted.as_str())
            .field("host", &self.host)
            .field("proc_id", &self.proc_id)
            .field("request_size_trigger", &self.request_size_trigger)
            .field("concurrency", &self.concurrency)
            .field("target_log_latency", &self.target_log_latency)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}
