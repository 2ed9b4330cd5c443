// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The HTTP exchange used to deliver a bundle.
//!
//! [`Transport`] is implemented for [`reqwest::Client`], which owns TLS and
//! connection pooling. Tests plug in their own implementations to control
//! when and how an exchange completes.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use std::time::Duration;

pub const LOGPLEX_CONTENT_TYPE: &str = "application/logplex-1";
pub const MSG_COUNT_HEADER: &str = "logplex-msg-count";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connection(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one POST and return the response status once the exchange
    /// completes. Any failure to complete the exchange is an `Err`.
    async fn post(
        &self,
        url: &Url,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<StatusCode, TransportError>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn post(
        &self,
        url: &Url,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<StatusCode, TransportError> {
        let resp = reqwest::Client::post(self, url.clone())
            .headers(headers)
            .body(body)
            .send()
            .await?;
        Ok(resp.status())
    }
}

/// Headers sent with every bundle.
#[must_use]
pub fn bundle_headers(message_count: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(LOGPLEX_CONTENT_TYPE));
    headers.insert(
        HeaderName::from_static(MSG_COUNT_HEADER),
        HeaderValue::from(message_count),
    );
    headers
}
