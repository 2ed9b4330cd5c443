// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors raised while building a [`crate::Client`]. No client is produced.
#[derive(Debug, thiserror::Error)]
pub enum Creation {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Client must be created inside a tokio runtime")]
    NoRuntime,
}

/// Errors returned synchronously to callers of `buffer_message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Append {
    #[error("Failed trying to buffer a message: client already closed")]
    Closed,
}
