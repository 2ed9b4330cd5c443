// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

/// Running statistics of the bundle currently being accrued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    /// Frames written into the bundle.
    pub number_framed: u64,
    /// Bytes of framed output held by the bundle.
    pub buffered: usize,
}

/// A batch of framed messages that is either being accrued to or has been
/// handed off for delivery.
///
/// Bundles move by value: the buffer store owns the active one until a swap,
/// after which the delivery worker owns it outright.
#[derive(Debug, Default)]
pub struct Bundle {
    message_count: u64,
    outbox: Vec<u8>,
}

impl Bundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_frame(&mut self) -> &mut Vec<u8> {
        self.message_count += 1;
        &mut self.outbox
    }

    #[must_use]
    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outbox.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.message_count == 0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.outbox
    }

    #[must_use]
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            number_framed: self.message_count,
            buffered: self.outbox.len(),
        }
    }

    /// Consume the bundle, yielding the request body.
    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.outbox
    }
}
