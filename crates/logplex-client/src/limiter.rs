// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Bound on simultaneous deliveries.
//!
//! Acquisition never waits: a delivery that finds the pool empty is dropped
//! instead of queued, which keeps the producer live and memory bounded when
//! the endpoint is slow.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Authorizes one in-flight POST. Returned to the pool on drop.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

#[derive(Debug, Clone)]
pub struct Limiter {
    permits: Arc<Semaphore>,
}

impl Limiter {
    /// A limiter holding `capacity` permits, all immediately available.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Take a permit if one is free right now. The pool is never closed, so
    /// `None` always means every permit is taken.
    pub fn try_acquire(&self) -> Option<Permit> {
        Arc::clone(&self.permits)
            .try_acquire_owned()
            .ok()
            .map(|permit| Permit { _permit: permit })
    }

    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_limiter_is_full() {
        let limiter = Limiter::new(3);
        assert_eq!(limiter.available(), 3);
    }

    #[test]
    fn test_try_acquire_exhausts_without_blocking() {
        let limiter = Limiter::new(2);
        let first = limiter.try_acquire();
        let second = limiter.try_acquire();
        assert!(first.is_some());
        assert!(second.is_some());
        assert!(limiter.try_acquire().is_none());
        assert_eq!(limiter.available(), 0);
    }

    #[test]
    fn test_drop_releases_permit() {
        let limiter = Limiter::new(1);
        {
            let _permit = limiter.try_acquire().expect("permit available");
            assert!(limiter.try_acquire().is_none());
        }
        assert_eq!(limiter.available(), 1);
        assert!(limiter.try_acquire().is_some());
    }

    #[test]
    fn test_zero_capacity_never_grants() {
        let limiter = Limiter::new(0);
        assert!(limiter.try_acquire().is_none());
    }
}
