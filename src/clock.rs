// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Injectable time source for TTL decisions
//!
//! Caches and the memoizer read time through [`Clock`] so expiry can be
//! tested without sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::TimestampMillis;

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> TimestampMillis;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimestampMillis {
        TimestampMillis::now()
    }
}

/// A clock that only moves when told to
///
/// Clones share the same underlying time.
///
/// # Examples
///
/// ```
/// use gaugescan::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.advance(Duration::from_secs(60));
/// assert_eq!(clock.now().duration_since(start), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Start at an arbitrary fixed instant
    pub fn new() -> Self {
        Self::starting_at(TimestampMillis::from_millis(1_700_000_000_000))
    }

    /// Start at `at`
    pub fn starting_at(at: TimestampMillis) -> Self {
        let millis = u64::try_from(at.as_millis()).unwrap_or(u64::MAX);
        Self {
            millis: Arc::new(AtomicU64::new(millis)),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimestampMillis {
        TimestampMillis::from_millis(u128::from(self.millis.load(Ordering::SeqCst)))
    }
}
