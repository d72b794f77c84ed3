// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Write timestamps for cached records

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch
///
/// Serialized as a bare integer in disk snapshots.
///
/// ```
/// use gaugescan::TimestampMillis;
/// use std::time::Duration;
///
/// let stored = TimestampMillis::from_millis(1_000);
/// let now = TimestampMillis::from_millis(4_500);
/// assert_eq!(now.duration_since(stored), Duration::from_millis(3_500));
/// assert_eq!(stored.duration_since(now), Duration::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimestampMillis(u128);

impl TimestampMillis {
    /// Wall-clock time
    pub fn now() -> Self {
        Self(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
        )
    }

    pub const fn from_millis(millis: u128) -> Self {
        Self(millis)
    }

    pub const fn as_millis(&self) -> u128 {
        self.0
    }

    /// Time from `earlier` to `self`, saturating at zero
    pub fn duration_since(&self, earlier: TimestampMillis) -> Duration {
        let millis = self.0.saturating_sub(earlier.0);
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}
