// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Time-bounded memoization of expensive global values
//!
//! [`TtlMemoizer`] keeps one value per key together with the time it was
//! computed. It is meant for values that are the same for every caller,
//! such as the protocol base yield, and that are cheap to recompute
//! occasionally but expensive to compute on every request.
//!
//! No lock is held while computing: two callers that miss at the same time
//! may both compute, and the last write wins. The computation must be pure.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::TimestampMillis;

#[derive(Debug, Clone)]
struct Memo<V> {
    value: V,
    computed_at: TimestampMillis,
}

/// Memoizes values for a caller-chosen validity window
///
/// # Examples
///
/// ```
/// use gaugescan::{ManualClock, TtlMemoizer};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let clock = ManualClock::new();
/// let memo: TtlMemoizer<f64> = TtlMemoizer::with_clock(Arc::new(clock.clone()));
/// let day = Duration::from_secs(86_400);
///
/// let v = memo.get_or_compute("base_yield", day, || async { Ok::<_, ()>(10.0) }).await;
/// assert_eq!(v, Ok(10.0));
///
/// // Served from memory within the window
/// let v = memo.get_or_compute("base_yield", day, || async { Ok::<_, ()>(99.0) }).await;
/// assert_eq!(v, Ok(10.0));
/// # }
/// ```
pub struct TtlMemoizer<V> {
    entries: Mutex<HashMap<String, Memo<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone + Send> TtlMemoizer<V> {
    /// Create a memoizer reading the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a memoizer reading `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Value under `key` if younger than `ttl`, otherwise the result of `compute`
    ///
    /// A successful result is stored with the current time. An error is
    /// returned as-is and nothing is stored, so the next call computes again.
    pub async fn get_or_compute<F, Fut, Err>(&self, key: &str, ttl: Duration, compute: F) -> Result<V, Err>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, Err>>,
    {
        if let Some(value) = self.fresh(key, ttl).await {
            trace!(key, "Memoized value still fresh");
            return Ok(value);
        }

        debug!(key, ttl_secs = ttl.as_secs(), "Computing memoized value");
        let value = compute().await?;

        self.entries.lock().await.insert(
            key.to_string(),
            Memo {
                value: value.clone(),
                computed_at: self.clock.now(),
            },
        );
        Ok(value)
    }

    async fn fresh(&self, key: &str, ttl: Duration) -> Option<V> {
        let now = self.clock.now();
        self.entries
            .lock()
            .await
            .get(key)
            .filter(|memo| now.duration_since(memo.computed_at) < ttl)
            .map(|memo| memo.value.clone())
    }

    /// Forget the value under `key`
    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.lock().await.remove(key).is_some()
    }

    /// Current value under `key` regardless of age, with when it was computed
    pub async fn peek(&self, key: &str) -> Option<(V, TimestampMillis)> {
        self.entries
            .lock()
            .await
            .get(key)
            .map(|memo| (memo.value.clone(), memo.computed_at))
    }
}

impl<V: Clone + Send> Default for TtlMemoizer<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DAY: Duration = Duration::from_secs(86_400);

    fn memoizer() -> (TtlMemoizer<f64>, ManualClock) {
        let clock = ManualClock::new();
        (TtlMemoizer::with_clock(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_computes_once_within_window() {
        let (memo, clock) = memoizer();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let compute = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(10.0)
        };

        assert_eq!(memo.get_or_compute("k", DAY, compute).await, Ok(10.0));
        clock.advance(DAY - Duration::from_secs(1));
        assert_eq!(memo.get_or_compute("k", DAY, compute).await, Ok(10.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(1));
        assert_eq!(memo.get_or_compute("k", DAY, compute).await, Ok(10.0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_stored() {
        let (memo, _clock) = memoizer();

        let err = memo
            .get_or_compute("k", DAY, || async { Err::<f64, _>("ledger down") })
            .await;
        assert_eq!(err, Err("ledger down"));
        assert!(memo.peek("k").await.is_none());

        let ok = memo
            .get_or_compute("k", DAY, || async { Ok::<_, &str>(4.0) })
            .await;
        assert_eq!(ok, Ok(4.0));
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let (memo, _clock) = memoizer();
        memo.get_or_compute("k", DAY, || async { Ok::<_, ()>(1.0) })
            .await
            .unwrap();

        assert!(memo.invalidate("k").await);
        let v = memo
            .get_or_compute("k", DAY, || async { Ok::<_, ()>(2.0) })
            .await;
        assert_eq!(v, Ok(2.0));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (memo, _clock) = memoizer();
        memo.get_or_compute("a", DAY, || async { Ok::<_, ()>(1.0) })
            .await
            .unwrap();
        let b = memo
            .get_or_compute("b", DAY, || async { Ok::<_, ()>(2.0) })
            .await;
        assert_eq!(b, Ok(2.0));
    }
}
