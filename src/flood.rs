/// Flood tracker: per-(group, user) sliding-window event counter
///
/// In-memory only; the window deliberately does not survive a restart.
/// State lives in a sharded concurrent map so unrelated keys never contend,
/// while same-key callers are serialized by the shard lock, keeping the
/// check-then-append atomic.
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// (group, user) key into the window map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloodKey {
    pub group_id: i64,
    pub user_id: i64,
}

/// Outcome of recording one event against the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodVerdict {
    /// Event appended; rate is under the limit
    WithinLimit,
    /// Limit reached; the triggering event was NOT appended, so it does
    /// not count toward the next window
    LimitExceeded,
}

impl FloodVerdict {
    pub fn exceeded(self) -> bool {
        self == FloodVerdict::LimitExceeded
    }
}

/// Concurrency-safe sliding-window counter
#[derive(Debug, Default)]
pub struct FloodTracker {
    windows: DashMap<FloodKey, Vec<Instant>>,
}

impl FloodTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prune the key's window, then check before appending
    ///
    /// Returns `LimitExceeded` when the pruned window already holds
    /// `max_events` timestamps; the new event is only appended otherwise.
    pub fn record_and_check(
        &self,
        group_id: i64,
        user_id: i64,
        window: Duration,
        max_events: usize,
        now: Instant,
    ) -> FloodVerdict {
        let key = FloodKey { group_id, user_id };
        let mut entry = self.windows.entry(key).or_default();

        entry.retain(|t| now.saturating_duration_since(*t) < window);

        if entry.len() >= max_events {
            return FloodVerdict::LimitExceeded;
        }

        entry.push(now);
        FloodVerdict::WithinLimit
    }

    /// Drop the window for a key (e.g. after the user was sanctioned)
    pub fn reset(&self, group_id: i64, user_id: i64) {
        self.windows.remove(&FloodKey { group_id, user_id });
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(5);

    #[test]
    fn test_within_limit_appends() {
        let tracker = FloodTracker::new();
        let t0 = Instant::now();
        for i in 0..4 {
            let verdict = tracker.record_and_check(
                1,
                2,
                WINDOW,
                5,
                t0 + Duration::from_millis(i * 20),
            );
            assert_eq!(verdict, FloodVerdict::WithinLimit);
        }
    }

    #[test]
    fn test_sixth_event_in_window_triggers() {
        let tracker = FloodTracker::new();
        let t0 = Instant::now();
        for i in 0..5 {
            assert_eq!(
                tracker.record_and_check(1, 2, WINDOW, 5, t0 + Duration::from_millis(i * 20)),
                FloodVerdict::WithinLimit
            );
        }
        // 6th event at t=4.9s is still inside the window
        assert_eq!(
            tracker.record_and_check(1, 2, WINDOW, 5, t0 + Duration::from_millis(4900)),
            FloodVerdict::LimitExceeded
        );
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let tracker = FloodTracker::new();
        let t0 = Instant::now();
        for i in 0..5 {
            tracker.record_and_check(1, 2, WINDOW, 5, t0 + Duration::from_millis(i * 20));
        }
        // 6 seconds later the first batch has fully expired
        let later = t0 + Duration::from_secs(6);
        for i in 0..5 {
            assert_eq!(
                tracker.record_and_check(1, 2, WINDOW, 5, later + Duration::from_millis(i * 20)),
                FloodVerdict::WithinLimit
            );
        }
    }

    #[test]
    fn test_triggering_event_not_counted() {
        let tracker = FloodTracker::new();
        let t0 = Instant::now();
        for i in 0..3 {
            tracker.record_and_check(1, 2, WINDOW, 3, t0 + Duration::from_millis(i * 10));
        }
        assert_eq!(
            tracker.record_and_check(1, 2, WINDOW, 3, t0 + Duration::from_millis(100)),
            FloodVerdict::LimitExceeded
        );
        // Once the original three expire the window is empty again, even
        // though a fourth event was seen
        let later = t0 + Duration::from_secs(6);
        assert_eq!(
            tracker.record_and_check(1, 2, WINDOW, 3, later),
            FloodVerdict::WithinLimit
        );
    }

    #[test]
    fn test_keys_are_independent() {
        let tracker = FloodTracker::new();
        let t0 = Instant::now();
        for i in 0..5 {
            tracker.record_and_check(1, 2, WINDOW, 5, t0 + Duration::from_millis(i));
        }
        assert_eq!(
            tracker.record_and_check(1, 2, WINDOW, 5, t0 + Duration::from_millis(10)),
            FloodVerdict::LimitExceeded
        );
        // Same user, different group
        assert_eq!(
            tracker.record_and_check(9, 2, WINDOW, 5, t0 + Duration::from_millis(10)),
            FloodVerdict::WithinLimit
        );
        // Same group, different user
        assert_eq!(
            tracker.record_and_check(1, 7, WINDOW, 5, t0 + Duration::from_millis(10)),
            FloodVerdict::WithinLimit
        );
    }

    #[test]
    fn test_reset_clears_key() {
        let tracker = FloodTracker::new();
        let t0 = Instant::now();
        for i in 0..5 {
            tracker.record_and_check(1, 2, WINDOW, 5, t0 + Duration::from_millis(i));
        }
        tracker.reset(1, 2);
        assert_eq!(
            tracker.record_and_check(1, 2, WINDOW, 5, t0 + Duration::from_millis(10)),
            FloodVerdict::WithinLimit
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_key_is_exact() {
        use std::sync::Arc;

        let tracker = Arc::new(FloodTracker::new());
        let now = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..32 {
            let tracker = Arc::clone(&tracker);
            handles.push(tokio::spawn(async move {
                tracker.record_and_check(1, 2, WINDOW, 10, now)
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() == FloodVerdict::WithinLimit {
                allowed += 1;
            }
        }
        // Shard lock makes check-then-append atomic: exactly max_events pass
        assert_eq!(allowed, 10);
    }
}
