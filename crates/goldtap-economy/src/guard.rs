//! Sliding-window rate counters for the abuse guard.
//!
//! Two deployments gate the service: a per-user tap counter (100 taps
//! per trailing second) and a per-client-address, per-endpoint counter
//! (60 requests per trailing minute). Both are purely additive,
//! process-local, pruned lazily on each check, and reset on restart.
//! Ledger invariants never depend on them; an adversary who spreads
//! requests across instances only degrades the guard's precision.
//!
//! The windows are plain data owned by whoever injects them (the API
//! state), never ambient globals, so each deployment configures its
//! own limits.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};

/// Default per-user tap limit within [`TAP_WINDOW_SECS`].
pub const TAP_LIMIT: usize = 100;

/// Trailing window for the per-user tap counter, in seconds.
pub const TAP_WINDOW_SECS: i64 = 1;

/// Default per-address, per-endpoint request limit within
/// [`ADDR_WINDOW_SECS`].
pub const ADDR_LIMIT: usize = 60;

/// Trailing window for the per-address counter, in seconds.
pub const ADDR_WINDOW_SECS: i64 = 60;

/// Admissions between automatic idle-key sweeps in [`KeyedWindows`].
const SWEEP_EVERY: u64 = 1_024;

/// One sliding window: a bounded count of events in a trailing span.
///
/// Timestamps older than the window are dropped on every check; no
/// background pruning exists.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    limit: usize,
    window: Duration,
    hits: VecDeque<DateTime<Utc>>,
}

impl SlidingWindow {
    /// Create a window admitting at most `limit` events per `window`.
    pub const fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: VecDeque::new(),
        }
    }

    /// Record an event at `now` if the window has room.
    ///
    /// Returns `false` (and records nothing) when the limit has been
    /// reached within the trailing window.
    pub fn check_and_record(&mut self, now: DateTime<Utc>) -> bool {
        self.prune(now);
        if self.hits.len() >= self.limit {
            return false;
        }
        self.hits.push_back(now);
        true
    }

    /// Number of events currently inside the window.
    ///
    /// Introspection hook; admission decisions never consult it.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether the window holds no events.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Drop timestamps older than the trailing window.
    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now
            .checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        while self.hits.front().is_some_and(|&t| t <= cutoff) {
            self.hits.pop_front();
        }
    }
}

/// A family of sliding windows keyed by subject.
///
/// Keys appear on first use and are dropped again once their window
/// empties: every 1024th admission sweeps idle keys as a side effect,
/// so memory stays proportional to recently active subjects without a
/// maintenance task. [`prune_idle`](Self::prune_idle) forces the same
/// sweep explicitly.
#[derive(Debug, Clone)]
pub struct KeyedWindows<K> {
    limit: usize,
    window: Duration,
    windows: HashMap<K, SlidingWindow>,
    /// Admissions left until the next idle-key sweep.
    until_sweep: u64,
}

impl<K: Eq + Hash> KeyedWindows<K> {
    /// Create a family admitting at most `limit` events per `window`
    /// per key.
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: HashMap::new(),
            until_sweep: SWEEP_EVERY,
        }
    }

    /// Record an event for `key` at `now` if its window has room.
    ///
    /// Periodically sweeps idle keys before answering.
    pub fn check_and_record(&mut self, key: K, now: DateTime<Utc>) -> bool {
        self.until_sweep = self.until_sweep.saturating_sub(1);
        if self.until_sweep == 0 {
            self.prune_idle(now);
            self.until_sweep = SWEEP_EVERY;
        }
        self.windows
            .entry(key)
            .or_insert_with(|| SlidingWindow::new(self.limit, self.window))
            .check_and_record(now)
    }

    /// Drop keys whose windows hold no events newer than the cutoff.
    pub fn prune_idle(&mut self, now: DateTime<Utc>) {
        self.windows.retain(|_, w| {
            w.prune(now);
            !w.is_empty()
        });
    }

    /// Number of keys currently tracked.
    ///
    /// Introspection hook; admission decisions never consult it.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::arithmetic_side_effects)]

    use super::*;

    #[test]
    fn window_admits_up_to_the_limit() {
        let now = Utc::now();
        let mut window = SlidingWindow::new(3, Duration::seconds(1));

        assert!(window.check_and_record(now));
        assert!(window.check_and_record(now));
        assert!(window.check_and_record(now));
        assert!(!window.check_and_record(now));
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn old_events_fall_out_of_the_window() {
        let now = Utc::now();
        let mut window = SlidingWindow::new(2, Duration::seconds(1));
        assert!(window.check_and_record(now));
        assert!(window.check_and_record(now));
        assert!(!window.check_and_record(now));

        // After the window passes, capacity is available again.
        let later = now + Duration::seconds(2);
        assert!(window.check_and_record(later));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn rejected_events_are_not_recorded() {
        let now = Utc::now();
        let mut window = SlidingWindow::new(1, Duration::seconds(10));
        assert!(window.check_and_record(now));
        assert!(!window.check_and_record(now));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn keys_are_counted_independently() {
        let now = Utc::now();
        let mut windows: KeyedWindows<&str> = KeyedWindows::new(1, Duration::seconds(60));

        assert!(windows.check_and_record("alice", now));
        assert!(!windows.check_and_record("alice", now));
        assert!(windows.check_and_record("bob", now));
    }

    #[test]
    fn idle_keys_are_pruned() {
        let now = Utc::now();
        let mut windows: KeyedWindows<u32> = KeyedWindows::new(5, Duration::seconds(1));
        let _ = windows.check_and_record(1, now);
        let _ = windows.check_and_record(2, now);
        assert_eq!(windows.tracked_keys(), 2);

        windows.prune_idle(now + Duration::seconds(5));
        assert_eq!(windows.tracked_keys(), 0);
    }

    #[test]
    fn idle_keys_are_swept_during_admission() {
        let now = Utc::now();
        let mut windows: KeyedWindows<u32> = KeyedWindows::new(5, Duration::seconds(1));
        let _ = windows.check_and_record(1, now);
        assert_eq!(windows.tracked_keys(), 1);

        // Long after key 1's window has emptied, steady traffic on
        // key 2 evicts it without an explicit maintenance call.
        let later = now + Duration::seconds(10);
        for _ in 0..2_000 {
            let _ = windows.check_and_record(2, later);
        }
        assert_eq!(windows.tracked_keys(), 1);
    }

    #[test]
    fn tap_burst_is_capped_at_the_limit() {
        let now = Utc::now();
        let mut windows: KeyedWindows<i64> =
            KeyedWindows::new(TAP_LIMIT, Duration::seconds(TAP_WINDOW_SECS));

        let mut admitted = 0_u32;
        for _ in 0..150 {
            if windows.check_and_record(7, now) {
                admitted = admitted.saturating_add(1);
            }
        }
        assert_eq!(admitted, 100);
    }
}
