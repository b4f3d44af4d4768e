//! ETA Estimation for In-Flight Provider Calls
//!
//! The backend gives no progress signal, so the estimate is derived from the
//! size of the prompt alone. Two pieces:
//!
//! - **Duration estimate**: `base + scale * ln(1 + chars / chars_per_unit)`.
//!   Monotonic in size with a shrinking increment, so a 10 MB prompt does not
//!   produce an hour-long ETA.
//! - **Fraction curve**: linear up to `linear_until` of the estimate, then an
//!   exponential approach to `ceiling`. The slope at the knee is
//!   `acceleration` (steeper than linear), and the curve never reaches
//!   `ceiling`, so 100% is only ever shown once the call has returned.
//!
//! The tracker publishes into a `watch` channel and never prints.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::ProgressConfig;

// =============================================================================
// Snapshot
// =============================================================================

/// Point-in-time estimate; recomputed every tick, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub elapsed_seconds: f64,
    pub estimated_total_seconds: f64,
    pub fraction_complete: f64,
    /// Size of the prompt being waited on
    pub content_chars: usize,
}

impl ProgressSnapshot {
    /// Remaining time by the estimate; zero once past it
    pub fn remaining_seconds(&self) -> f64 {
        (self.estimated_total_seconds - self.elapsed_seconds).max(0.0)
    }

    pub fn percent(&self) -> f64 {
        self.fraction_complete * 100.0
    }
}

pub type ProgressSender = watch::Sender<Option<ProgressSnapshot>>;
pub type ProgressReceiver = watch::Receiver<Option<ProgressSnapshot>>;

/// A fresh, idle channel for one run
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    watch::channel(None)
}

// =============================================================================
// Tracker
// =============================================================================

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    content_chars: usize,
    estimated_total: f64,
    tick: Duration,
    linear_until: f64,
    ceiling: f64,
    acceleration: f64,
}

impl ProgressTracker {
    /// Tracker for a prompt of `content_chars` characters
    pub fn new(content_chars: usize, config: &ProgressConfig) -> Self {
        Self {
            content_chars,
            estimated_total: estimate_seconds(content_chars, config),
            tick: config.tick(),
            linear_until: config.linear_until,
            ceiling: config.ceiling,
            acceleration: config.acceleration,
        }
    }

    pub fn estimated_total_seconds(&self) -> f64 {
        self.estimated_total
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Reported fraction after `elapsed_secs`; always in `[0, ceiling)`
    pub fn fraction_at(&self, elapsed_secs: f64) -> f64 {
        let t = (elapsed_secs / self.estimated_total).max(0.0);
        if t <= self.linear_until {
            return t;
        }
        let headroom = self.ceiling - self.linear_until;
        let rate = self.acceleration / headroom;
        let fraction = self.ceiling - headroom * (-rate * (t - self.linear_until)).exp();
        // exp underflows to 0 for very large t
        fraction
            .max(self.linear_until)
            .min(next_below(self.ceiling))
    }

    pub fn snapshot_at(&self, elapsed: Duration) -> ProgressSnapshot {
        let elapsed_seconds = elapsed.as_secs_f64();
        ProgressSnapshot {
            elapsed_seconds,
            estimated_total_seconds: self.estimated_total,
            fraction_complete: self.fraction_at(elapsed_seconds),
            content_chars: self.content_chars,
        }
    }

    /// Publish a snapshot every tick until the future is dropped
    ///
    /// Meant to be raced against the provider call; it does not return on
    /// its own while the channel has receivers.
    pub async fn run(&self, sink: &ProgressSender) {
        let started = Instant::now();
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            sink.send_replace(Some(self.snapshot_at(started.elapsed())));
            if sink.is_closed() {
                return;
            }
        }
    }
}

/// Estimated call duration in seconds for a prompt of `chars` characters
pub fn estimate_seconds(chars: usize, config: &ProgressConfig) -> f64 {
    let units = chars as f64 / config.chars_per_unit;
    config.base_secs + config.scale_secs * units.ln_1p()
}

/// Largest f64 strictly below `x` (x positive and finite)
fn next_below(x: f64) -> f64 {
    f64::from_bits(x.to_bits() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tracker(chars: usize) -> ProgressTracker {
        ProgressTracker::new(chars, &ProgressConfig::default())
    }

    #[test]
    fn test_estimate_grows_with_diminishing_increment() {
        let config = ProgressConfig::default();
        let small = estimate_seconds(4_000, &config);
        let medium = estimate_seconds(40_000, &config);
        let large = estimate_seconds(400_000, &config);
        assert_eq!(estimate_seconds(0, &config), config.base_secs);
        assert!(small < medium && medium < large);
        // 10x more content never means 10x the wait
        assert!(large < medium * 10.0);
        assert!((large - medium) / (medium - small) < 2.0);
    }

    #[test]
    fn test_linear_segment() {
        let t = tracker(40_000);
        let total = t.estimated_total_seconds();
        assert_eq!(t.fraction_at(0.0), 0.0);
        assert!((t.fraction_at(total * 0.5) - 0.5).abs() < 1e-9);
        assert!((t.fraction_at(total * 0.9) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_accelerates_past_knee() {
        let t = tracker(40_000);
        let total = t.estimated_total_seconds();
        let step = total * 0.01;
        let linear_gain = t.fraction_at(total * 0.9) - t.fraction_at(total * 0.9 - step);
        let curved_gain = t.fraction_at(total * 0.9 + step) - t.fraction_at(total * 0.9);
        assert!(curved_gain > linear_gain);
    }

    #[test]
    fn test_never_reports_completion() {
        let t = tracker(40_000);
        let total = t.estimated_total_seconds();
        for factor in [1.0, 2.0, 10.0, 1_000.0, 1e12] {
            let f = t.fraction_at(total * factor);
            assert!(f < 0.99, "fraction {} at {}x", f, factor);
            assert!(f < 1.0);
        }
    }

    #[test]
    fn test_snapshot_remaining() {
        let t = tracker(0);
        let snap = t.snapshot_at(Duration::from_secs(4));
        assert_eq!(snap.elapsed_seconds, 4.0);
        assert!((snap.remaining_seconds() - 6.0).abs() < 1e-9);
        assert_eq!(t.snapshot_at(Duration::from_secs(60)).remaining_seconds(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_publishes_on_each_tick() {
        let (tx, rx) = watch::channel(None);
        let t = tracker(4_000);

        let _ = tokio::time::timeout(Duration::from_millis(1_600), t.run(&tx)).await;

        let snap = (*rx.borrow()).expect("at least one snapshot");
        // ticks at 0, 0.5, 1.0 and 1.5s
        assert!((snap.elapsed_seconds - 1.5).abs() < 0.01);
        assert!(snap.fraction_complete > 0.0 && snap.fraction_complete < 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_without_receivers() {
        let (tx, rx) = watch::channel(None);
        drop(rx);
        let finished = tokio::time::timeout(Duration::from_secs(1), tracker(10).run(&tx)).await;
        assert!(finished.is_ok());
    }

    proptest! {
        #[test]
        fn prop_fraction_monotonic_and_bounded(
            chars in 0usize..5_000_000,
            a in 0.0f64..10_000.0,
            b in 0.0f64..10_000.0,
        ) {
            let t = tracker(chars);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let f_lo = t.fraction_at(lo);
            let f_hi = t.fraction_at(hi);
            prop_assert!(f_lo <= f_hi);
            prop_assert!((0.0..0.99).contains(&f_hi));
        }

        #[test]
        fn prop_estimate_monotonic(a in 0usize..50_000_000, b in 0usize..50_000_000) {
            let config = ProgressConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(estimate_seconds(lo, &config) <= estimate_seconds(hi, &config));
        }
    }
}
