//! Decides when the worker publishes a new batch of requests
//!
//! A batch is produced when the consumers have reported back on a large enough
//! share of the previous batch, or when too much time has passed since it. The
//! first rule keeps the outgoing topic topped up while fetchers are busy; the
//! second keeps the frontier moving when feedback is sparse.

use crate::config::WorkerConfig;
use std::time::Duration;
use tokio::time::Instant;

/// Counters the scheduling rule is evaluated against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerState {
    /// Requests handed out by the last batch
    pub produced: usize,

    /// Messages consumed since the last batch
    pub consumed: usize,

    /// When the last batch was produced (or the worker started)
    pub last_batch_time: Instant,
}

/// Adaptive batch scheduler
#[derive(Debug, Clone)]
pub struct AdaptiveBatchScheduler {
    enabled: bool,
    ratio: f64,
    interval: Duration,
    state: SchedulerState,
}

impl AdaptiveBatchScheduler {
    /// Creates a scheduler whose clock starts at `now`
    ///
    /// # Arguments
    ///
    /// * `enabled` - When false, [`should_produce`](Self::should_produce) never fires
    /// * `ratio` - Fraction of the last batch that must be consumed before a new one
    /// * `interval` - Maximum time between batches
    /// * `now` - Start of the first interval
    pub fn new(enabled: bool, ratio: f64, interval: Duration, now: Instant) -> Self {
        Self {
            enabled,
            ratio,
            interval,
            state: SchedulerState {
                produced: 0,
                consumed: 0,
                last_batch_time: now,
            },
        }
    }

    pub fn from_config(config: &WorkerConfig, now: Instant) -> Self {
        Self::new(
            !config.disable_new_batches,
            config.new_batch_ratio,
            config.batch_interval(),
            now,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Adds to the number of messages consumed since the last batch
    pub fn record_consumed(&mut self, count: usize) {
        self.state.consumed += count;
    }

    /// Returns true if a new batch should be produced at `now`
    pub fn should_produce(&self, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }
        let consumed = self.state.consumed as f64;
        let threshold = self.ratio * self.state.produced as f64;
        consumed > threshold
            || now.saturating_duration_since(self.state.last_batch_time) > self.interval
    }

    /// Records a produced batch and restarts the interval at `now`
    pub fn record_batch(&mut self, produced: usize, now: Instant) {
        self.state = SchedulerState {
            produced,
            consumed: 0,
            last_batch_time: now,
        };
    }

    /// Restarts the interval at `now` without recording a batch
    pub fn restart(&mut self, now: Instant) {
        self.state.last_batch_time = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(180);

    fn scheduler_after_batch(produced: usize, now: Instant) -> AdaptiveBatchScheduler {
        let mut scheduler = AdaptiveBatchScheduler::new(true, 0.4, INTERVAL, now);
        scheduler.record_batch(produced, now);
        scheduler
    }

    #[test]
    fn test_consumed_at_threshold_does_not_fire() {
        let now = Instant::now();
        let mut scheduler = scheduler_after_batch(100, now);
        scheduler.record_consumed(40);
        assert!(!scheduler.should_produce(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_consumed_above_threshold_fires() {
        let now = Instant::now();
        let mut scheduler = scheduler_after_batch(100, now);
        scheduler.record_consumed(41);
        assert!(scheduler.should_produce(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_interval_elapsed_fires() {
        let now = Instant::now();
        let scheduler = scheduler_after_batch(100, now);
        assert!(!scheduler.should_produce(now + INTERVAL));
        assert!(scheduler.should_produce(now + INTERVAL + Duration::from_secs(1)));
    }

    #[test]
    fn test_disabled_never_fires() {
        let now = Instant::now();
        let mut scheduler = AdaptiveBatchScheduler::new(false, 0.4, INTERVAL, now);
        scheduler.record_consumed(1_000);
        assert!(!scheduler.should_produce(now + Duration::from_secs(3_600)));
    }

    #[test]
    fn test_empty_batch_fires_on_any_consumption() {
        let now = Instant::now();
        let mut scheduler = scheduler_after_batch(0, now);
        assert!(!scheduler.should_produce(now));
        scheduler.record_consumed(1);
        assert!(scheduler.should_produce(now));
    }

    #[test]
    fn test_record_batch_resets_consumed() {
        let now = Instant::now();
        let mut scheduler = scheduler_after_batch(10, now);
        scheduler.record_consumed(7);

        let later = now + Duration::from_secs(5);
        scheduler.record_batch(20, later);

        let state = scheduler.state();
        assert_eq!(state.produced, 20);
        assert_eq!(state.consumed, 0);
        assert_eq!(state.last_batch_time, later);
    }

    #[test]
    fn test_restart_keeps_counters() {
        let now = Instant::now();
        let mut scheduler = scheduler_after_batch(10, now);
        scheduler.record_consumed(3);

        let later = now + Duration::from_secs(60);
        scheduler.restart(later);
        assert_eq!(scheduler.state().consumed, 3);
        assert_eq!(scheduler.state().last_batch_time, later);
    }
}
