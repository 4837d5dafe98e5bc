use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Outcome counters shared by every connection worker.
///
/// Each counter is bumped independently; there is no combined total; sums are
/// taken from a [`StatsSnapshot`] once all workers have been joined.
#[derive(Debug, Default)]
pub struct Stats {
    successes: AtomicU64,
    connect_failures: AtomicU64,
    io_failures: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_connect_fail(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_io_fail(&self) {
        self.io_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Only consistent once every worker has terminated; the join provides the ordering.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            successes: self.successes.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            io_failures: self.io_failures.load(Ordering::Relaxed),
        }
    }
}

pub type SharedStats = Arc<Stats>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub successes: u64,
    pub connect_failures: u64,
    pub io_failures: u64,
}

impl StatsSnapshot {
    pub fn total_failures(&self) -> u64 {
        self.connect_failures + self.io_failures
    }

    /// Successful round-trips per second of configured run time.
    /// `None` for a zero-length run.
    pub fn ops_per_second(&self, run_duration: Duration) -> Option<u64> {
        let secs = run_duration.as_secs();
        if secs == 0 {
            return None;
        }
        Some(self.successes / secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let stats = Stats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn counters_are_independent() {
        let stats = Stats::new();
        stats.increment_success();
        stats.increment_success();
        stats.increment_connect_fail();
        stats.increment_io_fail();
        stats.increment_io_fail();
        stats.increment_io_fail();

        let snap = stats.snapshot();
        assert_eq!(snap.successes, 2);
        assert_eq!(snap.connect_failures, 1);
        assert_eq!(snap.io_failures, 3);
        assert_eq!(snap.total_failures(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let stats: SharedStats = Arc::new(Stats::new());
        let mut tasks = vec![];

        for _ in 0..32 {
            let stats = stats.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..1000 {
                    stats.increment_success();
                    stats.increment_io_fail();
                }
                stats.increment_connect_fail();
            }));
        }

        for task in tasks {
            task.await.unwrap();
        }

        let snap = stats.snapshot();
        assert_eq!(snap.successes, 32_000);
        assert_eq!(snap.io_failures, 32_000);
        assert_eq!(snap.connect_failures, 32);
    }

    #[test]
    fn ops_per_second_uses_whole_seconds() {
        let snap = StatsSnapshot {
            successes: 1001,
            ..Default::default()
        };
        assert_eq!(snap.ops_per_second(Duration::from_secs(2)), Some(500));
        assert_eq!(snap.ops_per_second(Duration::from_secs(1)), Some(1001));
    }

    #[test]
    fn ops_per_second_guards_zero_duration() {
        let snap = StatsSnapshot {
            successes: 42,
            ..Default::default()
        };
        assert_eq!(snap.ops_per_second(Duration::ZERO), None);
    }
}
