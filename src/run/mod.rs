use crate::config::Config;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Stand-in deadline for runs whose duration plus timeout overflows the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Shared stop signal and the single absolute I/O deadline for a run.
#[derive(Debug)]
pub struct RunController {
    started_at: Instant,
    deadline: Instant,
    stopped: AtomicBool,
}

impl RunController {
    /// Deadline = now + run duration + connect timeout, computed once.
    pub fn start(config: &Config) -> Self {
        let started_at = Instant::now();
        let deadline = started_at
            .checked_add(config.run_duration())
            .and_then(|t| t.checked_add(config.connect_timeout()))
            .unwrap_or_else(|| {
                warn!(
                    "Deadline of {}s + {}s is out of range, using {}s",
                    config.duration_secs,
                    config.timeout_secs,
                    FAR_FUTURE.as_secs()
                );
                started_at + FAR_FUTURE
            });
        Self {
            started_at,
            deadline,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn request_stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            info!("Stop requested after {:.2}s", self.elapsed().as_secs_f64());
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

pub type SharedRunController = Arc<RunController>;
