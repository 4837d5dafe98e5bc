use crate::config::Config;
use crate::progress::Spinner;
use crate::report::Report;
use crate::run::RunController;
use crate::stats::Stats;
use crate::worker::{ConnectionWorker, WorkerOutcome};
use futures::future::join_all;
use std::sync::Arc;
use tokio::time;
use tracing::{error, info};

/// Everything a finished run produced, including each worker's terminal state.
/// Workers whose task panicked have no entry.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: Report,
    pub workers: Vec<WorkerOutcome>,
}

pub struct LoadTest {
    config: Arc<Config>,
}

impl LoadTest {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Report {
        self.execute().await.report
    }

    /// Spawn every worker, let them run for the configured duration, raise the
    /// stop signal and join them all before reading the counters.
    pub async fn execute(&self) -> RunOutcome {
        let config = &self.config;
        let stats = Arc::new(Stats::new());
        let controller = Arc::new(RunController::start(config));

        info!(
            "Starting {} connections to {} for {}s (timeout {}s, {} byte messages)",
            config.connections,
            config.target,
            config.duration_secs,
            config.timeout_secs,
            config.message_len()
        );

        let spinner = config
            .progress
            .then(|| tokio::spawn(Spinner::new(controller.clone()).run()));

        let mut tasks = Vec::with_capacity(config.connections);
        for id in 0..config.connections {
            let worker = ConnectionWorker::new(
                id,
                config.clone(),
                controller.clone(),
                stats.clone(),
            );
            tasks.push(tokio::spawn(worker.run()));
        }

        // A zero-length run stops before any worker gets a scheduler turn.
        if !config.run_duration().is_zero() {
            time::sleep(config.run_duration()).await;
        }
        controller.request_stop();

        let mut workers = Vec::with_capacity(tasks.len());
        for (id, result) in join_all(tasks).await.into_iter().enumerate() {
            match result {
                Ok(outcome) => workers.push(outcome),
                Err(e) => error!("Worker {} task failed: {}", id, e),
            }
        }

        if let Some(spinner) = spinner {
            if let Err(e) = spinner.await {
                error!("Progress task failed: {}", e);
            }
        }

        let report = Report {
            snapshot: stats.snapshot(),
            run_duration: config.run_duration(),
            elapsed: controller.elapsed(),
        };
        info!(
            "Run finished in {:.2}s: {} ok, {} connect failures, {} i/o failures",
            report.elapsed.as_secs_f64(),
            report.snapshot.successes,
            report.snapshot.connect_failures,
            report.snapshot.io_failures
        );

        RunOutcome { report, workers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn no_connections_finishes_with_zero_counters() {
        let config = Arc::new(Config {
            connections: 0,
            duration_secs: 0,
            timeout_secs: 0,
            progress: false,
            ..Config::default()
        });

        let outcome = LoadTest::new(config).execute().await;

        assert!(outcome.workers.is_empty());
        assert_eq!(outcome.report.snapshot, Default::default());
        assert_eq!(outcome.report.operations_per_second(), None);
    }

    #[tokio::test]
    async fn zero_duration_stops_before_workers_run() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let (mut reader, mut writer) = socket.split();
                    let _ = tokio::io::copy(&mut reader, &mut writer).await;
                });
            }
        });

        let config = Arc::new(Config {
            target: addr.to_string(),
            connections: 4,
            duration_secs: 0,
            timeout_secs: 2,
            progress: false,
            ..Config::default()
        });

        let outcome = LoadTest::new(config).execute().await;

        assert_eq!(outcome.workers, vec![WorkerOutcome::Stopped { round_trips: 1 }; 4]);
        assert_eq!(outcome.report.snapshot.successes, 4);
    }
}
