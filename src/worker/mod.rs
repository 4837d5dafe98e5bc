use crate::config::Config;
use crate::run::SharedRunController;
use crate::stats::SharedStats;
use std::fmt;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Write,
    Read,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Write => f.write_str("write"),
            Phase::Read => f.write_str("read"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("dial tcp {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("dial tcp {addr}: timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },
    #[error("configure socket: {0}")]
    Configure(#[source] io::Error),
    #[error("{phase}: {source}")]
    Io {
        phase: Phase,
        #[source]
        source: io::Error,
    },
    #[error("{phase}: i/o deadline exceeded")]
    DeadlineExceeded { phase: Phase },
}

impl WorkerError {
    /// Errors raised before the echo loop starts are counted as connect failures.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            WorkerError::Connect { .. }
                | WorkerError::ConnectTimeout { .. }
                | WorkerError::Configure(_)
        )
    }
}

/// Terminal state of one worker. Exactly one per spawned worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Observed the stop signal after a completed round-trip.
    Stopped { round_trips: u64 },
    ConnectFailed,
    IoFailed { round_trips: u64 },
}

impl WorkerOutcome {
    pub fn round_trips(&self) -> u64 {
        match self {
            WorkerOutcome::Stopped { round_trips } | WorkerOutcome::IoFailed { round_trips } => {
                *round_trips
            }
            WorkerOutcome::ConnectFailed => 0,
        }
    }
}

/// Drives a single TCP connection: dial, then write/read the payload until
/// the run is stopped or anything fails. Failures are terminal; there is no reconnect.
pub struct ConnectionWorker {
    id: usize,
    config: Arc<Config>,
    controller: SharedRunController,
    stats: SharedStats,
    round_trips: u64,
}

impl ConnectionWorker {
    pub fn new(
        id: usize,
        config: Arc<Config>,
        controller: SharedRunController,
        stats: SharedStats,
    ) -> Self {
        Self {
            id,
            config,
            controller,
            stats,
            round_trips: 0,
        }
    }

    pub async fn run(mut self) -> WorkerOutcome {
        match self.drive().await {
            Ok(()) => {
                debug!(
                    "Worker {} stopping after {} round-trips",
                    self.id, self.round_trips
                );
                WorkerOutcome::Stopped {
                    round_trips: self.round_trips,
                }
            }
            Err(e) if e.is_connect_failure() => {
                warn!("Worker {} connect failed: {}", self.id, e);
                self.stats.increment_connect_fail();
                WorkerOutcome::ConnectFailed
            }
            Err(e) => {
                warn!("Worker {} i/o failed: {}", self.id, e);
                self.stats.increment_io_fail();
                WorkerOutcome::IoFailed {
                    round_trips: self.round_trips,
                }
            }
        }
    }

    async fn drive(&mut self) -> Result<(), WorkerError> {
        let mut stream = self.connect().await?;
        debug!("Worker {} connected to {}", self.id, self.config.target);
        self.echo_loop(&mut stream).await
    }

    async fn connect(&self) -> Result<TcpStream, WorkerError> {
        let addr = self.config.target.as_str();
        let timeout = self.config.connect_timeout();

        // A zero timeout leaves the dial unbounded.
        let stream = if timeout.is_zero() {
            TcpStream::connect(addr).await.map_err(|source| WorkerError::Connect {
                addr: addr.to_string(),
                source,
            })?
        } else {
            match time::timeout(timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(source)) => {
                    return Err(WorkerError::Connect {
                        addr: addr.to_string(),
                        source,
                    });
                }
                Err(_) => {
                    return Err(WorkerError::ConnectTimeout {
                        addr: addr.to_string(),
                        timeout,
                    });
                }
            }
        };

        stream.set_nodelay(true).map_err(WorkerError::Configure)?;
        Ok(stream)
    }

    async fn echo_loop(&mut self, stream: &mut TcpStream) -> Result<(), WorkerError> {
        // Same absolute instant for every operation on every connection.
        let deadline = self.controller.deadline();
        let message = self.config.message.as_slice();
        let mut recv_buf = vec![0u8; self.config.message_len()];

        loop {
            with_deadline(deadline, Phase::Write, stream.write_all(message)).await?;
            with_deadline(deadline, Phase::Read, stream.read_exact(&mut recv_buf)).await?;

            self.stats.increment_success();
            self.round_trips += 1;

            if self.controller.is_stopped() {
                return Ok(());
            }
        }
    }
}

async fn with_deadline<F, T>(deadline: Instant, phase: Phase, op: F) -> Result<T, WorkerError>
where
    F: Future<Output = io::Result<T>>,
{
    match time::timeout_at(deadline, op).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(WorkerError::Io { phase, source }),
        Err(_) => Err(WorkerError::DeadlineExceeded { phase }),
    }
}
