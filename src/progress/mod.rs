use crate::run::SharedRunController;
use std::time::Duration;
use tokio::io::{self, AsyncWrite, AsyncWriteExt};
use tokio::time;

const FRAMES: &[u8; 4] = b"|/-\\";
const TICK: Duration = Duration::from_millis(100);

/// Console spinner redrawn in place until the run is stopped.
pub struct Spinner {
    controller: SharedRunController,
}

impl Spinner {
    pub fn new(controller: SharedRunController) -> Self {
        Self { controller }
    }

    pub async fn run(self) {
        self.run_with(io::stdout()).await;
    }

    /// Returns the number of frames drawn.
    pub async fn run_with<W: AsyncWrite + Unpin>(self, mut out: W) -> usize {
        let mut interval = time::interval(TICK);
        let mut frames = 0;

        loop {
            interval.tick().await;
            if self.controller.is_stopped() {
                break;
            }
            let frame = FRAMES[frames % FRAMES.len()] as char;
            // Step back, draw, step forward so log lines don't clobber the frame.
            let redraw = format!("\x1b[2D{}\x1b[1C", frame);
            if out.write_all(redraw.as_bytes()).await.is_err() || out.flush().await.is_err() {
                break;
            }
            frames += 1;
        }

        frames
    }
}
