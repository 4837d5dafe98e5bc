use crate::stats::StatsSnapshot;
use std::fmt;
use std::time::Duration;

/// Final counters of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub snapshot: StatsSnapshot,
    pub run_duration: Duration,
    pub elapsed: Duration,
}

impl Report {
    pub fn operations_per_second(&self) -> Option<u64> {
        self.snapshot.ops_per_second(self.run_duration)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Done. stats: ")?;
        writeln!(f, "-------------------------------")?;
        writeln!(f, "  Successful operations: {}", self.snapshot.successes)?;
        writeln!(f, "  Failed requests: {}", self.snapshot.connect_failures)?;
        writeln!(f, "  Failed IO: {}", self.snapshot.io_failures)?;
        writeln!(f, "-------------------------------")?;
        match self.operations_per_second() {
            Some(ops) => writeln!(f, "  Operations/sec: {}", ops)?,
            None => writeln!(f, "  Operations/sec: n/a")?,
        }
        writeln!(f, "  Elapsed: {:.2}s", self.elapsed.as_secs_f64())?;
        write!(f, "===============================")
    }
}
