//! TCP echo load generator.
//!
//! Opens a fixed number of concurrent connections to an echo server, sends a
//! fixed-size message on each and waits for it to come back, over and over,
//! for a configured duration. Outcomes are tallied into lock-free counters and
//! reported once every connection has finished.

pub mod config;
pub mod progress;
pub mod report;
pub mod run;
pub mod stats;
pub mod supervisor;
pub mod worker;
