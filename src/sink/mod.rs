//! Durable output for the keystroke daemon.
//!
//! The count log is the only thing the daemon persists: one `Started` line
//! per run and one line per window with a timestamp and a count.

pub mod log;

// Re-export commonly used types
pub use log::{LogRecord, LogSink, SinkError, SinkStats};
