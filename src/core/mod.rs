//! Core functionality for the keystroke daemon.
//!
//! This module contains the windowed aggregation that turns sampled device
//! events into one count per window.

pub mod windowing;

// Re-export commonly used types
pub use windowing::{TickOutcome, WindowAggregator, WindowState};
