//! Fixed-length counting windows.
//!
//! Each tick either samples one event from the device (window still open)
//! or flushes the count (window expired). The expiry check comes first, so a
//! tick that crosses the boundary never reads: whatever is pending on the
//! device at that instant lands in the next window.

use crate::collector::{classify, EventSource};
use crate::config::MAX_WINDOW_SECS;
use crate::sink::LogRecord;
use chrono::{DateTime, Duration, Utc};

/// Counting state for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// When the current window opened; never moves backwards
    pub window_start: DateTime<Utc>,
    /// Length of every window
    pub window_length: Duration,
    /// Key presses seen so far in this window
    pub count: u64,
}

impl WindowState {
    pub fn new(window_start: DateTime<Utc>, window_length: Duration) -> Self {
        Self {
            window_start,
            window_length,
            count: 0,
        }
    }

    /// Check whether the window has run its full length at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.window_start >= self.window_length
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A key press was read and counted
    Counted,
    /// Nothing countable was read (no data, release, repeat, non-key)
    Idle,
    /// The window expired; the record must go to the log sink
    Flushed(LogRecord),
}

/// Drives a `WindowState` one tick at a time.
#[derive(Debug)]
pub struct WindowAggregator {
    state: WindowState,
}

impl WindowAggregator {
    /// Create an aggregator whose first window opens at `start`.
    ///
    /// Lengths beyond `MAX_WINDOW_SECS` are clamped to it.
    pub fn new(window_length_secs: u64, start: DateTime<Utc>) -> Self {
        let secs = window_length_secs.min(MAX_WINDOW_SECS) as i64;
        Self {
            state: WindowState::new(start, Duration::seconds(secs)),
        }
    }

    /// Advance by one tick.
    ///
    /// At most one event is sampled per tick; bursts faster than the tick
    /// rate are undercounted.
    pub fn tick<S: EventSource + ?Sized>(
        &mut self,
        now: DateTime<Utc>,
        source: &mut S,
    ) -> TickOutcome {
        if self.state.is_expired(now) {
            return TickOutcome::Flushed(self.flush(now));
        }

        match source.poll() {
            Some(event) if classify(&event) => {
                self.state.count += 1;
                TickOutcome::Counted
            }
            _ => TickOutcome::Idle,
        }
    }

    /// Close the current window at `now` and open the next one.
    fn flush(&mut self, now: DateTime<Utc>) -> LogRecord {
        let record = LogRecord::Flush {
            timestamp: now,
            count: self.state.count,
        };

        self.state.count = 0;
        self.state.window_start = self.state.window_start.max(now);
        record
    }

    /// Current window state.
    pub fn state(&self) -> &WindowState {
        &self.state
    }
}
