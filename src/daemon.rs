//! Process detachment and the main sampling loop.
//!
//! Startup order in daemon mode is fixed: fork (parent exits 0), clear the
//! umask, open the device, start a new session, detach stdio. Any failure up
//! to that point is fatal. Once running, nothing is: device read errors are
//! empty ticks and log write errors drop a single line.

use crate::collector::{CollectorError, DeviceReader, EventSource};
use crate::config::Config;
use crate::core::{TickOutcome, WindowAggregator};
use crate::sink::{LogRecord, LogSink, SinkStats};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Detach from the invoking process and attach to the input device.
///
/// Returns only in the detached child. The original process exits with
/// success as soon as the fork succeeds.
pub fn daemonize(device_path: &Path) -> Result<DeviceReader, DaemonError> {
    fork_away()?;

    // SAFETY: umask only swaps the process file-creation mask.
    unsafe {
        libc::umask(0);
    }

    let reader = DeviceReader::open(device_path)?;
    new_session()?;
    detach_stdio();

    Ok(reader)
}

fn fork_away() -> Result<(), DaemonError> {
    // SAFETY: called before any threads are spawned.
    match unsafe { libc::fork() } {
        pid if pid < 0 => Err(DaemonError::ForkFailed(io::Error::last_os_error())),
        0 => Ok(()),
        _ => std::process::exit(0),
    }
}

fn new_session() -> Result<(), DaemonError> {
    // SAFETY: setsid has no memory-safety preconditions.
    if unsafe { libc::setsid() } < 0 {
        return Err(DaemonError::SessionCreationFailed(io::Error::last_os_error()));
    }
    Ok(())
}

/// Point stdin, stdout and stderr at /dev/null so the terminal is released
/// and the low descriptors cannot be handed to the log file later.
fn detach_stdio() {
    match OpenOptions::new().read(true).write(true).open("/dev/null") {
        Ok(null) => {
            for fd in 0..=2 {
                // SAFETY: both descriptors are valid for the duration of the call.
                unsafe {
                    libc::dup2(null.as_raw_fd(), fd);
                }
            }
        }
        Err(_) => {
            for fd in 0..=2 {
                // SAFETY: closing a standard descriptor we no longer use.
                unsafe {
                    libc::close(fd);
                }
            }
        }
    }
}

/// Owns all runtime state: device, window and log.
pub struct Daemon<S: EventSource> {
    source: S,
    aggregator: WindowAggregator,
    sink: LogSink,
    tick_interval: Duration,
    stats: SessionStats,
}

impl<S: EventSource> Daemon<S> {
    /// Create a daemon whose first window opens at `now`.
    pub fn new(source: S, config: &Config, now: DateTime<Utc>) -> Self {
        Self {
            source,
            aggregator: WindowAggregator::new(config.window_length.as_secs(), now),
            sink: LogSink::new(config.log_path.clone()),
            tick_interval: config.tick_interval,
            stats: SessionStats::new(now),
        }
    }

    /// Write the `Started` line.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.write(&LogRecord::Started { timestamp: now });
        tracing::info!(
            "Counting key presses in {}s windows",
            self.aggregator.state().window_length.num_seconds()
        );
    }

    /// Run one tick at `now`, flushing to the log if the window expired.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let outcome = self.aggregator.tick(now, &mut self.source);
        self.stats.ticks += 1;

        match outcome {
            TickOutcome::Counted => self.stats.presses += 1,
            TickOutcome::Idle => {}
            TickOutcome::Flushed(record) => {
                self.stats.windows_flushed += 1;
                if let LogRecord::Flush { count, .. } = record {
                    tracing::debug!("Window closed with {} presses", count);
                }
                self.write(&record);
            }
        }

        outcome
    }

    /// Tick once per `tick_interval` until `running` is cleared.
    ///
    /// In daemon mode nothing clears the flag and this never returns.
    pub fn run(&mut self, running: &AtomicBool) {
        while running.load(Ordering::SeqCst) {
            self.tick(Utc::now());
            thread::sleep(self.tick_interval);
        }
    }

    fn write(&mut self, record: &LogRecord) {
        // Lost lines are not retried or buffered.
        if let Err(e) = self.sink.append(record) {
            tracing::warn!("Dropped log line: {}", e);
        }
    }

    /// Statistics for this run.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            sink: self.sink.stats(),
            ..self.stats
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Ticks: {}\n\
             - Key presses counted: {}\n\
             - Windows flushed: {}\n\
             - Log lines written: {}\n\
             - Log lines dropped: {}\n\
             - Session duration: {} seconds",
            stats.ticks,
            stats.presses,
            stats.windows_flushed,
            stats.sink.lines_written,
            stats.sink.lines_dropped,
            (Utc::now() - stats.session_start).num_seconds()
        )
    }

    /// Current window state, mainly for inspection in tests.
    pub fn aggregator(&self) -> &WindowAggregator {
        &self.aggregator
    }
}

/// Counters for one daemon run.
#[derive(Debug, Clone, Copy)]
pub struct SessionStats {
    pub ticks: u64,
    pub presses: u64,
    pub windows_flushed: u64,
    pub sink: SinkStats,
    pub session_start: DateTime<Utc>,
}

impl SessionStats {
    fn new(session_start: DateTime<Utc>) -> Self {
        Self {
            ticks: 0,
            presses: 0,
            windows_flushed: 0,
            sink: SinkStats::default(),
            session_start,
        }
    }
}

/// Fatal startup errors.
#[derive(Debug)]
pub enum DaemonError {
    ForkFailed(io::Error),
    SessionCreationFailed(io::Error),
    Device(CollectorError),
}

impl std::fmt::Display for DaemonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DaemonError::ForkFailed(e) => write!(f, "Failed to fork: {e}"),
            DaemonError::SessionCreationFailed(e) => {
                write!(f, "Failed to create a new session: {e}")
            }
            DaemonError::Device(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DaemonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DaemonError::ForkFailed(e) | DaemonError::SessionCreationFailed(e) => Some(e),
            DaemonError::Device(e) => Some(e),
        }
    }
}

impl From<CollectorError> for DaemonError {
    fn from(err: CollectorError) -> Self {
        DaemonError::Device(err)
    }
}
