//! Append-only keystroke count log.
//!
//! The file is opened, written and closed for every line. No handle is held
//! between writes, so logrotate can move or truncate the file at any time.

use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One line of the count log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRecord {
    /// Written once when the daemon enters its main loop
    Started { timestamp: DateTime<Utc> },
    /// Written once per expired window
    Flush { timestamp: DateTime<Utc>, count: u64 },
}

impl LogRecord {
    /// Render the record as a single newline-terminated line.
    pub fn to_line(&self) -> String {
        match self {
            LogRecord::Started { timestamp } => {
                format!("Started {}...\n", timestamp.timestamp())
            }
            LogRecord::Flush { timestamp, count } => {
                format!("keyboard {} {}\n", timestamp.timestamp(), count)
            }
        }
    }
}

/// Sole writer of the count log.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    lines_written: u64,
    lines_dropped: u64,
}

impl LogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines_written: 0,
            lines_dropped: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record to the log.
    pub fn append(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        self.append_line(&record.to_line())
    }

    /// Append raw text to the log. A failed write is counted as dropped and
    /// never retried.
    pub fn append_line(&mut self, line: &str) -> Result<(), SinkError> {
        match write_once(&self.path, line) {
            Ok(()) => {
                self.lines_written += 1;
                Ok(())
            }
            Err(source) => {
                self.lines_dropped += 1;
                Err(SinkError::LogUnavailable {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    /// Current write statistics.
    pub fn stats(&self) -> SinkStats {
        SinkStats {
            lines_written: self.lines_written,
            lines_dropped: self.lines_dropped,
        }
    }
}

fn write_once(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    file.write_all(line.as_bytes())
}

/// Snapshot of log sink statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub lines_written: u64,
    pub lines_dropped: u64,
}

/// Errors from writing the count log.
#[derive(Debug)]
pub enum SinkError {
    LogUnavailable { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::LogUnavailable { path, source } => {
                write!(f, "Cannot write log file {path:?}: {source}")
            }
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkError::LogUnavailable { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_line_formats() {
        let started = LogRecord::Started { timestamp: at(1_700_000_000) };
        assert_eq!(started.to_line(), "Started 1700000000...\n");

        let flush = LogRecord::Flush {
            timestamp: at(1_700_000_060),
            count: 42,
        };
        assert_eq!(flush.to_line(), "keyboard 1700000060 42\n");
    }

    #[test]
    fn test_append_never_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystrokes.log");
        let mut sink = LogSink::new(&path);

        let record = LogRecord::Flush { timestamp: at(10), count: 3 };
        sink.append(&record).unwrap();
        sink.append(&record).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "keyboard 10 3\nkeyboard 10 3\n");
        assert_eq!(sink.stats().lines_written, 2);
    }

    #[test]
    fn test_append_preserves_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystrokes.log");
        std::fs::write(&path, "Started 1...\n").unwrap();

        let mut sink = LogSink::new(&path);
        let record = LogRecord::Flush { timestamp: at(61), count: 0 };
        sink.append(&record).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Started 1...\nkeyboard 61 0\n");
    }

    #[test]
    fn test_survives_rotation_between_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystrokes.log");
        let mut sink = LogSink::new(&path);

        sink.append_line("first\n").unwrap();
        std::fs::rename(&path, dir.path().join("keystrokes.log.1")).unwrap();
        sink.append_line("second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
    }

    #[test]
    fn test_unwritable_path_drops_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("keystrokes.log");
        let mut sink = LogSink::new(&path);

        let err = sink.append_line("lost\n").unwrap_err();
        assert!(matches!(err, SinkError::LogUnavailable { .. }));
        assert_eq!(
            sink.stats(),
            SinkStats {
                lines_written: 0,
                lines_dropped: 1
            }
        );
    }
}
