//! Linux evdev reader.
//!
//! The device node is opened read-only and non-blocking, and `poll` performs
//! at most one fixed-size read. The reader never blocks the control loop.

use crate::collector::types::{RawEvent, RAW_EVENT_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// Anything the window aggregator can sample one event from per tick.
pub trait EventSource {
    /// Try to read a single event without blocking.
    fn poll(&mut self) -> Option<RawEvent>;
}

/// Exclusive handle on an input device node.
#[derive(Debug)]
pub struct DeviceReader {
    path: PathBuf,
    file: File,
}

impl DeviceReader {
    /// Open the device at `path` for non-blocking reads.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CollectorError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
            .map_err(|source| CollectorError::DeviceUnavailable {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Opened input device {:?}", path);
        Ok(Self { path, file })
    }

    /// Path the reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSource for DeviceReader {
    fn poll(&mut self) -> Option<RawEvent> {
        let mut buf = [0u8; RAW_EVENT_SIZE];
        match self.file.read(&mut buf) {
            Ok(n) if n == RAW_EVENT_SIZE => RawEvent::from_bytes(&buf),
            Ok(_) => None,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                // Best effort: a failed read is just an empty tick.
                tracing::debug!("Read from {:?} failed: {}", self.path, e);
                None
            }
        }
    }
}

/// Errors that can occur while attaching to the input device.
#[derive(Debug)]
pub enum CollectorError {
    DeviceUnavailable { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::DeviceUnavailable { path, source } => {
                write!(f, "Cannot open input device {path:?}: {source}")
            }
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectorError::DeviceUnavailable { source, .. } => Some(source),
        }
    }
}
