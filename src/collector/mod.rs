//! Event collection module for the keystroke daemon.
//!
//! This module attaches to a Linux input device and decides which of its
//! events count as keystrokes. Only the press/not-press decision leaves this
//! module; key codes do not.

pub mod classifier;
pub mod device;
pub mod types;

// Re-export commonly used types
pub use classifier::classify;
pub use device::{CollectorError, DeviceReader, EventSource};
pub use types::{KeyTransition, RawEvent, EV_KEY, RAW_EVENT_SIZE};
