//! Raw input event types for the keystroke daemon.
//!
//! A `RawEvent` is decoded from one kernel `struct input_event` record. It is
//! transient: classified on the tick it was read and then dropped.

use std::mem::size_of;

/// Event category for key and button state changes (`EV_KEY`).
pub const EV_KEY: u16 = 0x01;

/// Size in bytes of one kernel `input_event` record on this target.
pub const RAW_EVENT_SIZE: usize = size_of::<libc::input_event>();

/// Offset of the `type` field: the record starts with a `timeval`.
const KIND_OFFSET: usize = size_of::<libc::timeval>();

/// One event as read from an evdev node.
///
/// Privacy guarantee: the key code is available to the classifier but is
/// never stored, logged or persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    /// Event category (`EV_KEY`, `EV_SYN`, `EV_MSC`, ...)
    pub kind: u16,
    /// Which key or axis
    pub code: u16,
    /// Transition value; for keys 0 = release, 1 = press, 2 = repeat
    pub value: i32,
}

impl RawEvent {
    pub fn new(kind: u16, code: u16, value: i32) -> Self {
        Self { kind, code, value }
    }

    /// Decode one record. Returns `None` for a short buffer.
    ///
    /// The timestamp half of the record is skipped; the aggregator uses its
    /// own clock.
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < RAW_EVENT_SIZE {
            return None;
        }

        let field = &buf[KIND_OFFSET..RAW_EVENT_SIZE];
        let kind = u16::from_ne_bytes([field[0], field[1]]);
        let code = u16::from_ne_bytes([field[2], field[3]]);
        let value = i32::from_ne_bytes([field[4], field[5], field[6], field[7]]);

        Some(Self { kind, code, value })
    }

    /// Key transition for `EV_KEY` events, `None` for everything else.
    pub fn key_transition(&self) -> Option<KeyTransition> {
        if self.kind != EV_KEY {
            return None;
        }
        KeyTransition::from_value(self.value)
    }
}

/// The three transitions the kernel reports for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    Release,
    Press,
    Repeat,
}

impl KeyTransition {
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyTransition::Release),
            1 => Some(KeyTransition::Press),
            2 => Some(KeyTransition::Repeat),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) fn encode(event: &RawEvent) -> Vec<u8> {
    let mut buf = vec![0u8; RAW_EVENT_SIZE];
    buf[KIND_OFFSET..KIND_OFFSET + 2].copy_from_slice(&event.kind.to_ne_bytes());
    buf[KIND_OFFSET + 2..KIND_OFFSET + 4].copy_from_slice(&event.code.to_ne_bytes());
    buf[KIND_OFFSET + 4..KIND_OFFSET + 8].copy_from_slice(&event.value.to_ne_bytes());
    buf
}
