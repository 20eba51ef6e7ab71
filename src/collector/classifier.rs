//! Decides which raw events count as keystrokes.

use crate::collector::types::{KeyTransition, RawEvent};

/// True iff the event is a key press. Releases, auto-repeats and non-key
/// events (sync, scan codes, LEDs) never count.
pub fn classify(event: &RawEvent) -> bool {
    event.key_transition() == Some(KeyTransition::Press)
}
