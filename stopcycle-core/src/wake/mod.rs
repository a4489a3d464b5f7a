//! Wake sources and the handler-to-sequencer handoff.
//!
//! A stop window ends when exactly one of two hardware conditions fires
//! first: the countdown timer expires, or a falling edge arrives on the
//! external wake input. Both leave sticky write-one-to-clear flags behind;
//! the losing condition may still assert its flag afterwards, so every exit
//! path clears both flags before the next stop entry.

pub mod handler;
pub mod monitor;
pub mod timer;

pub use handler::{ACK_TOGGLE_COUNT, ACK_TOGGLE_INTERVAL, acknowledge_timer_wake};
pub use monitor::ExternalWakeBus;
pub use timer::{TIMER_IRQ_PRIORITY, WAKE_COUNTDOWN_TICKS, WakeTimerBus, arm, disarm};

use portable_atomic::{AtomicU8, Ordering};

/// Which hardware condition ended a stop window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeSource {
    /// The armed countdown reached zero and its interrupt ran.
    TimerExpiry,
    /// A falling edge arrived on the external wake input.
    ExternalEdge,
}

const SLOT_EMPTY: u8 = 0;
const SLOT_TIMER: u8 = 1;
const SLOT_EXTERNAL: u8 = 2;

/// One-slot wake event latch between interrupt context and the sequencer.
///
/// The timer-wake handler posts right after clearing the hardware flag; the
/// sequencer takes the event once execution resumes after the halt. A later
/// post overwrites an untaken one, mirroring the single sticky hardware
/// flag this latch formalizes. This is the only software-shared datum in
/// the program, and a single atomic cell is all the synchronization it
/// needs.
pub struct WakeSignal {
    slot: AtomicU8,
}

impl WakeSignal {
    /// An empty latch, usable in a `static`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: AtomicU8::new(SLOT_EMPTY),
        }
    }

    /// Records `source`, replacing any untaken event.
    pub fn post(&self, source: WakeSource) {
        let raw = match source {
            WakeSource::TimerExpiry => SLOT_TIMER,
            WakeSource::ExternalEdge => SLOT_EXTERNAL,
        };
        self.slot.store(raw, Ordering::Release);
    }

    /// Removes and returns the latched event, if any.
    pub fn take(&self) -> Option<WakeSource> {
        match self.slot.swap(SLOT_EMPTY, Ordering::AcqRel) {
            SLOT_TIMER => Some(WakeSource::TimerExpiry),
            SLOT_EXTERNAL => Some(WakeSource::ExternalEdge),
            _ => None,
        }
    }
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_latch_yields_nothing() {
        let signal = WakeSignal::new();
        assert_eq!(signal.take(), None);
    }

    #[test]
    fn take_drains_the_posted_event() {
        let signal = WakeSignal::new();
        signal.post(WakeSource::TimerExpiry);
        assert_eq!(signal.take(), Some(WakeSource::TimerExpiry));
        assert_eq!(signal.take(), None);
    }

    #[test]
    fn later_post_overwrites_an_untaken_event() {
        let signal = WakeSignal::new();
        signal.post(WakeSource::TimerExpiry);
        signal.post(WakeSource::ExternalEdge);
        assert_eq!(signal.take(), Some(WakeSource::ExternalEdge));
    }
}
