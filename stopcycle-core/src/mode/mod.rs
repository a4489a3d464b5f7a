//! Power-mode transition protocol.
//!
//! The mode-entry unit only accepts a transition request as a keyed write
//! pair: the request word, then its complement-keyed confirmation,
//! back-to-back on the mode-control register. A mismatched pair is ignored
//! by hardware. After a request, software polls the transition-in-progress
//! flag until it clears and then confirms the current-mode field before
//! touching any mode-dependent configuration.
//!
//! The destination modes themselves (regulator, oscillators, clock source)
//! must be configured before the first request; nothing here writes mode
//! configuration.

use core::fmt;

/// 16-bit key carried in the low half of every mode-request word. The
/// confirmation word carries its bitwise complement (`0xA50F`).
pub const MODE_KEY: u16 = 0x5AF0;

const CODE_DRUN: u8 = 0x3;
const CODE_RUN3: u8 = 0x7;
const CODE_STOP0: u8 = 0xA;

/// Operating modes of the power-mode unit, identified by the 4-bit code the
/// hardware uses in both the request word and the current-mode field.
///
/// Only the three modes the demo touches get named variants; any other code
/// decodes losslessly to [`OperatingMode::Other`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// Default run mode the chip boots into.
    Drun,
    /// Full-performance run mode (PLL system clock).
    Run3,
    /// Low-power stop mode; the core clock halts until a wake event.
    Stop0,
    /// Any mode code this demo does not use.
    Other(u8),
}

impl OperatingMode {
    /// The hardware's 4-bit code for this mode.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Drun => CODE_DRUN,
            Self::Run3 => CODE_RUN3,
            Self::Stop0 => CODE_STOP0,
            Self::Other(code) => code,
        }
    }

    /// Decodes a 4-bit mode code; total, unknown codes map to `Other`.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            CODE_DRUN => Self::Drun,
            CODE_RUN3 => Self::Run3,
            CODE_STOP0 => Self::Stop0,
            other => Self::Other(other),
        }
    }

    /// True for the stop mode, where the core clock is halted.
    #[must_use]
    pub const fn is_low_power(self) -> bool {
        matches!(self, Self::Stop0)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drun => f.write_str("DRUN"),
            Self::Run3 => f.write_str("RUN3"),
            Self::Stop0 => f.write_str("STOP0"),
            Self::Other(code) => write!(f, "MODE({code:#x})"),
        }
    }
}

/// Builds the first half of the keyed pair for `target`.
#[must_use]
pub const fn request_word(target: OperatingMode) -> u32 {
    ((target.code() as u32) << 28) | MODE_KEY as u32
}

/// Builds the confirmation half: same target code, complemented key.
#[must_use]
pub const fn confirmation_word(target: OperatingMode) -> u32 {
    ((target.code() as u32) << 28) | (!MODE_KEY) as u32
}

/// Register access for the mode-entry unit.
pub trait ModeEntryBus {
    /// Writes one raw word to the mode-control register.
    fn write_mode_control(&mut self, word: u32);

    /// Reads the transition-in-progress flag from the global status
    /// register.
    fn transition_in_progress(&self) -> bool;

    /// Reads the 4-bit current-mode field from the global status register.
    fn current_mode_code(&self) -> u8;
}

/// Requests a transition to `target` and blocks until it is the current
/// mode.
///
/// Both verification polls are unbounded: if the hardware never completes
/// the transition the caller spins forever. That failure mode is a known
/// silicon limitation of the wake path on this family and is intentionally
/// not masked by a timeout.
pub fn enter_run_mode<B: ModeEntryBus>(bus: &mut B, target: OperatingMode) {
    bus.write_mode_control(request_word(target));
    bus.write_mode_control(confirmation_word(target));
    verify_run_mode(bus, target);
}

/// Requests entry into STOP0.
///
/// This is the single suspension point of the whole program: on hardware
/// the core clock halts once the transition takes effect, and control only
/// continues past this call after a wake source fires. There is nothing to
/// poll here; the caller re-verifies the run mode once it is executing
/// again.
pub fn enter_stop_mode<B: ModeEntryBus>(bus: &mut B) {
    bus.write_mode_control(request_word(OperatingMode::Stop0));
    bus.write_mode_control(confirmation_word(OperatingMode::Stop0));
}

/// Polls until no transition is in progress, then until `expected` is the
/// current mode. Same unbounded-spin semantics as [`enter_run_mode`].
pub fn verify_run_mode<B: ModeEntryBus>(bus: &mut B, expected: OperatingMode) {
    while bus.transition_in_progress() {}
    while bus.current_mode_code() != expected.code() {}
}

/// Decoded current mode of the unit.
pub fn current_mode<B: ModeEntryBus>(bus: &B) -> OperatingMode {
    OperatingMode::from_code(bus.current_mode_code())
}
