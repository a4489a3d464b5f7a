#![no_std]

//! Core sequencing logic for the MPC5744P low-power stop/wake cycling demo.
//!
//! Everything with ordering or timing constraints lives in this crate,
//! behind capability traits, so the same code runs against the real register
//! file on the target and against the simulated machine in [`sim`] on a
//! development host:
//!
//! - [`mode`] — the keyed-write mode-entry protocol and post-transition
//!   verification polls.
//! - [`wake`] — the countdown wake timer, the falling-edge external wake
//!   monitor with its sticky write-one-to-clear flag, and the interrupt
//!   handler that acknowledges a timed wake.
//! - [`cycle`] — the red/green phase state machine that arms the timer,
//!   requests stop mode, and cleans up after every wake.
//!
//! The demo itself has no recoverable errors: a mode transition that never
//! completes is an unrecoverable hang on this silicon and is deliberately
//! not masked by a timeout.

pub mod cycle;
pub mod delay;
pub mod indicator;
pub mod mode;
pub mod sim;
pub mod wake;

pub use cycle::{CycleConfig, CyclePhase, CycleSequencer, CycleState};
pub use delay::DelayProvider;
pub use indicator::{Indicator, IndicatorDriver, IndicatorState, LineLevel};
pub use mode::{ModeEntryBus, OperatingMode};
pub use wake::{WakeSignal, WakeSource};
