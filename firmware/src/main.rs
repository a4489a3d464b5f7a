#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

//! STOP-mode entry/exit demo for the DEVKIT-MPC5744P.
//!
//! The red and green user LEDs take turns marking a STOP0 window; each window
//! ends after ten seconds on the periodic timer or earlier on a falling edge
//! at the wakeup pin. A timer wake flashes the blue LED before the cycle
//! continues. All sequencing logic lives in `stopcycle-core`; this crate only
//! binds it to the chip's registers.
//!
//! Known limitations on real hardware:
//! - Some debug probes keep the chip out of true STOP0, so the demo appears
//!   to hang at its first stop entry. Flash, disconnect, and reset to run
//!   freely.
//! - A silicon erratum on this family can leave a mode transition
//!   incomplete, in which case the post-wake verification spins forever.
//!   Only an external reset recovers.

#[cfg(target_os = "none")]
extern crate panic_halt;

mod hw;

#[cfg(target_os = "none")]
mod runtime;

#[cfg(not(target_os = "none"))]
fn main() {}
