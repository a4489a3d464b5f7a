//! Chip bindings for the MPC5744P target.
//!
//! [`regs`] names the handful of memory-mapped registers the demo touches,
//! [`board`] implements the core's capability traits over them. Everything
//! chip-specific is compiled only for `cfg(target_os = "none")`; this module
//! keeps the one helper the host build can exercise.

pub mod board;
pub mod regs;

use core::time::Duration;

/// Spin iterations per millisecond of requested delay, calibrated against
/// the RUN3 system clock. With a slower clock source active the same count
/// runs proportionally longer; callers accept that stretch.
const ITERATIONS_PER_MS: u64 = 5_000;

/// Converts a delay interval into a busy-wait iteration count.
#[must_use]
pub fn iterations_for(interval: Duration) -> u64 {
    let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
    millis.saturating_mul(ITERATIONS_PER_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_millis_matches_the_calibrated_spin() {
        assert_eq!(iterations_for(Duration::from_millis(100)), 500_000);
    }

    #[test]
    fn sub_millisecond_intervals_round_down_to_no_spin() {
        assert_eq!(iterations_for(Duration::from_micros(900)), 0);
    }
}
