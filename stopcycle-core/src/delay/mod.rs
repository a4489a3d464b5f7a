//! Fixed-interval pauses.

use core::time::Duration;

/// Blocks for roughly `interval`.
///
/// On hardware this is an iteration-counted spin, so the real duration
/// stretches when a slower clock source is active; the simulated machine
/// instead advances its virtual clock by exactly `interval`. Callers must
/// not rely on wall-clock precision, only on "a pause happened here".
pub trait DelayProvider {
    fn wait(&mut self, interval: Duration);
}
