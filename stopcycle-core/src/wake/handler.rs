//! Timer-wake interrupt service logic.

use core::time::Duration;

use crate::delay::DelayProvider;
use crate::indicator::{Indicator, IndicatorDriver};

use super::timer::WakeTimerBus;
use super::{WakeSignal, WakeSource};

/// Number of blue toggles acknowledging a timed wake. Even, so the line
/// ends at the level it started from (three visible flashes).
pub const ACK_TOGGLE_COUNT: u8 = 6;

/// Pause between acknowledgment toggles.
pub const ACK_TOGGLE_INTERVAL: Duration = Duration::from_millis(100);

/// Services a timer-expiry wake. Runs in interrupt context on hardware.
///
/// The pending flag is cleared before anything else: clearing it after the
/// toggle sequence risks wiping a flag the reloaded countdown has already
/// re-raised, losing that expiry. The wake event is posted to `signal` for
/// the sequencer to consume after the halt returns, then the channel is
/// disabled so the reloaded countdown cannot fire again. Runs to
/// completion without suspending.
pub fn acknowledge_timer_wake<P>(platform: &mut P, signal: &WakeSignal)
where
    P: WakeTimerBus + IndicatorDriver + DelayProvider,
{
    platform.clear_expiry_flag();
    signal.post(WakeSource::TimerExpiry);
    for _ in 0..ACK_TOGGLE_COUNT {
        platform.toggle_line(Indicator::Blue);
        platform.wait(ACK_TOGGLE_INTERVAL);
    }
    platform.disable_channel();
}
