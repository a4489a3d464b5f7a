//! Red/green cycle state machine.
//!
//! One full cycle is six transitions:
//! `RED_ON → STOPPED → RED_OFF → GREEN_ON → STOPPED → GREEN_OFF → repeat`.
//! Each [`CycleSequencer::advance`] call executes exactly one of them, so
//! tests can drive individual transitions without a hardware halt.

use core::time::Duration;

use crate::delay::DelayProvider;
use crate::indicator::{Indicator, IndicatorDriver, IndicatorState};
use crate::mode::{self, ModeEntryBus, OperatingMode};
use crate::wake::monitor::ExternalWakeBus;
use crate::wake::timer::{self, TIMER_IRQ_PRIORITY, WAKE_COUNTDOWN_TICKS, WakeTimerBus};
use crate::wake::{WakeSignal, WakeSource};

/// Pause between a phase's cleanup and the next phase.
pub const INTER_PHASE_PAUSE: Duration = Duration::from_millis(100);

/// Everything the sequencer needs from the platform, as one bound. A
/// single object (the board on hardware, the simulated machine elsewhere)
/// implements all five capabilities.
pub trait CyclePlatform:
    ModeEntryBus + WakeTimerBus + ExternalWakeBus + IndicatorDriver + DelayProvider
{
}

impl<T> CyclePlatform for T where
    T: ModeEntryBus + WakeTimerBus + ExternalWakeBus + IndicatorDriver + DelayProvider
{
}

/// Color of the running half-cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CyclePhase {
    Red,
    Green,
}

impl CyclePhase {
    /// The indicator this phase owns.
    #[must_use]
    pub const fn indicator(self) -> Indicator {
        match self {
            Self::Red => Indicator::Red,
            Self::Green => Indicator::Green,
        }
    }

    /// The phase following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Red,
        }
    }
}

/// Position within the six-state cycle.
///
/// `Stopped` is entered by the arrow that requests stop mode; on hardware
/// that arrow only finishes once a wake source has fired, so the `Stopped`
/// arrow that follows always runs post-wake.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleState {
    /// About to light the phase indicator and enter stop mode.
    PhaseOn(CyclePhase),
    /// Woken from stop mode, cleanup pending.
    Stopped(CyclePhase),
    /// Cleanup done, about to hand over to the other phase.
    PhaseOff(CyclePhase),
}

/// Sequencer tunables, defaulting to the stock demo values.
#[derive(Clone, Copy, Debug)]
pub struct CycleConfig {
    /// Countdown loaded into the wake timer before each stop entry.
    pub wake_ticks: u32,
    /// Priority the timer interrupt is routed at.
    pub timer_priority: u8,
    /// Run mode verified after every wake.
    pub run_mode: OperatingMode,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            wake_ticks: WAKE_COUNTDOWN_TICKS,
            timer_priority: TIMER_IRQ_PRIORITY,
            run_mode: OperatingMode::Run3,
        }
    }
}

/// Orchestrates the infinite red/green stop/wake cycle.
pub struct CycleSequencer {
    state: CycleState,
    config: CycleConfig,
    cycles_completed: u32,
    last_wake: Option<WakeSource>,
}

impl CycleSequencer {
    /// A sequencer positioned at the start of the red phase.
    #[must_use]
    pub const fn new(config: CycleConfig) -> Self {
        Self {
            state: CycleState::PhaseOn(CyclePhase::Red),
            config,
            cycles_completed: 0,
            last_wake: None,
        }
    }

    /// Current position in the cycle.
    #[must_use]
    pub const fn state(&self) -> CycleState {
        self.state
    }

    /// Completed full red+green cycles. Observability only; wraps.
    #[must_use]
    pub const fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    /// Classification of the most recent wake, once one has happened.
    #[must_use]
    pub const fn last_wake(&self) -> Option<WakeSource> {
        self.last_wake
    }

    /// Executes one state transition and returns the new state.
    ///
    /// The `PhaseOn` arrow ends in the stop request, the single suspension
    /// point. The `Stopped` arrow verifies the run mode is current again
    /// before it touches anything else, then disarms the timer, clears both
    /// sticky wake flags, extinguishes the phase indicator, and pauses.
    pub fn advance<P>(&mut self, platform: &mut P, signal: &WakeSignal) -> CycleState
    where
        P: CyclePlatform,
    {
        self.state = match self.state {
            CycleState::PhaseOn(phase) => {
                platform.set_line(phase.indicator(), IndicatorState::On.line_level());
                timer::arm(platform, self.config.wake_ticks, self.config.timer_priority);
                mode::enter_stop_mode(platform);
                CycleState::Stopped(phase)
            }
            CycleState::Stopped(phase) => {
                mode::verify_run_mode(platform, self.config.run_mode);
                let timed = signal.take();
                timer::disarm(platform);
                platform.clear_expiry_flag();
                platform.set_line(phase.indicator(), IndicatorState::Off.line_level());
                let edge = platform.edge_pending();
                platform.clear_edge_flag();
                self.last_wake = timed.or(edge.then_some(WakeSource::ExternalEdge));
                platform.wait(INTER_PHASE_PAUSE);
                CycleState::PhaseOff(phase)
            }
            CycleState::PhaseOff(phase) => {
                if matches!(phase, CyclePhase::Green) {
                    self.cycles_completed = self.cycles_completed.wrapping_add(1);
                }
                CycleState::PhaseOn(phase.next())
            }
        };
        self.state
    }
}
