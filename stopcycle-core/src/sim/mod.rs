//! Simulated machine for host-side tests and the emulator.
//!
//! One [`SimMachine`] stands in for the whole board: the mode-entry unit
//! with its keyed-write protocol, the countdown wake timer with its
//! mode-dependent tick rate, the falling-edge wake monitor, the three
//! indicator pads, and a virtual microsecond clock. Time only moves inside
//! [`SimMachine::advance_time`], which jumps to the next interesting
//! instant, so a ten-second halt costs one step to simulate.
//!
//! Every externally observable side effect lands in a bounded event trace;
//! ordering-sensitive tests assert against [`SimMachine::trace_snapshot`].

use core::cell::{Cell, RefCell};
use core::time::Duration;

use heapless::{HistoryBuf, Vec};

use crate::delay::DelayProvider;
use crate::indicator::{Indicator, IndicatorDriver, LineLevel};
use crate::mode::{MODE_KEY, ModeEntryBus, OperatingMode};
use crate::wake::WakeSource;
use crate::wake::monitor::ExternalWakeBus;
use crate::wake::timer::WakeTimerBus;

/// Busy reads of the transition-in-progress flag before a requested
/// transition settles and the current-mode field updates.
pub const TRANSITION_SETTLE_POLLS: u8 = 3;

/// Events retained in the trace ring.
pub const TRACE_DEPTH: usize = 256;

/// Timer ticks per virtual microsecond in a run mode (bus clock divided
/// down to 10 MHz).
const RUN_TICKS_PER_MICRO: u64 = 10;

/// Timer ticks per virtual microsecond while stopped. With the bus clock
/// halted the timer falls back to the 16 MHz internal RC oscillator,
/// divided down to 1 MHz, so the same load value runs ten times longer.
const STOP_TICKS_PER_MICRO: u64 = 1;

/// One observable side effect, in program order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TraceEvent {
    /// First half of a keyed mode request was written.
    ModeRequested { target: u8 },
    /// A mode-control write that did not form a valid keyed pair.
    RequestIgnored { word: u32 },
    /// A transition completed and the current-mode field updated.
    ModeSettled { mode: u8 },
    /// An accepted stop request halted the core clock.
    StopEntered,
    /// A wake source brought the core clock back.
    WakeFired { source: WakeSource },
    /// The countdown start value was loaded.
    TimerArmed { ticks: u32 },
    /// The countdown reached zero and reloaded.
    TimerExpired,
    /// The timer channel-enable bit was cleared.
    ChannelDisabled,
    /// The sticky timer expiry flag was cleared.
    ExpiryCleared,
    /// A falling edge was latched by the wake monitor.
    EdgeDetected,
    /// The sticky edge flag was cleared.
    EdgeCleared,
    /// An indicator line was driven to a level.
    PadWrite { indicator: Indicator, level: LineLevel },
    /// An indicator line was inverted, ending at `level`.
    PadToggle { indicator: Indicator, level: LineLevel },
}

/// Interrupt requests the simulated controller can post.
///
/// The host has no asynchronous delivery, so a pending request parks here
/// until the test harness or emulator loop dispatches it to the matching
/// handler, standing in for the hardware vector table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimInterrupt {
    /// The wake timer's channel raised its routed interrupt.
    TimerWake,
}

#[derive(Clone, Copy)]
struct Transition {
    target: u8,
    polls_left: u8,
}

struct TimerUnit {
    gated: bool,
    load: u32,
    remaining: u64,
    channel_enabled: bool,
    irq_enabled: bool,
    routed_priority: Option<u8>,
    expiry_flag: bool,
}

/// In-memory stand-in for the board's register file plus a virtual clock.
pub struct SimMachine {
    now_micros: u64,
    mode_current: Cell<u8>,
    mode_transition: Cell<Option<Transition>>,
    pending_request: Option<u32>,
    halted: bool,
    resume_mode: u8,
    timer: TimerUnit,
    edge_armed: bool,
    edge_flag: bool,
    scheduled_edge_micros: Option<u64>,
    pads: [LineLevel; 3],
    irq_pending: Option<SimInterrupt>,
    step_wake: Option<WakeSource>,
    trace: RefCell<HistoryBuf<TraceEvent, TRACE_DEPTH>>,
}

impl SimMachine {
    /// A machine at reset: default run mode current, pads high (indicators
    /// off), timer gated, nothing armed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now_micros: 0,
            mode_current: Cell::new(OperatingMode::Drun.code()),
            mode_transition: Cell::new(None),
            pending_request: None,
            halted: false,
            resume_mode: OperatingMode::Drun.code(),
            timer: TimerUnit {
                gated: true,
                load: 0,
                remaining: 0,
                channel_enabled: false,
                irq_enabled: false,
                routed_priority: None,
                expiry_flag: false,
            },
            edge_armed: false,
            edge_flag: false,
            scheduled_edge_micros: None,
            pads: [LineLevel::High; 3],
            irq_pending: None,
            step_wake: None,
            trace: RefCell::new(HistoryBuf::new()),
        }
    }

    /// Moves virtual time forward by up to `duration`.
    ///
    /// Advances in jumps to the next interesting instant, firing timer
    /// expiries and scheduled edges on the way. Returns early, reporting
    /// the source, as soon as a wake brings the machine out of the halt;
    /// the rest of the duration is not consumed. A wake latched before the
    /// call (a stale sticky flag at stop entry) returns at zero elapsed.
    pub fn advance_time(&mut self, duration: Duration) -> Option<WakeSource> {
        let mut budget = whole_micros(duration);
        loop {
            if let Some(source) = self.step_wake.take() {
                return Some(source);
            }
            if self
                .scheduled_edge_micros
                .is_some_and(|due| due <= self.now_micros)
            {
                self.scheduled_edge_micros = None;
                self.pulse_external_edge();
                continue;
            }
            if budget == 0 {
                return None;
            }
            let mut step = budget;
            if let Some(delta) = self.micros_until_expiry() {
                step = step.min(delta);
            }
            if let Some(due) = self.scheduled_edge_micros {
                step = step.min(due - self.now_micros);
            }
            self.now_micros += step;
            budget -= step;
            self.tick_timer(step);
        }
    }

    /// Runs the clock until a wake fires or `limit` elapses, reporting the
    /// wake source and how much virtual time the halt consumed.
    pub fn run_until_wake(&mut self, limit: Duration) -> Option<(WakeSource, Duration)> {
        let start = self.now_micros;
        let source = self.advance_time(limit)?;
        Some((source, Duration::from_micros(self.now_micros - start)))
    }

    /// Latches a falling edge on the wake input right now. Ignored while
    /// the monitor is not armed.
    pub fn pulse_external_edge(&mut self) {
        if !self.edge_armed {
            return;
        }
        self.edge_flag = true;
        self.record(TraceEvent::EdgeDetected);
        if self.halted {
            self.wake(WakeSource::ExternalEdge);
        }
    }

    /// Schedules a falling edge `after` the current virtual instant. It
    /// fires once [`Self::advance_time`] crosses that instant.
    pub fn schedule_external_edge(&mut self, after: Duration) {
        self.scheduled_edge_micros = Some(self.now_micros.saturating_add(whole_micros(after)));
    }

    /// Removes the pending interrupt request, if one is posted. The caller
    /// plays the vector table and invokes the matching handler.
    pub fn take_pending_interrupt(&mut self) -> Option<SimInterrupt> {
        self.irq_pending.take()
    }

    /// Chronological copy of the retained event trace.
    #[must_use]
    pub fn trace_snapshot(&self) -> Vec<TraceEvent, TRACE_DEPTH> {
        self.trace.borrow().oldest_ordered().copied().collect()
    }

    /// Forgets all recorded events. Useful between test phases.
    pub fn clear_trace(&mut self) {
        self.trace.replace(HistoryBuf::new());
    }

    /// Current virtual instant.
    #[must_use]
    pub fn now(&self) -> Duration {
        Duration::from_micros(self.now_micros)
    }

    /// Decoded current mode.
    #[must_use]
    pub fn current_mode(&self) -> OperatingMode {
        OperatingMode::from_code(self.mode_current.get())
    }

    /// True while the core clock is halted in stop mode.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Level currently driven on an indicator line.
    #[must_use]
    pub fn indicator_level(&self, indicator: Indicator) -> LineLevel {
        self.pads[indicator.index()]
    }

    /// True while the timer channel-enable bit is set.
    #[must_use]
    pub const fn timer_channel_enabled(&self) -> bool {
        self.timer.channel_enabled
    }

    /// True while the timer module is gated off.
    #[must_use]
    pub const fn timer_module_gated(&self) -> bool {
        self.timer.gated
    }

    /// State of the sticky timer expiry flag.
    #[must_use]
    pub const fn timer_expiry_pending(&self) -> bool {
        self.timer.expiry_flag
    }

    /// Countdown start value last loaded.
    #[must_use]
    pub const fn timer_load(&self) -> u32 {
        self.timer.load
    }

    /// Wall time until the enabled countdown next expires, at the current
    /// mode's tick rate. Zero while the channel is disabled.
    #[must_use]
    pub fn timer_remaining(&self) -> Duration {
        if !self.timer.channel_enabled {
            return Duration::ZERO;
        }
        Duration::from_micros(self.timer.remaining.div_ceil(self.tick_rate()))
    }

    /// Priority the timer interrupt is routed at, once routed.
    #[must_use]
    pub const fn routed_priority(&self) -> Option<u8> {
        self.timer.routed_priority
    }

    /// True once falling-edge wake detection is armed.
    #[must_use]
    pub const fn edge_wake_armed(&self) -> bool {
        self.edge_armed
    }

    /// State of the sticky edge flag.
    #[must_use]
    pub const fn edge_flag_pending(&self) -> bool {
        self.edge_flag
    }

    fn record(&self, event: TraceEvent) {
        self.trace.borrow_mut().write(event);
    }

    fn accept_request(&mut self, target: u8) {
        if target == OperatingMode::Stop0.code() {
            self.resume_mode = self.mode_current.get();
            self.mode_current.set(target);
            self.halted = true;
            self.record(TraceEvent::StopEntered);
            // A sticky flag left set from before the request brings the
            // core straight back out of the halt.
            if self.timer_irq_live() && self.timer.expiry_flag {
                self.irq_pending = Some(SimInterrupt::TimerWake);
                self.wake(WakeSource::TimerExpiry);
            } else if self.edge_armed && self.edge_flag {
                self.wake(WakeSource::ExternalEdge);
            }
        } else {
            self.begin_transition(target);
        }
    }

    fn begin_transition(&mut self, target: u8) {
        self.mode_transition.set(Some(Transition {
            target,
            polls_left: TRANSITION_SETTLE_POLLS,
        }));
    }

    fn wake(&mut self, source: WakeSource) {
        self.halted = false;
        self.record(TraceEvent::WakeFired { source });
        self.begin_transition(self.resume_mode);
        self.step_wake = Some(source);
    }

    fn on_timer_expiry(&mut self) {
        self.timer.expiry_flag = true;
        self.record(TraceEvent::TimerExpired);
        if self.timer_irq_live() {
            self.irq_pending = Some(SimInterrupt::TimerWake);
            if self.halted {
                self.wake(WakeSource::TimerExpiry);
            }
        }
    }

    const fn timer_irq_live(&self) -> bool {
        self.timer.irq_enabled && self.timer.routed_priority.is_some()
    }

    const fn timer_counting(&self) -> bool {
        !self.timer.gated && self.timer.channel_enabled && self.timer.load != 0
    }

    const fn tick_rate(&self) -> u64 {
        if self.halted {
            STOP_TICKS_PER_MICRO
        } else {
            RUN_TICKS_PER_MICRO
        }
    }

    fn micros_until_expiry(&self) -> Option<u64> {
        if !self.timer_counting() {
            return None;
        }
        Some(self.timer.remaining.div_ceil(self.tick_rate()))
    }

    fn tick_timer(&mut self, micros: u64) {
        if !self.timer_counting() {
            return;
        }
        let mut ticks = micros.saturating_mul(self.tick_rate());
        while ticks >= self.timer.remaining {
            ticks -= self.timer.remaining;
            self.timer.remaining = u64::from(self.timer.load);
            self.on_timer_expiry();
            if !self.timer_counting() {
                return;
            }
        }
        self.timer.remaining -= ticks;
    }
}

impl Default for SimMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeEntryBus for SimMachine {
    fn write_mode_control(&mut self, word: u32) {
        if word & 0xFFFF == u32::from(MODE_KEY) {
            self.pending_request = Some(word);
            self.record(TraceEvent::ModeRequested {
                target: target_code(word),
            });
            return;
        }
        let confirmed = word & 0xFFFF == u32::from(!MODE_KEY)
            && self
                .pending_request
                .take()
                .is_some_and(|request| target_code(request) == target_code(word));
        if confirmed {
            self.accept_request(target_code(word));
        } else {
            // Any other write invalidates a half-written request; the pair
            // must arrive back-to-back.
            self.pending_request = None;
            self.record(TraceEvent::RequestIgnored { word });
        }
    }

    fn transition_in_progress(&self) -> bool {
        let Some(transition) = self.mode_transition.get() else {
            return false;
        };
        if transition.polls_left == 0 {
            self.mode_transition.set(None);
            self.mode_current.set(transition.target);
            self.record(TraceEvent::ModeSettled {
                mode: transition.target,
            });
            return false;
        }
        self.mode_transition.set(Some(Transition {
            polls_left: transition.polls_left - 1,
            ..transition
        }));
        true
    }

    fn current_mode_code(&self) -> u8 {
        self.mode_current.get()
    }
}

impl WakeTimerBus for SimMachine {
    fn gate_module(&mut self) {
        self.timer.gated = true;
    }

    fn ungate_module(&mut self) {
        self.timer.gated = false;
    }

    fn load_countdown(&mut self, ticks: u32) {
        self.timer.load = ticks;
        self.timer.remaining = u64::from(ticks);
        self.record(TraceEvent::TimerArmed { ticks });
    }

    fn enable_channel(&mut self) {
        self.timer.channel_enabled = true;
        self.timer.irq_enabled = true;
    }

    fn disable_channel(&mut self) {
        self.timer.channel_enabled = false;
        self.record(TraceEvent::ChannelDisabled);
    }

    fn route_interrupt(&mut self, priority: u8) {
        self.timer.routed_priority = Some(priority);
    }

    fn expiry_pending(&self) -> bool {
        self.timer.expiry_flag
    }

    fn clear_expiry_flag(&mut self) {
        self.timer.expiry_flag = false;
        self.record(TraceEvent::ExpiryCleared);
    }
}

impl ExternalWakeBus for SimMachine {
    fn arm_edge_wake(&mut self) {
        self.edge_armed = true;
    }

    fn edge_pending(&self) -> bool {
        self.edge_flag
    }

    fn clear_edge_flag(&mut self) {
        self.edge_flag = false;
        self.record(TraceEvent::EdgeCleared);
    }
}

impl IndicatorDriver for SimMachine {
    fn set_line(&mut self, indicator: Indicator, level: LineLevel) {
        self.pads[indicator.index()] = level;
        self.record(TraceEvent::PadWrite { indicator, level });
    }

    fn toggle_line(&mut self, indicator: Indicator) {
        let level = self.pads[indicator.index()].toggled();
        self.pads[indicator.index()] = level;
        self.record(TraceEvent::PadToggle { indicator, level });
    }
}

impl DelayProvider for SimMachine {
    fn wait(&mut self, interval: Duration) {
        self.advance_time(interval);
    }
}

/// The 4-bit mode code carried in a mode-control word.
const fn target_code(word: u32) -> u8 {
    (word >> 28) as u8
}

fn whole_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use crate::mode::{self, confirmation_word, request_word};
    use crate::wake::timer;

    use super::*;

    #[test]
    fn keyed_pair_settles_after_transition_polls() {
        let mut sim = SimMachine::new();
        sim.write_mode_control(request_word(OperatingMode::Run3));
        sim.write_mode_control(confirmation_word(OperatingMode::Run3));
        assert_eq!(sim.current_mode(), OperatingMode::Drun);

        let mut busy_polls = 0_u8;
        while sim.transition_in_progress() {
            busy_polls += 1;
        }
        assert_eq!(busy_polls, TRANSITION_SETTLE_POLLS);
        assert_eq!(sim.current_mode(), OperatingMode::Run3);
    }

    #[test]
    fn mismatched_confirmation_is_ignored() {
        let mut sim = SimMachine::new();
        sim.write_mode_control(request_word(OperatingMode::Run3));
        sim.write_mode_control(confirmation_word(OperatingMode::Stop0));
        assert!(!sim.transition_in_progress());
        assert!(!sim.is_halted());
        assert_eq!(sim.current_mode(), OperatingMode::Drun);
        assert!(
            sim.trace_snapshot()
                .iter()
                .any(|event| matches!(event, TraceEvent::RequestIgnored { .. }))
        );
    }

    #[test]
    fn wrong_key_never_confirms() {
        let mut sim = SimMachine::new();
        sim.write_mode_control(request_word(OperatingMode::Stop0));
        sim.write_mode_control(0xA000_1234);
        assert!(!sim.is_halted());
        sim.write_mode_control(confirmation_word(OperatingMode::Stop0));
        assert!(!sim.is_halted());
    }

    #[test]
    fn countdown_stretches_tenfold_in_stop_mode() {
        let mut sim = SimMachine::new();
        timer::arm(&mut sim, 10_000_000, timer::TIMER_IRQ_PRIORITY);

        sim.advance_time(Duration::from_micros(999_999));
        assert!(!sim.timer_expiry_pending());
        sim.advance_time(Duration::from_micros(1));
        assert!(sim.timer_expiry_pending());

        sim.clear_expiry_flag();
        sim.take_pending_interrupt();
        mode::enter_stop_mode(&mut sim);
        let (source, elapsed) = sim.run_until_wake(Duration::from_secs(60)).unwrap();
        assert_eq!(source, WakeSource::TimerExpiry);
        assert_eq!(elapsed, Duration::from_secs(10));
    }

    #[test]
    fn reload_keeps_firing_until_the_channel_is_disabled() {
        let expiries = |sim: &SimMachine| {
            sim.trace_snapshot()
                .iter()
                .filter(|event| **event == TraceEvent::TimerExpired)
                .count()
        };

        let mut sim = SimMachine::new();
        timer::arm(&mut sim, 1_000, timer::TIMER_IRQ_PRIORITY);
        sim.advance_time(Duration::from_micros(350));
        assert_eq!(expiries(&sim), 3);

        timer::disarm(&mut sim);
        sim.advance_time(Duration::from_millis(5));
        assert_eq!(expiries(&sim), 3);
    }

    #[test]
    fn stop_without_an_armed_wake_source_halts_forever() {
        let mut sim = SimMachine::new();
        mode::enter_stop_mode(&mut sim);
        assert!(sim.is_halted());
        assert_eq!(sim.run_until_wake(Duration::from_secs(3600)), None);
        assert!(sim.is_halted());
        assert_eq!(sim.current_mode(), OperatingMode::Stop0);
    }

    #[test]
    fn edge_while_running_latches_without_waking() {
        let mut sim = SimMachine::new();
        sim.arm_edge_wake();
        sim.schedule_external_edge(Duration::from_millis(3));
        assert_eq!(sim.advance_time(Duration::from_millis(10)), None);
        assert!(sim.edge_flag_pending());
        assert!(!sim.is_halted());
    }
}
