//! Interactive terminal session driving the core logic against the
//! simulated machine.
//!
//! Virtual time advances in fixed slices scaled by the speed factor, so a
//! ten-second stop window plays out in real time at `--speed 1` or ten times
//! faster at `--speed 10`. The `n` key pulses the external wake edge; `q`
//! quits.

use std::io::{self, Stdout, Write};
use std::time::Duration as HostDuration;

use core::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};

use stopcycle_core::mode;
use stopcycle_core::sim::{SimInterrupt, SimMachine, TraceEvent};
use stopcycle_core::wake::monitor::ExternalWakeBus;
use stopcycle_core::wake::{WAKE_COUNTDOWN_TICKS, acknowledge_timer_wake};
use stopcycle_core::{
    CycleConfig, CyclePhase, CycleSequencer, CycleState, Indicator, LineLevel, OperatingMode,
    WakeSignal, WakeSource,
};

/// Real-time slice between keyboard polls and renders.
const SLICE_MS: u64 = 50;

/// Trace lines shown at the bottom of the screen.
const TRACE_TAIL: usize = 8;

#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Virtual-time multiplier.
    pub speed: f64,
    /// Countdown loaded before each stop entry.
    pub wake_ticks: u32,
    /// Exit after this many full red+green cycles; `None` runs forever.
    pub cycle_limit: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            wake_ticks: WAKE_COUNTDOWN_TICKS,
            cycle_limit: None,
        }
    }
}

pub struct Session {
    machine: SimMachine,
    sequencer: CycleSequencer,
    signal: WakeSignal,
    speed: f64,
    cycle_limit: Option<u32>,
    out: Stdout,
}

impl Session {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let mut machine = SimMachine::new();
        mode::enter_run_mode(&mut machine, OperatingMode::Run3);
        machine.arm_edge_wake();
        machine.clear_trace();

        let sequencer = CycleSequencer::new(CycleConfig {
            wake_ticks: config.wake_ticks,
            ..CycleConfig::default()
        });

        Self {
            machine,
            sequencer,
            signal: WakeSignal::new(),
            speed: config.speed,
            cycle_limit: config.cycle_limit,
            out: io::stdout(),
        }
    }

    /// Runs the session until the cycle limit is reached or `q` is pressed.
    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.out, Hide)?;
        let outcome = self.drive();
        execute!(self.out, Show)?;
        terminal::disable_raw_mode()?;
        outcome
    }

    fn drive(&mut self) -> io::Result<()> {
        loop {
            // Light the phase indicator, arm the timer, request stop.
            self.sequencer.advance(&mut self.machine, &self.signal);
            self.render()?;

            // Play the stop window out in real time. A stale sticky flag
            // wakes the machine before the loop is ever entered.
            while self.machine.is_halted() {
                if self.poll_keys()? {
                    return Ok(());
                }
                let slice = self.virtual_slice();
                self.machine.advance_time(slice);
                self.render()?;
            }

            // The host has no vector table; dispatch the parked interrupt
            // request to the handler by hand.
            if self.machine.take_pending_interrupt() == Some(SimInterrupt::TimerWake) {
                acknowledge_timer_wake(&mut self.machine, &self.signal);
            }

            // Post-wake cleanup, then hand over to the other phase.
            self.sequencer.advance(&mut self.machine, &self.signal);
            self.render()?;
            self.sequencer.advance(&mut self.machine, &self.signal);

            if self
                .cycle_limit
                .is_some_and(|limit| self.sequencer.cycles_completed() >= limit)
            {
                return Ok(());
            }
        }
    }

    /// Polls the keyboard for one slice. Returns `true` on quit.
    fn poll_keys(&mut self) -> io::Result<bool> {
        if !event::poll(HostDuration::from_millis(SLICE_MS))? {
            return Ok(false);
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                return Ok(false);
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                KeyCode::Char('n') => self.machine.pulse_external_edge(),
                _ => {}
            }
        }
        Ok(false)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn virtual_slice(&self) -> Duration {
        let micros = (SLICE_MS as f64) * 1000.0 * self.speed;
        Duration::from_micros(micros as u64)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn render(&mut self) -> io::Result<()> {
        queue!(self.out, MoveTo(0, 0), Clear(ClearType::All))?;

        queue!(
            self.out,
            Print("MPC5744P stop/wake cycling demo (simulated)"),
            MoveTo(0, 2),
            Print(format!(
                "  red {}   green {}   blue {}",
                lamp(&self.machine, Indicator::Red),
                lamp(&self.machine, Indicator::Green),
                lamp(&self.machine, Indicator::Blue),
            )),
            MoveTo(0, 4),
            Print(format!(
                "  mode {}   state {}   cycles {}",
                self.machine.current_mode(),
                describe_state(self.sequencer.state()),
                self.sequencer.cycles_completed(),
            )),
            MoveTo(0, 5),
            Print(format!(
                "  t={:>8.2?}   countdown {:>8.2?}   last wake {}",
                self.machine.now(),
                self.machine.timer_remaining(),
                describe_wake(self.sequencer.last_wake()),
            )),
        )?;

        let trace = self.machine.trace_snapshot();
        let tail = trace.len().saturating_sub(TRACE_TAIL);
        for (row, event) in trace[tail..].iter().enumerate() {
            queue!(
                self.out,
                MoveTo(0, 7 + row as u16),
                Print(format!("  {}", describe_event(*event))),
            )?;
        }

        queue!(
            self.out,
            MoveTo(0, 7 + TRACE_TAIL as u16 + 1),
            Print("  n: pulse wake edge   q: quit"),
        )?;
        self.out.flush()
    }
}

fn lamp(machine: &SimMachine, indicator: Indicator) -> &'static str {
    // Active low: a driven-low pad lights the LED.
    match machine.indicator_level(indicator) {
        LineLevel::Low => "[#]",
        LineLevel::High => "[ ]",
    }
}

fn describe_state(state: CycleState) -> &'static str {
    match state {
        CycleState::PhaseOn(CyclePhase::Red) => "RED_ON",
        CycleState::Stopped(CyclePhase::Red) => "STOPPED(red)",
        CycleState::PhaseOff(CyclePhase::Red) => "RED_OFF",
        CycleState::PhaseOn(CyclePhase::Green) => "GREEN_ON",
        CycleState::Stopped(CyclePhase::Green) => "STOPPED(green)",
        CycleState::PhaseOff(CyclePhase::Green) => "GREEN_OFF",
    }
}

fn describe_wake(source: Option<WakeSource>) -> &'static str {
    match source {
        None => "-",
        Some(WakeSource::TimerExpiry) => "timer",
        Some(WakeSource::ExternalEdge) => "external edge",
    }
}

fn describe_event(event: TraceEvent) -> String {
    match event {
        TraceEvent::ModeRequested { target } => format!("mode requested {target:#x}"),
        TraceEvent::RequestIgnored { word } => format!("mode request ignored {word:#010x}"),
        TraceEvent::ModeSettled { mode } => {
            format!("mode settled {}", OperatingMode::from_code(mode))
        }
        TraceEvent::StopEntered => "stop entered, core clock halted".to_string(),
        TraceEvent::WakeFired { source } => {
            format!("wake: {}", describe_wake(Some(source)))
        }
        TraceEvent::TimerArmed { ticks } => format!("timer armed, {ticks} ticks"),
        TraceEvent::TimerExpired => "timer expired".to_string(),
        TraceEvent::ChannelDisabled => "timer channel disabled".to_string(),
        TraceEvent::ExpiryCleared => "timer flag cleared".to_string(),
        TraceEvent::EdgeDetected => "falling edge latched".to_string(),
        TraceEvent::EdgeCleared => "edge flag cleared".to_string(),
        TraceEvent::PadWrite { indicator, level } => {
            format!("pad write {indicator:?} -> {level:?}")
        }
        TraceEvent::PadToggle { indicator, level } => {
            format!("pad toggle {indicator:?} -> {level:?}")
        }
    }
}
