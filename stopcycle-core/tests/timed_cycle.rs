use core::time::Duration;

use stopcycle_core::mode;
use stopcycle_core::sim::{SimInterrupt, SimMachine, TraceEvent};
use stopcycle_core::wake::{ACK_TOGGLE_COUNT, ExternalWakeBus, acknowledge_timer_wake};
use stopcycle_core::{
    CycleConfig, CyclePhase, CycleSequencer, CycleState, Indicator, LineLevel, OperatingMode,
    WakeSignal, WakeSource,
};

const STOP_LIMIT: Duration = Duration::from_secs(60);

#[test]
fn each_phase_stops_for_ten_seconds() {
    let mut sim = boot();
    let signal = WakeSignal::new();
    let mut sequencer = CycleSequencer::new(CycleConfig::default());

    for _ in 0..4 {
        let (source, stopped_for) = run_phase(&mut sim, &mut sequencer, &signal);
        assert_eq!(source, WakeSource::TimerExpiry);
        assert_eq!(
            stopped_for,
            Duration::from_secs(10),
            "10_000_000 ticks at the 1 MHz stop-mode timer clock"
        );
    }
}

#[test]
fn timer_wake_toggles_blue_six_times_then_disables_the_channel() {
    let mut sim = boot();
    let signal = WakeSignal::new();
    let mut sequencer = CycleSequencer::new(CycleConfig::default());

    run_phase(&mut sim, &mut sequencer, &signal);

    let trace = sim.trace_snapshot();
    let toggles = trace
        .iter()
        .filter(|event| {
            matches!(
                event,
                TraceEvent::PadToggle {
                    indicator: Indicator::Blue,
                    ..
                }
            )
        })
        .count();
    assert_eq!(toggles, usize::from(ACK_TOGGLE_COUNT));

    let first_toggle = trace
        .iter()
        .position(|event| matches!(event, TraceEvent::PadToggle { .. }))
        .expect("acknowledgment toggles should be recorded");
    let disabled = trace
        .iter()
        .position(|event| *event == TraceEvent::ChannelDisabled)
        .expect("channel should be disabled after acknowledgment");
    assert!(
        first_toggle < disabled,
        "toggles happen before the channel is disabled"
    );
    assert_eq!(
        sim.indicator_level(Indicator::Blue),
        LineLevel::High,
        "an even toggle count leaves blue released"
    );
}

#[test]
fn indicator_writes_alternate_red_then_green() {
    let mut sim = boot();
    let signal = WakeSignal::new();
    let mut sequencer = CycleSequencer::new(CycleConfig::default());

    run_phase(&mut sim, &mut sequencer, &signal);
    run_phase(&mut sim, &mut sequencer, &signal);

    let writes: Vec<(Indicator, LineLevel)> = sim
        .trace_snapshot()
        .iter()
        .filter_map(|event| match event {
            TraceEvent::PadWrite { indicator, level } => Some((*indicator, *level)),
            _ => None,
        })
        .collect();
    assert_eq!(
        writes,
        [
            (Indicator::Red, LineLevel::Low),
            (Indicator::Red, LineLevel::High),
            (Indicator::Green, LineLevel::Low),
            (Indicator::Green, LineLevel::High),
        ],
        "active-low wiring: on drives low, off drives high"
    );
}

#[test]
fn cycle_counter_increments_only_after_the_green_phase() {
    let mut sim = boot();
    let signal = WakeSignal::new();
    let mut sequencer = CycleSequencer::new(CycleConfig::default());

    assert_eq!(sequencer.cycles_completed(), 0);
    run_phase(&mut sim, &mut sequencer, &signal);
    assert_eq!(
        sequencer.cycles_completed(),
        0,
        "red alone does not complete a cycle"
    );
    run_phase(&mut sim, &mut sequencer, &signal);
    assert_eq!(sequencer.cycles_completed(), 1);
    assert_eq!(sequencer.last_wake(), Some(WakeSource::TimerExpiry));
    assert_eq!(sequencer.state(), CycleState::PhaseOn(CyclePhase::Red));
}

/// Runs one complete phase: light, stop, wake, dispatch the interrupt the
/// way the vector table would, clean up, and hand over to the next phase.
fn run_phase(
    sim: &mut SimMachine,
    sequencer: &mut CycleSequencer,
    signal: &WakeSignal,
) -> (WakeSource, Duration) {
    assert!(matches!(sequencer.state(), CycleState::PhaseOn(_)));
    sequencer.advance(sim, signal);
    assert!(sim.is_halted(), "the stop request should halt the core clock");

    let (source, stopped_for) = sim
        .run_until_wake(STOP_LIMIT)
        .expect("a wake source should end the stop window");
    if sim.take_pending_interrupt() == Some(SimInterrupt::TimerWake) {
        acknowledge_timer_wake(sim, signal);
    }

    sequencer.advance(sim, signal);
    sequencer.advance(sim, signal);
    (source, stopped_for)
}

fn boot() -> SimMachine {
    let mut sim = SimMachine::new();
    mode::enter_run_mode(&mut sim, OperatingMode::Run3);
    sim.arm_edge_wake();
    sim.clear_trace();
    sim
}
