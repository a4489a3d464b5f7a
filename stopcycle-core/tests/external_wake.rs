use core::time::Duration;

use stopcycle_core::mode;
use stopcycle_core::sim::{SimMachine, TraceEvent};
use stopcycle_core::wake::ExternalWakeBus;
use stopcycle_core::{
    CycleConfig, CyclePhase, CycleSequencer, CycleState, OperatingMode, WakeSignal, WakeSource,
};

const STOP_LIMIT: Duration = Duration::from_secs(60);

#[test]
fn falling_edge_cuts_the_stop_window_short() {
    let mut sim = boot();
    let signal = WakeSignal::new();
    let mut sequencer = CycleSequencer::new(CycleConfig::default());

    sequencer.advance(&mut sim, &signal);
    sim.schedule_external_edge(Duration::from_secs(3));
    let (source, stopped_for) = sim
        .run_until_wake(STOP_LIMIT)
        .expect("the scheduled edge should end the stop window");
    assert_eq!(source, WakeSource::ExternalEdge);
    assert_eq!(stopped_for, Duration::from_secs(3));
    assert_eq!(
        sim.take_pending_interrupt(),
        None,
        "an edge wake raises no interrupt request"
    );
    assert!(
        !sim.timer_expiry_pending(),
        "the countdown still had seven million ticks left"
    );

    sequencer.advance(&mut sim, &signal);
    assert_eq!(sequencer.last_wake(), Some(WakeSource::ExternalEdge));
    let blue_toggles = sim
        .trace_snapshot()
        .iter()
        .filter(|event| matches!(event, TraceEvent::PadToggle { .. }))
        .count();
    assert_eq!(
        blue_toggles, 0,
        "only a timer wake runs the acknowledgment toggles"
    );
}

#[test]
fn cycling_resumes_timed_after_an_external_wake() {
    let mut sim = boot();
    let signal = WakeSignal::new();
    let mut sequencer = CycleSequencer::new(CycleConfig::default());

    // Red phase cut short by the wake input.
    sequencer.advance(&mut sim, &signal);
    sim.schedule_external_edge(Duration::from_secs(1));
    sim.run_until_wake(STOP_LIMIT)
        .expect("the scheduled edge should end the stop window");
    sequencer.advance(&mut sim, &signal);
    sequencer.advance(&mut sim, &signal);

    // Green phase runs its full countdown regardless.
    sequencer.advance(&mut sim, &signal);
    let (source, stopped_for) = sim
        .run_until_wake(STOP_LIMIT)
        .expect("the timer should end the second stop window");
    assert_eq!(source, WakeSource::TimerExpiry);
    assert_eq!(
        stopped_for,
        Duration::from_secs(10),
        "arming reloads the full countdown"
    );
    assert_eq!(sequencer.state(), CycleState::Stopped(CyclePhase::Green));
}

fn boot() -> SimMachine {
    let mut sim = SimMachine::new();
    mode::enter_run_mode(&mut sim, OperatingMode::Run3);
    sim.arm_edge_wake();
    sim.clear_trace();
    sim
}
