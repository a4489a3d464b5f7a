//! Target entry point and the timer wake handler.

use stopcycle_core::indicator::IndicatorDriver;
use stopcycle_core::mode::{self, OperatingMode};
use stopcycle_core::wake::monitor::ExternalWakeBus;
use stopcycle_core::wake::{WakeSignal, acknowledge_timer_wake};
use stopcycle_core::{CycleConfig, CycleSequencer};

use crate::hw::board::Board;

// Board support collaborators: startup code installs the vector table and
// global interrupt mechanism, and brings the PLL up to 160 MHz.
unsafe extern "C" {
    fn enable_interrupts();
    fn configure_system_clock();
}

/// Handler-to-sequencer wake latch, the only software-shared datum.
static WAKE_SIGNAL: WakeSignal = WakeSignal::new();

#[unsafe(no_mangle)]
pub extern "C" fn main() -> ! {
    let mut board = Board::new();

    // Peripheral gating is configured before the clock bring-up because the
    // bring-up re-enters DRUN and the new gating takes effect on that
    // transition.
    unsafe { enable_interrupts() };
    board.configure_peripheral_clocks();
    unsafe { configure_system_clock() };

    // DRUN cannot transition straight to STOP0 on this family; the demo
    // parks in RUN3 and stops from there.
    board.configure_target_modes();
    mode::enter_run_mode(&mut board, OperatingMode::Run3);

    board.enable_indicator_pads();
    board.all_off();
    board.arm_edge_wake();

    let mut sequencer = CycleSequencer::new(CycleConfig::default());
    loop {
        sequencer.advance(&mut board, &WAKE_SIGNAL);
    }
}

/// PIT channel 0 handler, vector 226. Runs when the wake countdown expires.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "C" fn PIT0_ISR() {
    let mut board = Board::new();
    acknowledge_timer_wake(&mut board, &WAKE_SIGNAL);
}
