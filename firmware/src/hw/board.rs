//! Board handle implementing the core's capability traits.

#![cfg(target_os = "none")]

use core::hint;
use core::time::Duration;

use stopcycle_core::delay::DelayProvider;
use stopcycle_core::indicator::{Indicator, IndicatorDriver, LineLevel};
use stopcycle_core::mode::ModeEntryBus;
use stopcycle_core::wake::monitor::ExternalWakeBus;
use stopcycle_core::wake::timer::WakeTimerBus;

use super::{iterations_for, regs};

/// Zero-sized handle over the demo's register file.
///
/// Both the main loop and the timer ISR construct their own handle; the
/// registers they touch are disjoint by the indicator-ownership convention,
/// so the two never race on the same pad.
pub struct Board;

impl Board {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Peripheral clock gating for all modes. The timer is assigned the one
    /// configuration set that stays clocked in STOP0, so it can count down
    /// and wake the core while everything else is gated.
    pub fn configure_peripheral_clocks(&mut self) {
        regs::write32(regs::ME_RUN_PC0, regs::RUN_PC0_VALUE);
        regs::write32(regs::ME_RUN_PC1, regs::RUN_PC1_VALUE);
        regs::write32(regs::ME_RUN_PC7, regs::RUN_PC7_VALUE);
        regs::write32(regs::ME_LP_PC7, regs::LP_PC7_VALUE);
        regs::write8(regs::ME_PCTL_PIT0, regs::PCTL_SETS_7_7);
    }

    /// Enables the two destination modes and writes their configuration
    /// words. Must run before the first keyed mode request; the mode-entry
    /// protocol itself performs no mode configuration.
    pub fn configure_target_modes(&mut self) {
        regs::write32(
            regs::ME_ME,
            regs::ME_ENABLE_RUN3 | regs::ME_ENABLE_STOP0,
        );
        regs::write32(regs::ME_RUN3_MC, regs::RUN3_MC_VALUE);
        regs::write32(regs::ME_STOP0_MC, regs::STOP0_MC_VALUE);
    }

    /// Switches the three indicator pads to outputs.
    pub fn enable_indicator_pads(&mut self) {
        for indicator in Indicator::ALL {
            regs::write32(regs::mscr(pad_of(indicator)), regs::MSCR_OBE);
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

const fn pad_of(indicator: Indicator) -> usize {
    match indicator {
        Indicator::Red => regs::PAD_LED_RED,
        Indicator::Green => regs::PAD_LED_GREEN,
        Indicator::Blue => regs::PAD_LED_BLUE,
    }
}

const fn level_bit(level: LineLevel) -> u8 {
    match level {
        LineLevel::Low => 0,
        LineLevel::High => 1,
    }
}

impl ModeEntryBus for Board {
    fn write_mode_control(&mut self, word: u32) {
        regs::write32(regs::ME_MCTL, word);
    }

    fn transition_in_progress(&self) -> bool {
        regs::read32(regs::ME_GS) & regs::GS_MTRANS != 0
    }

    fn current_mode_code(&self) -> u8 {
        ((regs::read32(regs::ME_GS) >> regs::GS_CURRENT_MODE_SHIFT) & 0xF) as u8
    }
}

impl WakeTimerBus for Board {
    fn gate_module(&mut self) {
        regs::write32(regs::PIT_MCR, regs::PIT_MCR_MDIS);
    }

    fn ungate_module(&mut self) {
        regs::write32(regs::PIT_MCR, 0);
    }

    fn load_countdown(&mut self, ticks: u32) {
        regs::write32(regs::PIT_LDVAL0, ticks);
    }

    fn enable_channel(&mut self) {
        regs::write32(regs::PIT_TCTRL0, regs::PIT_TCTRL_TEN | regs::PIT_TCTRL_TIE);
    }

    fn disable_channel(&mut self) {
        let tctrl = regs::read32(regs::PIT_TCTRL0);
        regs::write32(regs::PIT_TCTRL0, tctrl & !regs::PIT_TCTRL_TEN);
    }

    fn route_interrupt(&mut self, priority: u8) {
        regs::write16(
            regs::INTC_PSR_PIT0,
            regs::PSR_SELECT_CORE0 | u16::from(priority & 0xF),
        );
    }

    fn expiry_pending(&self) -> bool {
        regs::read32(regs::PIT_TFLG0) & regs::PIT_TFLG_TIF != 0
    }

    fn clear_expiry_flag(&mut self) {
        regs::write32(regs::PIT_TFLG0, regs::PIT_TFLG_TIF);
    }
}

impl ExternalWakeBus for Board {
    fn arm_edge_wake(&mut self) {
        regs::write32(
            regs::WKPU_NCR,
            regs::NCR_NDSS0_MACHINE_CHECK | regs::NCR_NWRE0 | regs::NCR_NFEE0,
        );
    }

    fn edge_pending(&self) -> bool {
        regs::read32(regs::WKPU_NSR) & regs::NSR_NIF0 != 0
    }

    fn clear_edge_flag(&mut self) {
        regs::write32(regs::WKPU_NSR, regs::NSR_NIF0);
    }
}

impl IndicatorDriver for Board {
    fn set_line(&mut self, indicator: Indicator, level: LineLevel) {
        regs::write8(regs::gpdo(pad_of(indicator)), level_bit(level));
    }

    fn toggle_line(&mut self, indicator: Indicator) {
        let pad = regs::gpdo(pad_of(indicator));
        regs::write8(pad, regs::read8(pad) ^ 1);
    }
}

impl DelayProvider for Board {
    fn wait(&mut self, interval: Duration) {
        for _ in 0..iterations_for(interval) {
            hint::spin_loop();
        }
    }
}
