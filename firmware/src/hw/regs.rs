//! Memory-mapped registers of the units the demo touches.
//!
//! Addresses and field masks come from the MPC5744P reference manual. Only
//! the registers the demo actually reads or writes are named; this is not a
//! peripheral access crate.

#![cfg(target_os = "none")]

use core::ptr;

// Mode entry unit (MC_ME).
const MC_ME: usize = 0xFFFB_8000;
/// Global status: transition-in-progress flag and current-mode field.
pub const ME_GS: usize = MC_ME;
/// Mode control; accepts the keyed request/confirmation word pair.
pub const ME_MCTL: usize = MC_ME + 0x04;
/// Mode enable set.
pub const ME_ME: usize = MC_ME + 0x08;
/// RUN3 mode configuration word.
pub const ME_RUN3_MC: usize = MC_ME + 0x3C;
/// STOP0 mode configuration word.
pub const ME_STOP0_MC: usize = MC_ME + 0x48;
/// Run peripheral configuration sets 0, 1, and 7.
pub const ME_RUN_PC0: usize = MC_ME + 0x80;
pub const ME_RUN_PC1: usize = MC_ME + 0x84;
pub const ME_RUN_PC7: usize = MC_ME + 0x9C;
/// Low-power peripheral configuration set 7.
pub const ME_LP_PC7: usize = MC_ME + 0xBC;
/// Peripheral control byte for PIT_0 (peripheral 30).
pub const ME_PCTL_PIT0: usize = MC_ME + 0xC0 + 30;

/// GS: a mode transition is in progress.
pub const GS_MTRANS: u32 = 0x0800_0000;
/// GS: current-mode field position (4 bits).
pub const GS_CURRENT_MODE_SHIFT: u32 = 28;

/// ME: enable bits for the two modes the demo uses.
pub const ME_ENABLE_RUN3: u32 = 1 << 7;
pub const ME_ENABLE_STOP0: u32 = 1 << 10;

/// RUN3: regulator on, flash in RUN, both oscillators on, sysclk = PLL.
pub const RUN3_MC_VALUE: u32 = 0x001F_0012;
/// STOP0: regulator on, flash in RUN, sysclk = 16 MHz internal RC.
pub const STOP0_MC_VALUE: u32 = 0x0013_0010;

/// RUN_PC0 gates all peripheral clocks off; RUN_PC1 runs them everywhere.
pub const RUN_PC0_VALUE: u32 = 0x0000_0000;
pub const RUN_PC1_VALUE: u32 = 0x0000_00FE;
/// Set 7: clocked in DRUN and RUN3, and (LP_PC7) kept clocked in STOP0.
pub const RUN_PC7_VALUE: u32 = 0x0000_0088;
pub const LP_PC7_VALUE: u32 = 0x0000_0400;
/// PCTL: select run set 7 and low-power set 7.
pub const PCTL_SETS_7_7: u8 = 0x3F;

// Periodic interrupt timer (PIT_0), channel 0.
const PIT: usize = 0xFFFF_8400;
/// Module control: module-disable gate.
pub const PIT_MCR: usize = PIT;
/// Channel 0 countdown load value.
pub const PIT_LDVAL0: usize = PIT + 0x100;
/// Channel 0 control: timer enable, interrupt enable.
pub const PIT_TCTRL0: usize = PIT + 0x108;
/// Channel 0 flag register; TIF is write-one-to-clear.
pub const PIT_TFLG0: usize = PIT + 0x10C;

pub const PIT_MCR_MDIS: u32 = 0x2;
pub const PIT_TCTRL_TEN: u32 = 0x1;
pub const PIT_TCTRL_TIE: u32 = 0x2;
pub const PIT_TFLG_TIF: u32 = 0x1;

// Interrupt controller (INTC_0). PIT_0 channel 0 is vector 226; its
// priority select register is 16 bits wide.
const INTC: usize = 0xFC04_0000;
pub const INTC_PSR_PIT0: usize = INTC + 0x60 + 2 * 226;
/// PSR: route to processor 0; the low nibble carries the priority.
pub const PSR_SELECT_CORE0: u16 = 0x8000;

// Wakeup unit (WKPU), NMI channel 0.
const WKPU: usize = 0xFFF9_8000;
/// NMI status flag register; NIF0 is write-one-to-clear.
pub const WKPU_NSR: usize = WKPU;
/// NMI configuration register.
pub const WKPU_NCR: usize = WKPU + 0x08;

pub const NSR_NIF0: u32 = 0x8000_0000;
/// NCR: destination source select for channel 0. The machine-check setting
/// is implementation-defined on this wake path; it is what lets the chip
/// resume without running a service routine, carried over from validated
/// bring-up.
pub const NCR_NDSS0_MACHINE_CHECK: u32 = 0x2 << 29;
/// NCR: wakeup request enable for channel 0.
pub const NCR_NWRE0: u32 = 1 << 28;
/// NCR: falling-edge event enable for channel 0.
pub const NCR_NFEE0: u32 = 1 << 25;

// Pad control and GPIO (SIUL2). The user LEDs sit on pads PC11..PC13,
// numbered 43..45 across the ports.
const SIUL2: usize = 0xFFFC_0000;
const SIUL2_MSCR: usize = SIUL2 + 0x240;
const SIUL2_GPDO: usize = SIUL2 + 0x1300;

/// MSCR: output buffer enable.
pub const MSCR_OBE: u32 = 0x0200_0000;

pub const PAD_LED_RED: usize = 43;
pub const PAD_LED_GREEN: usize = 44;
pub const PAD_LED_BLUE: usize = 45;

/// Pad configuration register for `pad`.
#[must_use]
pub const fn mscr(pad: usize) -> usize {
    SIUL2_MSCR + 4 * pad
}

/// Byte-wide output data register for `pad`.
#[must_use]
pub const fn gpdo(pad: usize) -> usize {
    SIUL2_GPDO + pad
}

pub fn read32(addr: usize) -> u32 {
    unsafe { ptr::read_volatile(addr as *const u32) }
}

pub fn write32(addr: usize, value: u32) {
    unsafe { ptr::write_volatile(addr as *mut u32, value) }
}

pub fn write16(addr: usize, value: u16) {
    unsafe { ptr::write_volatile(addr as *mut u16, value) }
}

pub fn read8(addr: usize) -> u8 {
    unsafe { ptr::read_volatile(addr as *const u8) }
}

pub fn write8(addr: usize, value: u8) {
    unsafe { ptr::write_volatile(addr as *mut u8, value) }
}
