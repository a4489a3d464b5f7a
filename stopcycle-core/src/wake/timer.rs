//! Countdown wake timer.
//!
//! The timer runs from the peripheral bridge clock, which changes with the
//! operating mode: 10 MHz in RUN3 but 1 MHz in STOP0, where the bridge
//! falls back to the 16 MHz internal oscillator. The same programmed load
//! therefore counts for ~1 s if the chip stays running and ~10 s while
//! stopped. That stretch is a deliberate characteristic of the demo, not a
//! bug to compensate for. The countdown reloads itself at expiry and keeps
//! counting until the channel is disabled.

/// Default countdown load: one second of bridge clock in RUN3, ten seconds
/// in STOP0.
pub const WAKE_COUNTDOWN_TICKS: u32 = 10_000_000;

/// Fixed priority the wake channel's interrupt is routed at.
pub const TIMER_IRQ_PRIORITY: u8 = 15;

/// Register access for the periodic wake timer.
pub trait WakeTimerBus {
    /// Gates the whole timer module off while it is reconfigured.
    fn gate_module(&mut self);

    /// Ungates the timer module; an enabled channel starts counting.
    fn ungate_module(&mut self);

    /// Loads the channel's countdown start value.
    fn load_countdown(&mut self, ticks: u32);

    /// Enables the channel together with its interrupt request line.
    fn enable_channel(&mut self);

    /// Clears the channel-enable bit only; interrupt routing and the
    /// request-enable bit are left as they are.
    fn disable_channel(&mut self);

    /// Routes the channel's interrupt to the boot core at `priority`.
    fn route_interrupt(&mut self, priority: u8);

    /// Reads the sticky expiry flag.
    fn expiry_pending(&self) -> bool;

    /// Write-one-to-clear of the expiry flag.
    fn clear_expiry_flag(&mut self);
}

/// Arms the timer for one stop window.
///
/// The module is gated for the duration of the reconfiguration, then
/// released with the channel counting and its interrupt routed. The timer
/// is not self-re-arming: this must run before every stop entry.
pub fn arm<B: WakeTimerBus>(bus: &mut B, ticks: u32, priority: u8) {
    bus.gate_module();
    bus.load_countdown(ticks);
    bus.enable_channel();
    bus.route_interrupt(priority);
    bus.ungate_module();
}

/// Stops the channel counting.
///
/// Idempotent, and required after every wake regardless of which source
/// fired: after an external wake the timer is still live and would raise a
/// stale interrupt later if left enabled.
pub fn disarm<B: WakeTimerBus>(bus: &mut B) {
    bus.disable_channel();
}

#[cfg(test)]
mod tests {
    use heapless::Vec;

    use super::*;

    #[derive(Debug, Eq, PartialEq)]
    enum Step {
        Gated,
        Loaded(u32),
        ChannelOn,
        Routed(u8),
        Ungated,
        ChannelOff,
    }

    #[derive(Default)]
    struct RecordingBus {
        steps: Vec<Step, 8>,
    }

    impl WakeTimerBus for RecordingBus {
        fn gate_module(&mut self) {
            self.steps.push(Step::Gated).unwrap();
        }

        fn ungate_module(&mut self) {
            self.steps.push(Step::Ungated).unwrap();
        }

        fn load_countdown(&mut self, ticks: u32) {
            self.steps.push(Step::Loaded(ticks)).unwrap();
        }

        fn enable_channel(&mut self) {
            self.steps.push(Step::ChannelOn).unwrap();
        }

        fn disable_channel(&mut self) {
            self.steps.push(Step::ChannelOff).unwrap();
        }

        fn route_interrupt(&mut self, priority: u8) {
            self.steps.push(Step::Routed(priority)).unwrap();
        }

        fn expiry_pending(&self) -> bool {
            false
        }

        fn clear_expiry_flag(&mut self) {}
    }

    #[test]
    fn arm_reconfigures_behind_the_module_gate() {
        let mut bus = RecordingBus::default();
        arm(&mut bus, WAKE_COUNTDOWN_TICKS, TIMER_IRQ_PRIORITY);
        assert_eq!(
            bus.steps.as_slice(),
            &[
                Step::Gated,
                Step::Loaded(10_000_000),
                Step::ChannelOn,
                Step::Routed(15),
                Step::Ungated,
            ]
        );
    }

    #[test]
    fn disarm_touches_only_the_channel_enable() {
        let mut bus = RecordingBus::default();
        disarm(&mut bus);
        disarm(&mut bus);
        assert_eq!(bus.steps.as_slice(), &[Step::ChannelOff, Step::ChannelOff]);
    }
}
