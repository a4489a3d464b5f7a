//! External wake-on-edge monitor.

/// Register access for the falling-edge wake input.
///
/// The monitor is configuration-only from the sequencer's point of view: a
/// detected edge sets a sticky status flag and lets execution resume, but
/// no service routine runs for it. The flag must be cleared after every
/// stop exit; left set, it makes the very next stop entry wake immediately
/// without any further edge.
pub trait ExternalWakeBus {
    /// Arms falling-edge wake detection on the wake input.
    fn arm_edge_wake(&mut self);

    /// Reads the sticky edge flag.
    fn edge_pending(&self) -> bool;

    /// Write-one-to-clear of the edge flag.
    fn clear_edge_flag(&mut self);
}
