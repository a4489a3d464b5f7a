//! Indicator outputs and their polarity.
//!
//! The three user indicators are wired active-low; the mapping from logical
//! state to line level lives here so no caller hand-encodes polarity. Red
//! and green belong to the cycle sequencer, blue to the timer-wake handler;
//! nothing ever writes an indicator it does not own.

/// One of the three independent indicator outputs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    Red,
    Green,
    Blue,
}

impl Indicator {
    /// Every indicator, in a fixed order usable for table lookups.
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];

    /// Stable index of this indicator within [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

/// Electrical level driven onto an indicator line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineLevel {
    Low,
    High,
}

impl LineLevel {
    /// The opposite level.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

/// Logical indicator state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorState {
    On,
    Off,
}

impl IndicatorState {
    /// Line level realizing this state on the active-low board wiring.
    #[must_use]
    pub const fn line_level(self) -> LineLevel {
        match self {
            Self::On => LineLevel::Low,
            Self::Off => LineLevel::High,
        }
    }
}

/// Drives the indicator lines.
pub trait IndicatorDriver {
    /// Drives one line to `level`.
    fn set_line(&mut self, indicator: Indicator, level: LineLevel);

    /// Inverts the current level of one line.
    fn toggle_line(&mut self, indicator: Indicator);

    /// Releases every indicator to its inactive level.
    fn all_off(&mut self) {
        for indicator in Indicator::ALL {
            self.set_line(indicator, IndicatorState::Off.line_level());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_low_mapping() {
        assert_eq!(IndicatorState::On.line_level(), LineLevel::Low);
        assert_eq!(IndicatorState::Off.line_level(), LineLevel::High);
    }

    #[test]
    fn toggling_inverts_the_level() {
        assert_eq!(LineLevel::Low.toggled(), LineLevel::High);
        assert_eq!(LineLevel::High.toggled(), LineLevel::Low);
    }

    #[test]
    fn indices_match_catalog_order() {
        for (position, indicator) in Indicator::ALL.iter().enumerate() {
            assert_eq!(indicator.index(), position);
        }
    }
}
