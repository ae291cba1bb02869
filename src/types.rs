//! Value types shared between the interrupt-side decoders and the
//! foreground control loop.

use strum_macros::EnumIter;

/// Upper bound for the voltage setpoint, in millivolts.
pub const MAX_VOLTS_MV: u16 = 5000;
/// Upper bound for the current setpoint, in milliamps.
pub const MAX_AMPS_MA: u16 = 5000;

/// The two operator-adjustable output quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Voltage,
    Current,
}

impl Channel {
    /// Upper clamp for this channel's setpoint.
    pub const fn limit(self) -> u16 {
        match self {
            Channel::Voltage => MAX_VOLTS_MV,
            Channel::Current => MAX_AMPS_MA,
        }
    }
}

/// Per-detent increment applied by a rotary encoder.
///
/// Each encoder's push switch flips its channel between fine and coarse
/// adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepSize {
    /// 1 mV / 1 mA per detent.
    Unit,
    /// 10 mV / 10 mA per detent.
    Decade,
}

impl StepSize {
    /// Millivolts or milliamps moved per detent.
    pub const fn amount(self) -> u16 {
        match self {
            StepSize::Unit => 1,
            StepSize::Decade => 10,
        }
    }

    /// The other step size.
    pub const fn toggled(self) -> Self {
        match self {
            StepSize::Unit => StepSize::Decade,
            StepSize::Decade => StepSize::Unit,
        }
    }
}

/// A voltage/current target pair, in millivolts and milliamps.
///
/// Used both for values reported by the module and for the panel's own
/// confirmed copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Setpoints {
    pub volts_mv: u16,
    pub amps_ma: u16,
}

impl Setpoints {
    /// The value for one channel.
    pub const fn channel(&self, channel: Channel) -> u16 {
        match channel {
            Channel::Voltage => self.volts_mv,
            Channel::Current => self.amps_ma,
        }
    }

    /// Replace the value for one channel.
    pub fn set_channel(&mut self, channel: Channel, value: u16) {
        match channel {
            Channel::Voltage => self.volts_mv = value,
            Channel::Current => self.amps_ma = value,
        }
    }
}
