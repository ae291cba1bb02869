//! Register map of the RuiDeng DPS-5005 power module.
//!
//! Addresses follow the RD DPS-series Modbus documentation. The panel only
//! exercises `VSet`, `ISet` and `CvCc`; the rest of the documented map is
//! kept so the addresses live in one place.

/// Holding registers exposed by the DPS-5005 over Modbus RTU.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum DpsRegister {
    /// __R/W__ - Voltage setpoint.
    VSet = 0x00,
    /// __R/W__ - Current setpoint.
    ISet = 0x01,
    /// __R__ - Output voltage display value.
    VOut = 0x02,
    /// __R__ - Output current display value.
    IOut = 0x03,
    /// __R__ - Output power display value.
    Power = 0x04,
    /// __R__ - Input voltage display value.
    UIn = 0x05,
    /// __R/W__ - Key lock.
    /// * `0` - Unlocked.
    /// * `1` - Locked.
    Lock = 0x06,
    /// __R__ - Protection status.
    /// * `0` - Normal operation.
    /// * `1` - OVP tripped.
    /// * `2` - OCP tripped.
    /// * `3` - OPP tripped.
    Protect = 0x07,
    /// __R__ - Constant voltage / constant current state.
    /// * `0` - CV.
    /// * `1` - CC.
    CvCc = 0x08,
    /// __R/W__ - Switched output.
    /// * `0` - Output off.
    /// * `1` - Output on.
    OnOff = 0x09,
    /// __R/W__ - Backlight brightness level.
    ///
    /// Range = 0-5. 0 is darkest, and 5 is the brightest.
    BLed = 0x0A,
    /// __R__ - Product model.
    Model = 0x0B,
    /// __R__ - Firmware version number.
    Version = 0x0C,
}

impl From<DpsRegister> for u16 {
    fn from(value: DpsRegister) -> Self {
        value as u16
    }
}
