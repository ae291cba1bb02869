use embedded_hal::delay::DelayNs;
use embedded_io::{Read, ReadReady, Write};

use crate::{
    error::{Error, Result},
    frame,
    registers::DpsRegister,
    types::Setpoints,
};

/// Modbus unit ID the DPS-5005 ships with.
pub const DEFAULT_ADDRESS: u8 = 0x01;

/// The module only talks 9600 baud, 8N1.
pub const BAUD_RATE: u32 = 9600;

/// How long the module needs before its reply is fully buffered. It is slow
/// to answer and there is no response framing to key off, so transactions
/// wait out this fixed window and then collect whatever arrived.
const RESPONSE_SETTLE_MS: u32 = 500;

/// Largest reply we ever expect plus headroom. Anything past this is
/// discarded rather than carried over into the next transaction.
const RESPONSE_CAPACITY: usize = 15;

/// Modbus-RTU master for a DPS-5005 buck converter module, over any interface
/// implementing [embedded_io::Read] + [embedded_io::ReadReady] +
/// [embedded_io::Write].
///
/// The receive side must be non-blocking: `read_ready` reports whether bytes
/// are already buffered and `read` returns only what is there. Writes are
/// fire-and-forget since the module's write echo is unreliable; callers
/// confirm a write by reading the register back.
pub struct Dps5005<S: Read + ReadReady + Write> {
    serial: S,
    address: u8,
}

impl<S: Read + ReadReady + Write> Dps5005<S> {
    /// Create a new driver over `serial`, addressing unit `address`.
    pub fn new(serial: S, address: u8) -> Self {
        Self { serial, address }
    }

    /// Borrow the underlying serial interface.
    pub fn interface(&self) -> &S {
        &self.serial
    }

    /// Read both setpoints in one transaction: V-SET and I-SET occupy
    /// adjacent registers, so a single two-register read returns them
    /// together.
    pub fn read_setpoints(&mut self, delay: &mut impl DelayNs) -> Result<Setpoints, S::Error> {
        let response = self.read_holding(DpsRegister::VSet, 2, frame::PAIR_RESPONSE_LEN, delay)?;
        Ok(Setpoints {
            volts_mv: frame::word_at(&response, frame::DATA_OFFSET),
            amps_ma: frame::word_at(&response, frame::DATA_OFFSET + 2),
        })
    }

    /// Read a single holding register.
    pub fn read_single_register(
        &mut self,
        register: impl Into<u16>,
        delay: &mut impl DelayNs,
    ) -> Result<u16, S::Error> {
        let response = self.read_holding(register, 1, frame::SINGLE_RESPONSE_LEN, delay)?;
        Ok(frame::word_at(&response, frame::DATA_OFFSET))
    }

    /// Whether the module is currently limiting current rather than holding
    /// the set voltage.
    pub fn read_cc_status(&mut self, delay: &mut impl DelayNs) -> Result<bool, S::Error> {
        let value = self.read_single_register(DpsRegister::CvCc, delay)?;
        Ok(value == 1)
    }

    /// Set the output target voltage in millivolts.
    pub fn set_voltage_mv(&mut self, millivolts: u16) -> Result<(), S::Error> {
        self.write_single_register(DpsRegister::VSet, millivolts)
    }

    /// Set the output current limit in milliamps.
    pub fn set_current_ma(&mut self, milliamps: u16) -> Result<(), S::Error> {
        self.write_single_register(DpsRegister::ISet, milliamps)
    }

    /// Write a single holding register. The module's echo is not collected
    /// here; the next transaction's flush discards it, and callers that care
    /// confirm the write with a read-back.
    pub fn write_single_register(
        &mut self,
        register: impl Into<u16>,
        value: u16,
    ) -> Result<(), S::Error> {
        self.flush_receiver()?;
        let request = frame::write_request(self.address, register.into(), value);
        self.serial.write_all(&request).map_err(Error::Serial)?;
        Ok(())
    }

    /// One read-holding transaction: flush stale bytes, send the request,
    /// wait out the module's response window, then collect and validate the
    /// reply. `response_len` is the exact frame length this read produces.
    fn read_holding(
        &mut self,
        register: impl Into<u16>,
        count: u16,
        response_len: usize,
        delay: &mut impl DelayNs,
    ) -> Result<[u8; RESPONSE_CAPACITY], S::Error> {
        self.flush_receiver()?;
        let request = frame::read_request(self.address, register.into(), count);
        self.serial.write_all(&request).map_err(Error::Serial)?;

        delay.delay_ms(RESPONSE_SETTLE_MS);

        // A silent module leaves the buffer zeroed and a truncated reply
        // leaves a partial frame; both fail the CRC check below.
        let mut response = [0u8; RESPONSE_CAPACITY];
        self.receive(&mut response)?;
        if !frame::crc_matches(&response[..response_len]) {
            return Err(Error::InvalidResponse);
        }
        Ok(response)
    }

    /// Pull every pending byte into `buffer`. Overflow is drained and
    /// dropped so an oversized reply cannot bleed into the next transaction.
    fn receive(&mut self, buffer: &mut [u8]) -> Result<(), S::Error> {
        let mut filled = 0;
        while self.serial.read_ready().map_err(Error::Serial)? {
            if filled == buffer.len() {
                self.flush_receiver()?;
                break;
            }
            let n = self
                .serial
                .read(&mut buffer[filled..])
                .map_err(Error::Serial)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(())
    }

    /// Discard unread receive bytes, e.g. a write echo or the tail of an
    /// overlong reply.
    fn flush_receiver(&mut self) -> Result<(), S::Error> {
        let mut sink = [0u8; 8];
        while self.serial.read_ready().map_err(Error::Serial)? {
            if self.serial.read(&mut sink).map_err(Error::Serial)? == 0 {
                break;
            }
        }
        Ok(())
    }
}

/// Actual baud rate a UART clocked at `clock_hz` produces for [BAUD_RATE],
/// in thousandths of the nominal rate, assuming a 16x oversampling divisor
/// rounded to nearest. A clock too slow for even a divisor of one reports
/// zero.
pub const fn baud_rate_per_mille(clock_hz: u32) -> u32 {
    let divisor = (clock_hz + BAUD_RATE * 8) / (BAUD_RATE * 16);
    if divisor == 0 {
        return 0;
    }
    let real = clock_hz / (16 * divisor);
    real * 1000 / BAUD_RATE
}

/// Whether `clock_hz` can hit [BAUD_RATE] within the 1% error bound that
/// keeps an 8N1 frame sampled correctly end to end.
pub const fn clock_within_tolerance(clock_hz: u32) -> bool {
    let per_mille = baud_rate_per_mille(clock_hz);
    per_mille >= 990 && per_mille <= 1010
}
