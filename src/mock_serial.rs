//! We use this mocking module in unit tests to emulate the DPS-5005 on the
//! other end of the serial link.
//!
//! Responses are scripted ahead of time and armed one per complete request
//! frame written. That mirrors the real module: nothing appears on the
//! receive side until a request has gone out, so a driver that flushes its
//! receiver before each transaction never eats its own scripted reply.

use thiserror::Error;

use crate::frame;

/// Our mock type used to emulate the module's serial port.
pub struct MockSerial {
    /// Buffer to store data written to the mock serial port
    write_buffer: heapless::Vec<u8, 256>,
    /// Scripted replies, consumed one per request frame received
    responses: heapless::Vec<heapless::Vec<u8, 24>, 12>,
    /// Index of the next unarmed scripted reply
    next_response: usize,
    /// Bytes readable by the driver
    read_buffer: heapless::Vec<u8, 64>,
    /// Current position in the read buffer
    read_position: usize,
    /// Bytes written since the last complete request frame
    partial_request: usize,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

#[derive(Error, Debug)]
pub enum MockSerialError {
    /// Simulated buffer overflow
    #[error("Mock buffer overflow")]
    BufferOverflow,
    /// Generic simulated error for testing
    #[error("Simulated serial error")]
    SimulatedError,
}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;

        self.partial_request += buf.len();
        while self.partial_request >= frame::REQUEST_LEN {
            self.partial_request -= frame::REQUEST_LEN;
            self.arm_next_response();
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        let bytes_to_read = core::cmp::min(buf.len(), available_bytes);

        buf[..bytes_to_read].copy_from_slice(
            &self.read_buffer[self.read_position..self.read_position + bytes_to_read],
        );

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(self.read_position < self.read_buffer.len())
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            responses: heapless::Vec::new(),
            next_response: 0,
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            partial_request: 0,
            should_error_on_write: false,
            should_error_on_read: false,
        }
    }

    /// Script the reply to the next unanswered request. An empty slice
    /// scripts a module that stays silent for that one.
    pub fn queue_response(&mut self, response: &[u8]) {
        let mut slot = heapless::Vec::new();
        slot.extend_from_slice(response)
            .expect("scripted response too long for slot");
        self.responses.push(slot).expect("response script full");
    }

    /// Put bytes straight into the receiver, as stale leftovers from an
    /// earlier exchange would be.
    pub fn inject_rx(&mut self, bytes: &[u8]) {
        self.read_buffer
            .extend_from_slice(bytes)
            .expect("read buffer overflow");
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    fn arm_next_response(&mut self) {
        if let Some(response) = self.responses.get(self.next_response) {
            self.read_buffer
                .extend_from_slice(response)
                .expect("read buffer overflow");
        }
        // Past the end of the script the module stays silent.
        self.next_response += 1;
    }
}

impl Default for MockSerial {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, ReadReady, Write};

    #[test]
    fn test_response_armed_only_by_a_full_request() {
        let mut mock = MockSerial::new();
        mock.queue_response(&[0xAA, 0xBB]);

        let request = [0u8; frame::REQUEST_LEN];
        mock.write(&request[..5]).unwrap();
        assert!(!mock.read_ready().unwrap());

        mock.write(&request[5..]).unwrap();
        assert!(mock.read_ready().unwrap());

        let mut buffer = [0u8; 4];
        assert_eq!(mock.read(&mut buffer).unwrap(), 2);
        assert_eq!(&buffer[..2], [0xAA, 0xBB]);
        assert!(!mock.read_ready().unwrap());
    }

    #[test]
    fn test_silent_slot_and_exhausted_script() {
        let mut mock = MockSerial::new();
        mock.queue_response(&[]);

        let request = [0u8; frame::REQUEST_LEN];
        mock.write(&request).unwrap();
        assert!(!mock.read_ready().unwrap());

        // Script exhausted: still nothing to read.
        mock.write(&request).unwrap();
        assert!(!mock.read_ready().unwrap());
    }

    #[test]
    fn test_injected_bytes_readable_without_a_request() {
        let mut mock = MockSerial::new();
        mock.inject_rx(&[0x01, 0x02, 0x03]);

        assert!(mock.read_ready().unwrap());
        let mut buffer = [0u8; 8];
        assert_eq!(mock.read(&mut buffer).unwrap(), 3);
        assert_eq!(&buffer[..3], [0x01, 0x02, 0x03]);
        assert!(!mock.read_ready().unwrap());
    }

    #[test]
    fn test_write_multiple_times() {
        let mut mock = MockSerial::new();
        mock.write(&[0x01, 0x02]).unwrap();
        mock.write(&[0x03]).unwrap();
        assert_eq!(mock.written_data(), [0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_write_error_simulation() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);

        let result = mock.write(b"test");
        assert!(matches!(result, Err(MockSerialError::SimulatedError)));
        assert_eq!(mock.written_data().len(), 0);
    }

    #[test]
    fn test_read_error_simulation() {
        let mut mock = MockSerial::new();
        mock.inject_rx(b"data");
        mock.set_read_error(true);

        let mut buffer = [0u8; 8];
        assert!(mock.read(&mut buffer).is_err());
        assert!(mock.read_ready().is_err());
    }

    #[test]
    fn test_error_kinds_and_messages() {
        assert!(matches!(
            MockSerialError::BufferOverflow.kind(),
            embedded_io::ErrorKind::OutOfMemory
        ));
        assert!(matches!(
            MockSerialError::SimulatedError.kind(),
            embedded_io::ErrorKind::Other
        ));

        // The serial traits demand a full error type, display included.
        assert_eq!(
            MockSerialError::BufferOverflow.to_string(),
            "Mock buffer overflow"
        );
        assert_eq!(
            MockSerialError::SimulatedError.to_string(),
            "Simulated serial error"
        );
    }
}
