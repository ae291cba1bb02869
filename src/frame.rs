//! Fixed-layout Modbus RTU framing for the DPS-5005 link.
//!
//! The panel only ever exchanges three frame shapes with the module (read
//! two registers, read one register, write one register), so requests are
//! built into fixed 8-byte arrays and responses are validated at fixed
//! offsets rather than going through a general-purpose Modbus codec.

/// Function code: read holding registers.
const FUNC_READ_HOLDING: u8 = 0x03;
/// Function code: write single register.
const FUNC_WRITE_SINGLE: u8 = 0x06;

/// Every request is the same length: address, function, two register-address
/// bytes, two count/value bytes, CRC low, CRC high.
pub const REQUEST_LEN: usize = 8;

/// Length of the response to a two-register read: address, function, byte
/// count, four data bytes, CRC low, CRC high.
pub const PAIR_RESPONSE_LEN: usize = 9;

/// Length of the response to a single-register read.
pub const SINGLE_RESPONSE_LEN: usize = 7;

/// Offset of the first data byte in a read response.
pub const DATA_OFFSET: usize = 3;

/// CRC-16/MODBUS over `bytes`.
///
/// Initial value 0xFFFF, reflected polynomial 0xA001. On the wire the
/// checksum travels low byte first; with that byte order, re-running this
/// over a payload plus its appended checksum yields exactly zero.
pub fn crc16(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in bytes {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Build a read-holding-registers request for `count` registers starting at
/// `register`.
pub fn read_request(address: u8, register: u16, count: u16) -> [u8; REQUEST_LEN] {
    let mut frame = [0u8; REQUEST_LEN];
    frame[0] = address;
    frame[1] = FUNC_READ_HOLDING;
    frame[2..4].copy_from_slice(&register.to_be_bytes());
    frame[4..6].copy_from_slice(&count.to_be_bytes());
    seal(&mut frame);
    frame
}

/// Build a write-single-register request. The 16-bit value is split
/// big-endian into bytes 4 and 5.
pub fn write_request(address: u8, register: u16, value: u16) -> [u8; REQUEST_LEN] {
    let mut frame = [0u8; REQUEST_LEN];
    frame[0] = address;
    frame[1] = FUNC_WRITE_SINGLE;
    frame[2..4].copy_from_slice(&register.to_be_bytes());
    frame[4..6].copy_from_slice(&value.to_be_bytes());
    seal(&mut frame);
    frame
}

/// Append the CRC over everything but the trailing two bytes, low byte first.
fn seal(frame: &mut [u8; REQUEST_LEN]) {
    let crc = crc16(&frame[..REQUEST_LEN - 2]);
    frame[REQUEST_LEN - 2..].copy_from_slice(&crc.to_le_bytes());
}

/// Check the trailing CRC of a response frame: the last two bytes of `frame`
/// must hold, low byte first, the CRC over everything before them. A frame
/// too short to carry a checksum never matches.
///
/// A silent or truncated exchange leaves zeroes in the checked range of the
/// receive buffer; CRC-16/MODBUS over an all-zero prefix is never zero, so
/// such a frame always fails here.
pub fn crc_matches(frame: &[u8]) -> bool {
    if frame.len() < 2 {
        return false;
    }
    let covered = frame.len() - 2;
    let crc = crc16(&frame[..covered]);
    frame[covered] == (crc & 0x00FF) as u8 && frame[covered + 1] == (crc >> 8) as u8
}

/// Decode the big-endian 16-bit word at `offset`.
pub fn word_at(frame: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([frame[offset], frame[offset + 1]])
}
