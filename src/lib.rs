//! This crate is the hardware-agnostic core of a front panel for the RD
//! DPS-5005 programmable buck module: two rotary encoders with push-switch
//! step toggles adjust target voltage and current, the changes are pushed to
//! the module over its Modbus RTU serial protocol, and the module's
//! constant-current state is mirrored onto an indicator LED.
//!
//! A platform layer supplies the serial link, a 1 ms periodic interrupt,
//! pins and delays through [embedded_io] and [embedded_hal] traits, and
//! wires them up: [store::EncoderScanner] runs in the tick interrupt,
//! [panel::Panel] runs in the main context.
//!
//! The serial link to the module is fixed at:
//! * Baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None

#![cfg_attr(not(test), no_std)]

pub mod decoder;
pub mod error;
pub mod frame;
pub mod panel;
pub mod psu;
pub mod registers;
pub mod store;
pub mod types;

#[cfg(test)]
mod mock_serial;
