//! Error types for the link to the power module.

use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Failures while talking to the DPS-5005.
///
/// Neither variant is fatal to the panel: the control loop leaves its
/// confirmed state untouched on any error and retries the exchange on a
/// later pass.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    Serial(I),
    #[error("Response missing, truncated or failed CRC validation")]
    InvalidResponse,
}
