//! Live instrument access: the socket transport and the capture session.

pub mod dso;
pub mod transport;

pub use dso::Dso;
pub use transport::TcpTransport;

use dso_core::DecodeError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("CH{channel} acquisition not ready after {polls} polls, check the input signal")]
    AcquisitionNotReady { channel: u8, polls: u32 },

    #[error("Device not supported: {0}")]
    UnsupportedDevice(String),

    #[error("Channel {0} is not available on this device")]
    NoSuchChannel(u8),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
