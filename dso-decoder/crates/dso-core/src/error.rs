//! Error taxonomy shared by every decode path.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Transfer aborted after {received} of {expected} bytes: {source}")]
    TransferAborted {
        received: usize,
        expected: usize,
        #[source]
        source: io::Error,
    },
    #[error("Malformed block header: {0}")]
    MalformedBlockHeader(String),
    #[error("Image payload truncated: expected {expected} pixels, got {got}")]
    TruncatedImagePayload { expected: usize, got: usize },
    #[error("Unsupported file format: {0}")]
    UnsupportedFileFormat(String),
    #[error("Unsupported device format tag: {0:?}")]
    UnsupportedDeviceFormat(String),
    #[error("Unsupported data bit depth: {0}")]
    UnsupportedDataBitDepth(i64),
    #[error("Missing metadata field: {0}")]
    MissingField(String),
    #[error("Invalid value for {field}: {value:?}")]
    InvalidField { field: String, value: String },
    #[error("Malformed file: {0}")]
    MalformedFile(String),
    #[error("Acquisition set has no channels")]
    NoChannels,
    #[error("Image decode error: {0}")]
    Image(String),
}

impl DecodeError {
    pub fn invalid_field(field: &str, value: &str) -> Self {
        DecodeError::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}
