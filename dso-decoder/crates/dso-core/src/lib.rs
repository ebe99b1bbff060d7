//! Oscilloscope core types: channel records, header dialects, device
//! profiles, calibration tables and the display downsampling policy.
//!
//! Everything here is plain data plus pure functions. Transport and file
//! handling live in `dso-io` and `dso-file`.

pub mod dialect;
pub mod downsample;
pub mod error;
pub mod profile;
pub mod record;

pub use dialect::*;
pub use downsample::*;
pub use error::*;
pub use profile::*;
pub use record::*;
