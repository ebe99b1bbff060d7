//! Instrument I/O: the byte-source and transport traits, the
//! length-prefixed block reader, the live waveform header parser and
//! 16-bit sample decoding.

pub mod block;
pub mod header;
pub mod samples;
pub mod transport;

pub use block::*;
pub use header::*;
pub use samples::*;
pub use transport::*;
