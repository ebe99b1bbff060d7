//! Length-prefixed block transfers.
//!
//! A block is `#` + one decimal digit `d` + a `d`-digit decimal data length
//! `n` + `n` data bytes + a 1-byte trailer, e.g. `#48000<8000 bytes>\n`.
//! The same framing carries live waveform memory, screen images and the
//! sample section of LSF files.

use crate::transport::ByteSource;
use dso_core::DecodeError;
use std::io::{self, Write};

/// Leading marker byte.
pub const BLOCK_MARKER: u8 = b'#';
/// Bytes requested when no initial buffer is available.
pub const PROBE_LEN: usize = 20;
/// Upper bound on a single transport read.
pub const MAX_CHUNK: usize = 100_000;
/// Trailer byte after the data section.
pub const TRAILER_LEN: usize = 1;

/// Parsed `#d<len>` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Marker, digit count and length field together.
    pub header_len: usize,
    /// Declared number of data bytes.
    pub data_len: usize,
}

impl BlockHeader {
    /// Width of the length field, from the digit after the marker.
    pub fn digit_count(buf: &[u8]) -> Result<usize, DecodeError> {
        match buf {
            [BLOCK_MARKER, d @ b'1'..=b'9', ..] => Ok((d - b'0') as usize),
            [BLOCK_MARKER, d, ..] => Err(DecodeError::MalformedBlockHeader(format!(
                "length digit {:?} out of range 1..=9",
                *d as char
            ))),
            [m, ..] if *m != BLOCK_MARKER => Err(DecodeError::MalformedBlockHeader(format!(
                "expected '#' marker, found {:?}",
                *m as char
            ))),
            _ => Err(DecodeError::MalformedBlockHeader(format!(
                "header truncated at {} bytes",
                buf.len()
            ))),
        }
    }

    /// Parse a complete header from the start of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self, DecodeError> {
        let header_len = 2 + Self::digit_count(buf)?;
        let field = buf.get(2..header_len).ok_or_else(|| {
            DecodeError::MalformedBlockHeader(format!(
                "length field truncated: {} of {} header bytes",
                buf.len(),
                header_len
            ))
        })?;
        let text = String::from_utf8_lossy(field);
        if !field.iter().all(u8::is_ascii_digit) {
            return Err(DecodeError::MalformedBlockHeader(format!(
                "non-numeric length field {:?}",
                text
            )));
        }
        let data_len = text.parse().map_err(|_| {
            DecodeError::MalformedBlockHeader(format!("length field {:?} out of range", text))
        })?;
        Ok(Self { header_len, data_len })
    }

    /// Header for `data_len` data bytes.
    pub fn for_data_len(data_len: usize) -> Self {
        let digits = data_len.to_string().len();
        Self {
            header_len: 2 + digits,
            data_len,
        }
    }

    /// Total block length: header, data and trailer.
    pub fn total_len(&self) -> usize {
        self.header_len + self.data_len + TRAILER_LEN
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let len = self.data_len.to_string();
        format!("#{}{}", len.len(), len).into_bytes()
    }
}

/// A fully received block. Owned by the decode that requested it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    bytes: Vec<u8>,
}

impl Block {
    /// Data section, without header and trailer.
    pub fn payload(&self) -> &[u8] {
        let start = self.header.header_len;
        &self.bytes[start..start + self.header.data_len]
    }

    /// Every byte of the block, exactly `header.total_len()` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Pull bytes from `source` until `buf` holds `target` bytes.
///
/// A read error or an exhausted source releases the source and aborts the
/// transfer; nothing is retried here.
fn fill<S: ByteSource + ?Sized>(
    source: &mut S,
    buf: &mut Vec<u8>,
    target: usize,
) -> Result<(), DecodeError> {
    while buf.len() < target {
        let want = (target - buf.len()).min(MAX_CHUNK);
        log::debug!("{:8} bytes remaining", target - buf.len());
        let result = match source.read_bytes(want) {
            Ok(chunk) if chunk.is_empty() => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "byte source exhausted",
            )),
            other => other,
        };
        match result {
            Ok(mut chunk) => {
                chunk.truncate(want);
                buf.extend_from_slice(&chunk);
            }
            Err(e) => {
                source.release();
                return Err(DecodeError::TransferAborted {
                    received: buf.len(),
                    expected: target,
                    source: e,
                });
            }
        }
    }
    Ok(())
}

/// Read one block from `source`.
///
/// `initial` holds bytes of the block already received (for example the
/// tail of a header line); without it a `PROBE_LEN`-byte probe is read
/// first. The result is exactly the declared total length.
pub fn read_block<S: ByteSource + ?Sized>(
    source: &mut S,
    initial: Option<Vec<u8>>,
) -> Result<Block, DecodeError> {
    let mut buf = match initial {
        Some(buf) => buf,
        None => {
            let mut buf = Vec::with_capacity(PROBE_LEN);
            match source.read_bytes(PROBE_LEN) {
                Ok(probe) => buf.extend_from_slice(&probe[..probe.len().min(PROBE_LEN)]),
                Err(e) => {
                    source.release();
                    return Err(DecodeError::TransferAborted {
                        received: 0,
                        expected: PROBE_LEN,
                        source: e,
                    });
                }
            }
            buf
        }
    };

    fill(source, &mut buf, 2)?;
    let header_len = 2 + BlockHeader::digit_count(&buf)?;
    fill(source, &mut buf, header_len)?;
    let header = BlockHeader::parse(&buf)?;

    let total = header.total_len();
    log::info!("Block transfer: {} bytes declared", total);
    buf.truncate(total);
    fill(source, &mut buf, total)?;

    Ok(Block { header, bytes: buf })
}

/// Write `data` as a complete block with a `\n` trailer.
pub fn write_block<W: Write>(writer: &mut W, data: &[u8]) -> io::Result<()> {
    writer.write_all(&BlockHeader::for_data_len(data.len()).to_bytes())?;
    writer.write_all(data)?;
    writer.write_all(b"\n")?;
    Ok(())
}
