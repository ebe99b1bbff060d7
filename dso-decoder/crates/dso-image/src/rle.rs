//! Run-length expansion of RGB565 screen dumps.
//!
//! The payload is a sequence of little-endian `(length, colour)` u16 pairs
//! consumed strictly in order. An unpaired trailing word is reserved and
//! ignored.

use crate::lut::Rgb565Lut;
use crate::ImageBuffer;
use byteorder::{ByteOrder, LittleEndian};
use dso_core::{DecodeError, ScreenGeometry};

/// Expand runs until the screen is full. Runs past the last pixel are cut
/// at the boundary; a payload that runs out first is an error.
pub fn decode_rle(payload: &[u8], screen: &ScreenGeometry) -> Result<ImageBuffer, DecodeError> {
    let total = screen.pixel_count();
    let lut = Rgb565Lut::global();
    let mut data = Vec::with_capacity(screen.byte_len());
    let mut pixels = 0usize;

    for pair in payload.chunks_exact(4) {
        if pixels >= total {
            break;
        }
        let length = LittleEndian::read_u16(&pair[0..2]) as usize;
        let rgb = lut.rgb(LittleEndian::read_u16(&pair[2..4]));
        let run = length.min(total - pixels);
        for _ in 0..run {
            data.extend_from_slice(&rgb);
        }
        pixels += run;
    }

    if pixels < total {
        return Err(DecodeError::TruncatedImagePayload {
            expected: total,
            got: pixels,
        });
    }

    Ok(ImageBuffer {
        width: screen.width,
        height: screen.height,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(width: u32, height: u32) -> ScreenGeometry {
        ScreenGeometry { width, height }
    }

    fn payload(pairs: &[(u16, u16)]) -> Vec<u8> {
        let mut out = Vec::new();
        for &(len, value) in pairs {
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_exact_fill() {
        let img = decode_rle(&payload(&[(3, 0xF800), (5, 0x001F)]), &screen(4, 2)).unwrap();
        assert_eq!(img.data.len(), screen(4, 2).byte_len());
        assert_eq!(img.pixel(2, 0), [0xF8, 0, 0]);
        assert_eq!(img.pixel(3, 0), [0, 0, 0xF8]);
        assert_eq!(img.pixel(3, 1), [0, 0, 0xF8]);
    }

    #[test]
    fn test_overrun_stops_at_boundary() {
        let img = decode_rle(
            &payload(&[(6, 0xFFFF), (100, 0x07E0), (9, 0x1234)]),
            &screen(4, 2),
        )
        .unwrap();
        assert_eq!(img.data.len(), 24);
        assert_eq!(img.pixel(1, 1), [0xF8, 0xFC, 0xF8]);
        assert_eq!(img.pixel(3, 1), [0, 0xFC, 0]);
    }

    #[test]
    fn test_reserved_trailing_word() {
        let mut bytes = payload(&[(4, 0xFFFF)]);
        bytes.extend_from_slice(&[0xAB, 0xCD]);
        let img = decode_rle(&bytes, &screen(2, 2)).unwrap();
        assert_eq!(img.data, [0xF8, 0xFC, 0xF8].repeat(4));
    }

    #[test]
    fn test_truncated_payload() {
        match decode_rle(&payload(&[(3, 0xFFFF)]), &screen(2, 2)) {
            Err(DecodeError::TruncatedImagePayload { expected, got }) => {
                assert_eq!(expected, 4);
                assert_eq!(got, 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
