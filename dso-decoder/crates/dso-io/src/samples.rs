//! 16-bit sample decoding and code/voltage conversion.
//!
//! Live memory dumps are big-endian; LSF files store little-endian codes.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte order of a sample payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOrder {
    /// Live capture.
    BigEndian,
    /// LSF files.
    LittleEndian,
}

/// Decode signed 16-bit samples. A trailing odd byte is dropped.
pub fn decode_samples(payload: &[u8], order: SampleOrder) -> Vec<i16> {
    payload
        .chunks_exact(2)
        .map(|c| match order {
            SampleOrder::BigEndian => BigEndian::read_i16(c),
            SampleOrder::LittleEndian => LittleEndian::read_i16(c),
        })
        .collect()
}

/// Encode samples as little-endian bytes for LSF output.
pub fn encode_samples_le(samples: &[i16]) -> Vec<u8> {
    let mut buf = vec![0u8; samples.len() * 2];
    LittleEndian::write_i16_into(samples, &mut buf);
    buf
}

/// Scale every `stride`-th code to volts. A stride of 0 is treated as 1.
pub fn codes_to_volts(codes: &[i16], voltage_per_code: f64, stride: usize) -> Vec<f32> {
    let dv = voltage_per_code as f32;
    codes
        .iter()
        .step_by(stride.max(1))
        .map(|&c| c as f32 * dv)
        .collect()
}

fn saturate(value: i64) -> i16 {
    value.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// Recover an integer code from a stored voltage, truncating toward zero.
pub fn volts_to_code(volts: f64, voltage_per_code: f64) -> i16 {
    saturate((volts / voltage_per_code) as i64)
}

/// Code that corresponds to the vertical position on an LSF trace,
/// saturating at the `i32` range.
pub fn center_code(vertical_position: f64, voltage_per_code: f64, adc_center: i32) -> i32 {
    ((vertical_position / voltage_per_code) as i32).saturating_add(adc_center)
}

/// Subtract `center` from every code.
pub fn remove_offset(codes: &mut [i16], center: i32) {
    for c in codes.iter_mut() {
        *c = saturate(*c as i64 - center as i64);
    }
}

/// Inverse of [`remove_offset`].
pub fn apply_offset(codes: &mut [i16], center: i32) {
    for c in codes.iter_mut() {
        *c = saturate(*c as i64 + center as i64);
    }
}
