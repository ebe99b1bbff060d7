//! Header dialects and ADC calibration tables.
//!
//! Saved CSV/LSF headers are positional: each dialect fixes how many
//! metadata lines precede the samples and which line holds which field.
//! The offsets are kept in one table per dialect instead of being spread
//! through the readers.

use crate::error::DecodeError;

// ─── Calibration ────────────────────────────────────────────────────────────

/// Lowest data bit depth covered by the calibration tables.
pub const MIN_DATA_BITS: i64 = 8;

/// Steps per vertical division, indexed by `data_bits - 8`.
pub const STEPS_PER_DIV: [u32; 8] = [25, 50, 100, 200, 400, 800, 1600, 3200];

/// ADC code at the vertical center, indexed by `data_bits - 8`.
pub const ADC_CENTER: [i32; 8] = [128, 256, 512, 1024, 2048, 4096, 8192, 16384];

/// Per-bit-depth constants converting raw codes to voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub data_bits: u8,
    pub steps_per_div: u32,
    pub adc_center: i32,
}

impl Calibration {
    /// Look up the calibration for a declared data bit depth (8..=15).
    pub fn from_data_bits(data_bits: i64) -> Result<Self, DecodeError> {
        let index = data_bits - MIN_DATA_BITS;
        if !(0..STEPS_PER_DIV.len() as i64).contains(&index) {
            return Err(DecodeError::UnsupportedDataBitDepth(data_bits));
        }
        let index = index as usize;
        Ok(Self {
            data_bits: data_bits as u8,
            steps_per_div: STEPS_PER_DIV[index],
            adc_center: ADC_CENTER[index],
        })
    }

    /// Parse a `Data Bit,N` metadata field.
    pub fn from_field(field: &str) -> Result<Self, DecodeError> {
        let value = field_value(field).unwrap_or("");
        let bits: i64 = value
            .trim()
            .parse()
            .map_err(|_| DecodeError::invalid_field("Data Bit", value))?;
        Self::from_data_bits(bits)
    }

    /// Voltage represented by one ADC code at the given vertical scale.
    pub fn voltage_per_code(&self, vertical_scale: f64) -> f64 {
        vertical_scale / self.steps_per_div as f64
    }
}

impl Default for Calibration {
    /// 8-bit calibration, used by every dialect without a `Data Bit` field.
    fn default() -> Self {
        Self {
            data_bits: 8,
            steps_per_div: STEPS_PER_DIV[0],
            adc_center: ADC_CENTER[0],
        }
    }
}

/// Value half of a `Key,Value` metadata field.
pub fn field_value(field: &str) -> Option<&str> {
    field.split(',').nth(1)
}

// ─── Dialects ───────────────────────────────────────────────────────────────

/// Positional layout of a saved header, in CSV line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOffsets {
    /// Number of metadata lines before the first sample line.
    pub line_count: usize,
    pub source: usize,
    pub units: usize,
    pub vertical_scale: usize,
    pub vertical_position: usize,
    pub horizontal_position: usize,
    pub sample_period: usize,
    /// `Mode,Fast` / `Mode,Detail` line. LSF headers do not carry it.
    pub mode: usize,
    pub data_bits: Option<usize>,
}

impl FieldOffsets {
    /// Trailing `Waveform Data` marker line.
    pub fn waveform_data(&self) -> usize {
        self.line_count - 1
    }

    /// Position of the data bit field in an LSF header, which lacks the
    /// mode field.
    pub fn lsf_data_bits(&self) -> Option<usize> {
        self.data_bits.map(|i| i - 1)
    }

    /// Position of the `Waveform Data` field in an LSF header.
    pub fn lsf_waveform_data(&self) -> usize {
        self.line_count - 2
    }
}

const LONG_LAYOUT: FieldOffsets = FieldOffsets {
    line_count: 27,
    source: 5,
    units: 6,
    vertical_scale: 12,
    vertical_position: 13,
    horizontal_position: 16,
    sample_period: 19,
    mode: 24,
    data_bits: Some(25),
};

const SHORT_LAYOUT: FieldOffsets = FieldOffsets {
    line_count: 26,
    data_bits: None,
    ..LONG_LAYOUT
};

/// Saved header dialect, keyed by the version tag in the first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// GDS-3000A, tag `3.0A`.
    Gds3000A,
    /// MPO-2000, tag `2.0EP`.
    Mpo2000,
    /// GDS-2000E / MDO-2000E, tag `2.0E`.
    Gds2000E,
    /// MDO-2000A, tag `2.0MA`.
    Mdo2000A,
}

/// Checked in order. `2.0EP` must precede `2.0E`, which is its prefix.
const DIALECT_TAGS: [(&str, Dialect); 4] = [
    ("3.0A", Dialect::Gds3000A),
    ("2.0EP", Dialect::Mpo2000),
    ("2.0E", Dialect::Gds2000E),
    ("2.0MA", Dialect::Mdo2000A),
];

impl Dialect {
    /// Detect the dialect from the first metadata line.
    pub fn detect(first_line: &str) -> Result<Self, DecodeError> {
        DIALECT_TAGS
            .iter()
            .find(|(tag, _)| first_line.contains(tag))
            .map(|&(_, dialect)| dialect)
            .ok_or_else(|| DecodeError::UnsupportedDeviceFormat(first_line.to_string()))
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Dialect::Gds3000A => "3.0A",
            Dialect::Mpo2000 => "2.0EP",
            Dialect::Gds2000E => "2.0E",
            Dialect::Mdo2000A => "2.0MA",
        }
    }

    pub fn layout(&self) -> &'static FieldOffsets {
        match self {
            Dialect::Gds3000A | Dialect::Mpo2000 => &LONG_LAYOUT,
            Dialect::Gds2000E | Dialect::Mdo2000A => &SHORT_LAYOUT,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_table() {
        let cal = Calibration::from_data_bits(8).unwrap();
        assert_eq!(cal, Calibration::default());
        let cal = Calibration::from_data_bits(15).unwrap();
        assert_eq!(cal.steps_per_div, 3200);
        assert_eq!(cal.adc_center, 16384);
    }

    #[test]
    fn test_calibration_out_of_range() {
        assert!(matches!(
            Calibration::from_data_bits(7),
            Err(DecodeError::UnsupportedDataBitDepth(7))
        ));
        assert!(matches!(
            Calibration::from_data_bits(16),
            Err(DecodeError::UnsupportedDataBitDepth(16))
        ));
        assert!(matches!(
            Calibration::from_field("Data Bit,x"),
            Err(DecodeError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_calibration_from_field() {
        let cal = Calibration::from_field("Data Bit,10").unwrap();
        assert_eq!(cal.steps_per_div, 100);
        assert!((cal.voltage_per_code(2.0) - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_dialect_detect_order() {
        assert_eq!(Dialect::detect("Format,3.0A").unwrap(), Dialect::Gds3000A);
        assert_eq!(Dialect::detect("Format,2.0EP").unwrap(), Dialect::Mpo2000);
        assert_eq!(Dialect::detect("Format,2.0E").unwrap(), Dialect::Gds2000E);
        assert_eq!(Dialect::detect("Format,2.0MA").unwrap(), Dialect::Mdo2000A);
        assert!(matches!(
            Dialect::detect("Format,1.0B"),
            Err(DecodeError::UnsupportedDeviceFormat(_))
        ));
    }

    #[test]
    fn test_layouts() {
        let long = Dialect::Gds3000A.layout();
        assert_eq!(long.line_count, 27);
        assert_eq!(long.waveform_data(), 26);
        assert_eq!(long.lsf_data_bits(), Some(24));
        assert_eq!(long.lsf_waveform_data(), 25);

        let short = Dialect::Mdo2000A.layout();
        assert_eq!(short.line_count, 26);
        assert_eq!(short.data_bits, None);
        assert_eq!(short.mode, 24);
        assert_eq!(short.lsf_waveform_data(), 24);
    }
}
