//! Live waveform header parsing.
//!
//! With `:HEAD ON` the instrument prefixes each memory dump with one
//! `;`-separated line of `Key,Value` fields ending in a `Waveform Data`
//! marker. Scalar fields are located by label, not by position. The field
//! list is rewritten into the layout saved CSV files use, so a live capture
//! can be exported and re-loaded unchanged.

use dso_core::{field_value, Calibration, ChannelRecord, DecodeError, Dialect, SampleMode};

/// Version tag of the only live dialect that reports its data bit depth.
const DATA_BIT_TAG: &str = "3.0A";

pub const MODE_FAST_FIELD: &str = "Mode,Fast";

/// Result of parsing one live header line.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformHeader {
    /// Scalar fields and metadata; `samples` is left empty.
    pub record: ChannelRecord,
    pub calibration: Calibration,
    pub dialect: Option<Dialect>,
    /// Start of the binary block when it arrived on the header line.
    pub block_prefix: Option<Vec<u8>>,
}

/// Value of the first field whose text contains `label`.
pub fn labeled_value<'a>(fields: &'a [String], label: &str) -> Result<&'a str, DecodeError> {
    fields
        .iter()
        .find(|f| f.contains(label))
        .and_then(|f| field_value(f))
        .ok_or_else(|| DecodeError::MissingField(label.to_string()))
}

fn labeled_f64(fields: &[String], label: &str) -> Result<f64, DecodeError> {
    let value = labeled_value(fields, label)?;
    value
        .trim()
        .parse()
        .map_err(|_| DecodeError::invalid_field(label, value))
}

/// Parse a live header line into a channel record template.
pub fn parse_waveform_header(line: &str) -> Result<WaveformHeader, DecodeError> {
    let block_prefix = line
        .split(';')
        .find_map(|f| f.find('#').map(|i| f[i..].as_bytes().to_vec()));

    let mut fields: Vec<String> = line.split(';').map(str::to_string).collect();
    let n = fields.len();
    if n < 3 {
        return Err(DecodeError::MissingField("Waveform Data".to_string()));
    }

    // The last field holds the block start (or nothing); move the marker
    // there and place `Mode,Fast` ahead of it.
    fields[n - 1] = fields[n - 2].clone();
    let calibration = if fields[0].contains(DATA_BIT_TAG) {
        fields[n - 2] = fields[n - 3].clone();
        fields[n - 3] = MODE_FAST_FIELD.to_string();
        Calibration::from_field(&fields[n - 2])?
    } else {
        fields[n - 2] = MODE_FAST_FIELD.to_string();
        Calibration::default()
    };

    let dialect = Dialect::detect(&fields[0]).ok();
    let record = ChannelRecord {
        source: labeled_value(&fields, "Source")?.to_string(),
        sample_period: labeled_f64(&fields, "Sampling Period")?,
        vertical_scale: labeled_f64(&fields, "Vertical Scale")?,
        vertical_position: labeled_f64(&fields, "Vertical Position")?,
        horizontal_position: labeled_f64(&fields, "Horizontal Position")?,
        vertical_unit: labeled_value(&fields, "Vertical Units")?.to_string(),
        mode: SampleMode::Fast,
        samples: Vec::new(),
        metadata: fields,
    };

    Ok(WaveformHeader {
        record,
        calibration,
        dialect,
        block_prefix,
    })
}
