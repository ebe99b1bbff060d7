//! In-memory channel records shared by the live capture and file paths.

use crate::dialect::{Calibration, Dialect};
use crate::error::DecodeError;

/// Maximum number of channels in one acquisition.
pub const MAX_CHANNELS: usize = 4;

/// How sample values are represented on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleMode {
    /// Raw integer ADC codes.
    #[default]
    Fast,
    /// Pre-scaled floating voltages.
    Detail,
}

impl SampleMode {
    /// Parse the value half of a `Mode,...` field. Anything but `Fast` is
    /// treated as detail data.
    pub fn from_field(field: &str) -> Self {
        match crate::dialect::field_value(field) {
            Some("Fast") => SampleMode::Fast,
            _ => SampleMode::Detail,
        }
    }
}

/// One acquired channel: scalar acquisition parameters, the verbatim
/// metadata lines and the raw sample codes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelRecord {
    /// Device-reported source name, e.g. `CH1`.
    pub source: String,
    /// Volts per division.
    pub vertical_scale: f64,
    pub vertical_position: f64,
    pub vertical_unit: String,
    pub horizontal_position: f64,
    /// Seconds per sample.
    pub sample_period: f64,
    pub mode: SampleMode,
    /// `Key,Value` metadata lines in CSV order, kept for re-export.
    pub metadata: Vec<String>,
    pub samples: Vec<i16>,
}

impl ChannelRecord {
    /// 1-based channel number parsed from the source name.
    pub fn channel_number(&self) -> Option<u8> {
        let digits: String = self
            .source
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    pub fn points(&self) -> usize {
        self.samples.len()
    }

    pub fn voltage_per_code(&self, calibration: &Calibration) -> f64 {
        calibration.voltage_per_code(self.vertical_scale)
    }
}

/// Channels gathered by one capture or one file load, in discovery order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AcquisitionSet {
    pub channels: Vec<ChannelRecord>,
    /// Calibration shared by every channel of the acquisition.
    pub calibration: Calibration,
    /// Header dialect, when known.
    pub dialect: Option<Dialect>,
}

impl AcquisitionSet {
    pub fn new(calibration: Calibration, dialect: Option<Dialect>) -> Self {
        Self {
            channels: Vec::new(),
            calibration,
            dialect,
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Points per channel, taken from the first channel.
    pub fn points(&self) -> usize {
        self.channels.first().map(|c| c.points()).unwrap_or(0)
    }

    /// Check the invariants every consumer relies on: 1..=4 channels, all
    /// with the same number of points.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.channels.is_empty() {
            return Err(DecodeError::NoChannels);
        }
        if self.channels.len() > MAX_CHANNELS {
            return Err(DecodeError::MalformedFile(format!(
                "{} channels, at most {} supported",
                self.channels.len(),
                MAX_CHANNELS
            )));
        }
        let points = self.points();
        if let Some(ch) = self.channels.iter().find(|c| c.points() != points) {
            return Err(DecodeError::MalformedFile(format!(
                "{} has {} points, expected {}",
                ch.source,
                ch.points(),
                points
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, points: usize) -> ChannelRecord {
        ChannelRecord {
            source: source.to_string(),
            vertical_scale: 0.5,
            samples: vec![0; points],
            ..Default::default()
        }
    }

    #[test]
    fn test_channel_number() {
        assert_eq!(record("CH3", 0).channel_number(), Some(3));
        assert_eq!(record("Math", 0).channel_number(), None);
    }

    #[test]
    fn test_sample_mode_field() {
        assert_eq!(SampleMode::from_field("Mode,Fast"), SampleMode::Fast);
        assert_eq!(SampleMode::from_field("Mode,Detail"), SampleMode::Detail);
    }

    #[test]
    fn test_validate() {
        let mut set = AcquisitionSet::default();
        assert!(matches!(set.validate(), Err(DecodeError::NoChannels)));

        set.channels.push(record("CH1", 10));
        set.channels.push(record("CH2", 10));
        assert!(set.validate().is_ok());
        assert_eq!(set.points(), 10);

        set.channels.push(record("CH3", 9));
        assert!(matches!(set.validate(), Err(DecodeError::MalformedFile(_))));
    }

    #[test]
    fn test_voltage_per_code() {
        let cal = Calibration::default();
        assert!((record("CH1", 0).voltage_per_code(&cal) - 0.02).abs() < 1e-12);
    }
}
