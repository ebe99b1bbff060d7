//! CSV and LSF waveform files.
//!
//! Both formats carry the same per-channel metadata lines the live capture
//! produces, so a capture saved here loads back into an identical
//! `AcquisitionSet`. CSV holds one to four channels as text; LSF holds one
//! channel as a binary block of little-endian codes.

pub mod csv;
pub mod lsf;

pub use csv::*;
pub use lsf::*;

use dso_core::{field_value, AcquisitionSet, ChannelRecord, DecodeError, FieldOffsets, SampleMode};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// On-disk representation, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Lsf,
}

impl FileFormat {
    /// Detect from the extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self, DecodeError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "lsf" => Ok(FileFormat::Lsf),
            _ => Err(DecodeError::UnsupportedFileFormat(path.display().to_string())),
        }
    }
}

/// Load a CSV or LSF file into a fresh acquisition set.
pub fn load_file(path: &Path) -> Result<AcquisitionSet, DecodeError> {
    let format = FileFormat::from_path(path)?;
    let reader = BufReader::new(File::open(path)?);
    let set = match format {
        FileFormat::Csv => read_csv(reader)?,
        FileFormat::Lsf => read_lsf(reader)?,
    };
    set.validate()?;
    log::info!(
        "Loaded {} channel(s) x {} points from {}",
        set.len(),
        set.points(),
        path.display()
    );
    Ok(set)
}

/// Save an acquisition set in the format implied by `path`.
pub fn save_file(path: &Path, set: &AcquisitionSet) -> Result<(), DecodeError> {
    let format = FileFormat::from_path(path)?;
    let mut out = BufWriter::new(File::create(path)?);
    match format {
        FileFormat::Csv => write_csv(&mut out, set)?,
        FileFormat::Lsf => write_lsf(&mut out, set)?,
    }
    out.flush()?;
    log::info!("Saved {} channel(s) to {}", set.len(), path.display());
    Ok(())
}

/// Build a channel record (without samples) from CSV-form metadata lines
/// using the dialect's fixed offsets.
pub(crate) fn record_from_metadata(
    metadata: Vec<String>,
    layout: &FieldOffsets,
    mode: SampleMode,
) -> Result<ChannelRecord, DecodeError> {
    let text = |index: usize, label: &str| -> Result<String, DecodeError> {
        metadata
            .get(index)
            .and_then(|f| field_value(f))
            .map(str::to_string)
            .ok_or_else(|| DecodeError::MissingField(label.to_string()))
    };
    let number = |index: usize, label: &str| -> Result<f64, DecodeError> {
        let value = text(index, label)?;
        value
            .trim()
            .parse()
            .map_err(|_| DecodeError::invalid_field(label, &value))
    };

    let source = text(layout.source, "Source")?;
    let vertical_unit = text(layout.units, "Vertical Units")?;
    let vertical_scale = number(layout.vertical_scale, "Vertical Scale")?;
    let vertical_position = number(layout.vertical_position, "Vertical Position")?;
    let horizontal_position = number(layout.horizontal_position, "Horizontal Position")?;
    let sample_period = number(layout.sample_period, "Sampling Period")?;

    Ok(ChannelRecord {
        source,
        vertical_scale,
        vertical_position,
        vertical_unit,
        horizontal_position,
        sample_period,
        mode,
        metadata,
        samples: Vec::new(),
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// CSV-form metadata for one channel of the given dialect tag.
    pub fn metadata(tag: &str, channel: u8, points: usize) -> Vec<String> {
        let mut lines = vec![
            format!("Format,{}", tag),
            format!("Memory Length,{}", points),
            "IntpDistance,0".to_string(),
            "Trigger Address,0".to_string(),
            "Trigger Level,0.000E+00".to_string(),
            format!("Source,CH{}", channel),
            "Vertical Units,V".to_string(),
            "Vertical Units Div,0".to_string(),
            "Vertical Units Extend Div,16".to_string(),
            "Label,".to_string(),
            "Probe Type,0".to_string(),
            "Probe Ratio,1.000E+01".to_string(),
            format!("Vertical Scale,{}.000E-01", channel * 2),
            "Vertical Position,-1.000E-01".to_string(),
            "Horizontal Units,S".to_string(),
            "Horizontal Scale,5.000E-05".to_string(),
            "Horizontal Position,2.000E-05".to_string(),
            "Horizontal Mode,Main".to_string(),
            "SincET Mode,Real Time".to_string(),
            "Sampling Period,1.000E-07".to_string(),
            "Horizontal Old Scale,5.000E-05".to_string(),
            "Horizontal Old Position,0.000E+00".to_string(),
            "Firmware,V1.00".to_string(),
            "Time,12:00:00".to_string(),
            "Mode,Fast".to_string(),
        ];
        if tag == "3.0A" || tag == "2.0EP" {
            lines.push("Data Bit,8".to_string());
        }
        lines.push("Waveform Data".to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dso_core::Dialect;

    #[test]
    fn test_format_from_path() {
        assert_eq!(FileFormat::from_path(Path::new("DS0001.CSV")).unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("a/b.lsf")).unwrap(), FileFormat::Lsf);
        assert!(matches!(
            FileFormat::from_path(Path::new("wave.txt")),
            Err(DecodeError::UnsupportedFileFormat(_))
        ));
        assert!(matches!(
            FileFormat::from_path(Path::new("noext")),
            Err(DecodeError::UnsupportedFileFormat(_))
        ));
    }

    #[test]
    fn test_record_from_metadata() {
        let meta = fixtures::metadata("2.0E", 2, 10);
        let layout = Dialect::Gds2000E.layout();
        let rec = record_from_metadata(meta.clone(), layout, SampleMode::Fast).unwrap();
        assert_eq!(rec.source, "CH2");
        assert_eq!(rec.vertical_unit, "V");
        assert!((rec.vertical_scale - 0.4).abs() < 1e-12);
        assert!((rec.horizontal_position - 2e-5).abs() < 1e-15);
        assert!((rec.sample_period - 1e-7).abs() < 1e-18);
        assert_eq!(rec.metadata, meta);
    }

    #[test]
    fn test_record_from_short_metadata() {
        let meta = fixtures::metadata("2.0E", 1, 10)[..10].to_vec();
        let layout = Dialect::Gds2000E.layout();
        assert!(matches!(
            record_from_metadata(meta, layout, SampleMode::Fast),
            Err(DecodeError::MissingField(_))
        ));
    }

    #[test]
    fn test_unsupported_extension_leaves_no_file() {
        let dir = std::env::temp_dir().join("dso-file-ext-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.bin");
        let set = AcquisitionSet::default();
        assert!(matches!(
            save_file(&path, &set),
            Err(DecodeError::UnsupportedFileFormat(_))
        ));
        assert!(!path.exists());
    }
}
