//! LSF waveform files: one `;`-separated header line followed by a block of
//! little-endian 16-bit codes stored relative to the vertical position.

use crate::record_from_metadata;
use dso_core::{AcquisitionSet, Calibration, ChannelRecord, DecodeError, Dialect, SampleMode};
use dso_io::{
    apply_offset, center_code, decode_samples, encode_samples_le, remove_offset, write_block,
    BlockHeader, SampleOrder,
};
use std::io::{Read, Write};

/// Header fields, without the trailing empty field left by the final `;`.
fn split_header(line: &str) -> Vec<String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut fields: Vec<String> = line.split(';').map(str::to_string).collect();
    if fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Center code of a trace. A zero or non-finite scale cannot place the
/// vertical position and is rejected.
fn trace_center(record: &ChannelRecord, calibration: &Calibration) -> Result<i32, DecodeError> {
    let dv = record.voltage_per_code(calibration);
    if !dv.is_finite() || dv == 0.0 || !record.vertical_position.is_finite() {
        return Err(DecodeError::invalid_field(
            "Vertical Scale",
            &record.vertical_scale.to_string(),
        ));
    }
    Ok(center_code(record.vertical_position, dv, calibration.adc_center))
}

/// Read an LSF file. LSF holds exactly one channel in Fast mode.
///
/// The data section must hold every declared byte; only the trailer may be
/// missing.
pub fn read_lsf<R: Read>(mut reader: R) -> Result<AcquisitionSet, DecodeError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let newline = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| DecodeError::MalformedFile("header line not terminated".into()))?;
    let fields = split_header(&String::from_utf8_lossy(&bytes[..newline]));
    let first = fields
        .first()
        .ok_or_else(|| DecodeError::MalformedFile("empty header line".into()))?;
    let dialect = Dialect::detect(first)?;
    let layout = dialect.layout();

    if fields.len() <= layout.lsf_waveform_data() {
        return Err(DecodeError::MalformedFile(format!(
            "{} header fields, expected {}",
            fields.len(),
            layout.lsf_waveform_data() + 1
        )));
    }

    // Rebuild the CSV-form metadata: the LSF header lacks the mode line.
    let mut metadata: Vec<String> = fields[..layout.mode].to_vec();
    metadata.push("Mode,Fast".to_string());
    let calibration = match layout.lsf_data_bits() {
        Some(i) => {
            metadata.push(fields[i].clone());
            Calibration::from_field(&fields[i])?
        }
        None => Calibration::default(),
    };
    metadata.push(fields[layout.lsf_waveform_data()].clone());

    let mut record = record_from_metadata(metadata, layout, SampleMode::Fast)?;

    let center = trace_center(&record, &calibration)?;

    let block = &bytes[newline + 1..];
    let header = BlockHeader::parse(block)?;
    let available = block.len().saturating_sub(header.header_len);
    if available < header.data_len {
        return Err(DecodeError::MalformedFile(format!(
            "LSF block declares {} bytes, {} present",
            header.data_len, available
        )));
    }
    let end = header.header_len + header.data_len;
    let mut samples = decode_samples(&block[header.header_len..end], SampleOrder::LittleEndian);
    remove_offset(&mut samples, center);
    record.samples = samples;

    Ok(AcquisitionSet {
        channels: vec![record],
        calibration,
        dialect: Some(dialect),
    })
}

/// Write a single-channel acquisition set as LSF.
pub fn write_lsf<W: Write>(writer: &mut W, set: &AcquisitionSet) -> Result<(), DecodeError> {
    set.validate()?;
    if set.len() != 1 {
        return Err(DecodeError::UnsupportedFileFormat(format!(
            "LSF holds one channel, got {}",
            set.len()
        )));
    }
    let ch = &set.channels[0];
    if ch.metadata.is_empty() {
        return Err(DecodeError::MissingField(format!("{} metadata", ch.source)));
    }

    let center = trace_center(ch, &set.calibration)?;

    let mut line = ch
        .metadata
        .iter()
        .filter(|f| !f.starts_with("Mode"))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(";");
    line.push_str(";\n");
    writer.write_all(line.as_bytes())?;

    let mut codes = ch.samples.clone();
    apply_offset(&mut codes, center);
    write_block(writer, &encode_samples_le(&codes))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use std::io::Cursor;

    fn lsf_bytes(tag: &str, raw: &[i16]) -> Vec<u8> {
        lsf_from_metadata(&fixtures::metadata(tag, 1, raw.len()), raw)
    }

    fn lsf_from_metadata(meta: &[String], raw: &[i16]) -> Vec<u8> {
        let fields: Vec<&str> = meta
            .iter()
            .filter(|f| !f.starts_with("Mode"))
            .map(String::as_str)
            .collect();
        let mut out = format!("{};\n", fields.join(";")).into_bytes();
        let data = encode_samples_le(raw);
        out.extend_from_slice(&BlockHeader::for_data_len(data.len()).to_bytes());
        out.extend_from_slice(&data);
        out.push(b'\n');
        out
    }

    /// Fixture metadata with the lines starting with `key` replaced.
    fn with_field(mut meta: Vec<String>, key: &str, line: &str) -> Vec<String> {
        for m in meta.iter_mut().filter(|m| m.starts_with(key)) {
            *m = line.to_string();
        }
        meta
    }

    #[test]
    fn test_read_removes_offset() {
        // 0.2 V/div, 8 bit: 8 mV per code; vpos -0.1 V → trunc(-12.5) + 128 = 116.
        let bytes = lsf_bytes("2.0E", &[116, 126, 100]);
        let set = read_lsf(Cursor::new(&bytes)).unwrap();

        assert_eq!(set.len(), 1);
        let ch = &set.channels[0];
        assert_eq!(ch.samples, vec![0, 10, -16]);
        assert_eq!(ch.mode, SampleMode::Fast);
        assert_eq!(ch.metadata.len(), 26);
        assert_eq!(ch.metadata[24], "Mode,Fast");
        assert_eq!(ch.metadata[25], "Waveform Data");
    }

    #[test]
    fn test_long_layout_keeps_data_bit() {
        let bytes = lsf_bytes("3.0A", &[120, 130]);
        let set = read_lsf(Cursor::new(&bytes)).unwrap();
        let ch = &set.channels[0];
        assert_eq!(ch.metadata.len(), 27);
        assert_eq!(ch.metadata[25], "Data Bit,8");
        assert_eq!(set.calibration.data_bits, 8);
        assert_eq!(ch.samples, vec![4, 14]);
    }

    #[test]
    fn test_round_trip() {
        let bytes = lsf_bytes("2.0EP", &[100, 116, 140, -3]);
        let set = read_lsf(Cursor::new(&bytes)).unwrap();
        let mut out = Vec::new();
        write_lsf(&mut out, &set).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_csv_metadata_converts_to_lsf() {
        let meta = fixtures::metadata("2.0E", 1, 2);
        let layout = Dialect::Gds2000E.layout();
        let mut record = record_from_metadata(meta, layout, SampleMode::Fast).unwrap();
        record.samples = vec![0, 10];
        let mut set = AcquisitionSet::new(Calibration::default(), Some(Dialect::Gds2000E));
        set.channels.push(record);

        let mut out = Vec::new();
        write_lsf(&mut out, &set).unwrap();
        assert_eq!(out, lsf_bytes("2.0E", &[116, 126]));
        assert_eq!(read_lsf(Cursor::new(&out)).unwrap(), set);
    }

    #[test]
    fn test_multi_channel_rejected() {
        let mut set = AcquisitionSet::default();
        for n in 1..=2 {
            set.channels.push(ChannelRecord {
                source: format!("CH{}", n),
                metadata: fixtures::metadata("2.0E", n, 1),
                samples: vec![0],
                ..Default::default()
            });
        }
        assert!(matches!(
            write_lsf(&mut Vec::new(), &set),
            Err(DecodeError::UnsupportedFileFormat(_))
        ));
    }

    #[test]
    fn test_unknown_dialect() {
        let bytes = lsf_bytes("1.0X", &[1]);
        assert!(matches!(
            read_lsf(Cursor::new(&bytes)),
            Err(DecodeError::UnsupportedDeviceFormat(_))
        ));
    }

    #[test]
    fn test_missing_block_marker() {
        let mut bytes = lsf_bytes("2.0E", &[1, 2]);
        let newline = bytes.iter().position(|&b| b == b'\n').unwrap();
        bytes[newline + 1] = b'$';
        assert!(matches!(
            read_lsf(Cursor::new(&bytes)),
            Err(DecodeError::MalformedBlockHeader(_))
        ));
    }

    #[test]
    fn test_ten_bit_offset() {
        // 0.2 V/div at 100 steps/div: 2 mV per code; vpos -0.1 V → -50 + 512 = 462.
        let meta = with_field(fixtures::metadata("3.0A", 1, 3), "Data Bit", "Data Bit,10");
        let bytes = lsf_from_metadata(&meta, &[462, 512, 400]);
        let set = read_lsf(Cursor::new(&bytes)).unwrap();

        assert_eq!(set.calibration.data_bits, 10);
        assert_eq!(set.calibration.adc_center, 512);
        assert_eq!(set.calibration.steps_per_div, 100);
        assert_eq!(set.channels[0].metadata[25], "Data Bit,10");
        assert_eq!(set.channels[0].samples, vec![0, 50, -62]);

        let mut out = Vec::new();
        write_lsf(&mut out, &set).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_zero_scale_rejected() {
        let meta = with_field(
            fixtures::metadata("2.0E", 1, 2),
            "Vertical Scale",
            "Vertical Scale,0.000E+00",
        );
        let meta = with_field(meta, "Vertical Position", "Vertical Position,1.000E-01");
        let bytes = lsf_from_metadata(&meta, &[1, 2]);
        assert!(matches!(
            read_lsf(Cursor::new(&bytes)),
            Err(DecodeError::InvalidField { field, .. }) if field == "Vertical Scale"
        ));

        let layout = Dialect::Gds2000E.layout();
        let mut record = record_from_metadata(meta, layout, SampleMode::Fast).unwrap();
        record.samples = vec![1, 2];
        let mut set = AcquisitionSet::new(Calibration::default(), Some(Dialect::Gds2000E));
        set.channels.push(record);
        let mut out = Vec::new();
        assert!(matches!(
            write_lsf(&mut out, &set),
            Err(DecodeError::InvalidField { .. })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_short_block() {
        let mut bytes = lsf_bytes("2.0E", &[116, 117, 118]);
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            read_lsf(Cursor::new(&bytes)),
            Err(DecodeError::MalformedFile(_))
        ));
    }

    #[test]
    fn test_missing_trailer_accepted() {
        let mut bytes = lsf_bytes("2.0E", &[116, 117]);
        bytes.pop();
        let set = read_lsf(Cursor::new(&bytes)).unwrap();
        assert_eq!(set.channels[0].samples, vec![0, 1]);
    }
}
