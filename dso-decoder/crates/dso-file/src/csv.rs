//! CSV waveform files.
//!
//! Layout: `\r\n` line endings, a fixed number of metadata lines (26 or 27
//! by dialect), then one line per sample. Every line ends in a comma.
//! Multi-channel files put each channel's `Key,Value` pair side by side, so
//! column `2*ch` holds the key (or Fast code) and `2*ch + 1` the value (or
//! Detail voltage) of channel `ch`.

use crate::record_from_metadata;
use dso_core::{
    AcquisitionSet, Calibration, ChannelRecord, DecodeError, Dialect, FieldOffsets, SampleMode,
};
use dso_io::volts_to_code;
use std::io::{BufRead, Write};

/// Strip the line terminator and the single trailing comma.
fn strip_line(line: &str) -> &str {
    let line = line.trim_end_matches(['\r', '\n']);
    line.strip_suffix(',').unwrap_or(line)
}

fn column<'a>(cols: &[&'a str], index: usize, line: usize) -> Result<&'a str, DecodeError> {
    cols.get(index).copied().ok_or_else(|| {
        DecodeError::MalformedFile(format!("line {} has no column {}", line + 1, index + 1))
    })
}

/// Split interleaved header lines into per-channel metadata.
fn deinterleave(
    header: &[String],
    layout: &FieldOffsets,
    count: usize,
) -> Result<Vec<Vec<String>>, DecodeError> {
    let last = layout.waveform_data();
    let mut channels = vec![vec![header[0].clone()]; count];
    for (x, line) in header.iter().enumerate().take(last).skip(1) {
        let cols: Vec<&str> = line.split(',').collect();
        for (ch, meta) in channels.iter_mut().enumerate() {
            let key = column(&cols, 2 * ch, x)?;
            let value = column(&cols, 2 * ch + 1, x)?;
            meta.push(format!("{},{}", key, value));
        }
    }
    let cols: Vec<&str> = header[last].split(',').collect();
    for (ch, meta) in channels.iter_mut().enumerate() {
        meta.push(column(&cols, 2 * ch, last)?.to_string());
    }
    Ok(channels)
}

/// Read a CSV file.
pub fn read_csv<R: BufRead>(reader: R) -> Result<AcquisitionSet, DecodeError> {
    let mut lines = reader.lines();

    let first = lines
        .next()
        .transpose()?
        .ok_or_else(|| DecodeError::MalformedFile("empty file".into()))?;
    let first = strip_line(&first).to_string();
    let dialect = Dialect::detect(&first)?;
    let layout = dialect.layout();

    let mut header = vec![first];
    while header.len() < layout.line_count {
        let line = lines.next().transpose()?.ok_or_else(|| {
            DecodeError::MalformedFile(format!(
                "header ends after {} of {} lines",
                header.len(),
                layout.line_count
            ))
        })?;
        header.push(strip_line(&line).to_string());
    }

    let count = header[layout.source].matches("CH").count();
    if count == 0 {
        return Err(DecodeError::MissingField("Source".into()));
    }
    let mode = SampleMode::from_field(&header[layout.mode]);
    let calibration = match layout.data_bits {
        Some(i) => Calibration::from_field(&header[i])?,
        None => Calibration::default(),
    };

    let metadata = if count == 1 {
        vec![header]
    } else {
        deinterleave(&header, layout, count)?
    };
    let mut channels = metadata
        .into_iter()
        .map(|meta| record_from_metadata(meta, layout, mode))
        .collect::<Result<Vec<ChannelRecord>, _>>()?;

    let scales: Vec<f64> = channels
        .iter()
        .map(|c| c.voltage_per_code(&calibration))
        .collect();
    for (row, line) in lines.enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let line_no = layout.line_count + row;
        let cols: Vec<&str> = line.split(',').collect();
        for (ch, record) in channels.iter_mut().enumerate() {
            let code = match mode {
                SampleMode::Fast => {
                    let text = column(&cols, 2 * ch, line_no)?;
                    text.trim()
                        .parse::<i16>()
                        .map_err(|_| DecodeError::invalid_field(&record.source, text))?
                }
                SampleMode::Detail => {
                    let text = column(&cols, 2 * ch + 1, line_no)?;
                    let volts: f64 = text
                        .trim()
                        .parse()
                        .map_err(|_| DecodeError::invalid_field(&record.source, text))?;
                    volts_to_code(volts, scales[ch])
                }
            };
            record.samples.push(code);
        }
    }

    Ok(AcquisitionSet {
        channels,
        calibration,
        dialect: Some(dialect),
    })
}

/// Write an acquisition set as a Fast-mode CSV file.
///
/// Samples are always written as integer codes, so the mode line of every
/// channel is rewritten to `Mode,Fast`.
pub fn write_csv<W: Write>(writer: &mut W, set: &AcquisitionSet) -> Result<(), DecodeError> {
    set.validate()?;
    let channels = &set.channels;
    let items = channels[0].metadata.len();
    if items < 2 {
        return Err(DecodeError::MissingField(format!(
            "{} metadata",
            channels[0].source
        )));
    }
    if let Some(ch) = channels.iter().find(|c| c.metadata.len() != items) {
        return Err(DecodeError::MalformedFile(format!(
            "{} has {} metadata lines, expected {}",
            ch.source,
            ch.metadata.len(),
            items
        )));
    }

    write!(writer, "{},\r\n", channels[0].metadata[0])?;
    for x in 1..items - 1 {
        let mut line = String::new();
        for ch in channels {
            if ch.metadata[x].starts_with("Mode") {
                line.push_str("Mode,Fast,");
            } else {
                line.push_str(&ch.metadata[x]);
                line.push(',');
            }
        }
        line.push_str("\r\n");
        writer.write_all(line.as_bytes())?;
    }

    let mut line = String::new();
    if channels.len() == 1 {
        line.push_str(&channels[0].metadata[items - 1]);
        line.push(',');
    } else {
        for ch in channels {
            line.push_str(&ch.metadata[items - 1]);
            line.push_str(",,");
        }
    }
    line.push_str("\r\n");
    writer.write_all(line.as_bytes())?;

    for i in 0..set.points() {
        line.clear();
        if channels.len() == 1 {
            line.push_str(&format!("{},", channels[0].samples[i]));
        } else {
            for ch in channels {
                line.push_str(&format!("{}, ,", ch.samples[i]));
            }
        }
        line.push_str("\r\n");
        writer.write_all(line.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use std::io::Cursor;

    fn single_csv(tag: &str, samples: &[i16]) -> Vec<u8> {
        let mut out = String::new();
        let meta = fixtures::metadata(tag, 1, samples.len());
        for line in &meta {
            out.push_str(&format!("{},\r\n", line));
        }
        for s in samples {
            out.push_str(&format!("{},\r\n", s));
        }
        out.into_bytes()
    }

    fn dual_csv(tag: &str, a: &[i16], b: &[i16]) -> Vec<u8> {
        let m1 = fixtures::metadata(tag, 1, a.len());
        let m2 = fixtures::metadata(tag, 2, b.len());
        let last = m1.len() - 1;
        let mut out = format!("{},\r\n", m1[0]);
        for x in 1..last {
            out.push_str(&format!("{},{},\r\n", m1[x], m2[x]));
        }
        out.push_str(&format!("{},,{},,\r\n", m1[last], m2[last]));
        for (x, y) in a.iter().zip(b) {
            out.push_str(&format!("{}, ,{}, ,\r\n", x, y));
        }
        out.into_bytes()
    }

    #[test]
    fn test_single_channel_round_trip() {
        let bytes = single_csv("2.0E", &[0, 12, -7, 127, -128]);
        let set = read_csv(Cursor::new(&bytes)).unwrap();

        assert_eq!(set.dialect, Some(Dialect::Gds2000E));
        assert_eq!(set.len(), 1);
        let ch = &set.channels[0];
        assert_eq!(ch.source, "CH1");
        assert_eq!(ch.mode, SampleMode::Fast);
        assert_eq!(ch.samples, vec![0, 12, -7, 127, -128]);
        assert_eq!(ch.metadata.len(), 26);

        let mut out = Vec::new();
        write_csv(&mut out, &set).unwrap();
        assert_eq!(out, bytes);
        assert_eq!(read_csv(Cursor::new(&out)).unwrap(), set);
    }

    #[test]
    fn test_multi_channel_round_trip() {
        let bytes = dual_csv("3.0A", &[1, 2, 3], &[-4, -5, -6]);
        let set = read_csv(Cursor::new(&bytes)).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.channels[0].source, "CH1");
        assert_eq!(set.channels[1].source, "CH2");
        assert!((set.channels[1].vertical_scale - 0.4).abs() < 1e-12);
        assert_eq!(set.channels[1].samples, vec![-4, -5, -6]);
        assert_eq!(set.channels[0].metadata.len(), 27);
        assert_eq!(set.channels[1].metadata[5], "Source,CH2");
        assert_eq!(set.channels[1].metadata[26], "Waveform Data");
        assert_eq!(set.calibration, Calibration::default());

        let mut out = Vec::new();
        write_csv(&mut out, &set).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_detail_mode() {
        let mut text = String::new();
        let meta = fixtures::metadata("2.0MA", 1, 3);
        for line in &meta {
            let line = if line.starts_with("Mode") { "Mode,Detail" } else { line.as_str() };
            text.push_str(&format!("{},\r\n", line));
        }
        // 0.2 V/div at 25 steps/div → 8 mV per code.
        for volts in ["0.000E+00", "8.000E-03", "-2.400E-02"] {
            text.push_str(&format!(",{},\r\n", volts));
        }

        let set = read_csv(Cursor::new(text.as_bytes())).unwrap();
        let ch = &set.channels[0];
        assert_eq!(ch.mode, SampleMode::Detail);
        assert_eq!(ch.samples.len(), 3);
        for (got, want) in ch.samples.iter().zip([0i16, 1, -3]) {
            assert!((got - want).abs() <= 1, "{} vs {}", got, want);
        }

        let mut out = Vec::new();
        write_csv(&mut out, &set).unwrap();
        let reread = read_csv(Cursor::new(&out)).unwrap();
        assert_eq!(reread.channels[0].mode, SampleMode::Fast);
        assert_eq!(reread.channels[0].samples, ch.samples);
    }

    #[test]
    fn test_multi_channel_detail_mode() {
        let m1 = fixtures::metadata("2.0E", 1, 3);
        let m2 = fixtures::metadata("2.0E", 2, 3);
        let last = m1.len() - 1;
        let mut text = format!("{},\r\n", m1[0]);
        for x in 1..last {
            if m1[x].starts_with("Mode") {
                text.push_str("Mode,Detail,Mode,Detail,\r\n");
            } else {
                text.push_str(&format!("{},{},\r\n", m1[x], m2[x]));
            }
        }
        text.push_str(&format!("{},,{},,\r\n", m1[last], m2[last]));
        // CH1: 0.2 V/div → 8 mV per code. CH2: 0.4 V/div → 16 mV per code.
        for (a, b) in [("0.000E+00", "0.000E+00"), ("1.200E-02", "4.000E-02"), ("-1.200E-02", "-4.000E-02")] {
            text.push_str(&format!(",{},,{},\r\n", a, b));
        }

        let set = read_csv(Cursor::new(text.as_bytes())).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.channels.iter().all(|c| c.mode == SampleMode::Detail));
        assert_eq!(set.channels[0].metadata[24], "Mode,Detail");
        assert_eq!(set.channels[0].samples, vec![0, 1, -1]);
        assert_eq!(set.channels[1].samples, vec![0, 2, -2]);

        let mut out = Vec::new();
        write_csv(&mut out, &set).unwrap();
        let reread = read_csv(Cursor::new(&out)).unwrap();
        assert!(reread.channels.iter().all(|c| c.mode == SampleMode::Fast));
        assert_eq!(reread.channels[0].samples, set.channels[0].samples);
        assert_eq!(reread.channels[1].samples, set.channels[1].samples);
    }

    #[test]
    fn test_unknown_dialect() {
        let bytes = single_csv("9.9Z", &[1, 2]);
        assert!(matches!(
            read_csv(Cursor::new(&bytes)),
            Err(DecodeError::UnsupportedDeviceFormat(_))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = single_csv("2.0EP", &[]);
        let cut = &bytes[..bytes.len() / 2];
        assert!(matches!(
            read_csv(Cursor::new(cut)),
            Err(DecodeError::MalformedFile(_))
        ));
    }

    #[test]
    fn test_bad_sample() {
        let mut bytes = single_csv("2.0E", &[1]);
        bytes.extend_from_slice(b"oops,\r\n");
        assert!(matches!(
            read_csv(Cursor::new(&bytes)),
            Err(DecodeError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_write_requires_metadata() {
        let mut set = AcquisitionSet::default();
        set.channels.push(ChannelRecord {
            source: "CH1".into(),
            samples: vec![1, 2],
            ..Default::default()
        });
        assert!(matches!(
            write_csv(&mut Vec::new(), &set),
            Err(DecodeError::MissingField(_))
        ));
        assert!(matches!(
            write_csv(&mut Vec::new(), &AcquisitionSet::default()),
            Err(DecodeError::NoChannels)
        ));
    }
}
