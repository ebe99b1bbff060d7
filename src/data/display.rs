//! Plot-ready traces derived from an acquisition set. Stored samples are
//! never modified; only the extracted copies are downsampled.

use dso_core::{downsample_stride, AcquisitionSet};
use dso_io::codes_to_volts;
use serde::Serialize;

/// Trace colours, indexed by channel number - 1.
pub const CHANNEL_COLORS: [&str; 4] = ["#C0B020", "#0060FF", "#FF0080", "#00FF60"];

/// One channel ready for plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub label: String,
    pub color: &'static str,
    pub volts: Vec<f32>,
    /// Vertical display range `(min, max)`: eight divisions around the
    /// vertical position.
    pub y_range: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayData {
    pub stride: usize,
    /// Shared time axis in seconds, one value per plotted sample.
    pub time: Vec<f64>,
    pub x_range: (f64, f64),
    pub traces: Vec<Trace>,
}

/// Time axis of `n` values centred on `hpos`, `dt` apart.
pub fn time_axis(n: usize, dt: f64, hpos: f64) -> Vec<f64> {
    let start = hpos - n as f64 * dt / 2.0;
    (0..n).map(|i| start + i as f64 * dt).collect()
}

pub fn prepare(set: &AcquisitionSet) -> Option<DisplayData> {
    let first = set.channels.first()?;
    let stride = downsample_stride(set.points(), set.len());
    let n = set.points() / stride;
    let dt = first.sample_period;
    let hpos = first.horizontal_position;
    let half_span = n as f64 * dt / 2.0;

    let traces = set
        .channels
        .iter()
        .enumerate()
        .map(|(i, ch)| {
            let index = ch
                .channel_number()
                .map(|c| usize::from(c.saturating_sub(1)))
                .unwrap_or(i);
            let mut volts =
                codes_to_volts(&ch.samples, ch.voltage_per_code(&set.calibration), stride);
            volts.truncate(n);
            Trace {
                label: format!("{} Units: {}", ch.source, ch.vertical_unit),
                color: CHANNEL_COLORS[index % CHANNEL_COLORS.len()],
                volts,
                y_range: (
                    -4.0 * ch.vertical_scale - ch.vertical_position,
                    4.0 * ch.vertical_scale - ch.vertical_position,
                ),
            }
        })
        .collect();

    if stride > 1 {
        log::info!("Display downsampled by {} to {} points", stride, n);
    }
    Some(DisplayData {
        stride,
        time: time_axis(n, dt, hpos),
        x_range: (hpos - half_span, hpos + half_span),
        traces,
    })
}
