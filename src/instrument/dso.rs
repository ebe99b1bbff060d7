//! Capture session against one connected oscilloscope.

use super::InstrumentError;
use crate::config::PollPolicy;
use dso_core::{AcquisitionSet, Calibration, ChannelRecord, DeviceProfile, Dialect};
use dso_image::{decode_image, ImageBuffer, ImageMode, Platform};
use dso_io::{
    decode_samples, parse_waveform_header, read_block, trim_line_end, SampleOrder, Transport,
    BLOCK_MARKER,
};
use std::thread;

/// One channel read from waveform memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelCapture {
    pub record: ChannelRecord,
    pub calibration: Calibration,
    pub dialect: Option<Dialect>,
}

/// Split a raw header line at the start of the binary block, if the block
/// begins on the same line.
fn split_block_start(raw: &[u8]) -> (String, Option<Vec<u8>>) {
    match raw.iter().position(|&b| b == BLOCK_MARKER) {
        Some(i) => (
            String::from_utf8_lossy(&raw[..i]).into_owned(),
            Some(raw[i..].to_vec()),
        ),
        None => (String::from_utf8_lossy(trim_line_end(raw)).into_owned(), None),
    }
}

pub struct Dso<T: Transport> {
    transport: T,
    model: String,
    profile: DeviceProfile,
    platform: Platform,
    poll: PollPolicy,
}

impl<T: Transport> Dso<T> {
    /// Identify the instrument with `*IDN?` and select its profile. An
    /// unknown model still yields a session, marked unsupported.
    pub fn connect(
        mut transport: T,
        platform: Platform,
        poll: PollPolicy,
    ) -> Result<Self, InstrumentError> {
        let idn = transport.query("*IDN?")?;
        let model = idn.split(',').nth(1).unwrap_or("").trim().to_string();
        let profile = DeviceProfile::identify(&model);
        if profile.is_supported() {
            log::info!("{} connected ({} channels)", model, profile.channel_count);
        } else {
            log::warn!("Device not supported: {:?}", idn);
        }
        Ok(Self {
            transport,
            model,
            profile,
            platform,
            poll,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_supported(&self) -> bool {
        self.profile.is_supported()
    }

    fn ensure_supported(&self) -> Result<(), InstrumentError> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(InstrumentError::UnsupportedDevice(self.model.clone()))
        }
    }

    fn check_channel(&self, ch: u8) -> Result<(), InstrumentError> {
        if ch >= 1 && usize::from(ch) <= self.profile.channel_count {
            Ok(())
        } else {
            Err(InstrumentError::NoSuchChannel(ch))
        }
    }

    pub fn is_channel_on(&mut self, ch: u8) -> Result<bool, InstrumentError> {
        self.check_channel(ch)?;
        let reply = self.transport.query(&format!(":CHAN{}:DISP?", ch))?;
        Ok(reply.trim() == "ON")
    }

    /// Turn the channel display on unless it already is.
    pub fn enable_channel(&mut self, ch: u8) -> Result<(), InstrumentError> {
        if !self.is_channel_on(ch)? {
            self.transport.write(&format!(":CHAN{}:DISP ON", ch))?;
            log::info!("CH{} display on", ch);
        }
        Ok(())
    }

    /// Poll `:ACQn:STAT?` until the reply starts with `1`.
    pub fn wait_for_acquisition(&mut self, ch: u8) -> Result<(), InstrumentError> {
        let command = format!(":ACQ{}:STAT?", ch);
        for poll in 0..self.poll.max_polls {
            let state = self.transport.query(&command)?;
            log::debug!("CH{} state={}", ch, state);
            if state.starts_with('1') {
                return Ok(());
            }
            if poll > 0 && poll % 50 == 0 {
                log::warn!("CH{} not triggered, check the input signal", ch);
            }
            thread::sleep(self.poll.interval);
        }
        Err(InstrumentError::AcquisitionNotReady {
            channel: ch,
            polls: self.poll.max_polls,
        })
    }

    /// Read one channel's header and waveform memory.
    pub fn read_channel(&mut self, ch: u8) -> Result<ChannelCapture, InstrumentError> {
        self.check_channel(ch)?;
        log::info!("Waiting for CH{} data...", ch);
        self.transport.write(":HEAD ON")?;
        self.wait_for_acquisition(ch)?;
        self.transport.write(&format!(":ACQ{}:MEM?", ch))?;

        let raw = self.transport.read_raw_line()?;
        let (text, prefix) = split_block_start(&raw);
        let header = parse_waveform_header(&text)?;
        let block = read_block(&mut self.transport, prefix.or(header.block_prefix))?;

        let mut record = header.record;
        record.samples = decode_samples(block.payload(), SampleOrder::BigEndian);
        log::info!("{}: {} points", record.source, record.points());
        Ok(ChannelCapture {
            record,
            calibration: header.calibration,
            dialect: header.dialect,
        })
    }

    /// Capture the given channels, in order, into a fresh acquisition set.
    pub fn capture(&mut self, channels: &[u8]) -> Result<AcquisitionSet, InstrumentError> {
        self.ensure_supported()?;
        for &ch in channels {
            self.enable_channel(ch)?;
        }

        let mut set = AcquisitionSet::default();
        for &ch in channels {
            let capture = self.read_channel(ch)?;
            if set.is_empty() {
                set.calibration = capture.calibration;
                set.dialect = capture.dialect;
            }
            set.channels.push(capture.record);
        }
        set.validate()?;
        Ok(set)
    }

    /// Fetch and decode the screen image.
    pub fn capture_image(&mut self, mode: ImageMode) -> Result<ImageBuffer, InstrumentError> {
        self.ensure_supported()?;
        self.transport.write(mode.command())?;
        let block = read_block(&mut self.transport, None)?;
        let img = decode_image(block.payload(), mode, &self.profile.screen, self.platform)?;
        log::info!("Image is ready ({}x{})", img.width, img.height);
        Ok(img)
    }

    pub fn close(&mut self) {
        self.transport.close();
    }
}
