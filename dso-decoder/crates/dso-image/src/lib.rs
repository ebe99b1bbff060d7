//! Screen image decoding.
//!
//! The instrument sends its screen either run-length encoded in RGB565 or
//! as an embedded PNG, both inside a standard block. Either way the result
//! is an RGB888 buffer, flipped vertically on platforms that need it.

pub mod lut;
pub mod rle;

use dso_core::{DecodeError, ScreenGeometry};

pub use lut::*;
pub use rle::*;

/// Screen transfer encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    /// `(length, rgb565)` run pairs, fetched with `:DISP:OUTP?`.
    Rle,
    /// Standard PNG, fetched with `:DISP:PNGOutput?`.
    Png,
}

impl ImageMode {
    /// Instrument command that requests this encoding.
    pub fn command(&self) -> &'static str {
        match self {
            ImageMode::Rle => ":DISP:OUTP?",
            ImageMode::Png => ":DISP:PNGOutput?",
        }
    }
}

/// Host platform, as far as image orientation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    /// Raspberry Pi: decoded images must be flipped top to bottom.
    RaspberryPi,
    #[default]
    Other,
}

impl Platform {
    pub fn needs_vertical_flip(&self) -> bool {
        matches!(self, Platform::RaspberryPi)
    }
}

/// Row-major RGB888 pixels, `ScreenGeometry::BYTES_PER_PIXEL` bytes each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ImageBuffer {
    /// Reverse the row order in place.
    pub fn flip_vertical(&mut self) {
        let row = self.width as usize * ScreenGeometry::BYTES_PER_PIXEL;
        if row == 0 {
            return;
        }
        let rows = self.data.len() / row;
        for top in 0..rows / 2 {
            let bottom = rows - 1 - top;
            let (upper, lower) = self.data.split_at_mut(bottom * row);
            upper[top * row..(top + 1) * row].swap_with_slice(&mut lower[..row]);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * ScreenGeometry::BYTES_PER_PIXEL;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// Copy in the orientation the instrument sent. Decoding flips images
    /// on platforms that need it for display; exported files are not.
    pub fn for_export(&self, platform: Platform) -> ImageBuffer {
        let mut img = self.clone();
        if platform.needs_vertical_flip() {
            img.flip_vertical();
        }
        img
    }

    /// Save as PNG in the instrument's orientation.
    pub fn export_png(&self, path: &std::path::Path, platform: Platform) -> Result<(), DecodeError> {
        self.for_export(platform).save_png(path)
    }

    /// Save as PNG.
    pub fn save_png(&self, path: &std::path::Path) -> Result<(), DecodeError> {
        let img = self.to_rgb_image().ok_or_else(|| {
            DecodeError::Image(format!(
                "{} bytes do not fill {}x{}",
                self.data.len(),
                self.width,
                self.height
            ))
        })?;
        img.save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| DecodeError::Image(e.to_string()))?;
        log::info!("Saved image to {}", path.display());
        Ok(())
    }
}

/// Decode an embedded PNG (or any format the `image` crate recognises).
pub fn decode_png(payload: &[u8]) -> Result<ImageBuffer, DecodeError> {
    let img = image::load_from_memory(payload)
        .map_err(|e| DecodeError::Image(e.to_string()))?
        .to_rgb8();
    Ok(ImageBuffer {
        width: img.width(),
        height: img.height(),
        data: img.into_raw(),
    })
}

/// Decode a screen image block payload and apply the platform flip.
pub fn decode_image(
    payload: &[u8],
    mode: ImageMode,
    screen: &ScreenGeometry,
    platform: Platform,
) -> Result<ImageBuffer, DecodeError> {
    let mut img = match mode {
        ImageMode::Rle => decode_rle(payload, screen)?,
        ImageMode::Png => decode_png(payload)?,
    };
    if platform.needs_vertical_flip() {
        img.flip_vertical();
    }
    Ok(img)
}
