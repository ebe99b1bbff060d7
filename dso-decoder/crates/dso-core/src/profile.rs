//! Device profiles selected from the `*IDN?` model name.
//!
//! Model families are a static table checked in order; anything that does
//! not match ends in the explicit `Unsupported` family.

use crate::dialect::{Calibration, Dialect};

/// Screen geometry of the image transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
}

impl ScreenGeometry {
    /// Bytes per decoded RGB888 pixel.
    pub const BYTES_PER_PIXEL: usize = 3;

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn byte_len(&self) -> usize {
        self.pixel_count() * Self::BYTES_PER_PIXEL
    }
}

/// Every supported family shares the same 800×480 RGB screen.
pub const DEFAULT_SCREEN: ScreenGeometry = ScreenGeometry {
    width: 800,
    height: 480,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    /// GDS-3xx2A
    Gds3xx2A,
    /// GDS-3xx4A / MSO-3xx4
    Gds3xx4A,
    /// GDS-2xx2E and relatives, MPO-2xx2
    Gds2xx2E,
    /// GDS-2xx4E and relatives, MPO-2xx4
    Gds2xx4E,
    Unsupported,
}

impl ModelFamily {
    pub fn channel_count(&self) -> usize {
        match self {
            ModelFamily::Gds3xx2A | ModelFamily::Gds2xx2E => 2,
            ModelFamily::Gds3xx4A | ModelFamily::Gds2xx4E | ModelFamily::Unsupported => 4,
        }
    }
}

const GDS_3XX2A: &[&str] = &["GDS-3352A", "GDS-3652A"];

const GDS_3XX4A: &[&str] = &["GDS-3354A", "GDS-3654A", "MSO-3354", "MSO-3654"];

const GDS_2XX2E: &[&str] = &[
    "GDS-2072E", "DCS-2072E", "IDS-2072E", "GDS-72072E", "MSO-2072E", "MSO-72072E",
    "MSO-2072EA", "MSO-72072EA", "MDO-2072EC", "MDO-72072EC", "MDO-2072EG", "MDO-72072EG",
    "MDO-2072EX", "MDO-72072EX", "MDO-2072ES", "MDO-72072ES",
    "GDS-2102E", "DCS-2102E", "IDS-2102E", "GDS-72102E", "MSO-2102E", "MSO-72102E",
    "MSO-2102EA", "MSO-72102EA", "MDO-2102EC", "MDO-72102EC", "MDO-2102EG", "MDO-72102EG",
    "MDO-2102EX", "MDO-72102EX", "MDO-2102ES", "MDO-72102ES",
    "GDS-2202E", "DCS-2202E", "IDS-2202E", "GDS-72202E", "MSO-2202E", "MSO-72202E",
    "MSO-2202EA", "MSO-72202EA", "MDO-2202EC", "MDO-72202EC", "MDO-2202EG", "MDO-72202EG",
    "MDO-2202EX", "MDO-72202EX", "MDO-2202ES", "MDO-72202ES",
    "RSMSO-2102E", "RSMSO-2202E", "RSMSO-2102EA", "RSMSO-2202EA",
    "RSMDO-2102EG", "RSMDO-2202EG", "RSMDO-2102EX", "RSMDO-2202EX",
    "MDO-2102A", "MDO-2202A", "MDO-2302A", "MDO-2102AG", "MDO-2202AG", "MDO-2302AG",
    "MPO-2102B", "MPO-2202P",
];

const GDS_2XX4E: &[&str] = &[
    "GDS-2074E", "DCS-2074E", "IDS-2074E", "GDS-72074E", "MSO-2074E", "MSO-72074E",
    "MSO-2074EA", "MSO-72074EA", "MDO-2074EC", "MDO-72074EC", "MDO-2074EG", "MDO-72074EG",
    "MDO-2074EX", "MDO-72074EX", "MDO-2074ES", "MDO-72074ES",
    "GDS-2104E", "DCS-2104E", "IDS-2104E", "GDS-72104E", "MSO-2104E", "MSO-72104E",
    "MSO-2104EA", "MSO-72104EA", "MDO-2104EC", "MDO-72104EC", "MDO-2104EG", "MDO-72104EG",
    "MDO-2104EX", "MDO-72104EX", "MDO-2104ES", "MDO-72104ES",
    "GDS-2204E", "DCS-2204E", "IDS-2204E", "GDS-72204E", "MSO-2204E", "MSO-72204E",
    "MSO-2204EA", "MSO-72204EA", "MDO-2204EC", "MDO-72204EC", "MDO-2204EG", "MDO-72204EG",
    "MDO-2204EX", "MDO-72204EX", "MDO-2204ES", "MDO-72204ES",
    "RSMSO-2104E", "RSMSO-2204E", "RSMSO-2104EA", "RSMSO-2204EA",
    "RSMDO-2104EG", "RSMDO-2204EG", "RSMDO-2104EX", "RSMDO-2204EX",
    "MPO-2104B", "MPO-2204P",
];

const MODEL_TABLE: [(&[&str], ModelFamily); 4] = [
    (GDS_3XX2A, ModelFamily::Gds3xx2A),
    (GDS_3XX4A, ModelFamily::Gds3xx4A),
    (GDS_2XX2E, ModelFamily::Gds2xx2E),
    (GDS_2XX4E, ModelFamily::Gds2xx4E),
];

/// Capabilities derived from a device identity or a file format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    pub family: ModelFamily,
    pub channel_count: usize,
    pub calibration: Calibration,
    pub screen: ScreenGeometry,
}

impl DeviceProfile {
    fn for_family(family: ModelFamily) -> Self {
        Self {
            family,
            channel_count: family.channel_count(),
            calibration: Calibration::default(),
            screen: DEFAULT_SCREEN,
        }
    }

    /// Select the profile for a model name such as `GDS-2104E`.
    pub fn identify(model: &str) -> Self {
        let model = model.trim();
        let family = MODEL_TABLE
            .iter()
            .find(|(names, _)| names.contains(&model))
            .map(|&(_, family)| family)
            .unwrap_or(ModelFamily::Unsupported);
        Self::for_family(family)
    }

    /// Select the profile from an `*IDN?` reply (`vendor,model,serial,fw`).
    pub fn from_idn(idn: &str) -> Self {
        Self::identify(idn.split(',').nth(1).unwrap_or(""))
    }

    /// Profile implied by a saved-file dialect. Files do not record the
    /// channel count, so the four-channel layout is assumed.
    pub fn from_dialect(dialect: Dialect) -> Self {
        let family = match dialect {
            Dialect::Gds3000A => ModelFamily::Gds3xx4A,
            Dialect::Mpo2000 | Dialect::Gds2000E | Dialect::Mdo2000A => ModelFamily::Gds2xx4E,
        };
        Self::for_family(family)
    }

    pub fn is_supported(&self) -> bool {
        self.family != ModelFamily::Unsupported
    }
}
