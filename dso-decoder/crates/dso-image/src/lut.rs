//! RGB565 → RGB888 lookup table.

use std::sync::OnceLock;

/// Expand one RGB565 value. Each component keeps its significant bits at
/// the top of the byte; the low bits stay zero.
pub fn rgb565_to_rgb888(value: u16) -> [u8; 3] {
    [
        ((value >> 8) & 0xF8) as u8,
        ((value >> 3) & 0xFC) as u8,
        ((value << 3) & 0xF8) as u8,
    ]
}

/// All 65536 RGB565 colours, expanded once and shared.
pub struct Rgb565Lut {
    table: Box<[[u8; 3]]>,
}

impl Rgb565Lut {
    fn build() -> Self {
        let table = (0..=u16::MAX).map(rgb565_to_rgb888).collect();
        Self { table }
    }

    /// Process-wide table, built on first use.
    pub fn global() -> &'static Rgb565Lut {
        static LUT: OnceLock<Rgb565Lut> = OnceLock::new();
        LUT.get_or_init(Self::build)
    }

    #[inline]
    pub fn rgb(&self, value: u16) -> [u8; 3] {
        self.table[value as usize]
    }
}
