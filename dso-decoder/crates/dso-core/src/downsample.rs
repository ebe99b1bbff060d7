//! Stride selection for rendering oversized acquisitions.
//!
//! Only the display path uses this; stored samples are never reduced.

/// Sample-count tiers and their strides for one, two, and three or more
/// channels.
const STRIDE_TIERS: [(usize, [usize; 3]); 4] = [
    (10_000_000, [1, 1, 1]),
    (20_000_000, [2, 4, 4]),
    (100_000_000, [10, 20, 40]),
    (200_000_000, [20, 40, 80]),
];

/// Stride for `total_points` samples per channel across `channel_count`
/// channels. Counts outside the tiers are not reduced.
pub fn downsample_stride(total_points: usize, channel_count: usize) -> usize {
    let column = match channel_count {
        0 | 1 => 0,
        2 => 1,
        _ => 2,
    };
    STRIDE_TIERS
        .iter()
        .find(|(tier, _)| *tier == total_points)
        .map(|(_, strides)| strides[column])
        .unwrap_or(1)
}
