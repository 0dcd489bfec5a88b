//! Fragment grid and per-fragment histogram extraction.
//!
//! An image is partitioned into a fixed [`GRID_DIM`]×[`GRID_DIM`] grid.
//! Fragment sizes are `floor(dim / GRID_DIM)`, so dimensions that are
//! not multiples of the grid silently drop the trailing pixels. That
//! truncation is deliberate, long-standing behavior; tests pin it.

use crate::surface::RasterSurface;

/// Cells per grid axis.
pub const GRID_DIM: usize = 4;

/// Total fragments per image.
pub const FRAGMENT_COUNT: usize = GRID_DIM * GRID_DIM;

/// Buckets per channel histogram (one per 8-bit intensity value).
pub const HISTOGRAM_BUCKETS: usize = 256;

/// Position of one fragment within the grid, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentCoordinates {
    pub row: usize,
    pub col: usize,
}

impl FragmentCoordinates {
    /// Coordinates of the fragment at `index` in row-major order.
    pub fn from_index(index: usize) -> Self {
        Self {
            row: (index / GRID_DIM) % GRID_DIM,
            col: index % GRID_DIM,
        }
    }

    /// Row-major index of this fragment.
    pub fn index(&self) -> usize {
        self.row * GRID_DIM + self.col
    }
}

/// Three 256-bucket frequency arrays for one fragment, one per color
/// channel in surface byte order. Immutable once extraction finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHistogram {
    counts: [[u32; HISTOGRAM_BUCKETS]; 3],
}

impl ChannelHistogram {
    fn new() -> Self {
        Self {
            counts: [[0; HISTOGRAM_BUCKETS]; 3],
        }
    }

    fn record(&mut self, channels: [u8; 3]) {
        for (channel, value) in channels.into_iter().enumerate() {
            self.counts[channel][value as usize] += 1;
        }
    }

    /// Frequency buckets for one channel (0, 1 or 2).
    pub fn channel(&self, channel: usize) -> &[u32; HISTOGRAM_BUCKETS] {
        &self.counts[channel]
    }

    /// Total pixel count recorded in one channel.
    pub fn total(&self, channel: usize) -> u64 {
        self.counts[channel].iter().map(|&c| u64::from(c)).sum()
    }
}

/// Count every pixel of one fragment into a fresh histogram.
///
/// Iteration is clamped to the surface bounds, and each invocation owns
/// its own arrays, so arbitrarily many extractions may run concurrently
/// against the same read-only surface.
pub fn extract_fragment(surface: &RasterSurface, coords: FragmentCoordinates) -> ChannelHistogram {
    let fragment_width = surface.width() / GRID_DIM;
    let fragment_height = surface.height() / GRID_DIM;
    let x_start = coords.col * fragment_width;
    let y_start = coords.row * fragment_height;

    let mut histogram = ChannelHistogram::new();
    for dy in 0..fragment_height {
        for dx in 0..fragment_width {
            if let Some(channels) = surface.channels_at(x_start + dx, y_start + dy) {
                histogram.record(channels);
            }
        }
    }
    histogram
}
