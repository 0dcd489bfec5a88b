//! Read-only raster surfaces with stride-aware, bounds-checked access.
//!
//! A [`RasterSurface`] wraps a decoded pixel buffer together with its
//! geometry. All pixel reads go through [`RasterSurface::channels_at`],
//! which checks bounds and computes the byte offset as
//! `y * stride + x * bytes_per_pixel`. There is no raw pointer
//! arithmetic anywhere in the crate.

use thiserror::Error;

/// Errors raised while constructing a surface from a raw buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// Fewer than three channels cannot feed three color histograms.
    #[error("surface needs at least 3 bytes per pixel, got {0}")]
    TooFewChannels(usize),

    /// The row stride does not cover a full row of pixels.
    #[error("stride {stride} is smaller than {width} pixels at {bytes_per_pixel} bytes each")]
    StrideTooSmall {
        stride: usize,
        width: usize,
        bytes_per_pixel: usize,
    },

    /// The buffer is shorter than the geometry requires.
    #[error("pixel buffer holds {actual} bytes, geometry requires {required}")]
    BufferTooSmall { required: usize, actual: usize },
}

/// A decoded pixel grid, owned and immutable after construction.
///
/// `stride` is the number of bytes per row; it may exceed
/// `width * bytes_per_pixel` when rows carry alignment padding.
/// The first three channel bytes of each pixel feed the histograms, in
/// buffer order. Callers are expected to normalize both surfaces under
/// comparison to the same channel order (the decoder in the umbrella
/// crate produces RGB for both).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterSurface {
    width: usize,
    height: usize,
    stride: usize,
    bytes_per_pixel: usize,
    data: Vec<u8>,
}

impl RasterSurface {
    /// Wrap a raw pixel buffer with explicit geometry.
    pub fn new(
        width: usize,
        height: usize,
        stride: usize,
        bytes_per_pixel: usize,
        data: Vec<u8>,
    ) -> Result<Self, SurfaceError> {
        if bytes_per_pixel < 3 {
            return Err(SurfaceError::TooFewChannels(bytes_per_pixel));
        }
        if stride < width * bytes_per_pixel {
            return Err(SurfaceError::StrideTooSmall {
                stride,
                width,
                bytes_per_pixel,
            });
        }
        let required = height * stride;
        if data.len() < required {
            return Err(SurfaceError::BufferTooSmall {
                required,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            bytes_per_pixel,
            data,
        })
    }

    /// Wrap a buffer whose rows carry no padding.
    pub fn packed(
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
        data: Vec<u8>,
    ) -> Result<Self, SurfaceError> {
        Self::new(width, height, width * bytes_per_pixel, bytes_per_pixel, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// Read the first three channel bytes of the pixel at `(x, y)`.
    ///
    /// Returns `None` when the coordinates fall outside the surface.
    pub fn channels_at(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y * self.stride + x * self.bytes_per_pixel;
        let bytes = self.data.get(offset..offset + 3)?;
        Some([bytes[0], bytes[1], bytes[2]])
    }
}
