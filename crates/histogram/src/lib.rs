//! # Fragment histogram extraction and comparison
//!
//! This crate is the pure compute core of fragsim. It partitions a
//! decoded raster surface into a fixed 4×4 grid of fragments, counts a
//! 256-bucket frequency histogram per color channel per fragment, and
//! reduces two such histogram sets to a similarity matrix and a scalar
//! score via capped Kullback–Leibler divergence.
//!
//! ## Contract
//!
//! - No I/O, no clocks, no global state: every function is a pure
//!   function of its inputs.
//! - Extraction never mutates the surface and owns its output arrays,
//!   so concurrent extraction against one shared surface is safe by
//!   construction.
//! - For the same surface and coordinates the extracted histogram is
//!   bit-identical regardless of scheduling, which is what makes the
//!   sequential and worker-pool orchestration modes comparable.

pub mod compare;
pub mod fragment;
pub mod surface;

pub use compare::{
    compare_fragments, fragment_similarity, CompareConfig, HistogramError, SimilarityMatrix,
    DEFAULT_MAX_DIVERGENCE,
};
pub use fragment::{
    extract_fragment, ChannelHistogram, FragmentCoordinates, FRAGMENT_COUNT, GRID_DIM,
    HISTOGRAM_BUCKETS,
};
pub use surface::{RasterSurface, SurfaceError};
