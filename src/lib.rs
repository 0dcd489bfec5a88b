//! Workspace umbrella crate for fragsim.
//!
//! This crate stitches the pure compute core ([`histogram`]) and the
//! generic worker pool ([`pool`]) into the comparison pipeline the HTTP
//! layer consumes: decode bytes into a raster surface, extract all
//! fragment histograms of both images (sequentially or on a fixed
//! worker pool), compare them, and report the similarity matrix, the
//! scalar score and the elapsed wall-clock time.
//!
//! The two execution modes are numerically equivalent: for identical
//! inputs they produce bit-identical histograms and therefore identical
//! matrices and scores. Only the elapsed time differs.

use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use histogram::{
    compare_fragments, extract_fragment, fragment_similarity, ChannelHistogram, CompareConfig,
    FragmentCoordinates, HistogramError, RasterSurface, SimilarityMatrix, SurfaceError,
    DEFAULT_MAX_DIVERGENCE, FRAGMENT_COUNT, GRID_DIM, HISTOGRAM_BUCKETS,
};
pub use pool::{FailureObserver, PoolError, TracingObserver, WorkerPool};

/// Worker threads used by [`ExecutionMode::MultiThread`] unless the
/// caller overrides [`CompareOptions::worker_count`].
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Errors that can occur while running the comparison pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("surface construction failed: {0}")]
    Surface(#[from] SurfaceError),

    #[error("histogram comparison failed: {0}")]
    Histogram(#[from] HistogramError),

    #[error("worker pool failure: {0}")]
    Pool(#[from] PoolError),

    /// A parallel work unit never delivered its histogram. Partial
    /// results are never returned as success.
    #[error("fragment unit {index} produced no histogram")]
    MissingFragment { index: usize },
}

/// How the 32 fragment-extraction units are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// All fragments of both images, sequentially in row-major order.
    SingleThread,
    /// All 32 units submitted to a fixed worker pool, then joined.
    MultiThread,
}

/// Tunables for one comparison run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompareOptions {
    pub worker_count: usize,
    pub compare: CompareConfig,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            compare: CompareConfig::default(),
        }
    }
}

/// Outcome of one comparison: the per-fragment similarity matrix, the
/// total score in `[0, 100]`, and the extraction+comparison wall time.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub matrix: SimilarityMatrix,
    pub total_score: f64,
    pub elapsed: Duration,
}

impl ComparisonResult {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// Decode raw file bytes into an RGB raster surface.
///
/// Both images under comparison go through this decoder, so the channel
/// semantics stay symmetric regardless of the source pixel layout.
pub fn decode_surface(bytes: &[u8]) -> Result<RasterSurface, PipelineError> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(RasterSurface::packed(
        width as usize,
        height as usize,
        3,
        rgb.into_raw(),
    )?)
}

/// Compare two decoded surfaces under the given execution mode.
///
/// The elapsed time covers fragment extraction and comparison; decoding
/// happens before the clock starts and costs the same in both modes.
pub fn compare_surfaces(
    reference: &Arc<RasterSurface>,
    uploaded: &Arc<RasterSurface>,
    mode: ExecutionMode,
    options: &CompareOptions,
) -> Result<ComparisonResult, PipelineError> {
    options.compare.validate()?;

    let started = Instant::now();
    let (reference_histograms, uploaded_histograms) = match mode {
        ExecutionMode::SingleThread => (
            extract_all_sequential(reference),
            extract_all_sequential(uploaded),
        ),
        ExecutionMode::MultiThread => {
            extract_all_parallel(reference, uploaded, options.worker_count)?
        }
    };

    let matrix = compare_fragments(&reference_histograms, &uploaded_histograms, &options.compare)?;
    let total_score = matrix.total_score();
    let elapsed = started.elapsed();

    tracing::debug!(
        ?mode,
        total_score,
        elapsed_ms = elapsed.as_millis() as u64,
        "comparison finished"
    );

    Ok(ComparisonResult {
        matrix,
        total_score,
        elapsed,
    })
}

/// Extract the 16 fragment histograms of one surface in row-major order.
pub fn extract_all_sequential(surface: &RasterSurface) -> Vec<ChannelHistogram> {
    (0..FRAGMENT_COUNT)
        .map(|index| extract_fragment(surface, FragmentCoordinates::from_index(index)))
        .collect()
}

/// Extract the histograms of both surfaces on a fixed worker pool.
///
/// Unit `i < 16` computes reference fragment `i`; unit `i >= 16`
/// computes uploaded fragment `i - 16`. Each unit sends its result,
/// keyed by unit index, to the combiner over a channel; after
/// `shutdown()` joins the pool, an unfilled slot means the unit failed
/// and the whole comparison fails with it.
fn extract_all_parallel(
    reference: &Arc<RasterSurface>,
    uploaded: &Arc<RasterSurface>,
    worker_count: usize,
) -> Result<(Vec<ChannelHistogram>, Vec<ChannelHistogram>), PipelineError> {
    extract_all_parallel_with(reference, uploaded, worker_count, extract_fragment)
}

/// Parallel extraction with an injectable per-unit extractor, so tests
/// can make individual units fail.
fn extract_all_parallel_with<F>(
    reference: &Arc<RasterSurface>,
    uploaded: &Arc<RasterSurface>,
    worker_count: usize,
    extract: F,
) -> Result<(Vec<ChannelHistogram>, Vec<ChannelHistogram>), PipelineError>
where
    F: Fn(&RasterSurface, FragmentCoordinates) -> ChannelHistogram + Send + Sync + 'static,
{
    let workers = WorkerPool::new(worker_count)?;
    let (sender, receiver) = channel::<(usize, ChannelHistogram)>();
    let extract = Arc::new(extract);

    for index in 0..FRAGMENT_COUNT * 2 {
        let surface = if index < FRAGMENT_COUNT {
            Arc::clone(reference)
        } else {
            Arc::clone(uploaded)
        };
        let sender = sender.clone();
        let extract = Arc::clone(&extract);
        workers.submit(move || {
            let coords = FragmentCoordinates::from_index(index % FRAGMENT_COUNT);
            let histogram = extract(&surface, coords);
            // The combiner holds the receiver until after the join, so
            // a send can only fail if the request was abandoned.
            let _ = sender.send((index, histogram));
        })?;
    }
    drop(sender);

    workers.shutdown();

    let mut slots: Vec<Option<ChannelHistogram>> = vec![None; FRAGMENT_COUNT * 2];
    for (index, histogram) in receiver {
        slots[index] = Some(histogram);
    }

    let mut reference_histograms = Vec::with_capacity(FRAGMENT_COUNT * 2);
    for (index, slot) in slots.into_iter().enumerate() {
        reference_histograms.push(slot.ok_or(PipelineError::MissingFragment { index })?);
    }
    let uploaded_histograms = reference_histograms.split_off(FRAGMENT_COUNT);
    Ok((reference_histograms, uploaded_histograms))
}
