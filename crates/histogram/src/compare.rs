//! Histogram comparison: capped KL divergence, similarity matrix, score.
//!
//! Per channel, both histograms are normalized to probability
//! distributions and compared with the Kullback–Leibler divergence
//! summed over buckets where both probabilities are positive. The
//! divergence is mapped into a bounded similarity via
//! `1 − min(D / max_divergence, 1)`.
//!
//! KL divergence is not symmetric and is not symmetrized here:
//! `D(reference ‖ uploaded)` is what the comparator computes, with the
//! reference histogram supplying `p` and the uploaded one `q`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fragment::{ChannelHistogram, FragmentCoordinates, FRAGMENT_COUNT, GRID_DIM, HISTOGRAM_BUCKETS};

/// Empirical upper bound for the divergence of typical histogram pairs.
///
/// This is a calibration constant, not a derived value: divergences at
/// or above it map to similarity 0. Tune it if the score distribution
/// needs re-centering for a different image corpus.
pub const DEFAULT_MAX_DIVERGENCE: f64 = 5.545;

/// Tunables for the comparator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompareConfig {
    /// Divergence value mapped to similarity 0. Must be positive.
    pub max_divergence: f64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            max_divergence: DEFAULT_MAX_DIVERGENCE,
        }
    }
}

impl CompareConfig {
    pub fn validate(&self) -> Result<(), HistogramError> {
        if self.max_divergence <= 0.0 || !self.max_divergence.is_finite() {
            return Err(HistogramError::InvalidMaxDivergence(self.max_divergence));
        }
        Ok(())
    }
}

/// Errors raised by the comparator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HistogramError {
    #[error("expected {expected} fragment histograms, got {actual}")]
    FragmentCountMismatch { expected: usize, actual: usize },

    #[error("max_divergence must be a positive finite value, got {0}")]
    InvalidMaxDivergence(f64),
}

/// 4×4 grid of per-fragment similarity scores in `[0, 1]`.
///
/// `cell(r, c)` corresponds exactly to grid cell `(r, c)` of both the
/// reference and the uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    cells: [[f64; GRID_DIM]; GRID_DIM],
}

impl SimilarityMatrix {
    pub fn cell(&self, row: usize, col: usize) -> f64 {
        self.cells[row][col]
    }

    pub fn rows(&self) -> &[[f64; GRID_DIM]; GRID_DIM] {
        &self.cells
    }

    /// Mean of all fragment similarities scaled to `[0, 100]`, rounded
    /// to two decimal places and clamped.
    pub fn total_score(&self) -> f64 {
        let sum: f64 = self.cells.iter().flatten().sum();
        let mean = sum / FRAGMENT_COUNT as f64;
        let score = (mean * 100.0 * 100.0).round() / 100.0;
        score.clamp(0.0, 100.0)
    }
}

/// Compare two row-major sequences of 16 fragment histograms.
pub fn compare_fragments(
    reference: &[ChannelHistogram],
    uploaded: &[ChannelHistogram],
    config: &CompareConfig,
) -> Result<SimilarityMatrix, HistogramError> {
    config.validate()?;
    for histograms in [reference, uploaded] {
        if histograms.len() != FRAGMENT_COUNT {
            return Err(HistogramError::FragmentCountMismatch {
                expected: FRAGMENT_COUNT,
                actual: histograms.len(),
            });
        }
    }

    let mut cells = [[0.0; GRID_DIM]; GRID_DIM];
    for index in 0..FRAGMENT_COUNT {
        let coords = FragmentCoordinates::from_index(index);
        cells[coords.row][coords.col] =
            fragment_similarity(&reference[index], &uploaded[index], config);
    }
    Ok(SimilarityMatrix { cells })
}

/// Unweighted mean of the three channel similarities of one fragment.
pub fn fragment_similarity(
    reference: &ChannelHistogram,
    uploaded: &ChannelHistogram,
    config: &CompareConfig,
) -> f64 {
    let sum: f64 = (0..3)
        .map(|channel| {
            channel_similarity(
                reference.channel(channel),
                uploaded.channel(channel),
                reference.total(channel),
                uploaded.total(channel),
                config,
            )
        })
        .sum();
    sum / 3.0
}

fn channel_similarity(
    p_counts: &[u32; HISTOGRAM_BUCKETS],
    q_counts: &[u32; HISTOGRAM_BUCKETS],
    p_total: u64,
    q_total: u64,
    config: &CompareConfig,
) -> f64 {
    // Degenerate case: an empty channel is a total mismatch.
    if p_total == 0 || q_total == 0 {
        return 0.0;
    }

    let mut divergence = 0.0;
    for bucket in 0..HISTOGRAM_BUCKETS {
        if p_counts[bucket] > 0 && q_counts[bucket] > 0 {
            let p = p_counts[bucket] as f64 / p_total as f64;
            let q = q_counts[bucket] as f64 / q_total as f64;
            divergence += p * (p / q).ln();
        }
    }

    // The truncated sum can dip below zero when support barely
    // overlaps; clamping keeps every cell inside [0, 1].
    1.0 - (divergence / config.max_divergence).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::extract_fragment;
    use crate::surface::RasterSurface;

    fn histogram_for(pixels: &[[u8; 3]]) -> ChannelHistogram {
        // Build a 4-wide, 4-tall surface so fragment (0,0) is 1x1 per
        // pixel row; easier: a packed surface sized to hold the pixels
        // in fragment (0,0) of a 4x-scaled grid.
        let width = 4 * pixels.len();
        let mut data = Vec::new();
        for row in 0..4 {
            for x in 0..width {
                let pixel = if row == 0 && x < pixels.len() {
                    pixels[x]
                } else {
                    pixels[0]
                };
                data.extend_from_slice(&pixel);
            }
        }
        let surface = RasterSurface::packed(width, 4, 3, data).expect("surface");
        extract_fragment(&surface, FragmentCoordinates { row: 0, col: 0 })
    }

    #[test]
    fn self_similarity_is_maximal() {
        let histogram = histogram_for(&[[10, 20, 30], [40, 50, 60], [10, 20, 30]]);
        let similarity = fragment_similarity(&histogram, &histogram, &CompareConfig::default());
        assert!((similarity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_channel_is_total_mismatch() {
        let populated = histogram_for(&[[0, 0, 0]]);
        // A 2x2 surface yields zero-sized fragments, so this histogram
        // never counted a single pixel.
        let surface = RasterSurface::packed(2, 2, 3, vec![0; 12]).expect("surface");
        let degenerate = extract_fragment(&surface, FragmentCoordinates { row: 0, col: 0 });
        assert_eq!(degenerate.total(0), 0);

        let similarity = fragment_similarity(&populated, &degenerate, &CompareConfig::default());
        assert_eq!(similarity, 0.0);
    }

    #[test]
    fn divergence_is_asymmetric() {
        // Skewed vs near-uniform distributions over the same support:
        // D(p‖q) and D(q‖p) differ, and the comparator must reflect it.
        let mut skewed = Vec::new();
        for _ in 0..9 {
            skewed.push([10, 10, 10]);
        }
        skewed.push([200, 200, 200]);

        let mut balanced = Vec::new();
        for _ in 0..5 {
            balanced.push([10, 10, 10]);
            balanced.push([200, 200, 200]);
        }

        let a = histogram_for(&skewed);
        let b = histogram_for(&balanced);
        let config = CompareConfig::default();

        let forward = fragment_similarity(&a, &b, &config);
        let backward = fragment_similarity(&b, &a, &config);
        assert_ne!(forward, backward);
    }

    #[test]
    fn total_score_stays_in_range() {
        let matrix = SimilarityMatrix {
            cells: [[1.0; GRID_DIM]; GRID_DIM],
        };
        assert_eq!(matrix.total_score(), 100.0);

        let matrix = SimilarityMatrix {
            cells: [[0.0; GRID_DIM]; GRID_DIM],
        };
        assert_eq!(matrix.total_score(), 0.0);

        let mut cells = [[0.25; GRID_DIM]; GRID_DIM];
        cells[0][0] = 0.75;
        let matrix = SimilarityMatrix { cells };
        let score = matrix.total_score();
        assert!((0.0..=100.0).contains(&score));
        // Two decimal places.
        assert!((score * 100.0 - (score * 100.0).round()).abs() < 1e-9);
    }

    #[test]
    fn compare_fragments_rejects_wrong_counts() {
        let histogram = histogram_for(&[[1, 2, 3]]);
        let short = vec![histogram.clone(); 4];
        let full = vec![histogram; FRAGMENT_COUNT];

        let err = compare_fragments(&short, &full, &CompareConfig::default()).unwrap_err();
        assert_eq!(
            err,
            HistogramError::FragmentCountMismatch {
                expected: FRAGMENT_COUNT,
                actual: 4
            }
        );
    }

    #[test]
    fn disjoint_support_yields_full_similarity() {
        // The divergence sums only over buckets where both sides are
        // positive, so fully disjoint distributions contribute nothing
        // and score a perfect 1.0. Long-standing quirk, kept as is.
        let a = histogram_for(&[[10, 10, 10]]);
        let b = histogram_for(&[[200, 200, 200]]);
        let similarity = fragment_similarity(&a, &b, &CompareConfig::default());
        assert_eq!(similarity, 1.0);
    }

    #[test]
    fn compare_fragments_places_cells_row_major() {
        // Overlapping but skewed distributions, so the off cell scores
        // strictly below 1.0 (disjoint support would not).
        let mut skewed = Vec::new();
        for _ in 0..9 {
            skewed.push([10, 10, 10]);
        }
        skewed.push([200, 200, 200]);

        let mut balanced = Vec::new();
        for _ in 0..5 {
            balanced.push([10, 10, 10]);
            balanced.push([200, 200, 200]);
        }

        let base = histogram_for(&skewed);
        let other = histogram_for(&balanced);

        let reference = vec![base.clone(); FRAGMENT_COUNT];
        let mut uploaded = vec![base; FRAGMENT_COUNT];
        // Fragment index 6 is grid cell (1, 2).
        uploaded[6] = other;

        let matrix =
            compare_fragments(&reference, &uploaded, &CompareConfig::default()).expect("matrix");
        assert!(matrix.cell(1, 2) < 1.0);
        assert!((matrix.cell(0, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_max_divergence_is_rejected() {
        let config = CompareConfig {
            max_divergence: 0.0,
        };
        assert_eq!(
            config.validate().unwrap_err(),
            HistogramError::InvalidMaxDivergence(0.0)
        );
    }
}
