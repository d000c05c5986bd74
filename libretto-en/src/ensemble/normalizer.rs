//! Score normalization
//!
//! Each source scores on its own scale (cosine similarity, distance-derived,
//! unbounded regression output). Before scores can be combined they are
//! rescaled per source onto [0,1] with a min/max transform.
//!
//! Normalization is strictly per-source: scores from different sources are
//! never compared here.

use crate::types::{NormalizedCandidate, NormalizedSource, SourceResult};
use tracing::debug;

/// Normalize one source's raw scores onto [0,1]
///
/// `normalized = (raw - min) / (max - min)` over this source's candidates.
///
/// When every candidate carries the same raw score (including the
/// single-candidate case) there is no discriminating signal; all candidates
/// get `1.0` so a degenerate source still contributes full weight rather
/// than being silently excluded.
pub fn normalize(result: SourceResult) -> NormalizedSource {
    let min = result
        .candidates
        .iter()
        .map(|c| c.raw_score)
        .fold(f64::INFINITY, f64::min);
    let max = result
        .candidates
        .iter()
        .map(|c| c.raw_score)
        .fold(f64::NEG_INFINITY, f64::max);

    let candidates: Vec<NormalizedCandidate> = result
        .candidates
        .into_iter()
        .map(|candidate| {
            let normalized_score = if max > min {
                (candidate.raw_score - min) / (max - min)
            } else {
                1.0
            };
            NormalizedCandidate {
                candidate,
                normalized_score,
            }
        })
        .collect();

    debug!(
        source = %result.source,
        candidate_count = candidates.len(),
        min = min,
        max = max,
        "Normalized source scores"
    );

    NormalizedSource {
        source: result.source,
        candidates,
    }
}
