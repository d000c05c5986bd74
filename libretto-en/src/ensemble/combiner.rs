//! Weight resolution and application
//!
//! Weights express how much each source's opinion counts in the final sum.
//! They are used as-is and need not sum to 1.

use crate::types::{Contribution, EnsembleError, NormalizedSource, SourceConfig};
use tracing::debug;

/// Resolve per-source weights in declaration order
///
/// - No source declares a weight: every source gets `1/N`
/// - At least one source declares a weight: declared weights are used as-is,
///   undeclared sources get `0.0` (present in provenance, scoreless)
///
/// # Errors
/// `Config` when a weight is negative or non-finite, or when every resolved
/// weight is zero (the aggregation could only ever produce all-zero scores).
pub fn resolve_weights(sources: &[SourceConfig]) -> Result<Vec<f64>, EnsembleError> {
    for source in sources {
        if let Some(w) = source.weight {
            if !w.is_finite() {
                return Err(EnsembleError::Config(format!(
                    "weight for source '{}' is not finite",
                    source.name
                )));
            }
            if w < 0.0 {
                return Err(EnsembleError::Config(format!(
                    "weight for source '{}' is negative ({})",
                    source.name, w
                )));
            }
        }
    }

    let any_declared = sources.iter().any(|s| s.weight.is_some());

    let weights: Vec<f64> = if any_declared {
        sources.iter().map(|s| s.weight.unwrap_or(0.0)).collect()
    } else {
        let equal = 1.0 / sources.len() as f64;
        vec![equal; sources.len()]
    };

    if !sources.is_empty() && weights.iter().all(|w| *w == 0.0) {
        return Err(EnsembleError::Config(
            "all source weights resolve to zero".to_string(),
        ));
    }

    Ok(weights)
}

/// Apply one source's weight to its normalized candidates
///
/// Pure multiplication: `weighted = normalized * weight`. A weight of 0
/// keeps the source visible in provenance while contributing no score.
pub fn combine(normalized: NormalizedSource, weight: f64) -> Vec<Contribution> {
    debug!(
        source = %normalized.source,
        weight = weight,
        candidate_count = normalized.candidates.len(),
        "Applying source weight"
    );

    normalized
        .candidates
        .into_iter()
        .map(|nc| Contribution {
            isbn: nc.candidate.isbn,
            title: nc.candidate.title,
            author: nc.candidate.author,
            description: nc.candidate.description,
            source: normalized.source.clone(),
            normalized_score: nc.normalized_score,
            weighted_score: nc.normalized_score * weight,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NormalizedCandidate, RawCandidate};

    fn source_config(name: &str, weight: Option<f64>) -> SourceConfig {
        SourceConfig {
            name: name.to_string(),
            endpoint: format!("http://localhost/{}", name),
            weight,
        }
    }

    fn normalized_source(source: &str, scores: &[(&str, f64)]) -> NormalizedSource {
        NormalizedSource {
            source: source.to_string(),
            candidates: scores
                .iter()
                .map(|(isbn, score)| NormalizedCandidate {
                    candidate: RawCandidate {
                        isbn: isbn.to_string(),
                        title: format!("Title {}", isbn),
                        author: "Author".to_string(),
                        description: "Description".to_string(),
                        raw_score: *score,
                    },
                    normalized_score: *score,
                })
                .collect(),
        }
    }

    #[test]
    fn test_equal_weights_when_none_declared() {
        let sources = vec![
            source_config("a", None),
            source_config("b", None),
            source_config("c", None),
            source_config("d", None),
        ];
        let weights = resolve_weights(&sources).unwrap();
        assert_eq!(weights, vec![0.25, 0.25, 0.25, 0.25]);
    }

    #[test]
    fn test_undeclared_weight_is_zero_when_any_declared() {
        let sources = vec![source_config("a", Some(0.7)), source_config("b", None)];
        let weights = resolve_weights(&sources).unwrap();
        assert_eq!(weights, vec![0.7, 0.0]);
    }

    #[test]
    fn test_weights_used_as_is_without_renormalization() {
        let sources = vec![source_config("a", Some(2.0)), source_config("b", Some(3.0))];
        let weights = resolve_weights(&sources).unwrap();
        assert_eq!(weights, vec![2.0, 3.0]);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let sources = vec![source_config("a", Some(-0.1))];
        let err = resolve_weights(&sources).unwrap_err();
        assert!(matches!(err, EnsembleError::Config(_)));
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let sources = vec![source_config("a", Some(0.0)), source_config("b", Some(0.0))];
        let err = resolve_weights(&sources).unwrap_err();
        assert!(matches!(err, EnsembleError::Config(_)));
    }

    #[test]
    fn test_single_zero_weight_among_others_is_allowed() {
        let sources = vec![source_config("a", Some(0.0)), source_config("b", Some(1.0))];
        let weights = resolve_weights(&sources).unwrap();
        assert_eq!(weights, vec![0.0, 1.0]);
    }

    #[test]
    fn test_combine_multiplies() {
        let contributions = combine(normalized_source("s1", &[("X", 1.0), ("Y", 0.5)]), 0.5);

        assert_eq!(contributions.len(), 2);
        assert_eq!(contributions[0].weighted_score, 0.5);
        assert_eq!(contributions[1].weighted_score, 0.25);
        assert_eq!(contributions[0].source, "s1");
        assert_eq!(contributions[0].normalized_score, 1.0);
    }

    #[test]
    fn test_combine_zero_weight_keeps_provenance() {
        let contributions = combine(normalized_source("s1", &[("X", 1.0)]), 0.0);
        assert_eq!(contributions.len(), 1);
        assert_eq!(contributions[0].weighted_score, 0.0);
        assert_eq!(contributions[0].source, "s1");
    }
}
