//! Shared API request/response types
//!
//! Types crossing the HTTP boundary of the ensemble service. Kept in the
//! common crate so callers and the service share one wire definition.

use serde::{Deserialize, Serialize};

/// Opaque playlist item identifier
///
/// Scoring sources accept either integer indices or string ids; both are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaylistId {
    Int(i64),
    Str(String),
}

/// One scoring source supplied with a request
///
/// A request-level source list overrides the configured source table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Unique source name (weight lookup and provenance key)
    pub name: String,
    /// POST endpoint implementing the scoring contract
    pub endpoint: String,
    /// Aggregation weight; all-omitted means equal weights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// Ensemble recommendation request
///
/// Omitted tuning fields fall back to the service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    /// Ordered playlist identifiers; duplicates preserved
    pub playlist_ids: Vec<PlaylistId>,

    /// Optional source override; defaults to the configured source table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceSpec>>,

    /// Candidates requested from each source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k_per_source: Option<usize>,

    /// Items in the final ranked output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k_final: Option<usize>,

    /// Per-source call timeout (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Abort on the first source error instead of proceeding best-effort
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<bool>,
}

/// One ranked recommendation in the response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub description: String,
    /// Weighted ensemble score (sum over contributing sources)
    pub score_final: f64,
    /// Sources that recommended this item, sorted by name
    pub models_contributing: Vec<String>,
}

/// A source that failed during a best-effort aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedSource {
    pub source: String,
    pub error: String,
}

/// Ensemble recommendation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub results: Vec<RecommendedBook>,
    /// Empty unless the request ran best-effort and some sources failed
    #[serde(default)]
    pub failed_sources: Vec<FailedSource>,
    pub elapsed_ms: u64,
}
