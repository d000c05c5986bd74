//! Core types and trait definitions for the ensemble pipeline
//!
//! The pipeline runs in fixed stages over per-source data:
//! - **Fetch:** one `ScoreSource` call per configured source, concurrently
//! - **Normalize:** per-source min/max rescale onto [0,1]
//! - **Combine:** apply the source weight to every normalized score
//! - **Aggregate:** merge contributions across sources by ISBN
//! - **Rank:** order by final score and truncate

use libretto_common::api::PlaylistId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Source configuration
// ============================================================================

/// One scoring source as seen by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique source name (weight lookup and provenance key)
    pub name: String,
    /// POST endpoint implementing the scoring contract
    pub endpoint: String,
    /// Aggregation weight; `None` participates in equal-weight resolution
    pub weight: Option<f64>,
}

/// Fully specified ensemble invocation
#[derive(Debug, Clone)]
pub struct EnsembleRequest {
    /// Ordered playlist identifiers; duplicates preserved
    pub playlist_ids: Vec<PlaylistId>,
    /// Sources in declaration order (the merge order for all later stages)
    pub sources: Vec<SourceConfig>,
    /// Candidates requested from each source
    pub top_k_per_source: usize,
    /// Items in the final ranked output
    pub top_k_final: usize,
    /// Per-source call timeout; the shared dispatch instant makes this the
    /// collection deadline as well
    pub timeout_per_source: Duration,
    /// Abort on the first source error instead of proceeding best-effort
    pub fail_fast: bool,
}

// ============================================================================
// Pipeline data
// ============================================================================

/// One candidate as returned by a source, after schema validation
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    /// Canonical dedup key across sources
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub description: String,
    /// Source-native similarity score, scale unknown
    pub raw_score: f64,
}

/// Validated response of one source
#[derive(Debug, Clone)]
pub struct SourceResult {
    /// Source name, tagged at fetch time
    pub source: String,
    /// Candidates in the source's own ranking order
    pub candidates: Vec<RawCandidate>,
    /// Individually malformed records dropped during validation
    pub dropped_records: usize,
}

/// A candidate with its per-source normalized score
#[derive(Debug, Clone)]
pub struct NormalizedCandidate {
    pub candidate: RawCandidate,
    /// Min/max-rescaled score in [0,1]
    pub normalized_score: f64,
}

/// One source's candidates after normalization
#[derive(Debug, Clone)]
pub struct NormalizedSource {
    pub source: String,
    pub candidates: Vec<NormalizedCandidate>,
}

/// Per-item, per-source contribution after weighting
#[derive(Debug, Clone)]
pub struct Contribution {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub source: String,
    pub normalized_score: f64,
    /// `normalized_score * source weight`
    pub weighted_score: f64,
}

/// One item after cross-source aggregation
#[derive(Debug, Clone)]
pub struct AggregatedItem {
    pub isbn: String,
    /// Descriptive fields from the first contribution seen for this ISBN
    pub title: String,
    pub author: String,
    pub description: String,
    /// Sum of weighted contributions over all contributing sources
    pub final_score: f64,
    /// Distinct contributing source names, sorted
    pub contributing_sources: Vec<String>,
}

/// A source that failed during a best-effort aggregation
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// Result of a complete ensemble invocation
#[derive(Debug, Clone)]
pub struct EnsembleOutcome {
    /// Ranked recommendations, best first
    pub items: Vec<AggregatedItem>,
    /// Per-source failures tolerated in best-effort mode (empty in fail-fast)
    pub failures: Vec<SourceFailure>,
    /// Wall-clock time of the whole invocation
    pub elapsed: Duration,
}

// ============================================================================
// Score source trait
// ============================================================================

/// A scoring source the orchestrator can dispatch to
///
/// Implemented by the HTTP client for real sources and by in-process fakes in
/// tests. Implementations are queried concurrently and must not share mutable
/// state across calls.
#[async_trait::async_trait]
pub trait ScoreSource: Send + Sync {
    /// Source name for provenance tracking
    fn name(&self) -> &str;

    /// Fetch up to `top_k` scored candidates for the playlist
    ///
    /// # Errors
    /// Returns `EnsembleError` tagged with this source's name; the caller
    /// decides whether one failure aborts the whole aggregation.
    async fn fetch(
        &self,
        playlist_ids: &[PlaylistId],
        top_k: usize,
    ) -> Result<SourceResult, EnsembleError>;
}

// ============================================================================
// Orchestrator phases
// ============================================================================

/// Pipeline phase, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsemblePhase {
    Idle,
    Dispatching,
    Collecting,
    Normalizing,
    Combining,
    Aggregating,
    Ranking,
    Done,
    Failed,
}

impl EnsemblePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnsemblePhase::Idle => "IDLE",
            EnsemblePhase::Dispatching => "DISPATCHING",
            EnsemblePhase::Collecting => "COLLECTING",
            EnsemblePhase::Normalizing => "NORMALIZING",
            EnsemblePhase::Combining => "COMBINING",
            EnsemblePhase::Aggregating => "AGGREGATING",
            EnsemblePhase::Ranking => "RANKING",
            EnsemblePhase::Done => "DONE",
            EnsemblePhase::Failed => "FAILED",
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Ensemble error taxonomy
///
/// Source-tagged variants identify the failing source; `Config` and `Empty`
/// concern the invocation as a whole.
#[derive(Debug, Error)]
pub enum EnsembleError {
    /// Rejected before dispatch: empty source set, duplicate names,
    /// negative or all-zero weights, empty playlist
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source failed to respond within its timeout
    #[error("Source '{source}' timed out after {timeout_ms}ms")]
    SourceTimeout { source: String, timeout_ms: u64 },

    /// Transport failure or non-success HTTP status from a source
    #[error("Source '{source}' HTTP error: {message}")]
    SourceHttp { source: String, message: String },

    /// Response body could not be validated into candidates
    #[error("Source '{source}' returned an unusable payload: {reason}")]
    SourceSchema { source: String, reason: String },

    /// All sources succeeded but produced zero usable candidates
    #[error("No usable candidates from any source")]
    Empty,

    /// In-flight call cancelled after a sibling failed in fail-fast mode.
    /// Never surfaced to callers; the triggering error is reported instead.
    #[error("Source '{source}' cancelled")]
    Cancelled { source: String },
}

impl EnsembleError {
    /// Name of the failing source, for source-tagged variants
    pub fn source_name(&self) -> Option<&str> {
        match self {
            EnsembleError::SourceTimeout { source, .. }
            | EnsembleError::SourceHttp { source, .. }
            | EnsembleError::SourceSchema { source, .. }
            | EnsembleError::Cancelled { source } => Some(source),
            EnsembleError::Config(_) | EnsembleError::Empty => None,
        }
    }

    /// True for errors attributable to a single source call
    pub fn is_source_error(&self) -> bool {
        self.source_name().is_some()
    }
}
