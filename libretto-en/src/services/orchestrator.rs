//! Ensemble orchestration
//!
//! Drives one full aggregation: validate, dispatch one call per source
//! concurrently, collect under the shared timeout, then run the pure
//! pipeline stages over the collected results in source declaration order.
//!
//! # Concurrency model
//! Every source call is an independent future polled concurrently; each
//! writes only its own slot, and the merge happens after all calls have
//! terminated, so no locking is needed around the collection. All calls
//! start at the same instant, which makes the per-source timeout double as
//! the collection deadline.
//!
//! In fail-fast mode the first source error cancels the shared
//! `CancellationToken`; in-flight siblings resolve promptly as cancelled and
//! are discarded. Best-effort mode never cancels: failures are recorded as
//! metadata and the pipeline proceeds with whatever succeeded.
//!
//! Post-collection stages always walk sources in declaration order, never
//! completion order, so the aggregator's first-seen field selection is
//! reproducible regardless of network timing.

use crate::ensemble::{aggregate, combine, normalize, rank, resolve_weights};
use crate::services::source_client::HttpScoreSource;
use crate::types::{
    EnsembleError, EnsembleOutcome, EnsemblePhase, EnsembleRequest, ScoreSource, SourceFailure,
    SourceResult,
};
use futures::stream::{FuturesUnordered, StreamExt};
use libretto_common::human_time::format_elapsed;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Orchestrates concurrent source dispatch and the aggregation pipeline
#[derive(Clone)]
pub struct EnsembleOrchestrator {
    http_client: reqwest::Client,
}

impl EnsembleOrchestrator {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Run a full ensemble aggregation against the configured HTTP sources
    pub async fn recommend(
        &self,
        request: EnsembleRequest,
    ) -> Result<EnsembleOutcome, EnsembleError> {
        let sources: Vec<Arc<dyn ScoreSource>> = request
            .sources
            .iter()
            .map(|config| {
                Arc::new(HttpScoreSource::new(
                    config,
                    self.http_client.clone(),
                    request.timeout_per_source,
                )) as Arc<dyn ScoreSource>
            })
            .collect();

        self.recommend_with_sources(request, sources).await
    }

    /// Run the aggregation with caller-supplied source implementations
    ///
    /// `sources` must align index-for-index with `request.sources`; weights
    /// and merge order come from the request.
    pub async fn recommend_with_sources(
        &self,
        request: EnsembleRequest,
        sources: Vec<Arc<dyn ScoreSource>>,
    ) -> Result<EnsembleOutcome, EnsembleError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();

        transition(request_id, EnsemblePhase::Idle);

        // Rejected before any network call
        if let Err(err) = validate_request(&request) {
            transition(request_id, EnsemblePhase::Failed);
            return Err(err);
        }
        let weights = match resolve_weights(&request.sources) {
            Ok(weights) => weights,
            Err(err) => {
                transition(request_id, EnsemblePhase::Failed);
                return Err(err);
            }
        };

        info!(
            request_id = %request_id,
            source_count = request.sources.len(),
            playlist_len = request.playlist_ids.len(),
            fail_fast = request.fail_fast,
            "Starting ensemble aggregation"
        );

        transition(request_id, EnsemblePhase::Dispatching);

        let cancel = CancellationToken::new();
        let playlist = request.playlist_ids.as_slice();
        let timeout = request.timeout_per_source;
        let top_k = request.top_k_per_source;

        let mut in_flight: FuturesUnordered<_> = sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let source = Arc::clone(source);
                let token = cancel.clone();
                async move {
                    let name = source.name().to_string();
                    let result = tokio::select! {
                        _ = token.cancelled() => Err(EnsembleError::Cancelled { source: name }),
                        fetched = tokio::time::timeout(timeout, source.fetch(playlist, top_k)) => {
                            match fetched {
                                Ok(inner) => inner,
                                Err(_) => Err(EnsembleError::SourceTimeout {
                                    source: name,
                                    timeout_ms: timeout.as_millis() as u64,
                                }),
                            }
                        }
                    };
                    (index, result)
                }
            })
            .collect();

        transition(request_id, EnsemblePhase::Collecting);

        let mut slots: Vec<Option<SourceResult>> = request.sources.iter().map(|_| None).collect();
        // Non-cancelled errors in arrival order; the first one is what
        // triggered a fail-fast abort
        let mut errors: Vec<(usize, EnsembleError)> = Vec::new();

        while let Some((index, result)) = in_flight.next().await {
            match result {
                Ok(source_result) => {
                    slots[index] = Some(source_result);
                }
                Err(EnsembleError::Cancelled { source }) => {
                    debug!(request_id = %request_id, source = %source, "Source call cancelled");
                }
                Err(err) => {
                    warn!(
                        request_id = %request_id,
                        source = err.source_name().unwrap_or("?"),
                        error = %err,
                        "Source call failed"
                    );
                    if request.fail_fast {
                        cancel.cancel();
                    }
                    errors.push((index, err));
                }
            }
        }

        if request.fail_fast {
            if !errors.is_empty() {
                let (_, err) = errors.remove(0);
                transition(request_id, EnsemblePhase::Failed);
                return Err(err);
            }
        } else if slots.iter().all(|slot| slot.is_none()) && !errors.is_empty() {
            // Best-effort needs at least one success; raise the first
            // declared source's error
            errors.sort_by_key(|(index, _)| *index);
            let (_, err) = errors.remove(0);
            transition(request_id, EnsemblePhase::Failed);
            return Err(err);
        }

        errors.sort_by_key(|(index, _)| *index);
        let failures: Vec<SourceFailure> = errors
            .iter()
            .map(|(index, err)| SourceFailure {
                source: request.sources[*index].name.clone(),
                error: err.to_string(),
            })
            .collect();

        // Declaration-order walk: normalize and weight each source, then
        // merge. Completion order must not influence anything after this
        // point.
        transition(request_id, EnsemblePhase::Normalizing);
        let normalized: Vec<_> = slots
            .into_iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|result| (index, normalize(result))))
            .collect();

        transition(request_id, EnsemblePhase::Combining);
        let mut contributions = Vec::new();
        for (index, normalized_source) in normalized {
            contributions.extend(combine(normalized_source, weights[index]));
        }

        transition(request_id, EnsemblePhase::Aggregating);
        let aggregated = aggregate(contributions);

        if aggregated.is_empty() {
            transition(request_id, EnsemblePhase::Failed);
            return Err(EnsembleError::Empty);
        }

        transition(request_id, EnsemblePhase::Ranking);
        let items = rank(aggregated, request.top_k_final);

        transition(request_id, EnsemblePhase::Done);
        let elapsed = started.elapsed();
        info!(
            request_id = %request_id,
            item_count = items.len(),
            failed_sources = failures.len(),
            elapsed = %format_elapsed(elapsed),
            "Ensemble aggregation complete"
        );

        Ok(EnsembleOutcome {
            items,
            failures,
            elapsed,
        })
    }
}

fn transition(request_id: Uuid, phase: EnsemblePhase) {
    debug!(request_id = %request_id, phase = phase.as_str(), "Pipeline phase");
}

/// Structural request validation, before weight resolution
fn validate_request(request: &EnsembleRequest) -> Result<(), EnsembleError> {
    if request.playlist_ids.is_empty() {
        return Err(EnsembleError::Config("playlist is empty".to_string()));
    }

    if request.sources.is_empty() {
        return Err(EnsembleError::Config("no sources configured".to_string()));
    }

    let mut seen = HashSet::new();
    for source in &request.sources {
        if !seen.insert(source.name.as_str()) {
            return Err(EnsembleError::Config(format!(
                "duplicate source name '{}'",
                source.name
            )));
        }
    }

    Ok(())
}
