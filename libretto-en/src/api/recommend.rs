//! Ensemble recommendation endpoint

use axum::{extract::State, routing::post, Json, Router};
use libretto_common::api::{FailedSource, RecommendRequest, RecommendResponse, RecommendedBook};
use std::time::Duration;
use tracing::debug;

use crate::error::ApiResult;
use crate::types::{EnsembleRequest, SourceConfig};
use crate::AppState;

/// POST /recommend/ensemble
///
/// Fans the playlist out to the scoring sources and returns the merged,
/// ranked recommendation list. Tuning fields omitted from the request fall
/// back to the service configuration; a request-level source list replaces
/// the configured source table for this call only.
pub async fn recommend_ensemble(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> ApiResult<Json<RecommendResponse>> {
    let defaults = &state.config.defaults;

    let sources: Vec<SourceConfig> = match request.sources {
        Some(specs) => specs
            .into_iter()
            .map(|spec| SourceConfig {
                name: spec.name,
                endpoint: spec.endpoint,
                weight: spec.weight,
            })
            .collect(),
        None => state.config.sources.clone(),
    };

    debug!(
        source_count = sources.len(),
        playlist_len = request.playlist_ids.len(),
        "Handling ensemble recommendation request"
    );

    let ensemble_request = EnsembleRequest {
        playlist_ids: request.playlist_ids,
        sources,
        top_k_per_source: request.top_k_per_source.unwrap_or(defaults.top_k_per_source),
        top_k_final: request.top_k_final.unwrap_or(defaults.top_k_final),
        timeout_per_source: Duration::from_secs(
            request.timeout_seconds.unwrap_or(defaults.timeout_seconds),
        ),
        fail_fast: request.fail_fast.unwrap_or(defaults.fail_fast),
    };

    let outcome = state.orchestrator.recommend(ensemble_request).await?;

    Ok(Json(RecommendResponse {
        results: outcome
            .items
            .into_iter()
            .map(|item| RecommendedBook {
                isbn: item.isbn,
                title: item.title,
                author: item.author,
                description: item.description,
                score_final: item.final_score,
                models_contributing: item.contributing_sources,
            })
            .collect(),
        failed_sources: outcome
            .failures
            .into_iter()
            .map(|failure| FailedSource {
                source: failure.source,
                error: failure.error,
            })
            .collect(),
        elapsed_ms: outcome.elapsed.as_millis() as u64,
    }))
}

/// Build recommendation routes
pub fn recommend_routes() -> Router<AppState> {
    Router::new().route("/recommend/ensemble", post(recommend_ensemble))
}
