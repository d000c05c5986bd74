//! libretto-en library interface
//!
//! Exposes the ensemble pipeline and HTTP surface for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod ensemble;
pub mod error;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::services::{build_http_client, EnsembleOrchestrator};
use crate::types::EnsembleError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolved service configuration
    pub config: Arc<ServiceConfig>,
    /// Ensemble orchestrator with the shared HTTP client
    pub orchestrator: EnsembleOrchestrator,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Result<Self, EnsembleError> {
        let http_client = build_http_client()?;
        Ok(Self {
            config: Arc::new(config),
            orchestrator: EnsembleOrchestrator::new(http_client),
            startup_time: Utc::now(),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::recommend_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
