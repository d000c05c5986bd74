//! Network-facing services for libretto-en

pub mod orchestrator;
pub mod source_client;

pub use orchestrator::EnsembleOrchestrator;
pub use source_client::{build_http_client, HttpScoreSource};
