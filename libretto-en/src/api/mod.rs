//! HTTP API handlers for libretto-en

pub mod health;
pub mod recommend;

pub use health::health_routes;
pub use recommend::recommend_routes;
