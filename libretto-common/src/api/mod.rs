//! Shared API types for Libretto services

pub mod types;

pub use types::{
    FailedSource, PlaylistId, RecommendRequest, RecommendResponse, RecommendedBook, SourceSpec,
};
