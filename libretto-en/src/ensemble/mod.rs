//! Ensemble pipeline stages
//!
//! Pure, per-stage transforms applied after all source calls have been
//! collected. Stages run in a fixed order over sources in declaration order,
//! so the output is reproducible regardless of network completion order.
//!
//! # Stages
//! 1. **normalizer** - Per-source min/max rescale onto [0,1]
//! 2. **combiner** - Weight resolution and application
//! 3. **aggregator** - Cross-source merge by ISBN
//! 4. **ranker** - Final ordering and truncation
//!
//! None of these stages performs I/O; everything network-facing lives in
//! `services`.

pub mod aggregator;
pub mod combiner;
pub mod normalizer;
pub mod ranker;

pub use aggregator::aggregate;
pub use combiner::{combine, resolve_weights};
pub use normalizer::normalize;
pub use ranker::rank;
