//! Final ranking
//!
//! Orders aggregated items by ensemble score and truncates to the requested
//! output size.

use crate::types::AggregatedItem;
use std::collections::HashMap;

/// Rank aggregated items and truncate to `top_k_final`
///
/// Descending by `final_score`; equal scores break ties by ascending ISBN so
/// the output order is deterministic. Fewer than `top_k_final` items is not
/// an error; everything available is returned.
pub fn rank(items: HashMap<String, AggregatedItem>, top_k_final: usize) -> Vec<AggregatedItem> {
    let mut ranked: Vec<AggregatedItem> = items.into_values().collect();

    ranked.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.isbn.cmp(&b.isbn))
    });

    ranked.truncate(top_k_final);
    ranked
}
