//! Cross-source aggregation
//!
//! Merges weighted contributions for the same ISBN into one record, summing
//! scores and tracking which sources contributed.

use crate::types::{AggregatedItem, Contribution};
use std::collections::HashMap;
use tracing::debug;

/// Merge contributions across sources by ISBN
///
/// For each ISBN: `final_score` is the sum of weighted contributions,
/// `contributing_sources` the distinct source names (sorted for stable
/// output). Descriptive fields are taken from the first contribution seen
/// for that ISBN; callers must pass contributions in fixed source
/// declaration order, which makes the choice deterministic across runs.
pub fn aggregate(contributions: Vec<Contribution>) -> HashMap<String, AggregatedItem> {
    let mut items: HashMap<String, AggregatedItem> = HashMap::new();

    for contribution in contributions {
        match items.get_mut(&contribution.isbn) {
            Some(item) => {
                item.final_score += contribution.weighted_score;
                if !item.contributing_sources.contains(&contribution.source) {
                    item.contributing_sources.push(contribution.source);
                }
            }
            None => {
                items.insert(
                    contribution.isbn.clone(),
                    AggregatedItem {
                        isbn: contribution.isbn,
                        title: contribution.title,
                        author: contribution.author,
                        description: contribution.description,
                        final_score: contribution.weighted_score,
                        contributing_sources: vec![contribution.source],
                    },
                );
            }
        }
    }

    for item in items.values_mut() {
        item.contributing_sources.sort();
    }

    debug!(item_count = items.len(), "Aggregated contributions");

    items
}
