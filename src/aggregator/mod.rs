//! Aggregation of cost records into weighted tables and metrics.
//!
//! This module transforms scanned records into:
//! - A per-owner, per-category table (for flamegraph generation)
//! - Hot entry analysis (top time consumers)
//! - Cost distribution statistics

pub mod hierarchy;
pub mod metrics;

// Re-export main types and functions
pub use hierarchy::{
    aggregate, normalize_category, AggregateTable, AggregatedEntry, DescendantSummary, EntryKey,
};
pub use metrics::{
    calculate_cost_distribution, calculate_hot_entries, percentage_of, CostDistribution, HotEntry,
};
