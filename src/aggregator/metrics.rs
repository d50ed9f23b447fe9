//! Cost metrics over an aggregated table.
//!
//! Hot entries are the `(owner, category)` pairs that accumulated the most
//! time. These are the first places to look in a busy cluster.

use super::hierarchy::{AggregateTable, AggregatedEntry};
use log::debug;
use serde::{Deserialize, Serialize};

/// One of the most expensive entries of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotEntry {
    pub owner: String,
    pub category: String,
    pub cost: f64,
    pub count: u64,

    /// Share of the batch total, in percent
    pub percentage: f64,
}

/// Calculate the top entries by cost
///
/// **Public** - main entry point for metrics calculation
///
/// # Arguments
/// * `table` - Aggregated table
/// * `total` - Batch total used as the percentage base
/// * `top_n` - Number of entries to return
///
/// # Returns
/// Entries sorted by cost (descending), ties in table order
pub fn calculate_hot_entries(table: &AggregateTable, total: f64, top_n: usize) -> Vec<HotEntry> {
    debug!("Calculating top {} entries from {} entries", top_n, table.len());

    let mut entries: Vec<&AggregatedEntry> = table.iter().collect();
    entries.sort_by(|a, b| b.cost.total_cmp(&a.cost));

    entries
        .into_iter()
        .take(top_n)
        .map(|entry| create_hot_entry(entry, total))
        .collect()
}

/// Create a HotEntry from an AggregatedEntry
pub fn create_hot_entry(entry: &AggregatedEntry, total: f64) -> HotEntry {
    HotEntry {
        owner: entry.owner.clone(),
        category: entry.category.clone(),
        cost: entry.cost,
        count: entry.count,
        percentage: percentage_of(entry.cost, total),
    }
}

/// `part` as a percentage of `whole`; zero when `whole` is zero
pub fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        (part / whole) * 100.0
    } else {
        0.0
    }
}

/// Cost distribution statistics
///
/// **Public** - returned from calculate_cost_distribution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostDistribution {
    /// Total cost across all entries
    pub total_cost: f64,

    /// Number of entries
    pub entry_count: usize,

    pub mean_cost: f64,
    pub median_cost: f64,

    /// Cost of the top 10% of entries
    pub top_10_percent_cost: f64,

    /// Percentage of total cost in the top 10%
    pub top_10_percent_percentage: f64,
}

/// Calculate cost distribution statistics
pub fn calculate_cost_distribution(table: &AggregateTable) -> CostDistribution {
    if table.is_empty() {
        return CostDistribution::default();
    }

    let mut costs: Vec<f64> = table.iter().map(|e| e.cost).collect();
    costs.sort_by(|a, b| b.total_cmp(a));

    let total: f64 = costs.iter().sum();
    let count = costs.len();
    let median = costs[count / 2];

    let top_count = (count as f64 * 0.1).ceil() as usize;
    let top_cost: f64 = costs.iter().take(top_count).sum();

    CostDistribution {
        total_cost: total,
        entry_count: count,
        mean_cost: total / count as f64,
        median_cost: median,
        top_10_percent_cost: top_cost,
        top_10_percent_percentage: percentage_of(top_cost, total),
    }
}

impl CostDistribution {
    /// True when the top 10% of entries hold more than 80% of the cost
    pub fn is_highly_concentrated(&self) -> bool {
        self.top_10_percent_percentage > 80.0
    }

    /// Get human-readable summary
    pub fn summary(&self, unit: &str) -> String {
        format!(
            "Total: {:.2} {} | Entries: {} | Mean: {:.2} | Median: {:.2} | Top 10%: {:.1}%",
            self.total_cost,
            unit,
            self.entry_count,
            self.mean_cost,
            self.median_cost,
            self.top_10_percent_percentage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::parser::Record;

    fn table() -> AggregateTable {
        aggregate(&[
            Record::new("n1", "search", 8000.0),
            Record::new("n1", "bulk", 1000.0),
            Record::new("n2", "search", 500.0),
            Record::new("n2", "refresh", 500.0),
        ])
    }

    #[test]
    fn test_calculate_hot_entries() {
        let hot = calculate_hot_entries(&table(), 10000.0, 2);

        assert_eq!(hot.len(), 2);
        assert_eq!(hot[0].category, "search");
        assert_eq!(hot[0].owner, "n1");
        assert_eq!(hot[0].percentage, 80.0);
        assert_eq!(hot[1].category, "bulk");
    }

    #[test]
    fn test_calculate_cost_distribution() {
        let dist = calculate_cost_distribution(&table());

        assert_eq!(dist.total_cost, 10000.0);
        assert_eq!(dist.entry_count, 4);
        assert_eq!(dist.mean_cost, 2500.0);
        assert!(!dist.is_highly_concentrated());
    }

    #[test]
    fn test_distribution_empty() {
        let dist = calculate_cost_distribution(&AggregateTable::default());
        assert_eq!(dist.total_cost, 0.0);
        assert_eq!(dist.entry_count, 0);
    }

    #[test]
    fn test_percentage_of_zero_total() {
        assert_eq!(percentage_of(5.0, 0.0), 0.0);
    }
}
