//! Record schema shared by the input scanners and the aggregator.
//!
//! Scanners turn raw dumps into a flat list of [`Record`]s; everything
//! downstream works on this list only.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One cost sample reported by a cluster node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Node (host) that reported the cost
    pub owner: String,

    /// Thread name (hot threads) or task action (task list)
    pub category: String,

    /// Elapsed time in the batch's [`TimeUnit`]
    pub cost: f64,

    /// Number of occurrences folded into this record
    pub count: u64,

    /// Free text shown in tooltips (leaf frame, task description)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,

    /// Task identifier, unique within one batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Identifier of the parent task, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Record {
    /// Create a flat record with a single occurrence
    pub fn new(owner: impl Into<String>, category: impl Into<String>, cost: f64) -> Self {
        Self {
            owner: owner.into(),
            category: category.into(),
            cost,
            count: 1,
            annotation: None,
            id: None,
            parent_id: None,
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        let annotation = annotation.into();
        self.annotation = (!annotation.is_empty()).then_some(annotation);
        self
    }

    /// Attach task identity and, optionally, the parent reference
    pub fn with_task_id(mut self, id: impl Into<String>, parent_id: Option<String>) -> Self {
        self.id = Some(id.into());
        self.parent_id = parent_id.filter(|p| !p.is_empty());
        self
    }
}

/// Unit of every `cost` in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Millis,
    Nanos,
}

impl TimeUnit {
    /// Short label used in tooltips and summaries
    pub fn label(&self) -> &'static str {
        match self {
            TimeUnit::Millis => "ms",
            TimeUnit::Nanos => "ns",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shape of a diagnostic dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    HotThreads,
    Tasks,
    /// Hot threads sections followed by a task list document
    Mixed,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputFormat::HotThreads => "hot threads",
            InputFormat::Tasks => "tasks",
            InputFormat::Mixed => "mixed",
        };
        f.write_str(name)
    }
}

/// Everything a scanner extracts from one dump
#[derive(Debug, Clone)]
pub struct ParsedBatch {
    pub format: InputFormat,
    pub records: Vec<Record>,

    /// Sum of all record costs
    pub total: f64,

    pub unit: TimeUnit,

    /// Sampling interval of the hot threads report, if known
    pub interval_ms: Option<f64>,
}

impl ParsedBatch {
    pub fn new(format: InputFormat, records: Vec<Record>, unit: TimeUnit) -> Self {
        let total = records.iter().map(|r| r.cost.max(0.0)).sum();
        Self {
            format,
            records,
            total,
            unit,
            interval_ms: None,
        }
    }

    /// Number of distinct owners in the batch
    pub fn node_count(&self) -> usize {
        let mut owners: Vec<&str> = self.records.iter().map(|r| r.owner.as_str()).collect();
        owners.sort_unstable();
        owners.dedup();
        owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Split the batch into one batch per owner, in first-appearance order
    pub fn split_by_owner(&self) -> Vec<(String, ParsedBatch)> {
        let mut groups: IndexMap<&str, Vec<Record>> = IndexMap::new();
        for record in &self.records {
            groups
                .entry(record.owner.as_str())
                .or_default()
                .push(record.clone());
        }

        groups
            .into_iter()
            .map(|(owner, records)| {
                let mut batch = ParsedBatch::new(self.format, records, self.unit);
                batch.interval_ms = self.interval_ms;
                (owner.to_string(), batch)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_total_ignores_negative_costs() {
        let batch = ParsedBatch::new(
            InputFormat::HotThreads,
            vec![Record::new("n1", "t", 5.0), Record::new("n1", "t", -3.0)],
            TimeUnit::Millis,
        );
        assert_eq!(batch.total, 5.0);
    }

    #[test]
    fn test_split_by_owner_keeps_order() {
        let batch = ParsedBatch::new(
            InputFormat::Tasks,
            vec![
                Record::new("b", "x", 1.0),
                Record::new("a", "y", 2.0),
                Record::new("b", "z", 3.0),
            ],
            TimeUnit::Nanos,
        );

        let split = batch.split_by_owner();
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].0, "b");
        assert_eq!(split[0].1.total, 4.0);
        assert_eq!(split[1].0, "a");
        assert_eq!(batch.node_count(), 2);
    }

    #[test]
    fn test_empty_annotation_is_dropped() {
        let record = Record::new("n", "c", 1.0).with_annotation("");
        assert!(record.annotation.is_none());
    }
}
