//! Reduction of cost records into a per-owner, per-category table.
//!
//! Flat input (no parent links) is grouped directly by `(owner, category)`.
//! Task input with parent links is first folded into its roots: every task
//! and all of its transitive children collapse into one entry keyed by the
//! root's `(owner, category)`, with the folded children listed as
//! [`DescendantSummary`] rows.
//!
//! The fold walks an index-based arena with an explicit stack and a visited
//! set, so cycles and dangling parent references terminate and no record is
//! ever counted twice.

use crate::parser::schema::Record;
use crate::utils::config::UNKNOWN_CATEGORY;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Key of an aggregated entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryKey {
    pub owner: String,
    pub category: String,
}

impl EntryKey {
    pub fn new(owner: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            category: category.into(),
        }
    }
}

/// Cost of one group of folded descendants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescendantSummary {
    /// Category as first seen (not normalized)
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,

    pub cost: f64,
}

/// Totals for one `(owner, category)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEntry {
    pub owner: String,
    pub category: String,

    /// Own cost plus the cost of every folded descendant
    pub cost: f64,

    /// Occurrences folded into this entry
    pub count: u64,

    /// First non-empty annotation of the entry's own records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,

    /// Folded descendants, most expensive first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descendants: Vec<DescendantSummary>,
}

/// Result of one aggregation pass, in first-appearance order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateTable {
    entries: IndexMap<EntryKey, AggregatedEntry>,
}

impl AggregateTable {
    pub fn get(&self, owner: &str, category: &str) -> Option<&AggregatedEntry> {
        self.entries.get(&EntryKey::new(owner, category))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregatedEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every entry's cost
    pub fn total_cost(&self) -> f64 {
        self.entries.values().map(|e| e.cost).sum()
    }

    /// Sum of every entry's occurrence count
    pub fn total_count(&self) -> u64 {
        self.entries.values().map(|e| e.count).sum()
    }

    /// Entries grouped by owner, owners in first-appearance order
    pub fn by_owner(&self) -> IndexMap<&str, Vec<&AggregatedEntry>> {
        let mut owners: IndexMap<&str, Vec<&AggregatedEntry>> = IndexMap::new();
        for entry in self.entries.values() {
            owners.entry(entry.owner.as_str()).or_default().push(entry);
        }
        owners
    }
}

/// Mutable accumulator used while a pass is running
struct EntryBuilder {
    cost: f64,
    count: u64,
    annotation: Option<String>,
    descendants: IndexMap<(String, Option<String>), DescendantSummary>,
}

impl EntryBuilder {
    fn new() -> Self {
        Self {
            cost: 0.0,
            count: 0,
            annotation: None,
            descendants: IndexMap::new(),
        }
    }

    fn add_own(&mut self, record: &Record) {
        self.cost += sanitize_cost(record.cost);
        self.count += record.count;
        if self.annotation.is_none() {
            self.annotation = record.annotation.clone().filter(|a| !a.is_empty());
        }
    }

    fn add_descendant(&mut self, record: &Record) {
        let cost = sanitize_cost(record.cost);
        self.cost += cost;
        self.count += record.count;

        let category = category_or_unknown(&record.category);
        let key = (normalize_category(category), record.annotation.clone());
        self.descendants
            .entry(key)
            .and_modify(|summary| summary.cost += cost)
            .or_insert_with(|| DescendantSummary {
                category: category.to_string(),
                annotation: record.annotation.clone(),
                cost,
            });
    }

    fn finish(self, key: EntryKey) -> AggregatedEntry {
        let mut descendants: Vec<DescendantSummary> = self.descendants.into_values().collect();
        descendants.sort_by(compare_descendants);

        AggregatedEntry {
            owner: key.owner,
            category: key.category,
            cost: self.cost,
            count: self.count,
            annotation: self.annotation,
            descendants,
        }
    }
}

/// Aggregate records into a per-owner, per-category table
///
/// **Public** - main entry point for aggregation
///
/// Parent links switch the pass into hierarchical mode; otherwise records
/// are grouped directly. An empty batch gives an empty table.
pub fn aggregate(records: &[Record]) -> AggregateTable {
    let hierarchical = records.iter().any(|r| r.parent_id.is_some());
    debug!(
        "Aggregating {} records ({} mode)",
        records.len(),
        if hierarchical { "hierarchical" } else { "flat" }
    );

    let builders = if hierarchical {
        fold_hierarchy(records)
    } else {
        group_flat(records)
    };

    let entries: IndexMap<EntryKey, AggregatedEntry> = builders
        .into_iter()
        .map(|(key, builder)| (key.clone(), builder.finish(key)))
        .collect();

    debug!("Aggregated into {} entries", entries.len());
    AggregateTable { entries }
}

fn group_flat(records: &[Record]) -> IndexMap<EntryKey, EntryBuilder> {
    let mut builders: IndexMap<EntryKey, EntryBuilder> = IndexMap::new();
    for record in records {
        builders
            .entry(key_for(record))
            .or_insert_with(EntryBuilder::new)
            .add_own(record);
    }
    builders
}

fn fold_hierarchy(records: &[Record]) -> IndexMap<EntryKey, EntryBuilder> {
    let n = records.len();

    // First record wins when an identifier repeats
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(n);
    for (i, record) in records.iter().enumerate() {
        if let Some(id) = record.id.as_deref() {
            index.entry(id).or_insert(i);
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut is_root = vec![true; n];
    for (i, record) in records.iter().enumerate() {
        let parent = record
            .parent_id
            .as_deref()
            .and_then(|p| index.get(p).copied())
            .filter(|&p| p != i);
        if let Some(p) = parent {
            children[p].push(i);
            is_root[i] = false;
        }
    }

    let mut visited = vec![false; n];
    let mut builders: IndexMap<EntryKey, EntryBuilder> = IndexMap::new();

    for root in (0..n).filter(|&i| is_root[i]) {
        fold_from(root, records, &children, &mut visited, &mut builders);
    }

    // Whatever is left sits on a parent cycle with no way up to a root;
    // each cycle is entered at its first record in input order.
    let mut cyclic = 0;
    for start in 0..n {
        if !visited[start] {
            cyclic += 1;
            fold_from(start, records, &children, &mut visited, &mut builders);
        }
    }
    if cyclic > 0 {
        warn!("Task graph contains {} parent cycle(s); folded at first member", cyclic);
    }

    builders
}

fn fold_from(
    root: usize,
    records: &[Record],
    children: &[Vec<usize>],
    visited: &mut [bool],
    builders: &mut IndexMap<EntryKey, EntryBuilder>,
) {
    if visited[root] {
        return;
    }
    visited[root] = true;

    let builder = builders
        .entry(key_for(&records[root]))
        .or_insert_with(EntryBuilder::new);
    builder.add_own(&records[root]);

    let mut stack = vec![root];
    while let Some(i) = stack.pop() {
        if i != root {
            builder.add_descendant(&records[i]);
        }
        for &child in children[i].iter().rev() {
            if !visited[child] {
                visited[child] = true;
                stack.push(child);
            }
        }
    }
}

fn key_for(record: &Record) -> EntryKey {
    EntryKey::new(record.owner.as_str(), category_or_unknown(&record.category))
}

fn category_or_unknown(category: &str) -> &str {
    if category.trim().is_empty() {
        UNKNOWN_CATEGORY
    } else {
        category
    }
}

/// Negative, NaN and infinite costs count as zero
fn sanitize_cost(cost: f64) -> f64 {
    if cost.is_finite() && cost > 0.0 {
        cost
    } else {
        0.0
    }
}

/// Descending cost; ties broken by category then annotation for stable output
fn compare_descendants(a: &DescendantSummary, b: &DescendantSummary) -> Ordering {
    b.cost
        .total_cmp(&a.cost)
        .then_with(|| a.category.cmp(&b.category))
        .then_with(|| a.annotation.cmp(&b.annotation))
}

/// Strip every bracketed group and trailing whitespace
///
/// `indices:data/read/search[phase/query] [x]` -> `indices:data/read/search`
pub fn normalize_category(category: &str) -> String {
    let mut out = String::with_capacity(category.len());
    let mut depth = 0usize;

    for c in category.chars() {
        match c {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }

    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn task(id: &str, parent: Option<&str>, category: &str, cost: f64) -> Record {
        Record::new("N1", category, cost).with_task_id(id, parent.map(str::to_string))
    }

    #[test]
    fn test_flat_grouping_sums_costs() {
        let records = vec![Record::new("N1", "T", 5.0), Record::new("N1", "T", 10.0)];
        let table = aggregate(&records);

        assert_eq!(table.len(), 1);
        let entry = table.get("N1", "T").unwrap();
        assert_eq!(entry.cost, 15.0);
        assert_eq!(entry.count, 2);
        assert!(entry.descendants.is_empty());
    }

    #[test]
    fn test_root_child_grandchild() {
        let records = vec![
            task("R", None, "root", 5.0),
            task("C", Some("R"), "child", 10.0),
            task("G", Some("C"), "grandchild", 2.0),
        ];
        let table = aggregate(&records);

        assert_eq!(table.len(), 1);
        let entry = table.get("N1", "root").unwrap();
        assert_eq!(entry.cost, 17.0);
        assert_eq!(entry.count, 3);

        let names: Vec<&str> = entry.descendants.iter().map(|d| d.category.as_str()).collect();
        assert_eq!(names, vec!["child", "grandchild"]);
    }

    #[test]
    fn test_dangling_parent_is_root() {
        let records = vec![
            task("A", Some("missing"), "a", 1.0),
            task("B", Some("A"), "b", 2.0),
        ];
        let table = aggregate(&records);
        assert_eq!(table.get("N1", "a").unwrap().cost, 3.0);
    }

    #[test]
    fn test_cycle_terminates_and_counts_once() {
        let records = vec![
            task("A", Some("B"), "a", 1.0),
            task("B", Some("A"), "b", 2.0),
            task("S", Some("S"), "self", 4.0),
        ];
        let table = aggregate(&records);

        assert_eq!(table.total_count(), 3);
        assert_eq!(table.total_cost(), 7.0);
        // The self-parented task is its own root
        assert_eq!(table.get("N1", "self").unwrap().cost, 4.0);
    }

    #[test]
    fn test_descendants_merge_on_normalized_category() {
        let records = vec![
            task("R", None, "search", 1.0),
            task("C1", Some("R"), "shard[0]", 3.0),
            task("C2", Some("R"), "shard[1]", 4.0),
            task("C3", Some("R"), "other", 5.0),
        ];
        let table = aggregate(&records);
        let entry = table.get("N1", "search").unwrap();

        assert_eq!(entry.descendants.len(), 2);
        assert_eq!(entry.descendants[0].category, "shard[0]");
        assert_eq!(entry.descendants[0].cost, 7.0);
        assert_eq!(entry.descendants[1].category, "other");
    }

    #[test]
    fn test_missing_category_and_bad_cost() {
        let records = vec![Record::new("N1", "", f64::NAN), Record::new("N1", "  ", -1.0)];
        let table = aggregate(&records);

        let entry = table.get("N1", UNKNOWN_CATEGORY).unwrap();
        assert_eq!(entry.cost, 0.0);
        assert_eq!(entry.count, 2);
    }

    #[test]
    fn test_empty_batch() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(
            normalize_category("indices:data/read/search[phase/query]"),
            "indices:data/read/search"
        );
        assert_eq!(normalize_category("bulk[s] [p] "), "bulk");
        assert_eq!(normalize_category("a[b[c]]d"), "ad");
        assert_eq!(normalize_category("plain"), "plain");
    }
}
