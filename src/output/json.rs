//! JSON profile output writer.
//!
//! A profile is the aggregated table of one batch, serialized with the
//! batch header so it can be inspected or validated later without the
//! source dump.

use super::svg::{create_parent_dirs, validate_path};
use crate::aggregator::{percentage_of, AggregateTable, AggregatedEntry, DescendantSummary};
use crate::parser::schema::{InputFormat, ParsedBatch, TimeUnit};
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Serialized summary of one aggregated batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile schema version
    pub version: String,

    pub input_format: InputFormat,
    pub unit: TimeUnit,
    pub total_cost: f64,

    /// Distinct owners in the batch
    pub node_count: usize,

    /// Entries by descending cost
    pub entries: Vec<ProfileEntry>,

    /// RFC 3339 timestamp
    pub generated_at: String,
}

/// One `(owner, category)` entry of a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub owner: String,
    pub category: String,
    pub cost: f64,
    pub count: u64,

    /// Share of the profile total, in percent
    pub percentage: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descendants: Vec<DescendantSummary>,
}

impl ProfileEntry {
    fn from_entry(entry: &AggregatedEntry, total: f64) -> Self {
        Self {
            owner: entry.owner.clone(),
            category: entry.category.clone(),
            cost: entry.cost,
            count: entry.count,
            percentage: percentage_of(entry.cost, total),
            annotation: entry.annotation.clone(),
            descendants: entry.descendants.clone(),
        }
    }
}

/// Build a profile from a batch and its aggregated table
///
/// **Public** - called by the generate command before writing
pub fn to_profile(batch: &ParsedBatch, table: &AggregateTable) -> Profile {
    let total = table.total_cost();
    let mut entries: Vec<ProfileEntry> = table
        .iter()
        .map(|entry| ProfileEntry::from_entry(entry, total))
        .collect();
    entries.sort_by(|a, b| b.cost.total_cmp(&a.cost));

    Profile {
        version: SCHEMA_VERSION.to_string(),
        input_format: batch.format,
        unit: batch.unit,
        total_cost: total,
        node_count: batch.node_count(),
        entries,
        generated_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Write a profile to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `profile` - Profile data to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_profile(profile: &Profile, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing profile to: {}", output_path.display());

    validate_path(output_path)?;
    create_parent_dirs(output_path)?;

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, profile)?;
    writer.flush()?;

    info!(
        "Profile written successfully ({} entries, {} bytes)",
        profile.entries.len(),
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a profile from a JSON file
///
/// **Public** - used by the validate command and tests
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_profile(input_path: impl AsRef<Path>) -> Result<Profile, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading profile from: {}", input_path.display());

    let file = File::open(input_path)?;
    let profile: Profile = serde_json::from_reader(BufReader::new(file))?;

    debug!(
        "Profile loaded: version {}, {} entries",
        profile.version,
        profile.entries.len()
    );

    Ok(profile)
}
