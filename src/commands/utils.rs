use crate::output::read_profile;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use log::warn;
use std::path::Path;

/// Validate a profile JSON file
pub fn validate_profile_file(file_path: impl AsRef<Path>) -> Result<()> {
    let file_path = file_path.as_ref();
    println!("Validating profile: {}", file_path.display());

    let profile = read_profile(file_path)
        .with_context(|| format!("Not a valid profile: {}", file_path.display()))?;

    println!("✓ Valid profile JSON");
    println!("  Version: {}", profile.version);
    println!("  Input: {}", profile.input_format);
    println!("  Total: {:.2} {}", profile.total_cost, profile.unit);
    println!("  Nodes: {}", profile.node_count);
    println!("  Entries: {}", profile.entries.len());
    println!("  Generated: {}", profile.generated_at);

    if profile.version != SCHEMA_VERSION {
        warn!(
            "Profile schema v{} differs from current v{}",
            profile.version,
            SCHEMA_VERSION
        );
    }

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("ES Flame Graph v{}", env!("CARGO_PKG_VERSION"));
    println!("Profile Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Flame graphs from Elasticsearch hot threads and task list dumps.");
}
