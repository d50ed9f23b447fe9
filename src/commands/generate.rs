//! Generate command implementation.
//!
//! The generate command:
//! 1. Reads the input dump
//! 2. Detects the format and scans records
//! 3. Aggregates records per owner and category
//! 4. Builds and lays out the frame graph
//! 5. Renders the SVG
//! 6. Writes output files

use super::models::GenerateArgs;
use crate::aggregator::{
    aggregate, calculate_cost_distribution, calculate_hot_entries, AggregateTable,
};
use crate::flamegraph::{build_from_table, generate_text_summary, FlamegraphConfig};
use crate::output::{render_svg, to_profile, write_profile, write_svg, SvgOptions};
use crate::parser::{parse_input, InputFormat, ParsedBatch};
use crate::utils::config::{DEFAULT_HOT_THREADS_TITLE, DEFAULT_TASKS_TITLE};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Execute the generate command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Generate command arguments
///
/// # Returns
/// Paths of the SVG files written; empty when the input held no records
///
/// # Errors
/// * Input file cannot be read
/// * Input matches neither supported format
/// * Invalid canvas settings
/// * File write errors
pub fn execute_generate(args: &GenerateArgs) -> Result<Vec<PathBuf>> {
    let start_time = Instant::now();

    // Step 1: Read input
    info!("Step 1/6: Reading {}...", args.input.display());
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read input file {}", args.input.display()))?;

    // Step 2: Scan records
    info!("Step 2/6: Scanning records...");
    let batches = parse_input(&text).context("Failed to scan input")?;
    let mixed = batches.len() > 1;

    for batch in &batches {
        debug!(
            "Scanned {} {} records from {} nodes ({:.2} {} total)",
            batch.records.len(),
            batch.format,
            batch.node_count(),
            batch.total,
            batch.unit
        );
        if let Some(interval) = batch.interval_ms {
            debug!("Hot threads sampling interval: {}ms", interval);
        }
    }

    if batches.iter().all(ParsedBatch::is_empty) {
        warn!("Input contains no records, nothing to draw");
        return Ok(Vec::new());
    }

    let mut written = Vec::new();
    for batch in batches.iter().filter(|b| !b.is_empty()) {
        let format_suffix = mixed.then(|| format_suffix(batch.format));
        written.extend(generate_batch(args, batch, format_suffix)?);
    }

    let elapsed = start_time.elapsed();
    info!(
        "Generated {} flamegraph(s) in {:.2}s",
        written.len(),
        elapsed.as_secs_f64()
    );

    Ok(written)
}

/// Steps 3-6 for one scanned batch
///
/// **Private** - internal helper for execute_generate
fn generate_batch(
    args: &GenerateArgs,
    batch: &ParsedBatch,
    format_suffix: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let title = args
        .title
        .clone()
        .unwrap_or_else(|| default_title(batch.format).to_string());
    let config = args
        .flamegraph_config
        .clone()
        .with_title(title)
        .with_unit(batch.unit);

    // Step 3: Aggregate
    info!(
        "Step 3/6: Aggregating {} {} records...",
        batch.records.len(),
        batch.format
    );
    let table = aggregate(&batch.records);

    let distribution = calculate_cost_distribution(&table);
    info!("Cost distribution: {}", distribution.summary(batch.unit.label()));
    if distribution.is_highly_concentrated() {
        info!(
            "Top 10% of entries hold {:.1}% of the cost",
            distribution.top_10_percent_percentage
        );
    }
    for (i, entry) in calculate_hot_entries(&table, table.total_cost(), 3).iter().enumerate() {
        debug!(
            "  {}. {} / {}: {:.2} {} ({:.1}%)",
            i + 1,
            entry.owner,
            entry.category,
            entry.cost,
            batch.unit,
            entry.percentage
        );
    }

    // Steps 4 and 5: Build and render
    let mut written = Vec::new();

    if args.per_node {
        for (owner, node_batch) in batch.split_by_owner() {
            let node_config = config
                .clone()
                .with_title(format!("{} - {}", config.title, owner));
            let name = match format_suffix {
                Some(suffix) => format!("{}_{}", suffix, owner),
                None => owner.clone(),
            };
            let path = per_node_path(&args.output, &name);
            render_to(&aggregate(&node_batch.records), &node_config, &path)?;
            written.push(path);
        }
    } else {
        let svg_path = match format_suffix {
            Some(suffix) => suffixed(&args.output, suffix),
            None => args.output.clone(),
        };
        render_to(&table, &config, &svg_path)?;
        written.push(svg_path);
    }

    // Step 6: Profile and summary
    if let Some(json_path) = &args.output_json {
        info!("Step 6/6: Writing profile...");
        let json_path = match format_suffix {
            Some(suffix) => suffixed(json_path, suffix),
            None => json_path.clone(),
        };
        write_profile(&to_profile(batch, &table), &json_path)
            .context("Failed to write profile JSON")?;
        info!("✓ Profile written to: {}", json_path.display());
    } else {
        info!("Step 6/6: Skipping profile (not requested)");
    }

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("{}", config.title.to_uppercase());
        println!("{}", "=".repeat(80));
        println!("Format:  {}", batch.format);
        println!("Nodes:   {}", batch.node_count());
        println!("Records: {}", batch.records.len());
        println!("Total:   {:.2} {}", table.total_cost(), batch.unit);
        println!(
            "\n{}",
            generate_text_summary(&table, batch.unit, config.theme, 10)
        );
        println!("{}", "=".repeat(80));
    }

    Ok(written)
}

fn render_to(
    table: &AggregateTable,
    config: &FlamegraphConfig,
    path: &Path,
) -> Result<()> {
    info!("Step 4/6: Building frame graph for '{}'...", config.title);
    let graph = build_from_table(table, config).context("Failed to build frame graph")?;

    info!("Step 5/6: Rendering {} frames...", graph.frames.len());
    let svg = render_svg(&graph, &SvgOptions::from(config));
    write_svg(&svg, path).context("Failed to write flamegraph SVG")?;

    info!("✓ Flamegraph written to: {}", path.display());
    Ok(())
}

fn default_title(format: InputFormat) -> &'static str {
    match format {
        InputFormat::Tasks => DEFAULT_TASKS_TITLE,
        InputFormat::HotThreads | InputFormat::Mixed => DEFAULT_HOT_THREADS_TITLE,
    }
}

fn format_suffix(format: InputFormat) -> &'static str {
    match format {
        InputFormat::HotThreads => "hot_threads",
        InputFormat::Tasks => "tasks",
        InputFormat::Mixed => "mixed",
    }
}

/// `dir/out.svg` + `tasks` -> `dir/out_tasks.svg`
pub fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "flamegraph".to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "svg".to_string());

    path.with_file_name(format!("{}_{}.{}", stem, suffix, ext))
}

/// Per-owner SVG path: inside `output` when it is a directory (or has no
/// extension), else `<stem>_<owner>.svg` next to it
pub fn per_node_path(output: &Path, owner: &str) -> PathBuf {
    let owner = sanitize_file_name(owner);
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.svg", owner))
    } else {
        suffixed(output, &owner)
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Validate generate arguments
///
/// **Public** - can be called before execute_generate for early validation
pub fn validate_args(args: &GenerateArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    if !args.input.is_file() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    if args.output.as_os_str().is_empty() {
        anyhow::bail!("Output path cannot be empty");
    }

    if !args.per_node && args.output.is_dir() {
        anyhow::bail!(
            "Output is a directory (use --per-node to write one file per node): {}",
            args.output.display()
        );
    }

    args.flamegraph_config
        .canvas()
        .validate()
        .context("Invalid flamegraph dimensions")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn input_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"nodes\":{{}}}}").unwrap();
        file
    }

    #[test]
    fn test_validate_args_valid() {
        let input = input_file();
        let args = GenerateArgs {
            input: input.path().to_path_buf(),
            ..Default::default()
        };

        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_missing_input() {
        let args = GenerateArgs {
            input: PathBuf::from("/definitely/not/here.txt"),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_empty_input() {
        assert!(validate_args(&GenerateArgs::default()).is_err());
    }

    #[test]
    fn test_validate_args_output_directory() {
        let input = input_file();
        let dir = tempfile::tempdir().unwrap();
        let args = GenerateArgs {
            input: input.path().to_path_buf(),
            output: dir.path().to_path_buf(),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
        assert!(validate_args(&GenerateArgs {
            per_node: true,
            ..args
        })
        .is_ok());
    }

    #[test]
    fn test_validate_args_bad_canvas() {
        let input = input_file();
        let args = GenerateArgs {
            input: input.path().to_path_buf(),
            flamegraph_config: FlamegraphConfig::new().with_width(20),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_suffixed() {
        assert_eq!(
            suffixed(Path::new("out/graph.svg"), "tasks"),
            PathBuf::from("out/graph_tasks.svg")
        );
        assert_eq!(
            suffixed(Path::new("profile.json"), "hot_threads"),
            PathBuf::from("profile_hot_threads.json")
        );
    }

    #[test]
    fn test_per_node_path() {
        assert_eq!(
            per_node_path(Path::new("graphs"), "node:1/a"),
            PathBuf::from("graphs/node_1_a.svg")
        );
        assert_eq!(
            per_node_path(Path::new("out.svg"), "n1"),
            PathBuf::from("out_n1.svg")
        );
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        let input = input_file();
        let dir = tempfile::tempdir().unwrap();
        let args = GenerateArgs {
            input: input.path().to_path_buf(),
            output: dir.path().join("out.svg"),
            ..Default::default()
        };

        let written = execute_generate(&args).unwrap();
        assert!(written.is_empty());
        assert!(!dir.path().join("out.svg").exists());
    }
}
