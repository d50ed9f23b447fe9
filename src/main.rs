//! ES Flame Graph CLI
//!
//! Turns Elasticsearch hot threads reports and task list dumps into
//! interactive SVG flame graphs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::warn;
use std::path::PathBuf;

use es_flame_graph::commands::{
    display_version, execute_generate, validate_args, validate_profile_file, GenerateArgs,
};
use es_flame_graph::flamegraph::{ColorMode, FlamegraphConfig, HashMode, MinWidth, Theme};
use es_flame_graph::utils::config::{DEFAULT_FRAME_HEIGHT, DEFAULT_MIN_WIDTH, DEFAULT_WIDTH};

/// ES Flame Graph - flame graphs for Elasticsearch diagnostics
#[derive(Parser, Debug)]
#[command(name = "es-flamegraph")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a flame graph from a hot threads or task list dump
    Generate {
        /// Input dump (hot threads text, task list JSON, or both)
        #[arg(short, long)]
        input: PathBuf,

        /// Output SVG path (a directory with --per-node)
        #[arg(short, long, default_value = "flamegraph.svg")]
        output: PathBuf,

        /// Flame graph title
        #[arg(long)]
        title: Option<String>,

        /// Image width in pixels
        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: usize,

        /// Frame height in pixels
        #[arg(long, default_value_t = DEFAULT_FRAME_HEIGHT)]
        height: usize,

        /// Omit frames narrower than this (pixels, or percent with a trailing %)
        #[arg(long, default_value = DEFAULT_MIN_WIDTH)]
        minwidth: MinWidth,

        /// Color theme (hot, java, mem, io, wakeup, chain, red, green, blue,
        /// yellow, purple, aqua, orange)
        #[arg(long, default_value = "hot", env = "ES_FLAMEGRAPH_COLOR")]
        color: String,

        /// Color frames by their share of the parent instead of by name
        #[arg(long)]
        color_by_share: bool,

        /// Similar names get similar hues
        #[arg(long)]
        consistent_hue: bool,

        /// Order nodes and categories by descending cost
        #[arg(long)]
        sort: bool,

        /// Write one flame graph per node
        #[arg(long)]
        per_node: bool,

        /// Also write the aggregated profile as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a profile JSON file
    Validate {
        /// Path to profile JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Generate {
            input,
            output,
            title,
            width,
            height,
            minwidth,
            color,
            color_by_share,
            consistent_hue,
            sort,
            per_node,
            json,
            summary,
        } => {
            let theme = Theme::parse(&color).unwrap_or_else(|| {
                warn!("Unknown color theme '{}', using hot", color);
                Theme::Hot
            });

            let fg_config = FlamegraphConfig::new()
                .with_width(width)
                .with_frame_height(height)
                .with_min_width(minwidth)
                .with_theme(theme)
                .with_color_mode(if color_by_share {
                    ColorMode::Gradient
                } else {
                    ColorMode::Hash
                })
                .with_hash_mode(if consistent_hue {
                    HashMode::Positional
                } else {
                    HashMode::Seeded
                })
                .with_sort_by_value(sort);

            let args = GenerateArgs {
                input,
                output,
                output_json: json,
                title,
                flamegraph_config: fg_config,
                per_node,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_generate(&args)?;
        }

        Commands::Validate { file } => {
            validate_profile_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
