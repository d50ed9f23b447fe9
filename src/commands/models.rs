use crate::flamegraph::FlamegraphConfig;
use std::path::PathBuf;

/// Arguments for the generate command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    /// Hot threads report, task list, or a dump holding both
    pub input: PathBuf,

    /// Output SVG path (or directory with `per_node`)
    pub output: PathBuf,

    /// Output path for the JSON profile (optional)
    pub output_json: Option<PathBuf>,

    /// Title override; defaults depend on the input format
    pub title: Option<String>,

    /// Flamegraph configuration
    pub flamegraph_config: FlamegraphConfig,

    /// One SVG per owner instead of one per input format
    pub per_node: bool,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for GenerateArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::from("flamegraph.svg"),
            output_json: None,
            title: None,
            flamegraph_config: FlamegraphConfig::default(),
            per_node: false,
            print_summary: false,
        }
    }
}
