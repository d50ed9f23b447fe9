//! Format detection and splitting of mixed dumps.
//!
//! Support bundles often concatenate one or more hot threads sections with a
//! task list document, optionally separated by a `tasks:` marker line.

use super::hot_threads::parse_hot_threads;
use super::schema::{InputFormat, ParsedBatch};
use super::tasks::parse_tasks;
use crate::utils::error::ParseError;
use log::debug;

/// The two halves of a mixed dump
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixedInput {
    pub hot_threads: Option<String>,
    pub tasks: Option<String>,
}

impl MixedInput {
    /// Number of `Hot threads at` reports in the hot threads half
    pub fn hot_threads_sections(&self) -> usize {
        self.hot_threads
            .as_deref()
            .map(|text| text.matches("Hot threads at").count())
            .unwrap_or(0)
    }
}

fn is_node_header(line: &str) -> bool {
    line.starts_with(":::") && line[3..].trim_start().starts_with('{')
}

fn is_tasks_marker(line: &str) -> bool {
    line.trim().starts_with("tasks:")
}

/// Split a dump into its hot threads text and its task list text
///
/// **Public** - used by format detection and the generate command
pub fn split_mixed(text: &str) -> MixedInput {
    let lines: Vec<&str> = text.lines().collect();

    // The task list starts at an explicit marker, or at the first JSON object
    // that follows hot threads content.
    let marker = lines.iter().position(|line| is_tasks_marker(line));
    let tasks_start = match marker {
        Some(idx) => lines[idx..]
            .iter()
            .position(|line| line.trim_start().starts_with('{'))
            .map(|offset| idx + offset),
        None => lines
            .iter()
            .position(|line| line.trim_start().starts_with('{')),
    };

    let hot_end = marker.or(tasks_start).unwrap_or(lines.len());
    let hot_start = lines[..hot_end].iter().position(|line| is_node_header(line));

    let hot_threads = hot_start.map(|start| lines[start..hot_end].join("\n"));
    let tasks = tasks_start.map(|start| lines[start..].join("\n"));

    debug!(
        "Split input: hot threads lines {:?}..{}, tasks from {:?}",
        hot_start, hot_end, tasks_start
    );

    MixedInput { hot_threads, tasks }
}

/// Detect which shape a dump has
///
/// # Errors
/// * `ParseError::DataFormat` - neither a node header nor a JSON object was found
pub fn detect_format(text: &str) -> Result<InputFormat, ParseError> {
    let split = split_mixed(text);
    match (split.hot_threads.is_some(), split.tasks.is_some()) {
        (true, true) => Ok(InputFormat::Mixed),
        (true, false) => Ok(InputFormat::HotThreads),
        (false, true) => Ok(InputFormat::Tasks),
        (false, false) => Err(ParseError::DataFormat(
            "input is neither a hot threads report nor a task list".to_string(),
        )),
    }
}

/// Detect the format and run the matching scanner(s)
///
/// Returns one batch per recognized half, hot threads first.
pub fn parse_input(text: &str) -> Result<Vec<ParsedBatch>, ParseError> {
    let split = split_mixed(text);
    let mut batches = Vec::new();

    if let Some(hot) = split.hot_threads.as_deref() {
        batches.push(parse_hot_threads(hot)?);
    }
    if let Some(tasks) = split.tasks.as_deref() {
        batches.push(parse_tasks(tasks)?);
    }

    if batches.is_empty() {
        return Err(ParseError::DataFormat(
            "input is neither a hot threads report nor a task list".to_string(),
        ));
    }

    Ok(batches)
}
