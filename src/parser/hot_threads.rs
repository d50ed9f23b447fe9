//! Scanner for the hot threads text report.
//!
//! A report is a sequence of node sections:
//!
//! ```text
//! ::: {abc123}{node-1}{Xy12}{10.0.0.1}{10.0.0.1:9300}
//!    Hot threads at 2026-01-18T08:42:32.186Z, interval=500ms, busiestThreads=3:
//!
//!     1.0% (5.0ms out of 500ms) cpu usage by thread 'elasticsearch[node-1][search][T#3]'
//!      10/10 snapshots sharing following 2 elements
//!        java.base@11.0.25/java.lang.Thread.run(Thread.java:829)
//! ```
//!
//! Every thread block becomes one [`Record`] owned by the node id, with the
//! CPU time in milliseconds as its cost.

use super::schema::{InputFormat, ParsedBatch, Record, TimeUnit};
use crate::utils::config::MICROS_PER_MILLI;
use crate::utils::error::ParseError;
use log::{debug, warn};
use regex::Regex;
use std::sync::LazyLock;

static NODE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:::\s+\{([^}]+)\}\{([^}]+)\}\{[^}]+\}\{([^}]+)\}").expect("valid regex")
});

static REPORT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Hot threads at ([\dT:.\-]+Z),\s+interval=(\d+)ms,").expect("valid regex")
});

static CPU_USAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([\d.]+)%\s+\(([\d.]+)(micros|ms)\s+out of (\d+)ms\)\s+cpu usage by thread '([^']+)'",
    )
    .expect("valid regex")
});

static SNAPSHOTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)/(\d+) snapshots sharing following \d+ elements").expect("valid regex")
});

/// Node identity taken from a `:::` header line
#[derive(Debug, Clone)]
struct NodeHeader {
    id: String,
    name: String,
    host: String,
}

/// Parse a hot threads report into records
///
/// **Public** - main entry point for hot threads input
///
/// # Errors
/// * `ParseError::DataFormat` - no node header anywhere in the text
pub fn parse_hot_threads(text: &str) -> Result<ParsedBatch, ParseError> {
    let mut records = Vec::new();
    let mut node: Option<NodeHeader> = None;
    let mut interval_ms: Option<f64> = None;
    let mut block: Vec<&str> = Vec::new();
    let mut saw_header = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some(caps) = NODE_HEADER.captures(line) {
            flush_block(&mut block, node.as_ref(), &mut records);
            saw_header = true;
            node = Some(NodeHeader {
                id: caps[1].to_string(),
                name: caps[2].to_string(),
                host: caps[3].to_string(),
            });
            debug!("Hot threads section for node {:?}", node);
            continue;
        }

        if let Some(caps) = REPORT_HEADER.captures(line) {
            interval_ms = caps[2].parse().ok();
            continue;
        }

        if CPU_USAGE.is_match(trimmed) {
            flush_block(&mut block, node.as_ref(), &mut records);
            block.push(trimmed);
        } else if !block.is_empty() {
            if trimmed.is_empty() {
                flush_block(&mut block, node.as_ref(), &mut records);
            } else {
                block.push(trimmed);
            }
        }
    }
    flush_block(&mut block, node.as_ref(), &mut records);

    if !saw_header {
        return Err(ParseError::DataFormat(
            "no hot threads node header (':::') found".to_string(),
        ));
    }

    debug!("Parsed {} hot threads", records.len());

    let mut batch = ParsedBatch::new(InputFormat::HotThreads, records, TimeUnit::Millis);
    batch.interval_ms = interval_ms;
    Ok(batch)
}

/// Turn the collected block into a record, skipping it if malformed
fn flush_block(block: &mut Vec<&str>, node: Option<&NodeHeader>, records: &mut Vec<Record>) {
    if block.is_empty() {
        return;
    }

    match node {
        Some(node) => match parse_thread_block(block, node) {
            Ok(record) => records.push(record),
            Err(e) => debug!("Skipping thread block: {}", e),
        },
        None => warn!("Thread block outside of a node section, skipping"),
    }

    block.clear();
}

/// Parse one thread block (CPU line, snapshots line, stack frames)
fn parse_thread_block(lines: &[&str], node: &NodeHeader) -> Result<Record, ParseError> {
    let first = lines.first().copied().unwrap_or_default();
    let caps = CPU_USAGE
        .captures(first)
        .ok_or_else(|| ParseError::MalformedRecord(format!("not a cpu usage line: {}", first)))?;

    let cpu_time: f64 = caps[2].parse().unwrap_or(0.0);
    let cpu_time_ms = match &caps[3] {
        "micros" => cpu_time / MICROS_PER_MILLI,
        _ => cpu_time,
    };
    let thread_name = caps[5].to_string();

    // Line two is always the snapshots line, e.g. `unique snapshot` for single samples
    let count = lines
        .get(1)
        .and_then(|line| SNAPSHOTS.captures(line))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(1);

    let frames: Vec<String> = lines
        .get(2..)
        .unwrap_or_default()
        .iter()
        .filter(|line| !line.is_empty() && !line.starts_with('['))
        .map(|line| strip_module_prefix(line).to_string())
        .collect();

    // Frames are listed innermost first
    let leaf = frames.first().ok_or_else(|| {
        ParseError::MalformedRecord(format!(
            "thread '{}' on {} ({}) has no stack frames",
            thread_name, node.name, node.host
        ))
    })?;

    Ok(Record::new(node.id.as_str(), thread_name, cpu_time_ms)
        .with_count(count)
        .with_annotation(leaf.as_str()))
}

/// `java.base@11.0.25/java.lang.Thread.run` -> `java.lang.Thread.run`
fn strip_module_prefix(frame: &str) -> &str {
    frame
        .split_once('@')
        .and_then(|(_, rest)| rest.split_once('/'))
        .map(|(_, tail)| tail)
        .unwrap_or(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
::: {abc123}{node_name}{hash123}{10.0.0.1}{10.0.0.1:9300}{dir}{attr=value}
   Hot threads at 2026-01-18T08:42:32.186Z, interval=500ms, busiestThreads=3, ignoreIdleThreads=true:

    1.0% (5.0ms out of 500ms) cpu usage by thread 'test-thread'
     10/10 snapshots sharing following 2 elements
       java.base@11.0.25/java.lang.Thread.sleep(Native Method)
       java.base@11.0.25/java.lang.Thread.run(Thread.java:829)

    0.0% (141.2micros out of 500ms) cpu usage by thread 'other-thread'
     3/10 snapshots sharing following 1 elements
       org.elasticsearch.Foo.bar(Foo.java:1)
";

    #[test]
    fn test_parse_sample() {
        let batch = parse_hot_threads(SAMPLE).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.interval_ms, Some(500.0));

        let first = &batch.records[0];
        assert_eq!(first.owner, "abc123");
        assert_eq!(first.category, "test-thread");
        assert_eq!(first.cost, 5.0);
        assert_eq!(first.count, 10);
        assert_eq!(
            first.annotation.as_deref(),
            Some("java.lang.Thread.sleep(Native Method)")
        );

        let second = &batch.records[1];
        assert!((second.cost - 0.1412).abs() < 1e-9);
        assert_eq!(second.count, 3);
        assert!((batch.total - 5.1412).abs() < 1e-9);
    }

    #[test]
    fn test_block_without_frames_is_skipped() {
        let text = "
::: {n1}{node}{x}{10.0.0.2}
    1.0% (5.0ms out of 500ms) cpu usage by thread 'lonely'
     10/10 snapshots sharing following 0 elements

";
        let batch = parse_hot_threads(text).unwrap();
        assert!(batch.records.is_empty());
    }

    #[test]
    fn test_unique_snapshot_line_is_not_a_frame() {
        let text = "
::: {n1}{node}{x}{10.0.0.2}
    2.5% (12.5ms out of 500ms) cpu usage by thread 'single'
     unique snapshot
       java.base@17/java.lang.Thread.run(Thread.java:1)
";
        let batch = parse_hot_threads(text).unwrap();
        assert_eq!(batch.records.len(), 1);

        let record = &batch.records[0];
        assert_eq!(record.count, 1);
        assert_eq!(
            record.annotation.as_deref(),
            Some("java.lang.Thread.run(Thread.java:1)")
        );
    }

    #[test]
    fn test_missing_header_is_data_format_error() {
        let result = parse_hot_threads("this is not a report");
        assert!(matches!(result, Err(ParseError::DataFormat(_))));
    }

    #[test]
    fn test_strip_module_prefix() {
        assert_eq!(
            strip_module_prefix("java.base@11.0.25/jdk.internal.misc.Unsafe.park"),
            "jdk.internal.misc.Unsafe.park"
        );
        assert_eq!(strip_module_prefix("plain.Frame"), "plain.Frame");
    }
}
