//! Scanner for the task list JSON report.
//!
//! Accepted shapes:
//! - `{"nodes": {node_id: {"name": .., "tasks": {task_id: task}}}}` (default grouping)
//! - `{node_id: {"tasks": {..}}}` (the same without the `nodes` wrapper)
//! - `{"tasks": {task_id: task}}` where tasks may nest `children` (parent grouping)
//!
//! Several documents may be concatenated back to back. Every task becomes one
//! [`Record`] keyed by its task id; `parent_task_id` and nested `children`
//! produce the parent links used by hierarchical aggregation.

use super::schema::{InputFormat, ParsedBatch, Record, TimeUnit};
use crate::utils::config::{
    TASK_COST_FIELD, TASK_NODES_FIELD, TASK_PARENT_FIELD, UNKNOWN_CATEGORY,
};
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde_json::{Map, Value};

/// Parse one or more concatenated task list documents
///
/// **Public** - main entry point for task list input
///
/// # Errors
/// * `ParseError::DataFormat` - no JSON object could be read from the text
pub fn parse_tasks(text: &str) -> Result<ParsedBatch, ParseError> {
    let documents = read_documents(text)?;

    let mut records = Vec::new();
    for doc in &documents {
        collect_document(doc, &mut records);
    }

    debug!(
        "Parsed {} tasks from {} document(s)",
        records.len(),
        documents.len()
    );

    Ok(ParsedBatch::new(InputFormat::Tasks, records, TimeUnit::Nanos))
}

/// Read back-to-back JSON documents, keeping every object before the first error
fn read_documents(text: &str) -> Result<Vec<Map<String, Value>>, ParseError> {
    let mut documents = Vec::new();

    for item in serde_json::Deserializer::from_str(text.trim()).into_iter::<Value>() {
        match item {
            Ok(Value::Object(map)) => documents.push(map),
            Ok(other) => warn!("Ignoring non-object JSON document: {}", type_name(&other)),
            Err(e) if documents.is_empty() => {
                debug!("No JSON document could be read: {}", e);
                break;
            }
            Err(e) => {
                warn!("Ignoring trailing input after {} document(s): {}", documents.len(), e);
                break;
            }
        }
    }

    if documents.is_empty() {
        return Err(ParseError::DataFormat(
            "no task list JSON object found".to_string(),
        ));
    }

    Ok(documents)
}

fn collect_document(doc: &Map<String, Value>, records: &mut Vec<Record>) {
    if let Some(Value::Object(tasks)) = doc.get("tasks") {
        // Grouped by parents: no node wrapper, owner comes from each task
        for (task_id, task) in tasks {
            let owner = task
                .get("node")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| owner_from_task_id(task_id));
            collect_task(&owner, task_id, task, None, records);
        }
        return;
    }

    let nodes = match doc.get(TASK_NODES_FIELD) {
        Some(Value::Object(nodes)) => nodes,
        _ => doc,
    };

    for (node_id, node) in nodes {
        let Some(Value::Object(tasks)) = node.get("tasks") else {
            continue;
        };
        for (task_id, task) in tasks {
            collect_task(node_id, task_id, task, None, records);
        }
    }
}

/// Push the task and, recursively, its nested children
fn collect_task(
    owner: &str,
    task_id: &str,
    task: &Value,
    inherited_parent: Option<&str>,
    records: &mut Vec<Record>,
) {
    match task_record(owner, task_id, task, inherited_parent) {
        Ok(record) => records.push(record),
        Err(e) => {
            debug!("Skipping task {}: {}", task_id, e);
            return;
        }
    }

    let Some(Value::Array(children)) = task.get("children") else {
        return;
    };

    for child in children {
        let child_owner = child.get("node").and_then(Value::as_str).unwrap_or(owner);
        let child_id = match child.get("id") {
            Some(Value::Number(n)) => format!("{}:{}", child_owner, n),
            Some(Value::String(s)) => s.clone(),
            _ => {
                debug!("Skipping child of {} without id", task_id);
                continue;
            }
        };
        collect_task(child_owner, &child_id, child, Some(task_id), records);
    }
}

fn task_record(
    owner: &str,
    task_id: &str,
    task: &Value,
    inherited_parent: Option<&str>,
) -> Result<Record, ParseError> {
    let task = task
        .as_object()
        .ok_or_else(|| ParseError::MalformedRecord(format!("task is {}", type_name(task))))?;

    let action = task
        .get("action")
        .and_then(Value::as_str)
        .filter(|a| !a.is_empty())
        .unwrap_or(UNKNOWN_CATEGORY);

    let description = task
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let parent_id = task
        .get(TASK_PARENT_FIELD)
        .and_then(Value::as_str)
        .or(inherited_parent)
        .map(str::to_string);

    Ok(Record::new(owner, action, parse_cost(task.get(TASK_COST_FIELD)))
        .with_annotation(description)
        .with_task_id(task_id, parent_id))
}

/// Running time in nanoseconds; anything unreadable counts as zero
fn parse_cost(value: Option<&Value>) -> f64 {
    let cost = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };

    if cost.is_finite() && cost > 0.0 {
        cost
    } else {
        0.0
    }
}

/// `nodeA:42` -> `nodeA`
fn owner_from_task_id(task_id: &str) -> String {
    task_id
        .split_once(':')
        .map(|(node, _)| node)
        .unwrap_or(task_id)
        .to_string()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
