//! ES Flame Graph
//!
//! Flame graphs from Elasticsearch hot threads reports and task list dumps.
//!
//! The pipeline runs one way:
//! - [`parser`] scans a dump into cost records
//! - [`aggregator`] folds records into a per-node, per-category table
//! - [`flamegraph`] colors and lays out the frames
//! - [`output`] renders SVG and writes JSON profiles
//!
//! The `es-flamegraph` binary wires these together; see [`commands`].

pub mod aggregator;
pub mod commands;
pub mod flamegraph;
pub mod output;
pub mod parser;
pub mod utils;
