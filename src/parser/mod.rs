//! Input scanners and the record schema.
//!
//! This module handles:
//! - Scanning hot threads text reports
//! - Scanning task list JSON reports
//! - Detecting and splitting mixed dumps
//! - Defining the record schema consumed by aggregation

pub mod hot_threads;
pub mod mixed;
pub mod schema;
pub mod tasks;

// Re-export main types
pub use hot_threads::parse_hot_threads;
pub use mixed::{detect_format, parse_input, split_mixed, MixedInput};
pub use schema::{InputFormat, ParsedBatch, Record, TimeUnit};
pub use tasks::parse_tasks;
