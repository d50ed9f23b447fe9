//! Configuration and constants for the CLI and the flame graph pipeline.

/// Current JSON profile schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Canvas defaults (pixels)
pub const DEFAULT_WIDTH: usize = 1200;
pub const DEFAULT_FRAME_HEIGHT: usize = 16;
pub const DEFAULT_FONT_SIZE: usize = 12;
pub const DEFAULT_XPAD: usize = 10;
pub const FRAME_PAD: f64 = 1.0;

/// Average glyph width as a fraction of the font size
pub const FONT_WIDTH: f64 = 0.59;

/// Default minimum frame width, in pixels unless suffixed with `%`
pub const DEFAULT_MIN_WIDTH: &str = "0.1";

pub const DEFAULT_HOT_THREADS_TITLE: &str = "Elasticsearch Hot Threads";
pub const DEFAULT_TASKS_TITLE: &str = "Elasticsearch Tasks";

/// Label of the synthetic top-level frame
pub const ROOT_LABEL: &str = "all";

/// Category used for records that carry no category at all
pub const UNKNOWN_CATEGORY: &str = "unknown";

// Separator frames are always gray
pub const SEPARATOR_COLOR: (u8, u8, u8) = (200, 200, 200);
pub const DOUBLE_SEPARATOR_COLOR: (u8, u8, u8) = (160, 160, 160);

pub const NANOS_PER_MILLI: f64 = 1_000_000.0;
pub const MICROS_PER_MILLI: f64 = 1_000.0;

// Field names for task list parsing
pub const TASK_COST_FIELD: &str = "running_time_in_nanos";
pub const TASK_PARENT_FIELD: &str = "parent_task_id";
pub const TASK_NODES_FIELD: &str = "nodes";
