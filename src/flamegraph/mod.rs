//! Flame graph construction: colors, layout and the frame graph builder.
//!
//! Aggregated entries become a three-level tree (root, owner, category)
//! which is colored, laid out on a canvas and filtered by minimum width.

pub mod builder;
pub mod color;
pub mod layout;
pub mod summary;

// Re-export main types
pub use builder::{build, build_from_table, ColorMode, FlameGraph, FlamegraphConfig};
pub use color::{color_for, color_for_name, color_with_mode, gradient_color, HashMode, Rgb, Theme};
pub use layout::{filter_min_width, layout, Canvas, Frame, FrameTree, LaidOut, MinWidth, TreeNode};
pub use summary::generate_text_summary;
