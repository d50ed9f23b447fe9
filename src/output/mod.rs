//! Output writers for profiles and flamegraphs.
//!
//! This module handles writing data to disk in two formats:
//! - JSON profiles
//! - SVG flamegraphs

pub mod json;
pub mod svg;

// Re-export main functions
pub use json::{read_profile, to_profile, write_profile, Profile, ProfileEntry};
pub use svg::{render_svg, write_svg, SvgOptions};
