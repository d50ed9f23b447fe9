//! SVG rendering and output writer.
//!
//! The renderer is a thin sink over a laid-out [`FlameGraph`]: every frame
//! already carries its coordinates and color, so this module only formats
//! markup, tooltips and labels.

use crate::flamegraph::{FlameGraph, FlamegraphConfig, Frame};
use crate::utils::config::FONT_WIDTH;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const SCRIPT: &str = r#"<script type="text/ecmascript"><![CDATA[
var details;
function init(evt) { details = document.getElementById("details").firstChild; }
function s(node) { details.nodeValue = node.getElementsByTagName("title")[0].firstChild.nodeValue; }
function c() { details.nodeValue = " "; }
]]></script>"#;

/// Text settings for the rendered document
#[derive(Debug, Clone, PartialEq)]
pub struct SvgOptions {
    pub title: String,

    /// Unit shown in tooltips, e.g. `ms`
    pub unit: String,

    pub font_size: f64,
    pub font_type: String,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self::from(&FlamegraphConfig::default())
    }
}

impl From<&FlamegraphConfig> for SvgOptions {
    fn from(config: &FlamegraphConfig) -> Self {
        Self {
            title: config.title.clone(),
            unit: config.unit.label().to_string(),
            font_size: config.font_size as f64,
            font_type: "Verdana".to_string(),
        }
    }
}

/// Render a frame graph as a standalone SVG document
///
/// **Public** - main entry point for SVG rendering
///
/// # Arguments
/// * `graph` - Laid-out frames and the canvas they were placed on
/// * `options` - Title, unit and font
///
/// # Returns
/// SVG markup; an empty graph still yields a valid document
pub fn render_svg(graph: &FlameGraph, options: &SvgOptions) -> String {
    let width = graph.canvas.width;
    let height = graph.image_height;
    let mut out = String::with_capacity(1024 + graph.frames.len() * 256);

    out.push_str(r#"<?xml version="1.0" standalone="no"?>"#);
    out.push('\n');
    out.push_str(
        r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">"#,
    );
    out.push('\n');
    let _ = writeln!(
        out,
        r#"<svg version="1.1" width="{w}" height="{h}" onload="init(evt)" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
        w = width,
        h = height
    );

    out.push_str(
        r##"<defs><linearGradient id="background" y1="0" y2="1" x1="0" x2="0"><stop stop-color="#eeeeee" offset="5%"/><stop stop-color="#eeeeb0" offset="95%"/></linearGradient></defs>"##,
    );
    out.push('\n');
    let _ = writeln!(
        out,
        r#"<style type="text/css">text {{ font-family:{}; font-size:{}px; fill:rgb(0,0,0); }} .func_g:hover {{ stroke:black; stroke-width:0.5; cursor:pointer; }}</style>"#,
        escape_xml(&options.font_type),
        options.font_size
    );
    out.push_str(SCRIPT);
    out.push('\n');

    let _ = writeln!(
        out,
        r#"<rect x="0" y="0" width="{}" height="{}" fill="url(#background)"/>"#,
        width, height
    );
    let _ = writeln!(
        out,
        r#"<text text-anchor="middle" x="{:.2}" y="{:.2}" font-size="{}">{}</text>"#,
        width / 2.0,
        options.font_size * 2.0,
        options.font_size + 5.0,
        escape_xml(&options.title)
    );
    let _ = writeln!(
        out,
        r#"<text id="details" text-anchor="start" x="{:.2}" y="{:.2}"> </text>"#,
        graph.canvas.xpad,
        height - graph.canvas.footer_pad / 2.0
    );

    for frame in &graph.frames {
        render_frame(&mut out, frame, options);
    }

    out.push_str("</svg>\n");
    debug!("Rendered {} frames into {} bytes", graph.frames.len(), out.len());
    out
}

fn render_frame(out: &mut String, frame: &Frame, options: &SvgOptions) {
    let _ = write!(
        out,
        r#"<g class="func_g" onmouseover="s(this)" onmouseout="c()"><title>{}</title>"#,
        escape_xml(&tooltip(frame, &options.unit))
    );
    let _ = write!(
        out,
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" rx="2" ry="2"/>"#,
        frame.x, frame.y, frame.width, frame.height, frame.color
    );
    if let Some(text) = fit_label(&frame.label, frame.width, options.font_size) {
        let _ = write!(
            out,
            r#"<text text-anchor="start" x="{:.2}" y="{:.2}">{}</text>"#,
            frame.x + 3.0,
            frame.y + frame.height - 4.5,
            escape_xml(&text)
        );
    }
    out.push_str("</g>\n");
}

/// Tooltip text: `label (value unit, pct%)`, plus the annotation if any
pub fn tooltip(frame: &Frame, unit: &str) -> String {
    let mut text = format!(
        "{} ({} {}, {:.2}%)",
        frame.label,
        format_thousands(frame.value),
        unit,
        frame.percentage
    );
    if let Some(annotation) = &frame.annotation {
        text.push_str(": ");
        text.push_str(annotation);
    }
    text
}

/// Label shortened with `..` to fit the frame, or `None` when under 3 chars fit
pub fn fit_label(label: &str, width: f64, font_size: f64) -> Option<String> {
    let fits = (width / (font_size * FONT_WIDTH)).max(0.0) as usize;
    if fits < 3 {
        return None;
    }

    let len = label.chars().count();
    if len <= fits {
        return Some(label.to_string());
    }
    let head: String = label.chars().take(fits - 2).collect();
    Some(format!("{}..", head))
}

/// `1234567.5` as `1,234,567.50`; whole numbers keep no decimals
pub fn format_thousands(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let whole = rounded.trunc();
    let digits = format!("{}", whole.abs() as u64);

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        grouped.insert(0, '-');
    }

    let fraction = (rounded - whole).abs();
    if fraction > 0.0 {
        let _ = write!(grouped, ".{:02}", (fraction * 100.0).round() as u64);
    }
    grouped
}

/// Escape the five XML special characters
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Write SVG content to a file
///
/// **Public** - main entry point for SVG output
///
/// # Arguments
/// * `svg_content` - SVG string from [`render_svg`]
/// * `output_path` - Path to output SVG file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::InvalidPath` - Path is invalid
pub fn write_svg(svg_content: &str, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing SVG to: {}", output_path.display());

    validate_path(output_path)?;
    create_parent_dirs(output_path)?;

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(svg_content.as_bytes())?;
    writer.flush()?;

    let file_size = svg_content.len();
    info!(
        "SVG written successfully ({} bytes, {:.2} KB)",
        file_size,
        file_size as f64 / 1024.0
    );

    Ok(())
}

/// Reject empty paths and existing directories
///
/// **Private** - shared by the SVG and JSON writers
pub(crate) fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

pub(crate) fn create_parent_dirs(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}
