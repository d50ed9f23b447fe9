//! Frame graph construction: aggregate, build the tree, color, lay out, filter.
//!
//! The tree always has three levels: a synthetic `all` root, one node per
//! owner, and one node per `(owner, category)` entry. The renderer gets the
//! surviving frames plus the canvas they were laid out on.

use super::color::{color_with_mode, gradient_color, HashMode, Rgb, Theme};
use super::layout::{filter_min_width, layout, Canvas, Frame, FrameTree, MinWidth, TreeNode};
use crate::aggregator::{aggregate, percentage_of, AggregateTable, AggregatedEntry};
use crate::parser::schema::{Record, TimeUnit};
use crate::utils::config::{
    DEFAULT_FONT_SIZE, DEFAULT_FRAME_HEIGHT, DEFAULT_HOT_THREADS_TITLE, DEFAULT_WIDTH,
    DEFAULT_XPAD, FRAME_PAD, ROOT_LABEL,
};
use crate::utils::error::FlamegraphError;
use log::{debug, info};

/// How frames are colored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Stable per-label color from the theme
    #[default]
    Hash,
    /// Share of the parent mapped onto a hot-to-cold gradient
    Gradient,
}

/// Flamegraph configuration
#[derive(Debug, Clone)]
pub struct FlamegraphConfig {
    pub title: String,
    pub width: usize,
    pub frame_height: usize,
    pub font_size: usize,
    pub xpad: usize,
    pub min_width: MinWidth,
    pub theme: Theme,
    pub color_mode: ColorMode,
    pub hash_mode: HashMode,

    /// Order owners and categories by descending value
    pub sort_by_value: bool,

    pub unit: TimeUnit,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_HOT_THREADS_TITLE.to_string(),
            width: DEFAULT_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            font_size: DEFAULT_FONT_SIZE,
            xpad: DEFAULT_XPAD,
            min_width: MinWidth::default(),
            theme: Theme::default(),
            color_mode: ColorMode::default(),
            hash_mode: HashMode::default(),
            sort_by_value: false,
            unit: TimeUnit::Millis,
        }
    }
}

impl FlamegraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_frame_height(mut self, frame_height: usize) -> Self {
        self.frame_height = frame_height;
        self
    }

    pub fn with_min_width(mut self, min_width: MinWidth) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_color_mode(mut self, color_mode: ColorMode) -> Self {
        self.color_mode = color_mode;
        self
    }

    pub fn with_hash_mode(mut self, hash_mode: HashMode) -> Self {
        self.hash_mode = hash_mode;
        self
    }

    pub fn with_sort_by_value(mut self, sort: bool) -> Self {
        self.sort_by_value = sort;
        self
    }

    pub fn with_unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Canvas derived from the pixel settings
    pub fn canvas(&self) -> Canvas {
        let font = self.font_size as f64;
        Canvas {
            width: self.width as f64,
            xpad: self.xpad as f64,
            frame_height: self.frame_height as f64,
            header_pad: font * 3.0,
            footer_pad: font * 2.0 + 10.0,
            frame_pad: FRAME_PAD,
        }
    }
}

/// Laid-out frames plus the geometry the renderer needs
#[derive(Debug, Clone)]
pub struct FlameGraph {
    pub frames: Vec<Frame>,
    pub canvas: Canvas,
    pub image_height: f64,
    pub max_depth: usize,

    /// Value of the synthetic root
    pub total: f64,
}

impl FlameGraph {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames at one depth, in left-to-right order
    pub fn frames_at(&self, depth: usize) -> impl Iterator<Item = &Frame> {
        self.frames.iter().filter(move |f| f.depth == depth)
    }
}

/// Build the frame graph for a record batch
///
/// **Public** - main entry point for frame graph construction
///
/// # Errors
/// * `FlamegraphError::InvalidCanvas` - pixel settings leave no drawable area
///
/// An empty batch yields an empty, valid graph.
pub fn build(
    records: &[Record],
    config: &FlamegraphConfig,
) -> Result<FlameGraph, FlamegraphError> {
    let table = aggregate(records);
    build_from_table(&table, config)
}

/// Build the frame graph for an already aggregated table
pub fn build_from_table(
    table: &AggregateTable,
    config: &FlamegraphConfig,
) -> Result<FlameGraph, FlamegraphError> {
    let canvas = config.canvas();
    canvas.validate()?;

    if table.is_empty() {
        info!("No entries to draw, producing an empty graph");
        return Ok(FlameGraph {
            frames: Vec::new(),
            canvas,
            image_height: canvas.image_height(0),
            max_depth: 0,
            total: 0.0,
        });
    }

    let mut tree = build_tree(table);
    if config.sort_by_value {
        tree.sort_by_value();
    }
    assign_colors(&mut tree, config);

    let total = tree.root.value;
    let laid_out = layout(&tree, total, &canvas);
    let frames = filter_min_width(laid_out.frames, config.min_width, canvas.drawable_width());

    info!(
        "Built {} frames for {} owners ({:.2} {} total)",
        frames.len(),
        tree.root.children.len(),
        total,
        config.unit
    );

    Ok(FlameGraph {
        frames,
        canvas,
        image_height: laid_out.image_height,
        max_depth: laid_out.max_depth,
        total,
    })
}

/// Two-level tree under a synthetic root whose value is the sum of owners
pub fn build_tree(table: &AggregateTable) -> FrameTree {
    let owners: Vec<TreeNode> = table
        .by_owner()
        .into_iter()
        .map(|(owner, entries)| {
            let mut node = TreeNode::new(owner, entries.iter().map(|e| e.cost).sum());
            node.count = entries.iter().map(|e| e.count).sum();
            node.with_children(entries.into_iter().map(category_node).collect())
        })
        .collect();

    let mut root = TreeNode::new(ROOT_LABEL, owners.iter().map(|o| o.value).sum());
    root.count = owners.iter().map(|o| o.count).sum();
    debug!("Tree has {} owners", owners.len());

    FrameTree::new(root.with_children(owners))
}

fn category_node(entry: &AggregatedEntry) -> TreeNode {
    let mut node = TreeNode::new(entry.category.as_str(), entry.cost);
    node.count = entry.count;
    node.annotation = describe_entry(entry);
    node
}

/// Tooltip text: the entry's own annotation plus its heaviest descendants
fn describe_entry(entry: &AggregatedEntry) -> Option<String> {
    const SHOWN: usize = 3;

    if entry.descendants.is_empty() {
        return entry.annotation.clone();
    }

    let children: Vec<String> = entry
        .descendants
        .iter()
        .take(SHOWN)
        .map(|d| format!("{} {:.1}%", d.category, percentage_of(d.cost, entry.cost)))
        .collect();
    let more = entry.descendants.len().saturating_sub(SHOWN);
    let mut text = format!("children: {}", children.join(", "));
    if more > 0 {
        text.push_str(&format!(" (+{} more)", more));
    }

    Some(match &entry.annotation {
        Some(annotation) => format!("{} | {}", annotation, text),
        None => text,
    })
}

/// Color every non-root node
pub fn assign_colors(tree: &mut FrameTree, config: &FlamegraphConfig) {
    let root_value = tree.root.value;
    tree.root.color = Rgb::WHITE;

    for owner in &mut tree.root.children {
        owner.color = match config.color_mode {
            ColorMode::Hash => color_with_mode(&owner.label, config.theme, config.hash_mode),
            ColorMode::Gradient if root_value > 0.0 => gradient_color(100.0),
            ColorMode::Gradient => gradient_color(0.0),
        };

        let owner_value = owner.value;
        for category in &mut owner.children {
            category.color = match config.color_mode {
                ColorMode::Hash => {
                    color_with_mode(&category.label, config.theme, config.hash_mode)
                }
                ColorMode::Gradient => {
                    gradient_color(percentage_of(category.value, owner_value))
                }
            };
        }
    }
}
