//! Proportional layout of a weighted tree into frame rectangles.
//!
//! Siblings are packed left to right inside their parent's span, each taking
//! a width proportional to its share of the parent's value. Rows are fixed
//! height bands chosen by depth, deeper rows drawn higher, so the synthetic
//! root sits at the bottom of the graph.

use super::color::Rgb;
use crate::utils::error::FlamegraphError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Node of the weighted tree handed to the layout
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub label: String,
    pub value: f64,
    pub count: u64,
    pub color: Rgb,
    pub annotation: Option<String>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
            count: 0,
            color: Rgb::WHITE,
            annotation: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children;
        self
    }

    fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.max_depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Sort children (recursively) by value, largest first, then by label
    fn sort_by_value(&mut self) {
        self.children.sort_by(|a, b| {
            b.value
                .total_cmp(&a.value)
                .then_with(|| a.label.cmp(&b.label))
        });
        for child in &mut self.children {
            child.sort_by_value();
        }
    }
}

/// Synthetic root over owners over categories
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTree {
    pub root: TreeNode,
}

impl FrameTree {
    pub fn new(root: TreeNode) -> Self {
        Self { root }
    }

    /// Order every level by descending value instead of insertion order
    pub fn sort_by_value(&mut self) {
        self.root.sort_by_value();
    }

    /// Depth of the deepest node (0 for a lone root)
    pub fn max_depth(&self) -> usize {
        self.root.max_depth()
    }
}

/// Pixel geometry of the drawing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub xpad: f64,
    pub frame_height: f64,

    /// Space above the frames (title)
    pub header_pad: f64,

    /// Space below the frames (details line)
    pub footer_pad: f64,

    /// Gap between stacked rows
    pub frame_pad: f64,
}

impl Canvas {
    /// Width available to frames
    pub fn drawable_width(&self) -> f64 {
        (self.width - 2.0 * self.xpad).max(0.0)
    }

    /// Full document height for a tree of the given depth
    pub fn image_height(&self, max_depth: usize) -> f64 {
        (max_depth + 1) as f64 * self.frame_height + self.header_pad + self.footer_pad
    }

    pub fn validate(&self) -> Result<(), FlamegraphError> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(FlamegraphError::InvalidCanvas(format!(
                "width must be positive, got {}",
                self.width
            )));
        }
        if self.drawable_width() <= 0.0 {
            return Err(FlamegraphError::InvalidCanvas(format!(
                "width {} leaves no room inside padding {}",
                self.width, self.xpad
            )));
        }
        if !(self.frame_height > self.frame_pad && self.frame_pad >= 0.0) {
            return Err(FlamegraphError::InvalidCanvas(format!(
                "frame height {} must exceed frame padding {}",
                self.frame_height, self.frame_pad
            )));
        }
        Ok(())
    }
}

/// A laid-out, colored rectangle ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Position in layout order; stable across filtering
    pub id: usize,

    /// `id` of the parent frame
    pub parent: Option<usize>,

    pub label: String,

    /// 0 = synthetic root, 1 = owner, 2 = category
    pub depth: usize,

    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    pub value: f64,
    pub count: u64,

    /// Share of the parent's value, in percent
    pub percentage: f64,

    pub color: Rgb,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// Output of [`layout`]
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOut {
    pub frames: Vec<Frame>,
    pub max_depth: usize,
    pub image_height: f64,
}

/// `part / whole`, or zero when `whole` is not positive
fn share(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole
    } else {
        0.0
    }
}

/// Assign every node a rectangle
///
/// **Public** - main entry point for layout
///
/// # Arguments
/// * `tree` - Weighted tree; children are placed in the order given
/// * `total` - Value that spans the full drawable width
/// * `canvas` - Pixel geometry
///
/// # Returns
/// Frames in pre-order (parents before children, siblings left to right)
pub fn layout(tree: &FrameTree, total: f64, canvas: &Canvas) -> LaidOut {
    let max_depth = tree.max_depth();
    let image_height = canvas.image_height(max_depth);
    let root_width = share(tree.root.value, total) * canvas.drawable_width();

    let mut placer = Placer {
        canvas,
        image_height,
        frames: Vec::new(),
    };
    placer.place(&tree.root, 0, canvas.xpad, root_width, None, total);

    debug!(
        "Laid out {} frames, depth {}, height {}",
        placer.frames.len(),
        max_depth,
        image_height
    );

    LaidOut {
        frames: placer.frames,
        max_depth,
        image_height,
    }
}

struct Placer<'a> {
    canvas: &'a Canvas,
    image_height: f64,
    frames: Vec<Frame>,
}

impl Placer<'_> {
    fn place(
        &mut self,
        node: &TreeNode,
        depth: usize,
        x: f64,
        width: f64,
        parent: Option<usize>,
        parent_value: f64,
    ) {
        // Owners always report their full share of themselves
        let percentage = match depth {
            1 if parent_value > 0.0 => 100.0,
            _ => share(node.value, parent_value) * 100.0,
        };

        let id = self.frames.len();
        let row_top = self.image_height
            - self.canvas.footer_pad
            - (depth + 1) as f64 * self.canvas.frame_height;

        self.frames.push(Frame {
            id,
            parent,
            label: node.label.clone(),
            depth,
            x,
            y: row_top + self.canvas.frame_pad,
            width,
            height: self.canvas.frame_height - self.canvas.frame_pad,
            value: node.value,
            count: node.count,
            percentage,
            color: node.color,
            annotation: node.annotation.clone(),
        });

        let mut cursor = x;
        for child in &node.children {
            let child_width = share(child.value, node.value) * width;
            self.place(child, depth + 1, cursor, child_width, Some(id), node.value);
            cursor += child_width;
        }
    }
}

/// Minimum frame width, absolute or relative to the drawable width
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MinWidth {
    Pixels(f64),
    Percent(f64),
}

impl Default for MinWidth {
    fn default() -> Self {
        MinWidth::Pixels(0.1)
    }
}

impl MinWidth {
    /// Width in pixels below which frames are dropped
    pub fn threshold(&self, drawable_width: f64) -> f64 {
        match *self {
            MinWidth::Pixels(px) => px,
            MinWidth::Percent(pct) => drawable_width * pct / 100.0,
        }
    }
}

impl FromStr for MinWidth {
    type Err = FlamegraphError;

    /// `"0.1"` is pixels, `"0.5%"` is percent
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (number, percent) = match s.strip_suffix('%') {
            Some(number) => (number.trim(), true),
            None => (s, false),
        };

        let value: f64 = number
            .parse()
            .map_err(|_| FlamegraphError::InvalidMinWidth(s.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(FlamegraphError::InvalidMinWidth(s.to_string()));
        }

        Ok(if percent {
            MinWidth::Percent(value)
        } else {
            MinWidth::Pixels(value)
        })
    }
}

/// Drop frames narrower than the threshold; kept frames are untouched
pub fn filter_min_width(
    frames: Vec<Frame>,
    min_width: MinWidth,
    drawable_width: f64,
) -> Vec<Frame> {
    let threshold = min_width.threshold(drawable_width);
    let before = frames.len();

    let kept: Vec<Frame> = frames
        .into_iter()
        .filter(|frame| frame.width.partial_cmp(&threshold) != Some(Ordering::Less))
        .collect();

    debug!(
        "Min width {:.3}px kept {} of {} frames",
        threshold,
        kept.len(),
        before
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canvas() -> Canvas {
        Canvas {
            width: 1020.0,
            xpad: 10.0,
            frame_height: 16.0,
            header_pad: 36.0,
            footer_pad: 34.0,
            frame_pad: 1.0,
        }
    }

    fn tree() -> FrameTree {
        FrameTree::new(TreeNode::new("all", 100.0).with_children(vec![
            TreeNode::new("n1", 75.0).with_children(vec![
                TreeNode::new("search", 50.0),
                TreeNode::new("bulk", 25.0),
            ]),
            TreeNode::new("n2", 25.0).with_children(vec![TreeNode::new("search", 25.0)]),
        ]))
    }

    #[test]
    fn test_proportional_widths() {
        let out = layout(&tree(), 100.0, &canvas());
        let widths: Vec<(&str, f64, f64)> = out
            .frames
            .iter()
            .map(|f| (f.label.as_str(), f.x, f.width))
            .collect();

        assert_eq!(
            widths,
            vec![
                ("all", 10.0, 1000.0),
                ("n1", 10.0, 750.0),
                ("search", 10.0, 500.0),
                ("bulk", 510.0, 250.0),
                ("n2", 760.0, 250.0),
                ("search", 760.0, 250.0),
            ]
        );
    }

    #[test]
    fn test_rows_and_percentages() {
        let out = layout(&tree(), 100.0, &canvas());
        assert_eq!(out.max_depth, 2);
        assert_eq!(out.image_height, 3.0 * 16.0 + 36.0 + 34.0);

        let root = &out.frames[0];
        let owner = &out.frames[1];
        let category = &out.frames[3];
        assert!(category.y < owner.y && owner.y < root.y);
        assert_eq!(owner.y - category.y, 16.0);
        assert_eq!(root.height, 15.0);

        assert_eq!(root.percentage, 100.0);
        assert_eq!(owner.percentage, 100.0);
        assert!((category.percentage - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(category.parent, Some(owner.id));
    }

    #[test]
    fn test_zero_total() {
        let zero = FrameTree::new(
            TreeNode::new("all", 0.0)
                .with_children(vec![TreeNode::new("n1", 0.0)
                    .with_children(vec![TreeNode::new("t", 0.0)])]),
        );
        let out = layout(&zero, 0.0, &canvas());

        assert_eq!(out.frames.len(), 3);
        for frame in &out.frames {
            assert_eq!(frame.percentage, 0.0);
            assert_eq!(frame.width, 0.0);
        }
    }

    #[test]
    fn test_sort_by_value() {
        let mut t = FrameTree::new(TreeNode::new("all", 3.0).with_children(vec![
            TreeNode::new("b", 1.0),
            TreeNode::new("c", 2.0),
            TreeNode::new("a", 1.0),
        ]));
        t.sort_by_value();
        let labels: Vec<&str> = t.root.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_min_width_parse() {
        assert_eq!("0.1".parse::<MinWidth>().unwrap(), MinWidth::Pixels(0.1));
        assert_eq!("0.5%".parse::<MinWidth>().unwrap(), MinWidth::Percent(0.5));
        assert!("abc".parse::<MinWidth>().is_err());
        assert!("-1".parse::<MinWidth>().is_err());
    }

    #[test]
    fn test_filter_keeps_positions() {
        let out = layout(&tree(), 100.0, &canvas());
        let kept = filter_min_width(out.frames.clone(), MinWidth::Percent(30.0), 1000.0);

        // 250px frames fall below 300px
        let labels: Vec<&str> = kept.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["all", "n1", "search"]);
        for frame in &kept {
            assert_eq!(frame, &out.frames[frame.id]);
        }

        let exact = filter_min_width(out.frames, MinWidth::Pixels(250.0), 1000.0);
        assert_eq!(exact.len(), 6);
    }

    #[test]
    fn test_canvas_validation() {
        assert!(canvas().validate().is_ok());
        let narrow = Canvas {
            width: 20.0,
            ..canvas()
        };
        assert!(narrow.validate().is_err());
    }
}
