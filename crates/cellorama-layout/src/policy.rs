#![forbid(unsafe_code)]

//! Arrangement policies.
//!
//! Pure functions from a container, its available width and its children's
//! measured sizes to a [`LayoutPlan`]. Nothing here touches the cache or a
//! surface; the engine feeds measured sizes in and reads frames out.
//!
//! # Two steps
//!
//! 1. [`propose`] decides which constraints each child is measured under.
//! 2. [`arrange`] places the measured children and derives the container's
//!    own size.
//!
//! All frames are relative to the container's origin and already account
//! for its insets.

use std::ops::Range;

use cellorama_core::geometry::{Rect, Size, clamp_extent};
use cellorama_core::item::{Arrangement, Container};
use serde::{Deserialize, Serialize};

use crate::context::LayoutConfig;

// ============================================================================
// Constraints
// ============================================================================

/// Bounds offered to a leaf when it is measured.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub max_width: Option<f32>,
    pub max_height: Option<f32>,
}

impl Constraints {
    /// No bounds at all.
    pub const UNBOUNDED: Self = Self {
        max_width: None,
        max_height: None,
    };

    /// Bounded width, free height.
    #[must_use]
    pub fn width(max_width: f32) -> Self {
        Self {
            max_width: Some(clamp_extent(max_width)),
            max_height: None,
        }
    }

    /// Bounded width and height.
    #[must_use]
    pub fn fixed(max_width: f32, max_height: f32) -> Self {
        Self {
            max_width: Some(clamp_extent(max_width)),
            max_height: Some(clamp_extent(max_height)),
        }
    }

    /// Width component of a cache key. Unbounded widths map to infinity.
    #[inline]
    #[must_use]
    pub fn cache_width(&self) -> f32 {
        self.max_width.unwrap_or(f32::INFINITY)
    }
}

/// What a container offers its children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    /// Constraints for leaf children.
    pub leaf: Constraints,
    /// Width handed to container children.
    pub container_width: f32,
}

/// Direction in which a container's content scrolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrollAxis {
    #[default]
    Vertical,
    Horizontal,
}

/// Placement of a single child.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChildFrame {
    /// Frame relative to the container's origin.
    pub rect: Rect,
    /// Paint order; higher draws on top.
    pub z_index: u32,
    /// Kept in the model but not shown or interactive.
    pub hidden: bool,
}

impl ChildFrame {
    const HIDDEN: Self = Self {
        rect: Rect::ZERO,
        z_index: 0,
        hidden: true,
    };

    fn shown(rect: Rect, z_index: u32) -> Self {
        Self {
            rect,
            z_index,
            hidden: false,
        }
    }
}

/// Result of arranging a container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutPlan {
    /// One frame per child, in child order.
    pub frames: Vec<ChildFrame>,
    /// Child indices grouped into rows (zone, grid, tab) or one run
    /// (carousel, stack).
    pub groups: Vec<Vec<usize>>,
    /// The container's own size.
    pub size: Size,
    /// Size of the scrollable content. Wider than `size` for carousels.
    pub content_size: Size,
    pub scroll_axis: ScrollAxis,
    /// Tallest child seen, including the carried hint for carousels.
    pub max_child_height: f32,
}

impl LayoutPlan {
    /// Reserve `height` above the content (section headers).
    #[must_use]
    pub fn with_leading(mut self, height: f32) -> Self {
        let height = clamp_extent(height);
        if height == 0.0 {
            return self;
        }
        for frame in self.frames.iter_mut().filter(|f| !f.hidden) {
            frame.rect = frame.rect.offset(0.0, height);
        }
        self.size.height += height;
        self.content_size.height += height;
        self
    }

    /// Number of children with a visible frame.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.frames.iter().filter(|f| !f.hidden).count()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Width of one grid cell: `(inner − (n−1)·spacing) / n`, clamped at zero.
#[must_use]
pub fn grid_cell_width(inner_width: f32, columns: u16, spacing: f32) -> f32 {
    let n = f32::from(columns.max(1));
    clamp_extent((inner_width - (n - 1.0) * spacing) / n)
}

/// Tab bucket of child `index` among `count` children split into
/// `segments` pages.
#[inline]
#[must_use]
pub fn segment_of(index: usize, count: usize, segments: usize) -> usize {
    if count == 0 {
        return 0;
    }
    index * segments.max(1) / count
}

/// Child indices whose bucket equals `segment`.
#[must_use]
pub fn segment_range(count: usize, segments: usize, segment: usize) -> Range<usize> {
    let segments = segments.max(1);
    if segment >= segments {
        return count..count;
    }
    let start = (segment * count).div_ceil(segments);
    let end = ((segment + 1) * count).div_ceil(segments);
    start.min(count)..end.min(count)
}

/// Children that take part in layout: the visible bucket for tabs,
/// everything otherwise.
#[must_use]
pub fn visible_range(container: &Container) -> Range<usize> {
    match container.arrangement() {
        Arrangement::Tab { segment, segments } => {
            segment_range(container.len(), segments, segment)
        }
        _ => 0..container.len(),
    }
}

// ============================================================================
// propose
// ============================================================================

/// Constraints offered to the children of `container` at `available_width`.
#[must_use]
pub fn propose(container: &Container, available_width: f32, config: &LayoutConfig) -> Proposal {
    let inner = container.max_width(available_width);
    match container.arrangement() {
        Arrangement::Zone | Arrangement::Tab { .. } => Proposal {
            leaf: Constraints::width(inner),
            container_width: inner,
        },
        Arrangement::Grid { columns } => {
            let cell = grid_cell_width(inner, columns, container.spacing());
            Proposal {
                leaf: Constraints::width(cell),
                container_width: cell,
            }
        }
        Arrangement::Carousel => Proposal {
            leaf: Constraints::UNBOUNDED,
            container_width: inner,
        },
        Arrangement::Stack => Proposal {
            leaf: Constraints::fixed(inner, stack_card_height(inner, config)),
            container_width: inner,
        },
    }
}

fn stack_card_height(inner_width: f32, config: &LayoutConfig) -> f32 {
    clamp_extent(inner_width * config.stack_aspect)
}

// ============================================================================
// arrange
// ============================================================================

/// Place measured children and size the container.
///
/// `child_sizes` has one entry per child. `None` marks a child that does
/// not take part in this pass; it gets a hidden zero frame. `height_hint` is
/// the cached max-child-height hint, consulted only by carousels.
#[must_use]
pub fn arrange(
    container: &Container,
    available_width: f32,
    child_sizes: &[Option<Size>],
    height_hint: f32,
    config: &LayoutConfig,
) -> LayoutPlan {
    debug_assert_eq!(child_sizes.len(), container.len());
    let width = clamp_extent(available_width);
    if child_sizes.is_empty() {
        return LayoutPlan {
            size: Size::new(width, 0.0),
            content_size: Size::new(width, 0.0),
            ..LayoutPlan::default()
        };
    }

    let frame = Frame::new(container, width);
    match container.arrangement() {
        Arrangement::Zone => arrange_rows(&frame, child_sizes, 0..child_sizes.len()),
        Arrangement::Tab { .. } => arrange_rows(&frame, child_sizes, visible_range(container)),
        Arrangement::Grid { columns } => arrange_grid(&frame, child_sizes, columns),
        Arrangement::Carousel => arrange_carousel(&frame, child_sizes, height_hint),
        Arrangement::Stack => arrange_stack(&frame, child_sizes, config),
    }
}

/// Resolved container metrics shared by every policy.
struct Frame {
    width: f32,
    inner: f32,
    left: f32,
    top: f32,
    vertical: f32,
    horizontal: f32,
    spacing: f32,
}

impl Frame {
    fn new(container: &Container, width: f32) -> Self {
        let insets = container.insets();
        Self {
            width,
            inner: container.max_width(width),
            left: insets.left,
            top: insets.top,
            vertical: insets.vertical(),
            horizontal: insets.horizontal(),
            spacing: container.spacing(),
        }
    }

    fn plan(&self, frames: Vec<ChildFrame>, groups: Vec<Vec<usize>>, body: f32) -> LayoutPlan {
        let max_child_height = frames
            .iter()
            .filter(|f| !f.hidden)
            .map(|f| f.rect.height)
            .fold(0.0, f32::max);
        let size = Size::new(self.width, self.vertical + clamp_extent(body));
        LayoutPlan {
            frames,
            groups,
            size,
            content_size: size,
            scroll_axis: ScrollAxis::Vertical,
            max_child_height,
        }
    }
}

/// Total extent of `count` runs of `extents` separated by `spacing`.
fn spaced_sum(extents: impl Iterator<Item = f32>, spacing: f32) -> f32 {
    let (sum, count) = extents.fold((0.0, 0usize), |(sum, count), e| (sum + e, count + 1));
    if count == 0 {
        0.0
    } else {
        sum + spacing * (count - 1) as f32
    }
}

fn arrange_rows(frame: &Frame, sizes: &[Option<Size>], shown: Range<usize>) -> LayoutPlan {
    let mut frames = vec![ChildFrame::HIDDEN; sizes.len()];
    let mut groups = Vec::new();
    let mut y = frame.top;
    let mut heights = Vec::new();
    for (index, size) in sizes.iter().enumerate() {
        let Some(size) = size.filter(|_| shown.contains(&index)) else {
            continue;
        };
        if !heights.is_empty() {
            y += frame.spacing;
        }
        let height = clamp_extent(size.height);
        frames[index] = ChildFrame::shown(Rect::new(frame.left, y, frame.inner, height), 0);
        groups.push(vec![index]);
        heights.push(height);
        y += height;
    }
    let body = spaced_sum(heights.into_iter(), frame.spacing);
    frame.plan(frames, groups, body)
}

fn arrange_grid(frame: &Frame, sizes: &[Option<Size>], columns: u16) -> LayoutPlan {
    let columns = usize::from(columns.max(1));
    let cell = grid_cell_width(frame.inner, columns as u16, frame.spacing);
    let mut frames = vec![ChildFrame::HIDDEN; sizes.len()];
    let participants: Vec<(usize, Size)> = sizes
        .iter()
        .enumerate()
        .filter_map(|(index, size)| size.map(|s| (index, s)))
        .collect();

    let mut groups = Vec::new();
    let mut row_heights = Vec::new();
    let mut y = frame.top;
    for row in participants.chunks(columns) {
        if !row_heights.is_empty() {
            y += frame.spacing;
        }
        let row_height = row
            .iter()
            .map(|(_, s)| clamp_extent(s.height))
            .fold(0.0, f32::max);
        for (column, (index, size)) in row.iter().enumerate() {
            let x = frame.left + column as f32 * (cell + frame.spacing);
            let rect = Rect::new(x, y, cell, clamp_extent(size.height));
            frames[*index] = ChildFrame::shown(rect, 0);
        }
        groups.push(row.iter().map(|(index, _)| *index).collect());
        row_heights.push(row_height);
        y += row_height;
    }
    let body = spaced_sum(row_heights.into_iter(), frame.spacing);
    frame.plan(frames, groups, body)
}

fn arrange_carousel(frame: &Frame, sizes: &[Option<Size>], height_hint: f32) -> LayoutPlan {
    let mut frames = vec![ChildFrame::HIDDEN; sizes.len()];
    let mut group = Vec::new();
    let mut x = frame.left;
    let mut widths = Vec::new();
    let mut observed = 0.0f32;
    for (index, size) in sizes.iter().enumerate() {
        let Some(size) = size else {
            continue;
        };
        if !widths.is_empty() {
            x += frame.spacing;
        }
        let (width, height) = (clamp_extent(size.width), clamp_extent(size.height));
        frames[index] = ChildFrame::shown(Rect::new(x, frame.top, width, height), 0);
        group.push(index);
        widths.push(width);
        observed = observed.max(height);
        x += width;
    }

    let max_child_height = observed.max(clamp_extent(height_hint));
    let content_width = frame.horizontal + spaced_sum(widths.into_iter(), frame.spacing);
    let height = frame.vertical + max_child_height;
    LayoutPlan {
        frames,
        groups: vec![group],
        size: Size::new(frame.width, height),
        content_size: Size::new(content_width.max(frame.width), height),
        scroll_axis: ScrollAxis::Horizontal,
        max_child_height,
    }
}

fn arrange_stack(frame: &Frame, sizes: &[Option<Size>], config: &LayoutConfig) -> LayoutPlan {
    let card = stack_card_height(frame.inner, config);
    let offset = clamp_extent(config.stack_offset);
    let mut frames = vec![ChildFrame::HIDDEN; sizes.len()];
    let mut group = Vec::new();
    for (index, _) in sizes.iter().enumerate().filter(|(_, s)| s.is_some()) {
        let position = group.len();
        let y = frame.top + offset * position as f32;
        frames[index] = ChildFrame::shown(
            Rect::new(frame.left, y, frame.inner, card),
            position as u32,
        );
        group.push(index);
    }

    let body = match group.len() {
        0 => 0.0,
        k => card + offset * (k - 1) as f32,
    };
    let mut plan = frame.plan(frames, vec![group], body);
    plan.max_child_height = card;
    plan
}
