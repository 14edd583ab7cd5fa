#![forbid(unsafe_code)]

//! The rendering surface seam.
//!
//! The engine never draws. It asks a [`RenderSurface`] to measure leaves,
//! hands it one [`ChildScreen`] per visible leaf, and finally presents the
//! whole frame tree. Batch edits from snapshot diffs go through the same
//! surface.
//!
//! [`IntrinsicSurface`] is a headless surface that sizes leaves from their
//! size class alone and records everything it is handed.

use cellorama_core::content::Color;
use cellorama_core::geometry::{Rect, Size, clamp_extent};
use cellorama_core::id::ItemId;
use cellorama_core::item::{Element, SizeClass};
use serde::{Deserialize, Serialize};

use crate::engine::LayoutNode;
use crate::policy::Constraints;
use crate::snapshot::{Edit, Snapshot};

/// Width of one glyph when sizing dynamic leaves.
pub const DYNAMIC_GLYPH_WIDTH: f32 = 40.0;

/// Horizontal padding around dynamic leaf content.
pub const DYNAMIC_PADDING: f32 = 20.0;

/// Height of one line of dynamic leaf content.
pub const DYNAMIC_LINE_HEIGHT: f32 = 60.0;

/// A leaf placed on screen, handed to the surface to host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildScreen {
    pub id: ItemId,
    /// Absolute frame.
    pub frame: Rect,
    pub glyph: String,
    pub color: Color,
    pub size: SizeClass,
}

impl ChildScreen {
    #[must_use]
    pub fn new(element: &Element, frame: Rect) -> Self {
        Self {
            id: element.id(),
            frame,
            glyph: element.glyph.clone(),
            color: element.color,
            size: element.size,
        }
    }
}

/// What the engine needs from a renderer.
pub trait RenderSurface {
    /// Called once before each layout pass.
    fn begin_frame(&mut self) {}

    /// Size `element` under `constraints`.
    fn measure_element(&mut self, element: &Element, constraints: Constraints) -> Size;

    /// Host a visible leaf at its absolute frame.
    fn attach_child_screen(&mut self, screen: ChildScreen);

    /// Show a finished frame tree.
    fn present(&mut self, root: &LayoutNode);

    /// Animate a batch of structural edits.
    fn apply_batch(&mut self, edits: &[Edit]);
}

/// Natural size of a leaf under `constraints`, without a renderer.
///
/// Fixed classes keep their height and shrink to the width bound. Dynamic
/// leaves are as wide as their glyphs and wrap onto a second line when the
/// width bound is too small.
#[must_use]
pub fn intrinsic_size(element: &Element, constraints: Constraints) -> Size {
    let max_width = constraints.max_width.unwrap_or(f32::INFINITY);
    match element.size.dimensions() {
        Some(size) => Size::new(size.width.min(max_width), size.height).clamped(),
        None => {
            let glyphs = element.glyph.chars().count() as f32;
            let natural = glyphs * DYNAMIC_GLYPH_WIDTH + DYNAMIC_PADDING;
            if natural > max_width {
                Size::new(clamp_extent(max_width), DYNAMIC_LINE_HEIGHT * 2.0)
            } else {
                Size::new(natural, DYNAMIC_LINE_HEIGHT)
            }
        }
    }
}

/// Headless surface. Records what it was asked to do.
#[derive(Debug, Default, Clone)]
pub struct IntrinsicSurface {
    measurements: usize,
    attached: Vec<ChildScreen>,
    presented: Option<LayoutNode>,
    mirror: Snapshot,
    batches: usize,
}

impl IntrinsicSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a snapshot already on screen.
    #[must_use]
    pub fn with_mirror(mirror: Snapshot) -> Self {
        Self {
            mirror,
            ..Self::default()
        }
    }

    /// Leaf measurements served so far.
    #[inline]
    pub fn measurements(&self) -> usize {
        self.measurements
    }

    /// Child screens attached since the last presentation began.
    pub fn attached(&self) -> &[ChildScreen] {
        &self.attached
    }

    /// The last presented frame tree.
    pub fn presented(&self) -> Option<&LayoutNode> {
        self.presented.as_ref()
    }

    /// Identity layout as reconstructed from applied batches.
    pub fn mirror(&self) -> &Snapshot {
        &self.mirror
    }

    #[inline]
    pub fn batches(&self) -> usize {
        self.batches
    }
}

impl RenderSurface for IntrinsicSurface {
    fn begin_frame(&mut self) {
        self.attached.clear();
    }

    fn measure_element(&mut self, element: &Element, constraints: Constraints) -> Size {
        self.measurements += 1;
        intrinsic_size(element, constraints)
    }

    fn attach_child_screen(&mut self, screen: ChildScreen) {
        self.attached.push(screen);
    }

    fn present(&mut self, root: &LayoutNode) {
        self.presented = Some(root.clone());
    }

    fn apply_batch(&mut self, edits: &[Edit]) {
        self.batches += 1;
        self.mirror = self.mirror.patched(edits);
        tracing::trace!(edits = edits.len(), "batch applied");
    }
}
