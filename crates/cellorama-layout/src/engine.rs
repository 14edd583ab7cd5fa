#![forbid(unsafe_code)]

//! Recursive sizing and placement.
//!
//! [`SizingEngine::measure`] sizes a subtree bottom-up:
//!
//! 1. **Cache check**: a size cached for this id at this width is returned
//!    as is.
//! 2. **Child dispatch**: containers recurse, leaves go to the surface under
//!    the constraints the policy proposes. Tab containers only measure the
//!    visible segment.
//! 3. **Aggregate**: [`policy::arrange`] turns child sizes into the
//!    container's size.
//! 4. **Cache write**: the size is stored, and carousels raise their
//!    max-height hint.
//!
//! [`SizingEngine::layout`] then walks the tree top-down, turning relative
//! frames into absolute ones. It attaches a child screen for every visible
//! leaf and presents the resulting [`LayoutNode`] tree.
//!
//! # Key Invariant
//!
//! With `force_full` set the measuring walk never reads the cache, and the
//! sizes produced are identical to those of a cached pass over the same
//! tree. Placement always reuses what that walk wrote, so each leaf is
//! measured once per pass.
//!
//! # Families
//!
//! In the compositional family the root only lays out container children
//! (sections), and sections only lay out leaf children. Everything else
//! gets a hidden frame. Sections also reserve a header above their content.

use cellorama_core::geometry::{Rect, Size, clamp_extent};
use cellorama_core::id::ItemId;
use cellorama_core::item::{Container, Element, Item, ItemKind};
use serde::{Deserialize, Serialize};

use crate::context::{Family, LayoutConfig, LayoutContext};
use crate::policy::{self, Constraints, LayoutPlan, ScrollAxis};
use crate::surface::{ChildScreen, RenderSurface};

// ============================================================================
// PassStats
// ============================================================================

/// Counters for the passes run since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    /// Containers whose size was recomputed.
    pub recomputed: usize,
    /// Lookups answered from the cache (containers and leaves).
    pub cached: usize,
    /// Leaves measured by the surface.
    pub leaves_measured: usize,
    /// Every sizing request.
    pub total: usize,
    /// Cached sizes after the last pass.
    pub cache_entries: usize,
}

impl PassStats {
    /// Cache hit rate as a fraction (0.0 – 1.0).
    pub fn hit_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.cached as f64 / self.total as f64
        }
    }

    /// Whether the pass was answered entirely from the cache.
    #[must_use]
    pub fn is_pure_hit(&self) -> bool {
        self.recomputed == 0 && self.leaves_measured == 0
    }
}

// ============================================================================
// LayoutNode
// ============================================================================

/// A placed node with an absolute frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: ItemId,
    pub kind: ItemKind,
    pub frame: Rect,
    pub z_index: u32,
    /// In the model but not on screen. Hidden nodes have no children.
    pub hidden: bool,
    pub scroll_axis: ScrollAxis,
    /// Scrollable extent (containers only).
    pub content_size: Size,
    /// Header reserved above the content (compositional sections only).
    pub header: f32,
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    fn new(id: ItemId, kind: ItemKind, frame: Rect) -> Self {
        Self {
            id,
            kind,
            frame,
            z_index: 0,
            hidden: false,
            scroll_axis: ScrollAxis::Vertical,
            content_size: frame.size(),
            header: 0.0,
            children: Vec::new(),
        }
    }

    fn hidden(item: &Item) -> Self {
        Self {
            hidden: true,
            ..Self::new(item.id(), item.kind(), Rect::ZERO)
        }
    }

    /// Depth-first search for `id`.
    pub fn find(&self, id: ItemId) -> Option<&LayoutNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Number of visible leaves in this subtree.
    pub fn visible_leaf_count(&self) -> usize {
        if self.hidden {
            return 0;
        }
        match self.kind {
            ItemKind::Element => 1,
            ItemKind::Container => self.children.iter().map(Self::visible_leaf_count).sum(),
        }
    }
}

// ============================================================================
// SizingEngine
// ============================================================================

/// Walks item trees against a [`LayoutContext`] and a [`RenderSurface`].
#[derive(Debug, Default)]
pub struct SizingEngine {
    stats: PassStats,
    /// Set while placing. Placement reads back the sizes the measuring
    /// walk just wrote, even under `force_full`.
    placing: bool,
}

impl SizingEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stats(&self) -> PassStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = PassStats::default();
    }

    /// Size `item` at `available_width`.
    pub fn measure<S: RenderSurface + ?Sized>(
        &mut self,
        ctx: &mut LayoutContext,
        surface: &mut S,
        item: &Item,
        available_width: f32,
    ) -> Size {
        let size = match item {
            Item::Element(element) => {
                self.size_leaf(ctx, surface, element, Constraints::width(available_width))
            }
            Item::Container(container) => {
                self.size_container(ctx, surface, container, available_width, false)
            }
        };
        self.stats.cache_entries = ctx.cache().len();
        size
    }

    /// Size a container at `available_width`.
    pub fn measure_container<S: RenderSurface + ?Sized>(
        &mut self,
        ctx: &mut LayoutContext,
        surface: &mut S,
        container: &Container,
        available_width: f32,
    ) -> Size {
        let size = self.size_container(ctx, surface, container, available_width, false);
        self.stats.cache_entries = ctx.cache().len();
        size
    }

    /// Size and place `root` at `width`, then present it.
    pub fn layout<S: RenderSurface + ?Sized>(
        &mut self,
        ctx: &mut LayoutContext,
        surface: &mut S,
        root: &Container,
        width: f32,
    ) -> LayoutNode {
        let _span = tracing::debug_span!("layout", root = %root.id(), width).entered();
        surface.begin_frame();
        let size = self.size_container(ctx, surface, root, width, false);
        self.placing = true;
        let node = self.place(ctx, surface, root, Rect::from_size(size), false);
        self.placing = false;
        self.stats.cache_entries = ctx.cache().len();
        tracing::debug!(
            recomputed = self.stats.recomputed,
            cached = self.stats.cached,
            leaves = self.stats.leaves_measured,
            height = size.height,
            "layout pass"
        );
        surface.present(&node);
        node
    }

    fn size_leaf<S: RenderSurface + ?Sized>(
        &mut self,
        ctx: &mut LayoutContext,
        surface: &mut S,
        element: &Element,
        constraints: Constraints,
    ) -> Size {
        self.stats.total += 1;
        let width = constraints.cache_width();
        if self.reads_cache(ctx)
            && let Some(size) = ctx.cache_mut().get_at_width(element.id(), width)
        {
            self.stats.cached += 1;
            return size;
        }
        let size = surface.measure_element(element, constraints);
        ctx.cache_mut().set_at_width(element.id(), width, size);
        self.stats.leaves_measured += 1;
        size
    }

    fn size_container<S: RenderSurface + ?Sized>(
        &mut self,
        ctx: &mut LayoutContext,
        surface: &mut S,
        container: &Container,
        available_width: f32,
        section: bool,
    ) -> Size {
        self.stats.total += 1;
        let width = clamp_extent(available_width);
        if self.reads_cache(ctx)
            && let Some(size) = ctx.cache_mut().get_at_width(container.id(), width)
        {
            self.stats.cached += 1;
            tracing::trace!(id = %container.id(), "size cache hit");
            return size;
        }

        let size = if container.is_empty() {
            Size::new(width, 0.0)
        } else {
            let _span = tracing::debug_span!(
                "measure",
                id = %container.id(),
                arrangement = container.arrangement().name(),
                width
            )
            .entered();
            self.plan(ctx, surface, container, width, section).size
        };
        ctx.cache_mut().set_at_width(container.id(), width, size);
        self.stats.recomputed += 1;
        size
    }

    fn reads_cache(&self, ctx: &LayoutContext) -> bool {
        self.placing || !ctx.config().force_full
    }

    /// Measure the participating children of `container` and arrange them.
    fn plan<S: RenderSurface + ?Sized>(
        &mut self,
        ctx: &mut LayoutContext,
        surface: &mut S,
        container: &Container,
        width: f32,
        section: bool,
    ) -> LayoutPlan {
        let config = *ctx.config();
        let proposal = policy::propose(container, width, &config);
        let visible = policy::visible_range(container);

        let mut sizes = Vec::with_capacity(container.len());
        for (index, child) in container.items().iter().enumerate() {
            if !visible.contains(&index) || !participates(&config, container, child) {
                sizes.push(None);
                continue;
            }
            let size = match child {
                Item::Element(element) => self.size_leaf(ctx, surface, element, proposal.leaf),
                Item::Container(nested) => self.size_container(
                    ctx,
                    surface,
                    nested,
                    proposal.container_width,
                    container.is_root(),
                ),
            };
            sizes.push(Some(size));
        }

        let hint = ctx
            .cache()
            .max_height(container.id())
            .max(container.max_item_height());
        let plan = policy::arrange(container, width, &sizes, hint, &config);
        if container.arrangement().scrolls_horizontally() {
            ctx.cache_mut()
                .set_max_height(container.id(), plan.max_child_height);
        }
        if section {
            plan.with_leading(config.section_header())
        } else {
            plan
        }
    }

    fn place<S: RenderSurface + ?Sized>(
        &mut self,
        ctx: &mut LayoutContext,
        surface: &mut S,
        container: &Container,
        frame: Rect,
        section: bool,
    ) -> LayoutNode {
        let mut node = LayoutNode::new(container.id(), ItemKind::Container, frame);
        if container.is_empty() {
            return node;
        }

        let plan = self.plan(ctx, surface, container, frame.width, section);
        node.scroll_axis = plan.scroll_axis;
        node.content_size = plan.content_size;
        if section {
            node.header = ctx.config().section_header();
        }

        for (child, child_frame) in container.items().iter().zip(&plan.frames) {
            if child_frame.hidden {
                node.children.push(LayoutNode::hidden(child));
                continue;
            }
            let rect = child_frame.rect.offset(frame.x, frame.y);
            let mut child_node = match child {
                Item::Element(element) => {
                    surface.attach_child_screen(ChildScreen::new(element, rect));
                    LayoutNode::new(element.id(), ItemKind::Element, rect)
                }
                Item::Container(nested) => {
                    self.place(ctx, surface, nested, rect, container.is_root())
                }
            };
            child_node.z_index = child_frame.z_index;
            node.children.push(child_node);
        }
        node
    }
}

/// Whether `child` takes part in `parent`'s layout under `config`.
fn participates(config: &LayoutConfig, parent: &Container, child: &Item) -> bool {
    match config.family {
        Family::Flow => true,
        Family::Compositional => match child {
            Item::Container(_) => parent.is_root(),
            Item::Element(_) => !parent.is_root(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::IntrinsicSurface;
    use cellorama_core::content::Color;
    use cellorama_core::item::{Arrangement, SizeClass};

    fn leaves(count: usize, size: SizeClass) -> Vec<Item> {
        (0..count)
            .map(|_| Element::new("x", size, Color::Green).into())
            .collect()
    }

    fn grid_root(count: usize) -> Container {
        let section =
            Container::new(leaves(count, SizeClass::Small)).with_arrangement(Arrangement::grid(2));
        Container::new([Item::from(section)]).root()
    }

    #[test]
    fn empty_container_does_not_recurse() {
        let mut ctx = LayoutContext::default();
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let empty = Container::default();
        let size = engine.measure_container(&mut ctx, &mut surface, &empty, 300.0);
        assert_eq!(size, Size::new(300.0, 0.0));
        assert_eq!(surface.measurements(), 0);
    }

    #[test]
    fn second_pass_is_pure_hit() {
        let mut ctx = LayoutContext::default();
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let root = grid_root(5);
        let first = engine.measure_container(&mut ctx, &mut surface, &root, 400.0);
        engine.reset_stats();
        let second = engine.measure_container(&mut ctx, &mut surface, &root, 400.0);
        assert_eq!(first, second);
        assert!(engine.stats().is_pure_hit());
        assert_eq!(engine.stats().cached, 1);
    }

    #[test]
    fn force_full_matches_cached_pass() {
        let root = grid_root(7);
        let mut cached_ctx = LayoutContext::default();
        let mut full_ctx = LayoutContext::new(LayoutConfig {
            force_full: true,
            ..LayoutConfig::default()
        });
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let a = engine.measure_container(&mut cached_ctx, &mut surface, &root, 500.0);
        let b = engine.measure_container(&mut full_ctx, &mut surface, &root, 500.0);
        let c = engine.measure_container(&mut full_ctx, &mut surface, &root, 500.0);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn tab_measures_only_visible_segment() {
        let tab = Container::new(leaves(6, SizeClass::Small)).with_arrangement(Arrangement::tab(3));
        let mut ctx = LayoutContext::default();
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let size = engine.measure_container(&mut ctx, &mut surface, &tab, 200.0);
        assert_eq!(surface.measurements(), 2);
        assert_eq!(size.height, 60.0 * 2.0 + 10.0 + 16.0);
    }

    #[test]
    fn compositional_sections_get_headers() {
        let root = grid_root(2);
        let mut ctx = LayoutContext::new(LayoutConfig::for_family(Family::Compositional));
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let node = engine.layout(&mut ctx, &mut surface, &root, 400.0);
        let section = &node.children[0];
        assert_eq!(section.header, 44.0);
        assert_eq!(section.frame.height, 60.0 + 16.0 + 44.0);
        assert_eq!(section.children[0].frame.y, 8.0 + 8.0 + 44.0);
    }

    #[test]
    fn compositional_skips_nested_containers() {
        let nested = Container::new(leaves(3, SizeClass::Small));
        let nested_id = nested.id();
        let mut items = leaves(1, SizeClass::Small);
        items.push(nested.into());
        let section = Container::new(items);
        let root = Container::new([Item::from(section)]).root();

        let mut ctx = LayoutContext::new(LayoutConfig::for_family(Family::Compositional));
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let node = engine.layout(&mut ctx, &mut surface, &root, 400.0);
        assert!(node.find(nested_id).is_some_and(|n| n.hidden));
        assert_eq!(node.visible_leaf_count(), 1);
    }

    #[test]
    fn carousel_hint_survives_shrinking() {
        let mut items = leaves(1, SizeClass::Small);
        items.extend(leaves(1, SizeClass::XLarge));
        let carousel = Container::new(items).with_arrangement(Arrangement::Carousel);
        let mut ctx = LayoutContext::default();
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let tall = engine.measure_container(&mut ctx, &mut surface, &carousel, 300.0);
        assert_eq!(tall.height, 220.0 + 16.0);

        let mut shrunk = carousel.clone();
        let inv = shrunk.set_size(SizeClass::Small);
        let mut sizes_only = cellorama_core::invalidation::Invalidation::new();
        sizes_only.mark_all(inv.sizes());
        ctx.apply(&sizes_only);
        let after = engine.measure_container(&mut ctx, &mut surface, &shrunk, 300.0);
        assert_eq!(after.height, tall.height);
    }

    #[test]
    fn seeded_hint_holds_carousel_open() {
        let carousel = Container::new(leaves(3, SizeClass::Small))
            .with_arrangement(Arrangement::Carousel)
            .with_max_item_height(200.0);
        let mut ctx = LayoutContext::default();
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let size = engine.measure_container(&mut ctx, &mut surface, &carousel, 300.0);
        assert_eq!(size.height, 200.0 + 16.0);
        assert_eq!(ctx.cache().max_height(carousel.id()), 200.0);

        let mut reset = carousel.clone();
        assert!(!reset.set_size(SizeClass::Medium).is_empty());
        assert_eq!(reset.max_item_height(), 0.0);
        ctx.cache_mut().clear();
        let size = engine.measure_container(&mut ctx, &mut surface, &reset, 300.0);
        assert_eq!(size.height, 60.0 + 16.0);
    }

    #[test]
    fn full_pass_measures_each_leaf_once() {
        let mut items = leaves(2, SizeClass::Small);
        items.push(Container::new(leaves(3, SizeClass::Medium)).into());
        let section = Container::new(items).with_arrangement(Arrangement::grid(2));
        let root = Container::new([Item::from(section)]).root();

        let mut ctx = LayoutContext::new(LayoutConfig {
            force_full: true,
            ..LayoutConfig::for_family(Family::Flow)
        });
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let node = engine.layout(&mut ctx, &mut surface, &root, 400.0);
        assert_eq!(node.visible_leaf_count(), 5);
        assert_eq!(surface.measurements(), 5);

        engine.layout(&mut ctx, &mut surface, &root, 400.0);
        assert_eq!(surface.measurements(), 10);
    }

    #[test]
    fn layout_attaches_visible_leaves() {
        let root = grid_root(5);
        let mut ctx = LayoutContext::default();
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let node = engine.layout(&mut ctx, &mut surface, &root, 400.0);
        assert_eq!(surface.attached().len(), 5);
        assert_eq!(surface.presented(), Some(&node));
        assert_eq!(node.visible_leaf_count(), 5);
    }
}
