#![forbid(unsafe_code)]

//! The recursive item tree.
//!
//! An [`Item`] is either an [`Element`] (leaf) or a [`Container`] (composite).
//! Containers own their children outright: the tree has no shared ownership
//! and no cycles. Children live in an [`im::Vector`], so cloning a subtree is
//! cheap and an edited copy shares every untouched node with the original.
//!
//! # Identity
//!
//! Every node carries an [`ItemId`]. Equality and hashing look at the id only,
//! so an element whose size class was replaced still compares equal to its
//! previous value. This is what lets snapshots diff by identity.

use std::fmt;
use std::hash::{Hash, Hasher};

use im::Vector;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::content::Color;
use crate::geometry::{Insets, Size, clamp_extent};
use crate::id::ItemId;

/// Default spacing between siblings.
pub const DEFAULT_SPACING: f32 = 10.0;

/// Default inset on every container edge.
pub const DEFAULT_INSET: f32 = 8.0;

/// Default number of segments for a new tab container.
pub const DEFAULT_SEGMENTS: usize = 3;

// ============================================================================
// SizeClass
// ============================================================================

/// Requested display size bucket of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeClass {
    /// 60 × 60.
    #[default]
    Small,
    /// 100 × 60.
    Medium,
    /// 160 × 100.
    Large,
    /// 320 × 220.
    #[serde(alias = "x-large")]
    XLarge,
    /// Measured from content.
    Dynamic,
}

impl SizeClass {
    /// All classes, in picker order.
    pub const ALL: [SizeClass; 5] = [
        SizeClass::Small,
        SizeClass::Medium,
        SizeClass::Large,
        SizeClass::XLarge,
        SizeClass::Dynamic,
    ];

    /// The fixed classes (everything except [`SizeClass::Dynamic`]).
    pub const FIXED: [SizeClass; 4] = [
        SizeClass::Small,
        SizeClass::Medium,
        SizeClass::Large,
        SizeClass::XLarge,
    ];

    /// Fixed dimensions, or `None` for [`SizeClass::Dynamic`].
    #[must_use]
    pub const fn dimensions(self) -> Option<Size> {
        match self {
            SizeClass::Small => Some(Size::new(60.0, 60.0)),
            SizeClass::Medium => Some(Size::new(100.0, 60.0)),
            SizeClass::Large => Some(Size::new(160.0, 100.0)),
            SizeClass::XLarge => Some(Size::new(320.0, 220.0)),
            SizeClass::Dynamic => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
            SizeClass::XLarge => "xlarge",
            SizeClass::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for SizeClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "small" => Ok(SizeClass::Small),
            "medium" => Ok(SizeClass::Medium),
            "large" => Ok(SizeClass::Large),
            "xlarge" | "x-large" => Ok(SizeClass::XLarge),
            "dynamic" => Ok(SizeClass::Dynamic),
            other => Err(format!("unknown size class: {other}")),
        }
    }
}

// ============================================================================
// Arrangement
// ============================================================================

/// How a container places its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Arrangement {
    /// One full-width row per child, stacked vertically.
    #[default]
    Zone,
    /// Rows of `columns` equal-width cells.
    Grid { columns: u16 },
    /// A single horizontally scrolling row.
    Carousel,
    /// Same-width cards overlapping vertically.
    Stack,
    /// Children split into `segments` pages; only `segment` is shown.
    Tab { segment: usize, segments: usize },
}

impl Arrangement {
    /// Grid with at least one column.
    #[must_use]
    pub fn grid(columns: u16) -> Self {
        Arrangement::Grid {
            columns: columns.max(1),
        }
    }

    /// Tab on its first segment, with at least one segment.
    #[must_use]
    pub fn tab(segments: usize) -> Self {
        Arrangement::Tab {
            segment: 0,
            segments: segments.max(1),
        }
    }

    /// Normalize out-of-range parameters (zero columns, zero segments,
    /// segment past the end).
    #[must_use]
    pub fn clamped(self) -> Self {
        match self {
            Arrangement::Grid { columns } => Arrangement::grid(columns),
            Arrangement::Tab { segment, segments } => {
                let segments = segments.max(1);
                Arrangement::Tab {
                    segment: segment.min(segments - 1),
                    segments,
                }
            }
            other => other,
        }
    }

    /// A random arrangement. Grids get `columns` columns.
    pub fn random<R: Rng>(rng: &mut R, columns: u16) -> Self {
        match rng.random_range(0..5u8) {
            0 => Arrangement::Zone,
            1 => Arrangement::grid(columns),
            2 => Arrangement::Carousel,
            3 => Arrangement::Stack,
            _ => Arrangement::tab(DEFAULT_SEGMENTS),
        }
    }

    #[must_use]
    pub fn is_grid(&self) -> bool {
        matches!(self, Arrangement::Grid { .. })
    }

    /// Carousels scroll horizontally; everything else grows vertically.
    #[must_use]
    pub fn scrolls_horizontally(&self) -> bool {
        matches!(self, Arrangement::Carousel)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Arrangement::Zone => "Zone",
            Arrangement::Grid { .. } => "Grid",
            Arrangement::Carousel => "Carousel",
            Arrangement::Stack => "Stack",
            Arrangement::Tab { .. } => "Tab",
        }
    }
}

// ============================================================================
// Element
// ============================================================================

/// A leaf holding displayable content.
#[derive(Debug, Clone)]
pub struct Element {
    id: ItemId,
    pub glyph: String,
    pub size: SizeClass,
    pub color: Color,
}

impl Element {
    /// Create an element with a fresh identity.
    pub fn new(glyph: impl Into<String>, size: SizeClass, color: Color) -> Self {
        Self {
            id: ItemId::next(),
            glyph: glyph.into(),
            size,
            color,
        }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// The same element (same identity) with another size class.
    #[must_use]
    pub fn with_size(&self, size: SizeClass) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// ============================================================================
// Container
// ============================================================================

/// A composite node: ordered children plus an arrangement.
#[derive(Debug, Clone)]
pub struct Container {
    pub(crate) id: ItemId,
    pub(crate) items: Vector<Item>,
    pub(crate) arrangement: Arrangement,
    spacing: f32,
    insets: Insets,
    pub(crate) is_root: bool,
    pub(crate) max_item_height: f32,
}

impl Default for Container {
    fn default() -> Self {
        Self::new(Vec::<Item>::new())
    }
}

impl Container {
    /// Create a zone container with default spacing and insets.
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            id: ItemId::next(),
            items: items.into_iter().collect(),
            arrangement: Arrangement::Zone,
            spacing: DEFAULT_SPACING,
            insets: Insets::uniform(DEFAULT_INSET),
            is_root: false,
            max_item_height: 0.0,
        }
    }

    /// Set the arrangement (parameters are clamped).
    #[must_use]
    pub fn with_arrangement(mut self, arrangement: Arrangement) -> Self {
        self.arrangement = arrangement.clamped();
        self
    }

    /// Set the spacing between siblings.
    #[must_use]
    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = clamp_extent(spacing);
        self
    }

    /// Set the edge insets.
    #[must_use]
    pub fn with_insets(mut self, insets: Insets) -> Self {
        self.insets = insets;
        self
    }

    /// Seed the max-child-height hint.
    #[must_use]
    pub fn with_max_item_height(mut self, height: f32) -> Self {
        self.max_item_height = clamp_extent(height);
        self
    }

    /// Mark as tree root. Roots always stack their sections as a zone.
    #[must_use]
    pub fn root(mut self) -> Self {
        self.is_root = true;
        self.arrangement = Arrangement::Zone;
        self
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[inline]
    pub fn items(&self) -> &Vector<Item> {
        &self.items
    }

    #[inline]
    pub fn arrangement(&self) -> Arrangement {
        self.arrangement
    }

    #[inline]
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    #[inline]
    pub fn insets(&self) -> Insets {
        self.insets
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    #[inline]
    pub fn max_item_height(&self) -> f32 {
        self.max_item_height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Width available to content inside `bounds_width`.
    #[must_use]
    pub fn max_width(&self, bounds_width: f32) -> f32 {
        clamp_extent(bounds_width - self.insets.horizontal())
    }

    /// `height` grown by the vertical insets.
    #[must_use]
    pub fn max_height(&self, height: f32) -> f32 {
        clamp_extent(height) + self.insets.vertical()
    }

    // ── Tree queries ────────────────────────────────────────────────

    /// Find a descendant by id.
    pub fn find(&self, id: ItemId) -> Option<&Item> {
        for item in &self.items {
            if item.id() == id {
                return Some(item);
            }
            if let Some(found) = item.as_container().and_then(|c| c.find(id)) {
                return Some(found);
            }
        }
        None
    }

    /// Find this container or a descendant container by id.
    pub fn find_container_mut(&mut self, id: ItemId) -> Option<&mut Container> {
        if self.id == id {
            return Some(self);
        }
        self.items
            .iter_mut()
            .filter_map(Item::as_container_mut)
            .find_map(|child| child.find_container_mut(id))
    }

    /// Ids from this container down to `id` (both ends included), or `None`
    /// if `id` is not in this subtree.
    pub fn path_to(&self, id: ItemId) -> Option<Vec<ItemId>> {
        if self.id == id {
            return Some(vec![self.id]);
        }
        for item in &self.items {
            let tail = match item {
                Item::Element(element) if element.id() == id => Some(vec![id]),
                Item::Element(_) => None,
                Item::Container(child) => child.path_to(id),
            };
            if let Some(mut tail) = tail {
                tail.insert(0, self.id);
                return Some(tail);
            }
        }
        None
    }

    /// Every descendant id, depth-first pre-order. Excludes `self`.
    pub fn descendant_ids(&self) -> Vec<ItemId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<ItemId>) {
        for item in &self.items {
            out.push(item.id());
            if let Item::Container(child) = item {
                child.collect_ids(out);
            }
        }
    }

    /// Number of leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        self.items
            .iter()
            .map(|item| match item {
                Item::Element(_) => 1,
                Item::Container(child) => child.leaf_count(),
            })
            .sum()
    }

    /// Nesting depth: 1 for a container holding only leaves.
    pub fn depth(&self) -> usize {
        1 + self
            .items
            .iter()
            .filter_map(Item::as_container)
            .map(Container::depth)
            .max()
            .unwrap_or(0)
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Container {}

impl Hash for Container {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// ============================================================================
// Item
// ============================================================================

/// Which variant an [`Item`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Container,
    Element,
}

/// A tree node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    Element(Element),
    Container(Container),
}

impl Item {
    #[inline]
    pub fn id(&self) -> ItemId {
        match self {
            Item::Element(element) => element.id(),
            Item::Container(container) => container.id(),
        }
    }

    #[inline]
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Element(_) => ItemKind::Element,
            Item::Container(_) => ItemKind::Container,
        }
    }

    #[inline]
    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Item::Container(container) => Some(container),
            Item::Element(_) => None,
        }
    }

    #[inline]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Item::Element(element) => Some(element),
            Item::Container(_) => None,
        }
    }

    #[inline]
    pub fn as_container_mut(&mut self) -> Option<&mut Container> {
        match self {
            Item::Container(container) => Some(container),
            Item::Element(_) => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Item::Element(element) => Some(element),
            Item::Container(_) => None,
        }
    }
}

impl From<Element> for Item {
    fn from(element: Element) -> Self {
        Item::Element(element)
    }
}

impl From<Container> for Item {
    fn from(container: Container) -> Self {
        Item::Container(container)
    }
}
