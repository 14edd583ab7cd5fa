#![forbid(unsafe_code)]

//! Structural edits on the item tree.
//!
//! Every operation edits a [`Container`] in place and returns the
//! [`Invalidation`] it caused. Clone first (cheap, thanks to structural
//! sharing) if the previous tree must be kept.
//!
//! # Invalidation rules
//!
//! A container whose children changed is stale, and so is every ancestor up
//! to the container the operation was called on. Each recursion level reports
//! whether anything below it changed; the caller marks the child, and the
//! entry point marks itself.
//!
//! # Root vs. section granularity
//!
//! Item-level randomization only touches non-root containers; section-level
//! randomization only touches the root. The check happens at each level.

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::content::ContentSource;
use crate::generate::{Fill, elements, sections};
use crate::id::ItemId;
use crate::invalidation::Invalidation;
use crate::item::{Arrangement, Container, Item, SizeClass};

/// Largest number of nodes a single randomized insert adds.
pub const MAX_RANDOM_INSERT: usize = 5;

// ============================================================================
// RandomizeKind
// ============================================================================

/// A structural churn operation used to exercise the sizing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RandomizeKind {
    #[default]
    MoveItems,
    InsertItems,
    DeleteItems,
    MoveSections,
    InsertSections,
    DeleteSections,
}

impl RandomizeKind {
    /// Every kind, in cycling order.
    pub const ALL: [RandomizeKind; 6] = [
        RandomizeKind::MoveItems,
        RandomizeKind::InsertItems,
        RandomizeKind::DeleteItems,
        RandomizeKind::MoveSections,
        RandomizeKind::InsertSections,
        RandomizeKind::DeleteSections,
    ];

    /// The following kind, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Whether this kind acts on sections (root children).
    #[must_use]
    pub fn is_section_level(self) -> bool {
        matches!(
            self,
            RandomizeKind::MoveSections
                | RandomizeKind::InsertSections
                | RandomizeKind::DeleteSections
        )
    }
}

impl fmt::Display for RandomizeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RandomizeKind::MoveItems => "move-items",
            RandomizeKind::InsertItems => "insert-items",
            RandomizeKind::DeleteItems => "delete-items",
            RandomizeKind::MoveSections => "move-sections",
            RandomizeKind::InsertSections => "insert-sections",
            RandomizeKind::DeleteSections => "delete-sections",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Operations
// ============================================================================

impl Container {
    /// Truncate or pad the children to `count`.
    ///
    /// Roots pad with sections built from `fill`; other containers pad with
    /// leaves. Sub-containers that survive are resized to `fill.items`
    /// recursively and keep their identity.
    pub fn set_item_count<R: Rng>(
        &mut self,
        count: usize,
        fill: &Fill,
        content: &mut dyn ContentSource,
        rng: &mut R,
    ) -> Invalidation {
        let mut inv = Invalidation::new();
        if self.resize_children(count, fill, content, rng, &mut inv) {
            inv.mark(self.id);
        }
        tracing::debug!(container = %self.id, count, stale = inv.len(), "set item count");
        inv
    }

    /// Resize every section directly under this container to `count` leaves.
    ///
    /// Leaves sitting directly in this container are left alone.
    pub fn set_items_per_section<R: Rng>(
        &mut self,
        count: usize,
        fill: &Fill,
        content: &mut dyn ContentSource,
        rng: &mut R,
    ) -> Invalidation {
        let mut inv = Invalidation::new();
        let mut changed = false;
        for section in self.items.iter_mut().filter_map(Item::as_container_mut) {
            if section.resize_children(count, fill, content, rng, &mut inv) {
                inv.mark(section.id);
                changed = true;
            }
        }
        if changed {
            inv.mark(self.id);
        }
        inv
    }

    fn resize_children<R: Rng>(
        &mut self,
        count: usize,
        fill: &Fill,
        content: &mut dyn ContentSource,
        rng: &mut R,
        inv: &mut Invalidation,
    ) -> bool {
        let mut changed = false;
        if self.items.len() > count {
            self.items.truncate(count);
            changed = true;
        }
        for child in self.items.iter_mut().filter_map(Item::as_container_mut) {
            if child.resize_children(fill.items, fill, content, rng, inv) {
                inv.mark(child.id);
                changed = true;
            }
        }
        let missing = count - self.items.len();
        if missing > 0 {
            let padding = if self.is_root {
                sections(missing, fill, content, rng)
            } else {
                elements(missing, fill.size, content)
            };
            self.items.extend(padding);
            changed = true;
        }
        changed
    }

    /// Give every leaf in the subtree the size class `size`.
    ///
    /// Leaves are replaced in place and keep their identity. Height hints of
    /// every container above a changed leaf are dropped too.
    pub fn set_size(&mut self, size: SizeClass) -> Invalidation {
        let mut inv = Invalidation::new();
        if self.apply_size(size, &mut inv) {
            inv.mark(self.id);
            inv.mark_height(self.id);
            self.max_item_height = 0.0;
        }
        inv
    }

    fn apply_size(&mut self, size: SizeClass, inv: &mut Invalidation) -> bool {
        let mut changed = false;
        for item in self.items.iter_mut() {
            match item {
                Item::Element(element) => {
                    if element.size != size {
                        *element = element.with_size(size);
                        inv.mark(element.id());
                        changed = true;
                    }
                }
                Item::Container(child) => {
                    if child.apply_size(size, inv) {
                        inv.mark(child.id);
                        inv.mark_height(child.id);
                        child.max_item_height = 0.0;
                        changed = true;
                    }
                }
            }
        }
        changed
    }

    /// Switch every grid in the subtree to `columns` columns.
    ///
    /// Cell widths change, so a changed grid's whole subtree goes stale.
    pub fn set_column_count(&mut self, columns: u16) -> Invalidation {
        let mut inv = Invalidation::new();
        if self.apply_columns(columns, &mut inv) {
            inv.mark(self.id);
        }
        inv
    }

    fn apply_columns(&mut self, columns: u16, inv: &mut Invalidation) -> bool {
        let mut changed = false;
        if self.arrangement.is_grid() {
            let next = Arrangement::grid(columns);
            if self.arrangement != next {
                self.arrangement = next;
                inv.mark_all(self.descendant_ids());
                changed = true;
            }
        }
        for child in self.items.iter_mut().filter_map(Item::as_container_mut) {
            if child.apply_columns(columns, inv) {
                inv.mark(child.id);
                changed = true;
            }
        }
        changed
    }

    /// Select segment `segment` of the tab container `target`.
    ///
    /// Which children are visible changes, so the tab's whole subtree goes
    /// stale along with its ancestors. A missing id, a non-tab target or an
    /// unchanged segment is a no-op.
    pub fn set_segment(&mut self, target: ItemId, segment: usize) -> Invalidation {
        let Some(path) = self.path_to(target) else {
            return Invalidation::new();
        };
        let Some(tab) = self.find_container_mut(target) else {
            return Invalidation::new();
        };
        let Arrangement::Tab {
            segment: current,
            segments,
        } = tab.arrangement
        else {
            return Invalidation::new();
        };
        let segment = segment.min(segments.saturating_sub(1));
        if segment == current {
            return Invalidation::new();
        }
        tab.arrangement = Arrangement::Tab { segment, segments };

        let mut inv = Invalidation::new();
        inv.mark_all(tab.descendant_ids());
        inv.mark_all(path);
        tracing::debug!(tab = %target, segment, stale = inv.len(), "segment selected");
        inv
    }

    /// Apply one round of random structural churn.
    ///
    /// Children are randomized first, then this level. With
    /// `fill.transitions`, non-root containers also re-roll their
    /// arrangement, which requests a full cache clear.
    pub fn randomize<R: Rng>(
        &mut self,
        kind: RandomizeKind,
        fill: &Fill,
        content: &mut dyn ContentSource,
        rng: &mut R,
    ) -> Invalidation {
        let mut inv = Invalidation::new();
        if self.randomize_level(kind, fill, content, rng, &mut inv) {
            inv.mark(self.id);
        }
        tracing::debug!(%kind, stale = inv.len(), full = inv.requires_full_clear(), "randomized");
        inv
    }

    fn randomize_level<R: Rng>(
        &mut self,
        kind: RandomizeKind,
        fill: &Fill,
        content: &mut dyn ContentSource,
        rng: &mut R,
        inv: &mut Invalidation,
    ) -> bool {
        let mut changed = false;
        for child in self.items.iter_mut().filter_map(Item::as_container_mut) {
            if child.randomize_level(kind, fill, content, rng, inv) {
                inv.mark(child.id);
                changed = true;
            }
        }

        if fill.transitions && !self.is_root {
            let next = fill.style.arrangement(rng);
            if next != self.arrangement {
                self.arrangement = next;
                inv.request_full_clear();
                changed = true;
            }
        }

        let touched = match (kind, self.is_root) {
            (RandomizeKind::MoveItems, false) | (RandomizeKind::MoveSections, true) => {
                self.shuffle(rng)
            }
            (RandomizeKind::InsertItems, false) => {
                let count = rng.random_range(1..=MAX_RANDOM_INSERT);
                let fresh = elements(count, fill.size, content);
                self.insert_randomly(fresh, rng)
            }
            (RandomizeKind::InsertSections, true) => {
                let count = rng.random_range(1..=MAX_RANDOM_INSERT);
                let fresh = sections(count, fill, content, rng);
                self.insert_randomly(fresh, rng)
            }
            (RandomizeKind::DeleteItems, false) | (RandomizeKind::DeleteSections, true) => {
                self.delete_half(rng)
            }
            _ => false,
        };
        changed || touched
    }

    fn shuffle<R: Rng>(&mut self, rng: &mut R) -> bool {
        if self.items.len() < 2 {
            return false;
        }
        let mut items: Vec<Item> = self.items.iter().cloned().collect();
        items.shuffle(rng);
        self.items = items.into_iter().collect();
        true
    }

    fn insert_randomly<R: Rng>(&mut self, fresh: Vec<Item>, rng: &mut R) -> bool {
        let inserted = !fresh.is_empty();
        for item in fresh {
            let index = rng.random_range(0..=self.items.len());
            self.items.insert(index, item);
        }
        inserted
    }

    fn delete_half<R: Rng>(&mut self, rng: &mut R) -> bool {
        let count = self.items.len() / 2;
        for _ in 0..count {
            let index = rng.random_range(0..self.items.len());
            self.items.remove(index);
        }
        count > 0
    }
}
