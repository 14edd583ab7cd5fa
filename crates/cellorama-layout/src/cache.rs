#![forbid(unsafe_code)]

//! Size cache keyed by item identity.
//!
//! [`SizeCache`] memoizes the last measured size of every item, and the
//! tallest child each scrolling container has shown so far.
//!
//! # Keys
//!
//! Entries are keyed by [`ItemId`] and remember the width they were
//! measured at. A lookup at a different width is a miss, so a resize never
//! needs explicit invalidation. Widths compare bit-for-bit.
//!
//! # Invalidation
//!
//! Mutations report stale ids through an [`Invalidation`]; feed it to
//! [`SizeCache::apply`]. Entries for ids no longer in the tree are only
//! dropped by [`SizeCache::clear`].
//!
//! # Max-height hints
//!
//! [`SizeCache::set_max_height`] never lowers a hint. Carousels use it so
//! their height does not jitter while scrolling.

use cellorama_core::geometry::{Size, clamp_extent};
use cellorama_core::id::ItemId;
use cellorama_core::invalidation::Invalidation;
use cellorama_core::item::Container;
use rustc_hash::FxHashMap;

/// Cached size with the width it was measured at.
#[derive(Clone, Copy, Debug)]
struct CachedSize {
    size: Size,
    /// `None` when written without a width; such entries match any width.
    width: Option<f32>,
}

impl CachedSize {
    fn matches(&self, width: f32) -> bool {
        self.width.is_none_or(|w| w.to_bits() == width.to_bits())
    }
}

/// Statistics about size cache performance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeCacheStats {
    /// Number of cached sizes.
    pub entries: usize,
    /// Number of max-height hints.
    pub hints: usize,
    /// Width-checked lookups that hit since creation or last reset.
    pub hits: u64,
    /// Width-checked lookups that missed since creation or last reset.
    pub misses: u64,
    /// Hit rate as a fraction (0.0 to 1.0).
    pub hit_rate: f64,
}

/// Identity-keyed store of measured sizes and max-height hints.
#[derive(Debug, Default, Clone)]
pub struct SizeCache {
    sizes: FxHashMap<ItemId, CachedSize>,
    max_heights: FxHashMap<ItemId, f32>,
    hits: u64,
    misses: u64,
}

impl SizeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last measured size of `id`, at whatever width.
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<Size> {
        self.sizes.get(&id).map(|entry| entry.size)
    }

    /// Size of `id` if it was measured at exactly `width`.
    ///
    /// Counts toward [`stats`](Self::stats).
    pub fn get_at_width(&mut self, id: ItemId, width: f32) -> Option<Size> {
        match self.sizes.get(&id) {
            Some(entry) if entry.matches(width) => {
                self.hits += 1;
                Some(entry.size)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a size valid at any width.
    pub fn set(&mut self, id: ItemId, size: Size) {
        self.sizes.insert(id, CachedSize { size, width: None });
    }

    /// Store a size measured at `width`.
    pub fn set_at_width(&mut self, id: ItemId, width: f32, size: Size) {
        self.sizes.insert(
            id,
            CachedSize {
                size,
                width: Some(width),
            },
        );
    }

    /// Tallest child height recorded for `id`, or zero.
    #[must_use]
    pub fn max_height(&self, id: ItemId) -> f32 {
        self.max_heights.get(&id).copied().unwrap_or(0.0)
    }

    /// The hint for `container` grown by its vertical insets.
    #[must_use]
    pub fn adjusted_max_height(&self, container: &Container) -> f32 {
        container.max_height(self.max_height(container.id()))
    }

    /// Raise the hint for `id` to `height`. Returns whether it grew.
    pub fn set_max_height(&mut self, id: ItemId, height: f32) -> bool {
        let height = clamp_extent(height);
        let slot = self.max_heights.entry(id).or_insert(0.0);
        if height > *slot {
            *slot = height;
            true
        } else {
            false
        }
    }

    /// Drop the cached size of `id`. Returns whether one existed.
    pub fn invalidate(&mut self, id: ItemId) -> bool {
        self.sizes.remove(&id).is_some()
    }

    /// Drop the max-height hint of `id`.
    pub fn invalidate_max_height(&mut self, id: ItemId) -> bool {
        self.max_heights.remove(&id).is_some()
    }

    /// Evict everything `invalidation` marks stale.
    ///
    /// Returns the number of entries removed.
    pub fn apply(&mut self, invalidation: &Invalidation) -> usize {
        if invalidation.requires_full_clear() {
            let removed = self.sizes.len() + self.max_heights.len();
            self.clear();
            tracing::debug!(removed, "size cache cleared");
            return removed;
        }
        let mut removed = 0;
        for id in invalidation.sizes() {
            removed += usize::from(self.invalidate(id));
        }
        for id in invalidation.heights() {
            removed += usize::from(self.invalidate_max_height(id));
        }
        tracing::debug!(
            stale = invalidation.len(),
            removed,
            remaining = self.sizes.len(),
            "size cache invalidated"
        );
        removed
    }

    /// Drop every size and hint. Statistics are kept.
    pub fn clear(&mut self) {
        self.sizes.clear();
        self.max_heights.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn stats(&self) -> SizeCacheStats {
        let total = self.hits + self.misses;
        SizeCacheStats {
            entries: self.sizes.len(),
            hints: self.max_heights.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Reset statistics counters to zero.
    #[inline]
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }
}
