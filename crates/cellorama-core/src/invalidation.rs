#![forbid(unsafe_code)]

//! Cache invalidation sets produced by tree mutations.
//!
//! A mutation never touches a size cache directly. It reports which ids went
//! stale, and the owner of the cache applies the report. Sizes and
//! max-height hints are tracked separately: structural edits keep a carousel's
//! height hint (it only ever grows), while a size-class change drops it.

use rustc_hash::FxHashSet;

use crate::id::ItemId;

/// Ids whose cached layout data is stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidation {
    sizes: FxHashSet<ItemId>,
    heights: FxHashSet<ItemId>,
    full_clear: bool,
}

impl Invalidation {
    /// Nothing stale.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything stale: the cache must be cleared.
    #[must_use]
    pub fn full() -> Self {
        Self {
            full_clear: true,
            ..Self::default()
        }
    }

    /// Mark the cached size of `id` stale.
    pub fn mark(&mut self, id: ItemId) {
        self.sizes.insert(id);
    }

    /// Mark the cached size of each id stale.
    pub fn mark_all(&mut self, ids: impl IntoIterator<Item = ItemId>) {
        self.sizes.extend(ids);
    }

    /// Mark the max-height hint of `id` stale.
    pub fn mark_height(&mut self, id: ItemId) {
        self.heights.insert(id);
    }

    /// Request a full cache clear.
    pub fn request_full_clear(&mut self) {
        self.full_clear = true;
    }

    /// Fold another invalidation into this one.
    pub fn merge(&mut self, other: Invalidation) {
        self.sizes.extend(other.sizes);
        self.heights.extend(other.heights);
        self.full_clear |= other.full_clear;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.full_clear && self.sizes.is_empty() && self.heights.is_empty()
    }

    #[must_use]
    pub fn requires_full_clear(&self) -> bool {
        self.full_clear
    }

    /// Whether the cached size of `id` is stale.
    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.full_clear || self.sizes.contains(&id)
    }

    /// Whether the max-height hint of `id` is stale.
    #[must_use]
    pub fn contains_height(&self, id: ItemId) -> bool {
        self.full_clear || self.heights.contains(&id)
    }

    /// Ids with stale sizes (unordered).
    pub fn sizes(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.sizes.iter().copied()
    }

    /// Ids with stale max-height hints (unordered).
    pub fn heights(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.heights.iter().copied()
    }

    /// Number of ids with stale sizes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        let inv = Invalidation::new();
        assert!(inv.is_empty());
        assert!(!inv.contains(ItemId::from_raw(1)));
    }

    #[test]
    fn full_contains_everything() {
        let inv = Invalidation::full();
        assert!(!inv.is_empty());
        assert!(inv.contains(ItemId::from_raw(99)));
        assert!(inv.contains_height(ItemId::from_raw(99)));
    }

    #[test]
    fn merge_unions_sets_and_flags() {
        let mut a = Invalidation::new();
        a.mark(ItemId::from_raw(1));
        let mut b = Invalidation::new();
        b.mark(ItemId::from_raw(2));
        b.mark_height(ItemId::from_raw(3));
        a.merge(b);
        assert_eq!(a.len(), 2);
        assert!(a.contains_height(ItemId::from_raw(3)));
        assert!(!a.requires_full_clear());
        a.merge(Invalidation::full());
        assert!(a.requires_full_clear());
    }
}
