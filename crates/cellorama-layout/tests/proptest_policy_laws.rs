//! Property-based tests for arrangement laws and snapshot diffs.
//!
//! 1. Grid cells are `(W − I_left − I_right − (n−1)·S) / n` wide
//! 2. A stack of k cards of height h is `h + o·(k−1)` tall
//! 3. Tab buckets partition the children; only the current one is shown
//! 4. Carousel height never shrinks while children are appended
//! 5. Sizing twice in a row gives the same size from the cache
//! 6. Patching a snapshot with its diff yields the target snapshot
//! 7. Moves are minimal: survivors outside the longest kept run

use cellorama_core::{
    Arrangement, Color, Container, Element, Fill, FixedContent, Insets, Item, ItemId, Size,
    SizeClass,
};
use cellorama_layout::policy::{self, arrange, grid_cell_width, segment_of};
use cellorama_layout::{
    Edit, IntrinsicSurface, LayoutConfig, LayoutContext, SectionSnapshot, SizingEngine, Snapshot,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rustc_hash::FxHashSet;

// ── Strategies ──────────────────────────────────────────────────────────

fn size_class() -> impl Strategy<Value = SizeClass> {
    prop::sample::select(SizeClass::FIXED.to_vec())
}

fn leaves(classes: &[SizeClass]) -> Vec<Item> {
    classes
        .iter()
        .map(|size| Element::new("x", *size, Color::Gray).into())
        .collect()
}

/// A permutation of `0..n` plus a random subset kept, as raw ids.
fn reorder(n: usize) -> impl Strategy<Value = Vec<u64>> {
    (
        Just((1..=n as u64).collect::<Vec<_>>()).prop_shuffle(),
        prop::collection::vec(any::<bool>(), n),
    )
        .prop_map(|(ids, keep)| {
            ids.into_iter()
                .zip(keep)
                .filter_map(|(id, k)| k.then_some(id))
                .collect()
        })
}

fn snapshot_pair() -> impl Strategy<Value = (Snapshot, Snapshot)> {
    (1usize..6, 0usize..6).prop_flat_map(|(sections, per)| {
        let total = sections * per;
        (
            Just((sections, per)),
            reorder(sections),
            prop::collection::vec(0usize..sections + 2, total),
            reorder(total),
            1usize..4,
        )
            .prop_map(|((sections, per), new_order, homes, items, extra)| {
                let section_id = |s: u64| ItemId::from_raw(1000 + s);
                let old = Snapshot {
                    sections: (0..sections)
                        .map(|s| SectionSnapshot {
                            id: section_id(s as u64 + 1),
                            items: (0..per)
                                .map(|i| ItemId::from_raw((s * per + i) as u64 + 1))
                                .collect(),
                        })
                        .collect(),
                };
                // Surviving sections in new order, plus `extra` fresh ones.
                let mut new_sections: Vec<SectionSnapshot> = new_order
                    .iter()
                    .map(|s| SectionSnapshot {
                        id: section_id(*s),
                        items: Vec::new(),
                    })
                    .collect();
                for e in 0..extra {
                    new_sections.push(SectionSnapshot {
                        id: section_id(500 + e as u64),
                        items: vec![ItemId::from_raw(900 + e as u64)],
                    });
                }
                let slots = new_sections.len();
                for (item, home) in items.iter().zip(homes) {
                    new_sections[home % slots].items.push(ItemId::from_raw(*item));
                }
                (
                    old,
                    Snapshot {
                        sections: new_sections,
                    },
                )
            })
    })
}

// ═══════════════════════════════════════════════════════════════════════
// 1. Grid column law
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn grid_cells_follow_column_law(
        columns in 1u16..8,
        extra in 0.0f32..2000.0,
        spacing in 0.0f32..30.0,
        inset in 0.0f32..20.0,
        count in 1usize..20,
    ) {
        let container = Container::new(leaves(&vec![SizeClass::Small; count]))
            .with_arrangement(Arrangement::grid(columns))
            .with_spacing(spacing)
            .with_insets(Insets::uniform(inset));
        let width = 2.0 * inset + extra;
        let expected =
            ((width - 2.0 * inset - f32::from(columns - 1) * spacing) / f32::from(columns)).max(0.0);
        prop_assert!((grid_cell_width(width - 2.0 * inset, columns, spacing) - expected).abs() < 1e-3);

        let sizes = vec![Some(Size::new(10.0, 10.0)); count];
        let plan = arrange(&container, width, &sizes, 0.0, &LayoutConfig::default());
        for frame in &plan.frames {
            prop_assert!((frame.rect.width - expected).abs() < 1e-3);
        }
        prop_assert_eq!(plan.groups.len(), count.div_ceil(usize::from(columns)));
        prop_assert!(plan.groups.iter().all(|row| row.len() <= usize::from(columns)));
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 2. Stack height law
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn stack_height_follows_law(
        k in 1usize..12,
        width in 16.0f32..800.0,
        offset in 0.0f32..60.0,
    ) {
        let config = LayoutConfig { stack_offset: offset, ..LayoutConfig::default() };
        let container = Container::new(leaves(&vec![SizeClass::Medium; k]))
            .with_arrangement(Arrangement::Stack);
        let sizes = vec![Some(Size::new(100.0, 60.0)); k];
        let plan = arrange(&container, width, &sizes, 0.0, &config);
        let h = (width - 16.0) * config.stack_aspect;
        let expected = h + offset * (k - 1) as f32 + 16.0;
        prop_assert!((plan.size.height - expected).abs() < 1e-2);
        prop_assert!(plan.frames.iter().all(|f| (f.rect.height - h).abs() < 1e-3));
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3. Tab partition
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tab_shows_exactly_one_bucket(
        count in 0usize..40,
        segments in 1usize..8,
        segment in 0usize..8,
        classes in prop::collection::vec(size_class(), 40),
    ) {
        let container = Container::new(leaves(&classes[..count]))
            .with_arrangement(Arrangement::Tab { segment, segments });
        let Arrangement::Tab { segment, .. } = container.arrangement() else {
            unreachable!("tab arrangement");
        };

        let mut covered = vec![0usize; count];
        for s in 0..segments {
            for index in policy::segment_range(count, segments, s) {
                covered[index] += 1;
            }
        }
        prop_assert!(covered.iter().all(|c| *c == 1));

        let mut ctx = LayoutContext::default();
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let node = engine.layout(&mut ctx, &mut surface, &container, 500.0);
        for (index, child) in node.children.iter().enumerate() {
            let shown = !child.hidden && !child.frame.is_empty();
            prop_assert_eq!(shown, segment_of(index, count, segments) == segment);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4–5. Carousel monotonicity and idempotence
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn carousel_height_never_shrinks(
        batches in prop::collection::vec(prop::collection::vec(size_class(), 1..5), 1..6),
    ) {
        let mut carousel = Container::default().with_arrangement(Arrangement::Carousel);
        let mut rng = SmallRng::seed_from_u64(0);
        let mut content = FixedContent::default();
        let mut ctx = LayoutContext::default();
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let mut last = 0.0f32;
        for batch in &batches {
            for size in batch {
                let fill = Fill { size: *size, ..Fill::default() };
                let inv = carousel.set_item_count(carousel.len() + 1, &fill, &mut content, &mut rng);
                ctx.apply(&inv);
            }
            let size = engine.measure_container(&mut ctx, &mut surface, &carousel, 320.0);
            prop_assert!(size.height >= last);
            last = size.height;
        }
    }

    #[test]
    fn sizing_is_idempotent(
        classes in prop::collection::vec(size_class(), 0..30),
        columns in 1u16..5,
        width in 0.0f32..1200.0,
    ) {
        let section = Container::new(leaves(&classes)).with_arrangement(Arrangement::grid(columns));
        let root = Container::new([Item::from(section)]).root();
        let mut ctx = LayoutContext::default();
        let mut surface = IntrinsicSurface::new();
        let mut engine = SizingEngine::new();
        let first = engine.measure_container(&mut ctx, &mut surface, &root, width);
        engine.reset_stats();
        let second = engine.measure_container(&mut ctx, &mut surface, &root, width);
        prop_assert_eq!(first, second);
        prop_assert!(engine.stats().is_pure_hit());
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 6–7. Snapshot diffs
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn patch_of_diff_reaches_target((old, new) in snapshot_pair()) {
        let edits = Snapshot::diff(&old, &new);
        prop_assert_eq!(old.patched(&edits), new);
    }

    #[test]
    fn section_moves_are_minimal((old, new) in snapshot_pair()) {
        let edits = Snapshot::diff(&old, &new);
        let old_ids: Vec<ItemId> = old.sections.iter().map(|s| s.id).collect();
        let positions: Vec<usize> = new
            .sections
            .iter()
            .filter_map(|s| old_ids.iter().position(|id| *id == s.id))
            .collect();
        let moves = edits
            .iter()
            .filter(|e| matches!(e, Edit::MoveSection { .. }))
            .count();
        prop_assert_eq!(moves, positions.len() - lis_len(&positions));

        let moved: FxHashSet<ItemId> = edits
            .iter()
            .filter_map(|e| match e {
                Edit::MoveSection { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        prop_assert_eq!(moved.len(), moves);
    }
}

/// Quadratic reference LIS length.
fn lis_len(values: &[usize]) -> usize {
    let mut best = vec![1usize; values.len()];
    for i in 0..values.len() {
        for j in 0..i {
            if values[j] < values[i] {
                best[i] = best[i].max(best[j] + 1);
            }
        }
    }
    best.into_iter().max().unwrap_or(0)
}
