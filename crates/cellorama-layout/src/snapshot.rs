#![forbid(unsafe_code)]

//! Snapshot capture and identity diffing.
//!
//! A [`Snapshot`] records the ordered section ids of a root and the ordered
//! leaf ids of each section. [`Snapshot::diff`] turns two snapshots into a
//! batch of [`Edit`]s a surface can animate.
//!
//! # Batch semantics
//!
//! Edits form one batch, not a sequence. Delete indices and move sources
//! refer to the old snapshot; insert indices and move targets refer to the
//! new one. [`Snapshot::patched`] applies a batch in that sense.
//!
//! # Minimal moves
//!
//! Survivors whose old positions form a longest increasing subsequence stay
//! put; only the rest are reported as moves.

use cellorama_core::id::ItemId;
use cellorama_core::item::{Container, Item};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// One section: its id and its leaf ids in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSnapshot {
    pub id: ItemId,
    pub items: Vec<ItemId>,
}

/// Ordered identities of a rendered tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub sections: Vec<SectionSnapshot>,
}

/// A single change in a batch update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Edit {
    DeleteSection {
        id: ItemId,
        index: usize,
    },
    InsertSection {
        id: ItemId,
        index: usize,
        items: Vec<ItemId>,
    },
    MoveSection {
        id: ItemId,
        from: usize,
        to: usize,
    },
    DeleteItem {
        id: ItemId,
        section: ItemId,
        index: usize,
    },
    InsertItem {
        id: ItemId,
        section: ItemId,
        index: usize,
    },
    MoveItem {
        id: ItemId,
        from_section: ItemId,
        from: usize,
        to_section: ItemId,
        to: usize,
    },
}

impl Edit {
    /// Whether this edit changes the section list.
    #[must_use]
    pub fn is_section_edit(&self) -> bool {
        matches!(
            self,
            Edit::DeleteSection { .. } | Edit::InsertSection { .. } | Edit::MoveSection { .. }
        )
    }
}

impl Snapshot {
    /// Sections are the root's container children; items are each
    /// section's leaf children. Anything else is not part of the snapshot.
    #[must_use]
    pub fn capture(root: &Container) -> Self {
        let sections = root
            .items()
            .iter()
            .filter_map(Item::as_container)
            .map(|section| SectionSnapshot {
                id: section.id(),
                items: section
                    .items()
                    .iter()
                    .filter_map(Item::as_element)
                    .map(|element| element.id())
                    .collect(),
            })
            .collect();
        Self { sections }
    }

    /// Total number of items across all sections.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// Edits that turn `old` into `new`.
    #[must_use]
    pub fn diff(old: &Snapshot, new: &Snapshot) -> Vec<Edit> {
        let mut edits = Vec::new();
        let old_ids: Vec<ItemId> = old.sections.iter().map(|s| s.id).collect();
        let new_ids: Vec<ItemId> = new.sections.iter().map(|s| s.id).collect();
        let sections = diff_sequence(&old_ids, &new_ids);

        for (index, id) in sections.deleted {
            edits.push(Edit::DeleteSection { id, index });
        }
        for (index, id) in sections.inserted {
            edits.push(Edit::InsertSection {
                id,
                index,
                items: new.sections[index].items.clone(),
            });
        }
        for (id, from, to) in sections.moved {
            edits.push(Edit::MoveSection { id, from, to });
        }

        // Item homes, restricted to sections present on both sides.
        let surviving: FxHashSet<ItemId> = new_ids
            .iter()
            .copied()
            .filter(|id| old_ids.contains(id))
            .collect();
        let old_home = homes(old, &surviving);
        let new_home = homes(new, &surviving);

        for section in old.sections.iter().filter(|s| surviving.contains(&s.id)) {
            let Some(after) = new.sections.iter().find(|s| s.id == section.id) else {
                continue;
            };
            let same_section = diff_sequence(&section.items, &after.items);
            for (index, id) in same_section.deleted {
                match new_home.get(&id) {
                    Some(&(to_section, to)) => edits.push(Edit::MoveItem {
                        id,
                        from_section: section.id,
                        from: index,
                        to_section,
                        to,
                    }),
                    None => edits.push(Edit::DeleteItem {
                        id,
                        section: section.id,
                        index,
                    }),
                }
            }
            for (index, id) in same_section.inserted {
                if !old_home.contains_key(&id) {
                    edits.push(Edit::InsertItem {
                        id,
                        section: section.id,
                        index,
                    });
                }
            }
            for (id, from, to) in same_section.moved {
                edits.push(Edit::MoveItem {
                    id,
                    from_section: section.id,
                    from,
                    to_section: section.id,
                    to,
                });
            }
        }
        edits
    }

    /// Apply a batch produced by [`diff`](Self::diff).
    #[must_use]
    pub fn patched(&self, edits: &[Edit]) -> Snapshot {
        let mut removed: FxHashSet<ItemId> = FxHashSet::default();
        let mut fresh: FxHashSet<ItemId> = FxHashSet::default();
        let mut placed: Vec<(usize, SectionSnapshot)> = Vec::new();
        for edit in edits {
            match edit {
                Edit::DeleteSection { id, .. } => {
                    removed.insert(*id);
                }
                Edit::InsertSection { id, index, items } => {
                    fresh.insert(*id);
                    placed.push((
                        *index,
                        SectionSnapshot {
                            id: *id,
                            items: items.clone(),
                        },
                    ));
                }
                Edit::MoveSection { id, to, .. } => {
                    removed.insert(*id);
                    if let Some(section) = self.sections.iter().find(|s| s.id == *id) {
                        placed.push((*to, section.clone()));
                    }
                }
                _ => {}
            }
        }

        let mut sections: Vec<SectionSnapshot> = self
            .sections
            .iter()
            .filter(|s| !removed.contains(&s.id))
            .cloned()
            .collect();
        placed.sort_by_key(|(index, _)| *index);
        for (index, section) in placed {
            let index = index.min(sections.len());
            sections.insert(index, section);
        }

        let mut leaving: FxHashSet<ItemId> = FxHashSet::default();
        let mut arriving: FxHashMap<ItemId, Vec<(usize, ItemId)>> = FxHashMap::default();
        for edit in edits {
            match *edit {
                Edit::DeleteItem { id, .. } => {
                    leaving.insert(id);
                }
                Edit::InsertItem { id, section, index } => {
                    arriving.entry(section).or_default().push((index, id));
                }
                Edit::MoveItem {
                    id,
                    to_section,
                    to,
                    ..
                } => {
                    leaving.insert(id);
                    arriving.entry(to_section).or_default().push((to, id));
                }
                _ => {}
            }
        }

        // Inserted sections already carry their final items.
        for section in sections.iter_mut().filter(|s| !fresh.contains(&s.id)) {
            section.items.retain(|id| !leaving.contains(id));
            if let Some(mut incoming) = arriving.remove(&section.id) {
                incoming.sort_by_key(|(index, _)| *index);
                for (index, id) in incoming {
                    let index = index.min(section.items.len());
                    section.items.insert(index, id);
                }
            }
        }
        Snapshot { sections }
    }
}

/// Where each item lives: section id and index, for the given sections.
fn homes(snapshot: &Snapshot, sections: &FxHashSet<ItemId>) -> FxHashMap<ItemId, (ItemId, usize)> {
    snapshot
        .sections
        .iter()
        .filter(|s| sections.contains(&s.id))
        .flat_map(|s| {
            s.items
                .iter()
                .enumerate()
                .map(move |(index, id)| (*id, (s.id, index)))
        })
        .collect()
}

/// Changes between two id sequences.
#[derive(Debug, Default)]
struct SequenceDiff {
    /// `(old index, id)` for ids missing from the new sequence.
    deleted: Vec<(usize, ItemId)>,
    /// `(new index, id)` for ids missing from the old sequence.
    inserted: Vec<(usize, ItemId)>,
    /// `(id, old index, new index)` for survivors outside the kept run.
    moved: Vec<(ItemId, usize, usize)>,
}

fn diff_sequence(old: &[ItemId], new: &[ItemId]) -> SequenceDiff {
    let old_index: FxHashMap<ItemId, usize> =
        old.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let new_set: FxHashSet<ItemId> = new.iter().copied().collect();

    let mut diff = SequenceDiff::default();
    for (index, id) in old.iter().enumerate() {
        if !new_set.contains(id) {
            diff.deleted.push((index, *id));
        }
    }

    // Survivors in new order, with their old positions.
    let mut survivors = Vec::new();
    for (index, id) in new.iter().enumerate() {
        match old_index.get(id) {
            Some(&from) => survivors.push((*id, from, index)),
            None => diff.inserted.push((index, *id)),
        }
    }
    let positions: Vec<usize> = survivors.iter().map(|(_, from, _)| *from).collect();
    let keep = longest_increasing(&positions);
    for ((id, from, to), kept) in survivors.into_iter().zip(keep) {
        if !kept {
            diff.moved.push((id, from, to));
        }
    }
    diff
}

/// Marks the members of one longest strictly increasing subsequence.
fn longest_increasing(values: &[usize]) -> Vec<bool> {
    // tails[k]: index of the smallest tail of an increasing run of length k+1.
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; values.len()];
    for (i, &value) in values.iter().enumerate() {
        let slot = tails.partition_point(|&t| values[t] < value);
        if slot > 0 {
            previous[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut keep = vec![false; values.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        keep[i] = true;
        cursor = previous[i];
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId::from_raw).collect()
    }

    fn snapshot(sections: &[(u64, &[u64])]) -> Snapshot {
        Snapshot {
            sections: sections
                .iter()
                .map(|(id, items)| SectionSnapshot {
                    id: ItemId::from_raw(*id),
                    items: ids(items),
                })
                .collect(),
        }
    }

    #[test]
    fn lis_marks_longest_run() {
        let keep = longest_increasing(&[2, 0, 1, 3]);
        assert_eq!(keep, vec![false, true, true, true]);
        assert!(longest_increasing(&[]).is_empty());
    }

    #[test]
    fn identical_snapshots_diff_to_nothing() {
        let s = snapshot(&[(1, &[10, 11]), (2, &[20])]);
        assert!(Snapshot::diff(&s, &s).is_empty());
    }

    #[test]
    fn rotation_is_one_move() {
        let old = snapshot(&[(1, &[]), (2, &[]), (3, &[])]);
        let new = snapshot(&[(2, &[]), (3, &[]), (1, &[])]);
        let edits = Snapshot::diff(&old, &new);
        assert_eq!(
            edits,
            vec![Edit::MoveSection {
                id: ItemId::from_raw(1),
                from: 0,
                to: 2
            }]
        );
        assert_eq!(old.patched(&edits), new);
    }

    #[test]
    fn cross_section_move() {
        let old = snapshot(&[(1, &[10, 11]), (2, &[20])]);
        let new = snapshot(&[(1, &[11]), (2, &[10, 20])]);
        let edits = Snapshot::diff(&old, &new);
        assert!(edits.contains(&Edit::MoveItem {
            id: ItemId::from_raw(10),
            from_section: ItemId::from_raw(1),
            from: 0,
            to_section: ItemId::from_raw(2),
            to: 0,
        }));
        assert_eq!(old.patched(&edits), new);
    }

    #[test]
    fn item_moving_into_new_section() {
        let old = snapshot(&[(1, &[10, 11])]);
        let new = snapshot(&[(1, &[11]), (2, &[10])]);
        let edits = Snapshot::diff(&old, &new);
        assert_eq!(old.patched(&edits), new);
    }

    #[test]
    fn items_of_deleted_section_are_inserted_elsewhere() {
        let old = snapshot(&[(1, &[10]), (2, &[20])]);
        let new = snapshot(&[(2, &[10, 20]), (3, &[30])]);
        let edits = Snapshot::diff(&old, &new);
        assert_eq!(old.patched(&edits), new);
        assert!(edits.iter().any(|e| matches!(e, Edit::InsertItem { .. })));
        assert!(edits.iter().any(|e| matches!(e, Edit::InsertSection { .. })));
        assert!(edits.iter().any(|e| matches!(e, Edit::DeleteSection { .. })));
    }
}
