// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection state machine.
//!
//! The selection moves between `Empty`, `Single` and `Multiple` as ids are
//! selected, added, removed and cleared. Preselection (hover highlight) is an
//! independent overlay that never changes the selection state.
//!
//! Every operation checks ids against the current tree and silently drops ids
//! the tree does not contain (they come from a stale generation), so the
//! selection is always a subset of the tree. The coordinator does not talk to
//! the engine or the URL itself: it reports a [`Transition`] and the session
//! turns changed transitions into highlight and fragment updates.

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::keys::ElementId;
use crate::tree::ModelTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SelectionState {
    Empty,
    Single,
    Multiple,
}

/// Current selection and preselection, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    primary: Option<ElementId>,
    selected: Vec<ElementId>,
    preselected: Vec<ElementId>,
}

impl Selection {
    /// The element whose properties are shown, if any.
    pub fn primary(&self) -> Option<ElementId> {
        self.primary
    }

    pub fn selected(&self) -> &[ElementId] {
        &self.selected
    }

    pub fn preselected(&self) -> &[ElementId] {
        &self.preselected
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn state(&self) -> SelectionState {
        match self.selected.len() {
            0 => SelectionState::Empty,
            1 => SelectionState::Single,
            _ => SelectionState::Multiple,
        }
    }

    /// Selected ids with the primary first, the order selection paths are
    /// written to a fragment in.
    pub fn primary_first(&self) -> Vec<ElementId> {
        let mut ids = Vec::with_capacity(self.selected.len());
        ids.extend(self.primary);
        ids.extend(self.selected.iter().copied().filter(|id| Some(*id) != self.primary));
        ids
    }
}

/// What an operation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transition {
    pub selection_changed: bool,
    pub preselection_changed: bool,
    /// The cut planes presented as "of the selection" must go as well.
    pub clear_cut_planes: bool,
}

impl Transition {
    const NONE: Transition = Transition {
        selection_changed: false,
        preselection_changed: false,
        clear_cut_planes: false,
    };

    const SELECTION: Transition = Transition {
        selection_changed: true,
        preselection_changed: false,
        clear_cut_planes: false,
    };

    pub fn is_noop(&self) -> bool {
        *self == Transition::NONE
    }

    /// Combined effect of two consecutive operations.
    pub fn merge(self, other: Transition) -> Transition {
        Transition {
            selection_changed: self.selection_changed || other.selection_changed,
            preselection_changed: self.preselection_changed || other.preselection_changed,
            clear_cut_planes: self.clear_cut_planes || other.clear_cut_planes,
        }
    }
}

/// Owns the selection for one session.
#[derive(Debug, Clone)]
pub struct SelectionCoordinator {
    selection: Selection,
    clear_cut_planes_on_deselect: bool,
}

impl SelectionCoordinator {
    pub fn new(clear_cut_planes_on_deselect: bool) -> Self {
        Self {
            selection: Selection::default(),
            clear_cut_planes_on_deselect,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Replaces the selection with `{id}`.
    pub fn select_single(&mut self, tree: &ModelTree, id: ElementId) -> Transition {
        if !accept(tree, id) {
            return Transition::NONE;
        }
        if self.selection.primary == Some(id) && self.selection.selected == [id] {
            return Transition::NONE;
        }
        self.selection.primary = Some(id);
        self.selection.selected.clear();
        self.selection.selected.push(id);
        Transition::SELECTION
    }

    /// Adds `id`; from `Empty` this is the same as [`select_single`].
    ///
    /// [`select_single`]: SelectionCoordinator::select_single
    pub fn add_to_selection(&mut self, tree: &ModelTree, id: ElementId) -> Transition {
        if !accept(tree, id) {
            return Transition::NONE;
        }
        if self.selection.is_empty() {
            return self.select_single(tree, id);
        }
        if self.selection.contains(id) {
            return Transition::NONE;
        }
        self.selection.selected.push(id);
        Transition::SELECTION
    }

    /// Drops `id`. If it was primary, the next remaining id becomes primary.
    pub fn remove_from_selection(&mut self, id: ElementId) -> Transition {
        let Some(pos) = self.selection.selected.iter().position(|s| *s == id) else {
            return Transition::NONE;
        };
        self.selection.selected.remove(pos);
        if self.selection.primary == Some(id) {
            self.selection.primary = self.selection.selected.first().copied();
        }
        Transition::SELECTION
    }

    /// Replaces the selection with the valid ids of `ids`, in order and
    /// without duplicates, and no primary. Used for search results.
    pub fn select_many(&mut self, tree: &ModelTree, ids: &[ElementId]) -> Transition {
        let selected = valid_unique(tree, ids);
        if self.selection.primary.is_none() && self.selection.selected == selected {
            return Transition::NONE;
        }
        self.selection.primary = None;
        self.selection.selected = selected;
        Transition::SELECTION
    }

    /// Any state → `Empty`. Whether cut planes go too is a policy.
    pub fn clear_selection(&mut self) -> Transition {
        let had_selection = !self.selection.selected.is_empty() || self.selection.primary.is_some();
        self.selection.selected.clear();
        self.selection.primary = None;
        Transition {
            selection_changed: had_selection,
            preselection_changed: false,
            clear_cut_planes: self.clear_cut_planes_on_deselect,
        }
    }

    /// Supersedes the preselected set.
    pub fn set_preselected(&mut self, tree: &ModelTree, ids: &[ElementId]) -> Transition {
        let preselected = valid_unique(tree, ids);
        if preselected == self.selection.preselected {
            return Transition::NONE;
        }
        self.selection.preselected = preselected;
        Transition {
            preselection_changed: true,
            ..Transition::NONE
        }
    }

    /// Forgets everything; used when the tree is replaced.
    pub fn reset(&mut self) {
        self.selection = Selection::default();
    }
}

fn accept(tree: &ModelTree, id: ElementId) -> bool {
    let known = tree.contains(id);
    if !known {
        tracing::debug!(%id, "ignoring id not in the current tree");
    }
    known
}

fn valid_unique(tree: &ModelTree, ids: &[ElementId]) -> Vec<ElementId> {
    let mut seen = FxHashSet::default();
    ids.iter()
        .copied()
        .filter(|id| accept(tree, *id) && seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawElement;

    fn tree() -> ModelTree {
        ModelTree::build(&RawElement::new(1, "IfcProject").with_children(
            (2..=6).map(|id| RawElement::new(id, "IfcWall")),
        ))
        .unwrap()
    }

    fn ids(raw: &[u32]) -> Vec<ElementId> {
        raw.iter().copied().map(ElementId).collect()
    }

    #[test]
    fn single_then_multiple_then_empty() {
        let tree = tree();
        let mut coordinator = SelectionCoordinator::new(true);
        assert_eq!(coordinator.selection().state(), SelectionState::Empty);

        assert!(coordinator.select_single(&tree, ElementId(3)).selection_changed);
        assert_eq!(coordinator.selection().state(), SelectionState::Single);
        assert_eq!(coordinator.selection().primary(), Some(ElementId(3)));

        assert!(coordinator.add_to_selection(&tree, ElementId(5)).selection_changed);
        assert_eq!(coordinator.selection().state(), SelectionState::Multiple);
        assert_eq!(coordinator.selection().primary(), Some(ElementId(3)));

        let transition = coordinator.clear_selection();
        assert!(transition.selection_changed);
        assert!(transition.clear_cut_planes);
        assert_eq!(coordinator.selection().state(), SelectionState::Empty);
        assert_eq!(coordinator.selection().primary(), None);
    }

    #[test]
    fn clearing_keeps_planes_when_policy_says_so() {
        let mut coordinator = SelectionCoordinator::new(false);
        assert!(!coordinator.clear_selection().clear_cut_planes);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let tree = tree();
        let mut coordinator = SelectionCoordinator::new(true);
        assert!(coordinator.select_single(&tree, ElementId(99)).is_noop());
        assert!(coordinator.add_to_selection(&tree, ElementId(99)).is_noop());
        assert!(coordinator.selection().is_empty());
    }

    #[test]
    fn repeated_operations_are_noops() {
        let tree = tree();
        let mut coordinator = SelectionCoordinator::new(true);
        coordinator.select_single(&tree, ElementId(2));
        assert!(coordinator.select_single(&tree, ElementId(2)).is_noop());
        coordinator.add_to_selection(&tree, ElementId(4));
        assert!(coordinator.add_to_selection(&tree, ElementId(4)).is_noop());
        assert_eq!(coordinator.selection().selected(), ids(&[2, 4]).as_slice());
    }

    #[test]
    fn add_from_empty_sets_primary() {
        let tree = tree();
        let mut coordinator = SelectionCoordinator::new(true);
        coordinator.add_to_selection(&tree, ElementId(6));
        assert_eq!(coordinator.selection().state(), SelectionState::Single);
        assert_eq!(coordinator.selection().primary(), Some(ElementId(6)));
    }

    #[test]
    fn removing_primary_promotes_next() {
        let tree = tree();
        let mut coordinator = SelectionCoordinator::new(true);
        coordinator.select_single(&tree, ElementId(2));
        coordinator.add_to_selection(&tree, ElementId(3));
        coordinator.add_to_selection(&tree, ElementId(4));
        coordinator.remove_from_selection(ElementId(2));
        assert_eq!(coordinator.selection().primary(), Some(ElementId(3)));
        assert!(coordinator.remove_from_selection(ElementId(42)).is_noop());
    }

    #[test]
    fn select_many_filters_and_dedupes() {
        let tree = tree();
        let mut coordinator = SelectionCoordinator::new(true);
        coordinator.select_many(&tree, &ids(&[4, 99, 2, 4]));
        assert_eq!(coordinator.selection().selected(), ids(&[4, 2]).as_slice());
        assert_eq!(coordinator.selection().primary(), None);
        assert!(coordinator.select_many(&tree, &ids(&[4, 2])).is_noop());
    }

    #[test]
    fn preselection_is_independent() {
        let tree = tree();
        let mut coordinator = SelectionCoordinator::new(true);
        coordinator.select_single(&tree, ElementId(2));
        let transition = coordinator.set_preselected(&tree, &ids(&[5, 6, 77]));
        assert!(transition.preselection_changed);
        assert!(!transition.selection_changed);
        assert_eq!(coordinator.selection().preselected(), ids(&[5, 6]).as_slice());
        assert_eq!(coordinator.selection().state(), SelectionState::Single);

        coordinator.clear_selection();
        assert_eq!(coordinator.selection().preselected(), ids(&[5, 6]).as_slice());
    }

    #[test]
    fn primary_first_ordering() {
        let tree = tree();
        let mut coordinator = SelectionCoordinator::new(true);
        coordinator.select_many(&tree, &ids(&[2, 3]));
        coordinator.add_to_selection(&tree, ElementId(4));
        assert_eq!(coordinator.selection().primary_first(), ids(&[2, 3, 4]));

        coordinator.select_single(&tree, ElementId(5));
        coordinator.add_to_selection(&tree, ElementId(2));
        coordinator.remove_from_selection(ElementId(5));
        coordinator.add_to_selection(&tree, ElementId(5));
        assert_eq!(coordinator.selection().primary_first(), ids(&[2, 5]));
    }
}
