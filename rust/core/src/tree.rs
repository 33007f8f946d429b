// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parent-linked model tree built from a raw scene description.
//!
//! Elements live in a slot map arena. Ownership flows strictly from parent to
//! child through the arena's child lists; the parent link is a plain key used
//! only for upward traversal. The builder rejects cycles and duplicate ids up
//! front, so no traversal needs to guard against them later.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::error::StructureError;
use crate::keys::{ElementId, ElementKey};
use crate::raw::{parse_scene, RawElement};

/// One node of the building-model hierarchy.
#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) id: ElementId,
    pub(crate) type_name: String,
    pub(crate) properties: BTreeMap<String, String>,
    pub(crate) parent: Option<ElementKey>,
    pub(crate) children: SmallVec<[ElementKey; 4]>,
    pub(crate) depth: u32,
    pub(crate) rank: u32,
}

impl Element {
    #[inline]
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// IFC type tag, e.g. `IfcWall`.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[inline]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    #[inline]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Distance from the root (the root has depth 0).
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Position in the tree's pre-order traversal.
    #[inline]
    pub fn rank(&self) -> u32 {
        self.rank
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// The full element hierarchy of one loaded model.
#[derive(Debug, Clone)]
pub struct ModelTree {
    elements: SlotMap<ElementKey, Element>,
    lookup: FxHashMap<ElementId, ElementKey>,
    root: ElementKey,
    pre_order: Vec<ElementKey>,
}

/// Builds a tree from an optional root, reporting an absent root as
/// [`StructureError::MissingRoot`].
pub fn build_tree(raw: Option<&RawElement>) -> Result<ModelTree, StructureError> {
    match raw {
        Some(root) => ModelTree::build(root),
        None => Err(StructureError::MissingRoot),
    }
}

impl ModelTree {
    /// Normalizes a raw scene description in a single pre-order traversal.
    ///
    /// Either the complete tree is returned or an error; nothing partial
    /// escapes.
    pub fn build(raw: &RawElement) -> Result<Self, StructureError> {
        let mut elements: SlotMap<ElementKey, Element> = SlotMap::with_key();
        let mut lookup: FxHashMap<ElementId, ElementKey> = FxHashMap::default();
        let mut pre_order: Vec<ElementKey> = Vec::new();

        // Iterative so deep hierarchies cannot overflow the stack. Children are
        // pushed in reverse so they pop in document order.
        let mut stack: Vec<(&RawElement, Option<ElementKey>)> = vec![(raw, None)];

        while let Some((node, parent)) = stack.pop() {
            if let Some(&existing) = lookup.get(&node.id) {
                return Err(classify_repeat(&elements, existing, parent, node.id));
            }

            let depth = parent.map_or(0, |p| elements[p].depth + 1);
            let key = elements.insert(Element {
                id: node.id,
                type_name: node.type_name.clone(),
                properties: node.properties.clone(),
                parent,
                children: SmallVec::new(),
                depth,
                rank: pre_order.len() as u32,
            });

            if let Some(p) = parent {
                elements[p].children.push(key);
            }
            lookup.insert(node.id, key);
            pre_order.push(key);

            for child in node.children.iter().rev() {
                stack.push((child, Some(key)));
            }
        }

        let root = pre_order[0];
        Ok(Self {
            elements,
            lookup,
            root,
            pre_order,
        })
    }

    /// Parses loader JSON and builds the tree.
    pub fn from_json(json: &str) -> Result<Self, StructureError> {
        let raw = parse_scene(json)?;
        build_tree(raw.as_ref())
    }

    #[inline]
    pub fn root(&self) -> &Element {
        &self.elements[self.root]
    }

    #[inline]
    pub fn root_key(&self) -> ElementKey {
        self.root
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: ElementId) -> bool {
        self.lookup.contains_key(&id)
    }

    #[inline]
    pub fn key_of(&self, id: ElementId) -> Option<ElementKey> {
        self.lookup.get(&id).copied()
    }

    /// O(1) lookup by element id.
    #[inline]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.lookup.get(&id).map(|&k| &self.elements[k])
    }

    #[inline]
    pub fn element(&self, key: ElementKey) -> Option<&Element> {
        self.elements.get(key)
    }

    pub fn parent_of(&self, element: &Element) -> Option<&Element> {
        element.parent.map(|p| &self.elements[p])
    }

    pub fn children_of<'a>(&'a self, element: &'a Element) -> impl Iterator<Item = &'a Element> + 'a {
        element.children.iter().map(move |&k| &self.elements[k])
    }

    /// Elements in pre-order (document order, parents before children).
    pub fn pre_order(&self) -> impl Iterator<Item = &Element> + '_ {
        self.pre_order.iter().map(move |&k| &self.elements[k])
    }

    /// Ancestors of `element`, nearest first, excluding the element itself.
    pub fn ancestors<'a>(&'a self, element: &'a Element) -> impl Iterator<Item = &'a Element> + 'a {
        std::iter::successors(self.parent_of(element), move |e| self.parent_of(e))
    }

    /// Ids to pre-expand in a navigation tree: the root followed by its
    /// first-child chain, `depth` levels deep, stopping early at a leaf.
    pub fn default_expanded(&self, depth: usize) -> Vec<ElementId> {
        let mut expanded = Vec::with_capacity(depth + 1);
        let mut current = self.root();
        expanded.push(current.id);
        for _ in 0..depth {
            let Some(&first) = current.children.first() else {
                break;
            };
            current = &self.elements[first];
            expanded.push(current.id);
        }
        expanded
    }
}

/// Decides whether a repeated id closes a cycle (it is an ancestor of the
/// node that lists it) or is a plain duplicate elsewhere in the tree.
fn classify_repeat(
    elements: &SlotMap<ElementKey, Element>,
    existing: ElementKey,
    parent: Option<ElementKey>,
    id: ElementId,
) -> StructureError {
    let mut cursor = parent;
    while let Some(k) = cursor {
        if k == existing {
            let parent_id = parent.map_or(id, |p| elements[p].id);
            return StructureError::Cycle {
                parent: parent_id,
                child: id,
            };
        }
        cursor = elements[k].parent;
    }
    StructureError::DuplicateId(id)
}
