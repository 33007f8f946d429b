// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Root-to-element paths.
//!
//! A path is the sequence of ids from the root (inclusive) down to an element
//! (inclusive). It is how a selection is addressed in a shared link, so it
//! must survive a reload of the same model and fail cleanly against any other
//! model. [`compute_path`] and [`resolve_path`] are mutual inverses for every
//! element of the tree that produced the path.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::PathMiss;
use crate::keys::ElementId;
use crate::tree::{Element, ModelTree};

/// Ordered ids from the root to a target element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementPath(SmallVec<[ElementId; 8]>);

impl ElementPath {
    pub fn new(ids: impl IntoIterator<Item = ElementId>) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn from_ids(ids: &[u32]) -> Self {
        Self(ids.iter().copied().map(ElementId).collect())
    }

    #[inline]
    pub fn ids(&self) -> &[ElementId] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The addressed element's id.
    #[inline]
    pub fn leaf(&self) -> Option<ElementId> {
        self.0.last().copied()
    }

    /// Parses a path from a URL pathname tail such as `/1/3` or `1/3/`.
    /// Returns `None` if any non-empty segment is not an id.
    pub fn from_url_segments(segments: &str) -> Option<Self> {
        let mut ids = SmallVec::new();
        for part in segments.split('/').filter(|s| !s.is_empty()) {
            ids.push(part.parse::<ElementId>().ok()?);
        }
        Some(Self(ids))
    }

    /// Renders the path as URL pathname segments: `1/3`.
    pub fn to_url_segments(&self) -> String {
        self.join('/')
    }

    fn join(&self, sep: char) -> String {
        let mut out = String::with_capacity(self.0.len() * 4);
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(sep);
            }
            out.push_str(&id.to_string());
        }
        out
    }
}

impl std::fmt::Display for ElementPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.join(','))
    }
}

impl std::str::FromStr for ElementPath {
    type Err = std::num::ParseIntError;

    /// Parses the comma-separated form used in fragments.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.split(',')
            .map(str::parse::<ElementId>)
            .collect::<std::result::Result<SmallVec<_>, _>>()
            .map(ElementPath)
    }
}

impl FromIterator<ElementId> for ElementPath {
    fn from_iter<T: IntoIterator<Item = ElementId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Walks parent links from `element` to the root and reverses.
pub fn compute_path(tree: &ModelTree, element: &Element) -> ElementPath {
    let mut ids: SmallVec<[ElementId; 8]> = SmallVec::with_capacity(element.depth() as usize + 1);
    ids.push(element.id());
    ids.extend(tree.ancestors(element).map(Element::id));
    ids.reverse();
    ElementPath(ids)
}

/// Path of the element with `id`, or `None` if the tree does not contain it.
pub fn path_of(tree: &ModelTree, id: ElementId) -> Option<ElementPath> {
    tree.get(id).map(|element| compute_path(tree, element))
}

/// Descends from the root, requiring each next id to be a direct child.
///
/// A path from another tree generation, an unknown id, a wrong root or an
/// empty path all produce a [`PathMiss`]; nothing partial is returned.
pub fn resolve_path<'t>(tree: &'t ModelTree, path: &ElementPath) -> Result<&'t Element, PathMiss> {
    let mut ids = path.ids().iter().copied();
    let first = ids.next().ok_or(PathMiss { depth: 0, id: None })?;

    let mut current = tree.root();
    if current.id() != first {
        return Err(PathMiss {
            depth: 0,
            id: Some(first),
        });
    }

    for (depth, next) in ids.enumerate() {
        current = tree
            .children_of(current)
            .find(|child| child.id() == next)
            .ok_or(PathMiss {
                depth: depth + 1,
                id: Some(next),
            })?;
    }
    Ok(current)
}
