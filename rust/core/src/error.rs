// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the view core.
//!
//! Every error here is recoverable at the component boundary: a bad model
//! load leaves the previous model in place, a bad fragment segment is
//! skipped, a stale path resolves to "no selection", and a pick without
//! geometry still selects.

use crate::keys::ElementId;

/// Result type alias for view-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while normalizing a raw scene description into a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    /// The loader produced no root node.
    #[error("scene description has no root element")]
    MissingRoot,

    /// Two nodes share an identifier.
    #[error("duplicate element id {0}")]
    DuplicateId(ElementId),

    /// A node lists itself or one of its ancestors as a child.
    #[error("element {child} is listed as a child of its descendant {parent}")]
    Cycle { parent: ElementId, child: ElementId },

    /// The raw input could not be decoded at all.
    #[error("invalid scene description: {0}")]
    InvalidInput(String),
}

/// A single fragment segment that could not be applied.
///
/// `index` is the position of the segment within the `::`-separated
/// fragment, counting empty segments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("segment {index}: unknown tag '{tag}'")]
    UnknownTag { index: usize, tag: String },

    #[error("segment {index}: missing ':' after tag in '{segment}'")]
    MissingTag { index: usize, segment: String },

    #[error("segment {index} ({tag}): {reason}")]
    Malformed {
        index: usize,
        tag: char,
        reason: String,
    },

    #[error("segment {index} ({tag}): non-finite number")]
    NonFinite { index: usize, tag: char },

    #[error("segment {index}: camera already given by an earlier segment")]
    DuplicateCamera { index: usize },
}

impl CodecError {
    /// Position of the offending segment within the fragment.
    pub fn index(&self) -> usize {
        match self {
            CodecError::UnknownTag { index, .. }
            | CodecError::MissingTag { index, .. }
            | CodecError::Malformed { index, .. }
            | CodecError::NonFinite { index, .. }
            | CodecError::DuplicateCamera { index } => *index,
        }
    }
}

/// Path resolution stopped before reaching the target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("path does not resolve at depth {depth} (id {id:?})")]
pub struct PathMiss {
    /// Number of path entries that matched before the miss.
    pub depth: usize,
    /// The id that failed to match, `None` for an empty path.
    pub id: Option<ElementId>,
}

/// The engine has no visual geometry for an otherwise valid element
/// (e.g. `IfcSite` or `IfcBuildingStorey`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no geometry for elements {ids:?}")]
pub struct PickMiss {
    pub ids: Vec<ElementId>,
}

/// Top-level error for session operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("structure error: {0}")]
    Structure(#[from] StructureError),

    #[error("invalid configuration: {0}")]
    Config(String),
}
