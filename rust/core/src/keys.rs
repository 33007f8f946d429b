// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifier and key types for model elements.
//!
//! [`ElementId`] is the stable identifier supplied by the loader (the IFC
//! express id) and is what travels through URLs, picks and the JS boundary.
//! [`ElementKey`] is the arena key of an element inside one [`ModelTree`];
//! keys are never valid across tree generations, so anything that outlives a
//! load holds ids, not keys.
//!
//! [`ModelTree`]: crate::tree::ModelTree

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Arena key of an element within a single model tree.
    pub struct ElementKey;
}

/// Stable element identifier from the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u32);

impl ElementId {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for ElementId {
    fn from(id: u32) -> Self {
        ElementId(id)
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ElementId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(ElementId)
    }
}
