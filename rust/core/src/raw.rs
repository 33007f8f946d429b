// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw scene description as produced by the external loader.
//!
//! The shape is `{id, type, properties, children[]}`. `expressID` is accepted
//! for `id` so web-ifc spatial structures deserialize directly. Property
//! values may be strings, numbers or booleans; they are stored as strings
//! because they only feed the search index. `null` values are dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StructureError;
use crate::keys::ElementId;

/// One node of the loader's nested scene description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawElement {
    #[serde(alias = "expressID")]
    pub id: ElementId,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default, deserialize_with = "de_properties")]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<RawElement>,
}

impl RawElement {
    pub fn new(id: u32, type_name: impl Into<String>) -> Self {
        Self {
            id: ElementId(id),
            type_name: type_name.into(),
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: RawElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = RawElement>) -> Self {
        self.children.extend(children);
        self
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// Parses a loader JSON document. `null` yields `Ok(None)` so the caller can
/// report a missing root distinctly from undecodable input.
pub fn parse_scene(json: &str) -> Result<Option<RawElement>, StructureError> {
    serde_json::from_str::<Option<RawElement>>(json)
        .map_err(|e| StructureError::InvalidInput(e.to_string()))
}

fn de_properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    let mut properties = BTreeMap::new();
    for (key, value) in raw.unwrap_or_default() {
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            // Nested structures are outside the searchable schema
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => continue,
        };
        properties.insert(key, text);
    }
    Ok(properties)
}
