// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Search index over a model tree's elements.
//!
//! Each element's searchable text is its type tag followed by its property
//! values, lower-cased and joined by single spaces. Queries match as
//! case-insensitive substrings of that text and results come back in tree
//! pre-order, which is a total order, so there is no relevance ranking and no
//! tie-breaking.
//!
//! Tokens (maximal alphanumeric runs of the text) are posted to the element
//! ids they occur in. A query made only of alphanumerics is a substring of the
//! text exactly when it is a substring of a single token, so such queries are
//! answered from the postings; anything else falls back to scanning the
//! texts.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::keys::ElementId;
use crate::tree::{Element, ModelTree};

/// Immutable token index for one tree generation.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    /// token → ids in pre-order, each id at most once
    postings: FxHashMap<String, Vec<ElementId>>,
    /// (id, searchable text) in pre-order
    texts: Vec<(ElementId, String)>,
    ranks: FxHashMap<ElementId, u32>,
}

impl SearchIndex {
    /// Full build over every element of `tree`.
    pub fn build(tree: &ModelTree) -> Self {
        let mut postings: FxHashMap<String, Vec<ElementId>> = FxHashMap::default();
        let mut texts = Vec::with_capacity(tree.len());
        let mut ranks = FxHashMap::default();
        ranks.reserve(tree.len());

        for element in tree.pre_order() {
            let text = searchable_text(element);
            for token in tokenize(&text) {
                let ids = postings.entry(token.to_string()).or_default();
                // Pre-order means a repeated token within one element can only
                // collide with the last posted id
                if ids.last() != Some(&element.id()) {
                    ids.push(element.id());
                }
            }
            ranks.insert(element.id(), element.rank());
            texts.push((element.id(), text));
        }

        Self {
            postings,
            texts,
            ranks,
        }
    }

    /// Ids whose searchable text contains `text`, in pre-order.
    ///
    /// The query is trimmed and lower-cased; an empty query matches nothing.
    pub fn query(&self, text: &str) -> Vec<ElementId> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        if needle.chars().all(char::is_alphanumeric) {
            self.query_tokens(&needle)
        } else {
            self.query_texts(&needle)
        }
    }

    fn query_tokens(&self, needle: &str) -> Vec<ElementId> {
        let mut seen = FxHashSet::default();
        let mut hits: Vec<ElementId> = Vec::new();
        for (token, ids) in &self.postings {
            if token.contains(needle) {
                hits.extend(ids.iter().copied().filter(|id| seen.insert(*id)));
            }
        }
        hits.sort_unstable_by_key(|id| self.ranks.get(id).copied().unwrap_or(u32::MAX));
        hits
    }

    fn query_texts(&self, needle: &str) -> Vec<ElementId> {
        self.texts
            .iter()
            .filter(|(_, text)| text.contains(needle))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Ids posted under exactly `token` (already normalized).
    pub fn postings(&self, token: &str) -> &[ElementId] {
        self.postings.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct tokens.
    pub fn token_count(&self) -> usize {
        self.postings.len()
    }

    /// Number of indexed elements.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// The normalized searchable text of an element, if indexed.
    pub fn text_of(&self, id: ElementId) -> Option<&str> {
        let rank = *self.ranks.get(&id)? as usize;
        self.texts.get(rank).map(|(_, text)| text.as_str())
    }
}

/// Type tag and property values, lower-cased, joined by single spaces.
pub fn searchable_text(element: &Element) -> String {
    let mut text = element.type_name().to_lowercase();
    for value in element.properties().values() {
        if value.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&value.to_lowercase());
    }
    text
}

/// Splits already lower-cased text on non-alphanumeric boundaries.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
}
