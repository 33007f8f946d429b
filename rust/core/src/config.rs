// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_FRAGMENT_DEBOUNCE_MS: u32 = 250;
pub const DEFAULT_EXPANDED_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Quiet period before a changed view is written to the URL.
    pub fragment_debounce_ms: u32,
    /// Whether clearing the selection also removes all cut planes.
    pub clear_cut_planes_on_deselect: bool,
    /// Depth of the first-child chain expanded in the hierarchy after load.
    pub default_expanded_depth: usize,
    /// Cap on search results, `None` for all matches.
    pub max_search_results: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fragment_debounce_ms: DEFAULT_FRAGMENT_DEBOUNCE_MS,
            clear_cut_planes_on_deselect: true,
            default_expanded_depth: DEFAULT_EXPANDED_DEPTH,
            max_search_results: None,
        }
    }
}

impl SessionConfig {
    /// Parses a (possibly partial) JSON configuration; missing fields take
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.fragment_debounce_ms, 250);
        assert!(config.clear_cut_planes_on_deselect);
        assert_eq!(config.default_expanded_depth, 3);
        assert_eq!(config.max_search_results, None);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            SessionConfig::from_json(r#"{"clearCutPlanesOnDeselect": false, "maxSearchResults": 50}"#)
                .unwrap();
        assert!(!config.clear_cut_planes_on_deselect);
        assert_eq!(config.max_search_results, Some(50));
        assert_eq!(config.fragment_debounce_ms, 250);
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        let err = SessionConfig::from_json(r#"{"fragmentDebounceMs": "soon"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
