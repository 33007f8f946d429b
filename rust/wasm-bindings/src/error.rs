// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors surfaced to JavaScript. They cross the boundary as strings, never
//! as panics.

use wasm_bindgen::JsValue;

#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("invalid {what}: {reason}")]
    InvalidArgument { what: &'static str, reason: String },

    #[error("unknown pick kind '{0}' (expected select, extend or hover)")]
    UnknownPickKind(String),

    #[error("no browser window")]
    NoWindow,

    #[error(transparent)]
    View(#[from] ifc_lite_view::Error),

    #[error(transparent)]
    Structure(#[from] ifc_lite_view::StructureError),

    #[error(transparent)]
    Path(#[from] ifc_lite_view::PathMiss),
}

impl BindingError {
    pub(crate) fn argument(what: &'static str, err: impl std::fmt::Display) -> Self {
        BindingError::InvalidArgument {
            what,
            reason: err.to_string(),
        }
    }
}

impl From<BindingError> for JsValue {
    fn from(err: BindingError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
