// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fragment codec for callers that build links without a session.

use ifc_lite_view::ViewState;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::error::BindingError;
use crate::session::to_js;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodedJs {
    state: ViewState,
    errors: Vec<String>,
}

/// Decodes a fragment into `{ state, errors }`. Bad segments are skipped
/// and listed in `errors`; decoding itself never throws.
#[wasm_bindgen(js_name = decodeFragment)]
pub fn decode_fragment(fragment: &str) -> Result<JsValue, JsValue> {
    let decoded = ifc_lite_view::decode(fragment);
    to_js(&DecodedJs {
        state: decoded.state,
        errors: decoded.errors.iter().map(|e| e.to_string()).collect(),
    })
}

/// Encodes `{ camera?, cutPlanes, selection }` to a fragment without `#`.
#[wasm_bindgen(js_name = encodeViewState)]
pub fn encode_view_state(state: JsValue) -> Result<String, JsValue> {
    let state: ViewState =
        serde_wasm_bindgen::from_value(state).map_err(|e| BindingError::argument("view state", e))?;
    Ok(ifc_lite_view::encode(&state))
}

/// Canonical form of a fragment; equal results mean equal views.
#[wasm_bindgen(js_name = canonicalizeFragment)]
pub fn canonicalize_fragment(fragment: &str) -> String {
    ifc_lite_view::canonicalize(fragment)
}
