// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Browser history and clock access.

use ifc_lite_view::{HistoryWrite, WriteMode};
use wasm_bindgen::JsValue;

use crate::error::BindingError;

/// `performance.now()`, or zero outside a window (workers, Node).
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
        .unwrap_or(0.0)
}

/// Writes the fragment to the location without reloading or firing
/// `popstate`.
pub fn write_history(write: &HistoryWrite) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or(BindingError::NoWindow)?;
    let history = window.history()?;
    let url = format!("#{}", write.fragment);
    match write.mode {
        WriteMode::Push => history.push_state_with_url(&JsValue::NULL, "", Some(&url)),
        WriteMode::Replace => history.replace_state_with_url(&JsValue::NULL, "", Some(&url)),
    }
}
