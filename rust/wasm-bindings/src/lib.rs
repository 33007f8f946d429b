// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Lite View WebAssembly Bindings
//!
//! JavaScript/TypeScript API for the view core built with wasm-bindgen.

use wasm_bindgen::prelude::*;

mod codec;
mod engine;
mod error;
mod history;
mod session;

pub use codec::{canonicalize_fragment, decode_fragment, encode_view_state};
pub use engine::JsEngine;
pub use error::BindingError;
pub use session::ViewerSessionJs;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get the version of the view core
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
