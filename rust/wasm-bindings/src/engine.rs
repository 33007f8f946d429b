// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine backed by a JavaScript object.
//!
//! The object supplies any of `setCamera`, `getCamera`, `clearCutPlanes`,
//! `addCutPlane`, `highlight`, `clearHighlight` and `preselect`. Missing
//! methods are skipped and exceptions are logged, so a partial engine (for
//! example one without clipping) still works.
//!
//! Cameras cross as `{ position: [x, y, z], target: [x, y, z], animate }`,
//! planes as `{ normal: [x, y, z], point: [x, y, z] }`, ids as
//! `Uint32Array`. `highlight` may return the ids it has no geometry for.

use ifc_lite_view::{CameraState, CutPlane, ElementId, PickMiss, ViewerEngine};
use js_sys::{Array, Function, Reflect, Uint32Array};
use wasm_bindgen::prelude::*;

pub struct JsEngine {
    target: JsValue,
}

impl JsEngine {
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }

    fn method(&self, name: &str) -> Option<Function> {
        Reflect::get(&self.target, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.dyn_into::<Function>().ok())
    }

    fn call(&self, name: &str, args: &[JsValue]) -> Option<JsValue> {
        let method = self.method(name)?;
        let args: Array = args.iter().collect();
        match method.apply(&self.target, &args) {
            Ok(value) => Some(value),
            Err(err) => {
                web_sys::console::warn_2(&format!("[ifc-lite-view] engine.{name} threw").into(), &err);
                None
            }
        }
    }
}

fn ids_to_js(ids: &[ElementId]) -> JsValue {
    let raw: Vec<u32> = ids.iter().map(|id| id.get()).collect();
    Uint32Array::from(raw.as_slice()).into()
}

fn ids_from_js(value: &JsValue) -> Vec<ElementId> {
    if value.is_undefined() || value.is_null() {
        return Vec::new();
    }
    serde_wasm_bindgen::from_value::<Vec<u32>>(value.clone())
        .map(|raw| raw.into_iter().map(ElementId).collect())
        .unwrap_or_default()
}

impl ViewerEngine for JsEngine {
    fn set_camera(&mut self, camera: &CameraState) {
        match serde_wasm_bindgen::to_value(camera) {
            Ok(value) => {
                self.call("setCamera", &[value]);
            }
            Err(err) => web_sys::console::warn_1(&format!("[ifc-lite-view] camera: {err}").into()),
        }
    }

    fn camera(&self) -> Option<CameraState> {
        let value = self.call("getCamera", &[])?;
        if value.is_undefined() || value.is_null() {
            return None;
        }
        serde_wasm_bindgen::from_value(value).ok()
    }

    fn clear_cut_planes(&mut self) {
        self.call("clearCutPlanes", &[]);
    }

    fn add_cut_plane(&mut self, plane: &CutPlane) {
        match serde_wasm_bindgen::to_value(plane) {
            Ok(value) => {
                self.call("addCutPlane", &[value]);
            }
            Err(err) => web_sys::console::warn_1(&format!("[ifc-lite-view] cut plane: {err}").into()),
        }
    }

    fn highlight(&mut self, ids: &[ElementId]) -> Result<(), PickMiss> {
        let missing = self
            .call("highlight", &[ids_to_js(ids)])
            .map(|value| ids_from_js(&value))
            .unwrap_or_default();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PickMiss { ids: missing })
        }
    }

    fn clear_highlight(&mut self) {
        self.call("clearHighlight", &[]);
    }

    fn preselect(&mut self, ids: &[ElementId]) {
        self.call("preselect", &[ids_to_js(ids)]);
    }
}
