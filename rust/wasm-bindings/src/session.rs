// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JavaScript API for a viewer session.

use std::cell::RefCell;
use std::rc::Rc;

use ifc_lite_view::{
    CameraState, CutPlane, ElementId, ElementPath, LoadOutcome, ModelBuild, PickEvent, PickKind,
    SessionConfig, ViewerSession,
};
use js_sys::Promise;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::engine::JsEngine;
use crate::error::BindingError;
use crate::history::{now_ms, write_history};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadResultJs {
    superseded: bool,
    generation: f64,
    element_count: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ElementJs<'a> {
    express_id: u32,
    #[serde(rename = "type")]
    type_name: &'a str,
    properties: &'a std::collections::BTreeMap<String, String>,
    children: Vec<u32>,
}

/// One viewer: model, selection, camera, cut planes and URL sync.
///
/// Example:
/// ```javascript
/// const session = new ViewerSession(engine, { fragmentDebounceMs: 250 });
/// await session.loadModel(sceneJson);
/// session.navigate(location.hash);
/// session.searchAndSelect('wall');
/// requestAnimationFrame(function frame() {
///   session.tick();
///   requestAnimationFrame(frame);
/// });
/// ```
#[wasm_bindgen(js_name = ViewerSession)]
pub struct ViewerSessionJs {
    inner: Rc<RefCell<ViewerSession<JsEngine>>>,
}

#[wasm_bindgen(js_class = ViewerSession)]
impl ViewerSessionJs {
    /// Creates a session around a JS engine object. `config` may be omitted.
    #[wasm_bindgen(constructor)]
    pub fn new(engine: JsValue, config: JsValue) -> Result<ViewerSessionJs, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            SessionConfig::default()
        } else if let Some(json) = config.as_string() {
            SessionConfig::from_json(&json).map_err(BindingError::from)?
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| BindingError::argument("config", e))?
        };
        Ok(Self {
            inner: Rc::new(RefCell::new(ViewerSession::with_config(JsEngine::new(engine), config))),
        })
    }

    /// Loads a scene description (JSON node tree). Resolves with
    /// `{ superseded, generation, elementCount }`; rejects on a malformed
    /// tree, in which case the previous model stays loaded.
    ///
    /// The build yields to the event loop once and then runs on the calling
    /// thread, so very large scenes still block the UI while the tree and
    /// index are built. Native hosts can build a `ModelBuild` on another
    /// thread and hand it to `ViewerSession::finish_load`.
    #[wasm_bindgen(js_name = loadModel)]
    pub fn load_model(&self, scene_json: String) -> Promise {
        let ticket = self.inner.borrow_mut().begin_load();
        let inner = Rc::clone(&self.inner);

        Promise::new(&mut |resolve, reject| {
            let inner = Rc::clone(&inner);
            let scene_json = scene_json.clone();
            spawn_local(async move {
                // Let the UI paint its loading state before the build.
                gloo_timers::future::TimeoutFuture::new(0).await;

                let build = ModelBuild::from_json(&scene_json);
                let outcome = inner.borrow_mut().finish_load(ticket, build);
                let settled = match outcome {
                    Ok(LoadOutcome::Applied {
                        generation,
                        elements,
                    }) => {
                        web_sys::console::debug_1(
                            &format!("[ifc-lite-view] model {generation} loaded: {elements} elements").into(),
                        );
                        to_js(&LoadResultJs {
                            superseded: false,
                            generation: generation as f64,
                            element_count: elements as u32,
                        })
                        .map(|value| resolve.call1(&JsValue::NULL, &value))
                    }
                    Ok(LoadOutcome::Superseded) => to_js(&LoadResultJs {
                        superseded: true,
                        generation: ticket.generation() as f64,
                        element_count: 0,
                    })
                    .map(|value| resolve.call1(&JsValue::NULL, &value)),
                    Err(err) => {
                        web_sys::console::warn_1(&format!("[ifc-lite-view] load failed: {err}").into());
                        Ok(reject.call1(&JsValue::NULL, &BindingError::from(err).into()))
                    }
                };
                if let Err(err) = settled {
                    let _ = reject.call1(&JsValue::NULL, &err);
                }
            });
        })
    }

    /// Generation of the most recently started load.
    #[wasm_bindgen(getter)]
    pub fn generation(&self) -> f64 {
        self.inner.borrow().generation() as f64
    }

    #[wasm_bindgen(getter, js_name = elementCount)]
    pub fn element_count(&self) -> u32 {
        self.inner.borrow().tree().map_or(0, |tree| tree.len() as u32)
    }

    /// Ids expanded in the hierarchy right after load.
    #[wasm_bindgen(getter, js_name = expandedIds)]
    pub fn expanded_ids(&self) -> Vec<u32> {
        let session = self.inner.borrow();
        session
            .model()
            .map(|model| model.expanded().iter().map(|id| id.get()).collect())
            .unwrap_or_default()
    }

    /// Type, properties and child ids of one element, for the hierarchy and
    /// properties panels. `undefined` for unknown ids.
    #[wasm_bindgen(js_name = getElement)]
    pub fn get_element(&self, express_id: u32) -> Result<JsValue, JsValue> {
        let session = self.inner.borrow();
        let (Some(tree), Some(element)) = (session.tree(), session.element(ElementId(express_id)))
        else {
            return Ok(JsValue::UNDEFINED);
        };
        to_js(&ElementJs {
            express_id,
            type_name: element.type_name(),
            properties: element.properties(),
            children: tree.children_of(element).map(|child| child.id().get()).collect(),
        })
    }

    #[wasm_bindgen(js_name = pathOf)]
    pub fn path_of(&self, express_id: u32) -> Option<String> {
        let session = self.inner.borrow();
        let tree = session.tree()?;
        ifc_lite_view::path_of(tree, ElementId(express_id)).map(|path| path.to_string())
    }

    /// Path of an element as URL pathname segments (`"1/10/20"`).
    #[wasm_bindgen(js_name = urlPathOf)]
    pub fn url_path_of(&self, express_id: u32) -> Option<String> {
        let session = self.inner.borrow();
        let tree = session.tree()?;
        ifc_lite_view::path_of(tree, ElementId(express_id)).map(|path| path.to_url_segments())
    }

    // ---------- Search and selection ----------

    pub fn search(&self, query: &str) -> Vec<u32> {
        ids_out(&self.inner.borrow().search(query).ids)
    }

    #[wasm_bindgen(js_name = searchAndSelect)]
    pub fn search_and_select(&self, query: &str) -> Vec<u32> {
        ids_out(&self.inner.borrow_mut().search_and_select(query).ids)
    }

    pub fn select(&self, express_id: u32) -> bool {
        self.inner.borrow_mut().select(ElementId(express_id)).selection_changed
    }

    #[wasm_bindgen(js_name = addToSelection)]
    pub fn add_to_selection(&self, express_id: u32) -> bool {
        self.inner
            .borrow_mut()
            .add_to_selection(ElementId(express_id))
            .selection_changed
    }

    #[wasm_bindgen(js_name = removeFromSelection)]
    pub fn remove_from_selection(&self, express_id: u32) -> bool {
        self.inner
            .borrow_mut()
            .remove_from_selection(ElementId(express_id))
            .selection_changed
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&self) -> bool {
        self.inner.borrow_mut().clear_selection().selection_changed
    }

    #[wasm_bindgen(js_name = setPreselected)]
    pub fn set_preselected(&self, express_ids: Vec<u32>) -> bool {
        let ids: Vec<ElementId> = express_ids.into_iter().map(ElementId).collect();
        self.inner.borrow_mut().set_preselected(&ids).preselection_changed
    }

    /// Selects by path, comma-separated (`"1,10,20,30"`) or in URL pathname
    /// form (`"/1/10/20/30"`).
    #[wasm_bindgen(js_name = selectPath)]
    pub fn select_path(&self, path: &str) -> Result<u32, JsValue> {
        let parsed = if path.contains('/') {
            ElementPath::from_url_segments(path)
        } else {
            path.parse::<ElementPath>().ok()
        };
        let path = parsed
            .ok_or_else(|| BindingError::argument("path", format!("'{path}' is not a list of ids")))?;
        let id = self
            .inner
            .borrow_mut()
            .select_path(&path)
            .map_err(BindingError::from)?;
        Ok(id.get())
    }

    /// Viewport pick. `kind` is `"select"`, `"extend"` or `"hover"`;
    /// `expressId` is `undefined` when nothing was hit.
    pub fn pick(&self, express_id: Option<u32>, kind: &str) -> Result<bool, JsValue> {
        let kind = match kind {
            "select" => PickKind::Select,
            "extend" => PickKind::Extend,
            "hover" => PickKind::Hover,
            other => return Err(BindingError::UnknownPickKind(other.to_string()).into()),
        };
        let event = PickEvent {
            target: express_id.map(ElementId),
            kind,
        };
        let transition = self.inner.borrow_mut().handle_pick(event);
        Ok(!transition.is_noop())
    }

    /// `{ primary, selected, preselected }`.
    #[wasm_bindgen(getter)]
    pub fn selection(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.borrow().selection())
    }

    // ---------- Camera and cut planes ----------

    /// Reports a camera the user moved to. Coalesced until the next tick.
    #[wasm_bindgen(js_name = cameraMoved)]
    pub fn camera_moved(&self, camera: JsValue) -> Result<(), JsValue> {
        let camera: CameraState =
            serde_wasm_bindgen::from_value(camera).map_err(|e| BindingError::argument("camera", e))?;
        self.inner.borrow_mut().camera_moved(camera);
        Ok(())
    }

    #[wasm_bindgen(js_name = syncCameraFromEngine)]
    pub fn sync_camera_from_engine(&self) {
        self.inner.borrow_mut().sync_camera_from_engine();
    }

    #[wasm_bindgen(js_name = setCamera)]
    pub fn set_camera(&self, camera: JsValue) -> Result<bool, JsValue> {
        let camera: CameraState =
            serde_wasm_bindgen::from_value(camera).map_err(|e| BindingError::argument("camera", e))?;
        Ok(self.inner.borrow_mut().set_camera(camera))
    }

    #[wasm_bindgen(js_name = addCutPlane)]
    pub fn add_cut_plane(&self, plane: JsValue) -> Result<bool, JsValue> {
        let plane: CutPlane =
            serde_wasm_bindgen::from_value(plane).map_err(|e| BindingError::argument("cut plane", e))?;
        Ok(self.inner.borrow_mut().add_cut_plane(plane))
    }

    #[wasm_bindgen(js_name = removeCutPlane)]
    pub fn remove_cut_plane(&self, index: usize) -> bool {
        self.inner.borrow_mut().remove_cut_plane(index).is_some()
    }

    #[wasm_bindgen(js_name = clearCutPlanes)]
    pub fn clear_cut_planes(&self) {
        self.inner.borrow_mut().clear_cut_planes();
    }

    #[wasm_bindgen(getter, js_name = cutPlanes)]
    pub fn cut_planes(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.borrow().cut_planes())
    }

    // ---------- URL ----------

    /// Call once per frame. Writes the fragment to the browser history when
    /// a change has settled and returns it.
    pub fn tick(&self) -> Result<Option<String>, JsValue> {
        let write = self.inner.borrow_mut().tick(now_ms());
        match write {
            Some(write) => {
                write_history(&write)?;
                Ok(Some(write.fragment))
            }
            None => Ok(None),
        }
    }

    /// Writes any pending change immediately.
    pub fn flush(&self) -> Result<Option<String>, JsValue> {
        let write = self.inner.borrow_mut().flush(now_ms());
        match write {
            Some(write) => {
                write_history(&write)?;
                Ok(Some(write.fragment))
            }
            None => Ok(None),
        }
    }

    /// Applies a location fragment (from load or `hashchange`). Returns the
    /// messages for segments that were skipped.
    pub fn navigate(&self, fragment: &str) -> Vec<String> {
        let errors = self.inner.borrow_mut().navigate(fragment);
        for error in &errors {
            web_sys::console::warn_1(&format!("[ifc-lite-view] {error}").into());
        }
        errors.iter().map(|error| error.to_string()).collect()
    }

    /// The current view as a fragment, without the `#`.
    #[wasm_bindgen(getter)]
    pub fn fragment(&self) -> String {
        self.inner.borrow().fragment()
    }

    #[wasm_bindgen(getter, js_name = viewState)]
    pub fn view_state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().view_state())
    }
}

fn ids_out(ids: &[ElementId]) -> Vec<u32> {
    ids.iter().map(|id| id.get()).collect()
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| BindingError::argument("value", e).into())
}
