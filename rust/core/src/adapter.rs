// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera/clipping adapter: the only path from the view core into the
//! external 3D engine.
//!
//! The engine is reached through the narrow [`ViewerEngine`] trait. The
//! adapter validates everything it forwards (no NaN or infinite values ever
//! reach the engine), skips writes that would not change the engine's state,
//! and orders batches so the camera moves before cut planes change.

use rustc_hash::FxHashSet;

use crate::camera::{CameraState, CutPlane};
use crate::error::PickMiss;
use crate::keys::ElementId;

/// Commands the view core issues to a 3D engine.
pub trait ViewerEngine {
    fn set_camera(&mut self, camera: &CameraState);

    /// Current engine camera, if the engine has one yet.
    fn camera(&self) -> Option<CameraState>;

    fn clear_cut_planes(&mut self);

    fn add_cut_plane(&mut self, plane: &CutPlane);

    /// Highlights the given elements as selected. Elements without visual
    /// geometry are reported back as a [`PickMiss`].
    fn highlight(&mut self, ids: &[ElementId]) -> Result<(), PickMiss>;

    fn clear_highlight(&mut self);

    /// Hover-style highlight, independent of the selection highlight.
    fn preselect(&mut self, ids: &[ElementId]);
}

/// What the viewport asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickKind {
    /// Replace the selection.
    Select,
    /// Add to the selection (modifier-click).
    Extend,
    /// Hover highlight.
    Hover,
}

/// A pick or hover coming from the viewport. `target` is `None` when the
/// pointer hit no geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickEvent {
    pub target: Option<ElementId>,
    pub kind: PickKind,
}

impl PickEvent {
    pub fn select(id: ElementId) -> Self {
        Self {
            target: Some(id),
            kind: PickKind::Select,
        }
    }

    pub fn extend(id: ElementId) -> Self {
        Self {
            target: Some(id),
            kind: PickKind::Extend,
        }
    }

    pub fn hover(id: ElementId) -> Self {
        Self {
            target: Some(id),
            kind: PickKind::Hover,
        }
    }

    pub fn miss(kind: PickKind) -> Self {
        Self { target: None, kind }
    }
}

pub type PickCallback = Box<dyn FnMut(&PickEvent)>;

/// Owns the engine and remembers what was last sent to it.
pub struct EngineAdapter<E> {
    engine: E,
    applied_camera: Option<CameraState>,
    applied_planes: Vec<CutPlane>,
    highlighted: Vec<ElementId>,
    preselected: Vec<ElementId>,
    pick_listeners: Vec<PickCallback>,
}

impl<E: std::fmt::Debug> std::fmt::Debug for EngineAdapter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineAdapter")
            .field("engine", &self.engine)
            .field("applied_camera", &self.applied_camera)
            .field("applied_planes", &self.applied_planes)
            .field("highlighted", &self.highlighted)
            .field("preselected", &self.preselected)
            .field("pick_listeners", &self.pick_listeners.len())
            .finish()
    }
}

impl<E: ViewerEngine> EngineAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            applied_camera: None,
            applied_planes: Vec::new(),
            highlighted: Vec::new(),
            preselected: Vec::new(),
            pick_listeners: Vec::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Moves the engine camera. Returns `false` when nothing was sent,
    /// either because the state is not finite or because it is already
    /// applied.
    pub fn apply_camera(&mut self, camera: &CameraState) -> bool {
        if !camera.is_finite() {
            tracing::warn!(?camera, "dropping non-finite camera");
            return false;
        }
        if self.applied_camera.as_ref() == Some(camera) {
            return false;
        }
        self.engine.set_camera(camera);
        self.applied_camera = Some(*camera);
        true
    }

    /// Replaces the engine's cut planes. Invalid planes are dropped. Returns
    /// `false` when the resulting set is already applied.
    pub fn apply_cut_planes(&mut self, planes: &[CutPlane]) -> bool {
        let valid: Vec<CutPlane> = planes
            .iter()
            .filter(|plane| {
                let ok = plane.is_valid();
                if !ok {
                    tracing::warn!(?plane, "dropping invalid cut plane");
                }
                ok
            })
            .copied()
            .collect();

        if valid == self.applied_planes {
            return false;
        }
        self.engine.clear_cut_planes();
        for plane in &valid {
            self.engine.add_cut_plane(plane);
        }
        self.applied_planes = valid;
        true
    }

    /// Applies camera and planes from one update. The camera always goes
    /// first so clipped geometry never renders unclipped from the new
    /// viewpoint.
    pub fn apply_batch(&mut self, camera: Option<&CameraState>, planes: Option<&[CutPlane]>) {
        if let Some(camera) = camera {
            self.apply_camera(camera);
        }
        if let Some(planes) = planes {
            self.apply_cut_planes(planes);
        }
    }

    /// Engine camera, filtered to finite values.
    pub fn read_camera(&self) -> Option<CameraState> {
        self.engine.camera().filter(CameraState::is_finite)
    }

    /// Records a camera the engine reached on its own (user orbiting), so a
    /// later `apply_camera` with an older state is not skipped.
    pub fn record_camera(&mut self, camera: &CameraState) {
        self.applied_camera = Some(*camera);
    }

    /// Highlights `ids` as the selection. A [`PickMiss`] is logged and
    /// returned; it never blocks the selection itself.
    pub fn highlight(&mut self, ids: &[ElementId]) -> Option<PickMiss> {
        if ids == self.highlighted.as_slice() {
            return None;
        }
        self.highlighted = ids.to_vec();
        if ids.is_empty() {
            self.engine.clear_highlight();
            return None;
        }
        match self.engine.highlight(ids) {
            Ok(()) => None,
            Err(miss) => {
                tracing::debug!(ids = ?miss.ids, "no visual geometry for highlighted elements");
                Some(miss)
            }
        }
    }

    pub fn preselect(&mut self, ids: &[ElementId]) {
        if ids == self.preselected.as_slice() {
            return;
        }
        self.preselected = ids.to_vec();
        self.engine.preselect(ids);
    }

    pub fn applied_planes(&self) -> &[CutPlane] {
        &self.applied_planes
    }

    pub fn highlighted(&self) -> &[ElementId] {
        &self.highlighted
    }

    /// Registers a listener for viewport picks and hovers.
    pub fn on_pick(&mut self, callback: impl FnMut(&PickEvent) + 'static) {
        self.pick_listeners.push(Box::new(callback));
    }

    /// Forwards a viewport event to every listener.
    pub fn emit_pick(&mut self, event: &PickEvent) {
        for listener in &mut self.pick_listeners {
            listener(event);
        }
    }

    /// Clears highlight, preselection and planes for a new model. The camera
    /// is left where it is; only the record of it is forgotten.
    pub fn reset(&mut self) {
        self.highlight(&[]);
        self.preselect(&[]);
        self.apply_cut_planes(&[]);
        self.applied_camera = None;
    }
}

/// One command received by a [`HeadlessEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    SetCamera(CameraState),
    ClearCutPlanes,
    AddCutPlane(CutPlane),
    Highlight(Vec<ElementId>),
    ClearHighlight,
    Preselect(Vec<ElementId>),
}

/// Engine without rendering. Keeps the state it was told to show and a log
/// of every command, for native sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct HeadlessEngine {
    pub camera: Option<CameraState>,
    pub cut_planes: Vec<CutPlane>,
    pub highlighted: Vec<ElementId>,
    pub preselected: Vec<ElementId>,
    /// Elements that behave like `IfcSite`: present in the tree, no geometry.
    pub without_geometry: FxHashSet<ElementId>,
    pub commands: Vec<EngineCommand>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_geometry(ids: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            without_geometry: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Simulates the user orbiting the camera.
    pub fn orbit_to(&mut self, camera: CameraState) {
        self.camera = Some(camera);
    }
}

impl ViewerEngine for HeadlessEngine {
    fn set_camera(&mut self, camera: &CameraState) {
        self.camera = Some(*camera);
        self.commands.push(EngineCommand::SetCamera(*camera));
    }

    fn camera(&self) -> Option<CameraState> {
        self.camera
    }

    fn clear_cut_planes(&mut self) {
        self.cut_planes.clear();
        self.commands.push(EngineCommand::ClearCutPlanes);
    }

    fn add_cut_plane(&mut self, plane: &CutPlane) {
        self.cut_planes.push(*plane);
        self.commands.push(EngineCommand::AddCutPlane(*plane));
    }

    fn highlight(&mut self, ids: &[ElementId]) -> Result<(), PickMiss> {
        self.commands.push(EngineCommand::Highlight(ids.to_vec()));
        let (missing, visible): (Vec<ElementId>, Vec<ElementId>) =
            ids.iter().copied().partition(|id| self.without_geometry.contains(id));
        self.highlighted = visible;
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PickMiss { ids: missing })
        }
    }

    fn clear_highlight(&mut self) {
        self.highlighted.clear();
        self.commands.push(EngineCommand::ClearHighlight);
    }

    fn preselect(&mut self, ids: &[ElementId]) {
        self.preselected = ids.to_vec();
        self.commands.push(EngineCommand::Preselect(ids.to_vec()));
    }
}
