// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer session: the explicit context that owns one viewer's state.
//!
//! All state flows one way. A change enters through a session operation
//! (selection, pick, camera, cut plane, navigation), is applied to the
//! selection coordinator and the engine adapter, and marks the view dirty.
//! [`ViewerSession::tick`] re-encodes a dirty view and hands it to the
//! fragment writer. Inbound navigation is acknowledged before anything is
//! written back, so a fragment we applied is never re-written and a fragment
//! we wrote is never re-applied.
//!
//! Loads are tracked by generation. Building a model is pure and may run
//! elsewhere; only the completion of the latest load is installed.

use crate::adapter::{EngineAdapter, PickEvent, PickKind, ViewerEngine};
use crate::camera::{CameraState, CutPlane};
use crate::codec::{self, ViewState};
use crate::config::SessionConfig;
use crate::error::{CodecError, PathMiss, StructureError};
use crate::index::SearchIndex;
use crate::keys::ElementId;
use crate::path::{path_of, resolve_path, ElementPath};
use crate::raw::{parse_scene, RawElement};
use crate::selection::{Selection, SelectionCoordinator, Transition};
use crate::sync::{FragmentSync, HistoryWrite, WriteMode};
use crate::tree::{Element, ModelTree};

/// Issued by [`ViewerSession::begin_load`]; identifies one load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Tree and index built from one scene description. Owns all of its data,
/// so it can be built away from the session and sent back.
#[derive(Debug, Clone)]
pub struct ModelBuild {
    pub tree: ModelTree,
    pub index: SearchIndex,
}

impl ModelBuild {
    pub fn build(raw: Option<&RawElement>) -> Result<Self, StructureError> {
        let tree = crate::tree::build_tree(raw)?;
        let index = SearchIndex::build(&tree);
        Ok(Self { tree, index })
    }

    /// Builds from the loader's JSON node tree.
    pub fn from_json(json: &str) -> Result<Self, StructureError> {
        let raw = parse_scene(json)?;
        Self::build(raw.as_ref())
    }
}

/// The installed model.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    generation: u64,
    tree: ModelTree,
    index: SearchIndex,
    expanded: Vec<ElementId>,
}

impl LoadedModel {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tree(&self) -> &ModelTree {
        &self.tree
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Hierarchy nodes expanded right after load.
    pub fn expanded(&self) -> &[ElementId] {
        &self.expanded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The model is now current.
    Applied { generation: u64, elements: usize },
    /// A newer load began after this one; its result was dropped.
    Superseded,
}

/// Search hits, tagged with the generation they were computed against.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResults {
    pub generation: u64,
    pub ids: Vec<ElementId>,
}

pub struct ViewerSession<E: ViewerEngine> {
    config: SessionConfig,
    generation: u64,
    model: Option<LoadedModel>,
    selection: SelectionCoordinator,
    camera: Option<CameraState>,
    pending_camera: Option<CameraState>,
    cut_planes: Vec<CutPlane>,
    pending_view: Option<ViewState>,
    dirty: Option<WriteMode>,
    sync: FragmentSync,
    adapter: EngineAdapter<E>,
}

impl<E: ViewerEngine> ViewerSession<E> {
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, SessionConfig::default())
    }

    pub fn with_config(engine: E, config: SessionConfig) -> Self {
        Self {
            selection: SelectionCoordinator::new(config.clear_cut_planes_on_deselect),
            sync: FragmentSync::new(config.fragment_debounce_ms),
            config,
            generation: 0,
            model: None,
            camera: None,
            pending_camera: None,
            cut_planes: Vec::new(),
            pending_view: None,
            dirty: None,
            adapter: EngineAdapter::new(engine),
        }
    }

    // ---------- Loading ----------

    /// Starts a load. Any load begun earlier is superseded.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        tracing::debug!(generation = self.generation, "load started");
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Installs the result of the load identified by `ticket`.
    ///
    /// A superseded ticket is dropped without touching the session, whether
    /// its build succeeded or not. A structure error for the current ticket
    /// is returned and the previous model stays in place.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<ModelBuild, StructureError>,
    ) -> Result<LoadOutcome, StructureError> {
        if ticket.generation != self.generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "discarding superseded load"
            );
            return Ok(LoadOutcome::Superseded);
        }

        let build = result.map_err(|e| {
            tracing::warn!(generation = ticket.generation, error = %e, "model load failed");
            e
        })?;

        let elements = build.tree.len();
        let expanded = build.tree.default_expanded(self.config.default_expanded_depth);
        self.model = Some(LoadedModel {
            generation: ticket.generation,
            tree: build.tree,
            index: build.index,
            expanded,
        });
        tracing::info!(generation = ticket.generation, elements, "model installed");

        self.selection.reset();
        self.camera = None;
        self.pending_camera = None;
        self.cut_planes.clear();
        self.dirty = None;
        self.adapter.reset();

        if let Some(view) = self.pending_view.take() {
            tracing::debug!("applying view requested before the model was ready");
            self.apply_view(view);
        } else if self.sync.last_written().is_some() {
            // The location still describes the previous model.
            self.mark_dirty(WriteMode::Replace);
        }

        Ok(LoadOutcome::Applied {
            generation: ticket.generation,
            elements,
        })
    }

    /// Builds and installs in one step.
    pub fn load(&mut self, raw: Option<&RawElement>) -> Result<LoadOutcome, StructureError> {
        let ticket = self.begin_load();
        self.finish_load(ticket, ModelBuild::build(raw))
    }

    // ---------- Search ----------

    pub fn search(&self, query: &str) -> SearchResults {
        let Some(model) = &self.model else {
            return SearchResults {
                generation: self.generation,
                ids: Vec::new(),
            };
        };
        let mut ids = model.index.query(query);
        if let Some(max) = self.config.max_search_results {
            ids.truncate(max);
        }
        SearchResults {
            generation: model.generation,
            ids,
        }
    }

    /// Replaces the selection with `results`. Cut planes are kept whatever
    /// the deselect policy. Results computed against another generation are
    /// ignored.
    pub fn select_search_results(&mut self, results: &SearchResults) -> Transition {
        match &self.model {
            Some(model) if model.generation == results.generation => {}
            _ => {
                tracing::debug!(generation = results.generation, "ignoring stale search results");
                return Transition::default();
            }
        }
        let transition = self.with_tree(|selection, tree| selection.select_many(tree, &results.ids));
        self.after_transition(transition)
    }

    pub fn search_and_select(&mut self, query: &str) -> SearchResults {
        let results = self.search(query);
        self.select_search_results(&results);
        results
    }

    // ---------- Selection ----------

    pub fn select(&mut self, id: ElementId) -> Transition {
        let transition = self.with_tree(|selection, tree| selection.select_single(tree, id));
        self.after_transition(transition)
    }

    pub fn add_to_selection(&mut self, id: ElementId) -> Transition {
        let transition = self.with_tree(|selection, tree| selection.add_to_selection(tree, id));
        self.after_transition(transition)
    }

    pub fn remove_from_selection(&mut self, id: ElementId) -> Transition {
        let transition = self.selection.remove_from_selection(id);
        self.after_transition(transition)
    }

    pub fn clear_selection(&mut self) -> Transition {
        let transition = self.selection.clear_selection();
        self.after_transition(transition)
    }

    pub fn set_preselected(&mut self, ids: &[ElementId]) -> Transition {
        let transition = self.with_tree(|selection, tree| selection.set_preselected(tree, ids));
        self.after_transition(transition)
    }

    /// Selects the element a path leads to.
    pub fn select_path(&mut self, path: &ElementPath) -> Result<ElementId, PathMiss> {
        let id = match &self.model {
            Some(model) => resolve_path(&model.tree, path)?.id(),
            None => {
                return Err(PathMiss {
                    depth: 0,
                    id: path.ids().first().copied(),
                })
            }
        };
        self.select(id);
        Ok(id)
    }

    /// Routes a viewport event through the selection operations. A click on
    /// empty space clears the selection; leaving geometry clears the hover.
    pub fn handle_pick(&mut self, event: PickEvent) -> Transition {
        match (event.kind, event.target) {
            (PickKind::Select, Some(id)) => self.select(id),
            (PickKind::Extend, Some(id)) => self.add_to_selection(id),
            (PickKind::Hover, Some(id)) => self.set_preselected(&[id]),
            (PickKind::Hover, None) => self.set_preselected(&[]),
            (PickKind::Select, None) => self.clear_selection(),
            (PickKind::Extend, None) => Transition::default(),
        }
    }

    fn with_tree(
        &mut self,
        op: impl FnOnce(&mut SelectionCoordinator, &ModelTree) -> Transition,
    ) -> Transition {
        match &self.model {
            Some(model) => op(&mut self.selection, &model.tree),
            None => {
                tracing::debug!("no model loaded, ignoring selection change");
                Transition::default()
            }
        }
    }

    fn after_transition(&mut self, transition: Transition) -> Transition {
        if transition.clear_cut_planes && !self.cut_planes.is_empty() {
            self.cut_planes.clear();
            self.adapter.apply_cut_planes(&[]);
            self.mark_dirty(WriteMode::Push);
        }
        if transition.selection_changed {
            self.refresh_highlight();
            self.mark_dirty(WriteMode::Push);
        }
        if transition.preselection_changed {
            self.adapter.preselect(self.selection.selection().preselected());
        }
        transition
    }

    fn refresh_highlight(&mut self) {
        // A miss is logged by the adapter; the selection stands either way.
        let _ = self.adapter.highlight(self.selection.selection().selected());
    }

    // ---------- Camera and cut planes ----------

    /// The engine camera moved (user orbit). Updates are coalesced until the
    /// next [`tick`](ViewerSession::tick); the last one wins.
    pub fn camera_moved(&mut self, camera: CameraState) {
        if !camera.is_finite() {
            tracing::warn!(?camera, "ignoring non-finite camera update");
            return;
        }
        self.adapter.record_camera(&camera);
        self.pending_camera = Some(camera);
    }

    /// Pulls the current camera from the engine.
    pub fn sync_camera_from_engine(&mut self) {
        if let Some(camera) = self.adapter.read_camera() {
            self.camera_moved(camera);
        }
    }

    /// Moves the engine camera on behalf of the application.
    pub fn set_camera(&mut self, camera: CameraState) -> bool {
        if !self.adapter.apply_camera(&camera) {
            return false;
        }
        self.pending_camera = None;
        self.camera = Some(camera);
        self.mark_dirty(WriteMode::Replace);
        true
    }

    pub fn add_cut_plane(&mut self, plane: CutPlane) -> bool {
        if !plane.is_valid() {
            tracing::warn!(?plane, "ignoring invalid cut plane");
            return false;
        }
        self.cut_planes.push(plane);
        self.adapter.apply_cut_planes(&self.cut_planes);
        self.mark_dirty(WriteMode::Push);
        true
    }

    pub fn remove_cut_plane(&mut self, index: usize) -> Option<CutPlane> {
        if index >= self.cut_planes.len() {
            return None;
        }
        let removed = self.cut_planes.remove(index);
        self.adapter.apply_cut_planes(&self.cut_planes);
        self.mark_dirty(WriteMode::Push);
        Some(removed)
    }

    pub fn clear_cut_planes(&mut self) {
        if self.cut_planes.is_empty() {
            return;
        }
        self.cut_planes.clear();
        self.adapter.apply_cut_planes(&[]);
        self.mark_dirty(WriteMode::Push);
    }

    // ---------- URL ----------

    /// Commits the coalesced camera, re-encodes a dirty view and returns the
    /// history write that is due, if any.
    pub fn tick(&mut self, now_ms: f64) -> Option<HistoryWrite> {
        self.commit(now_ms);
        self.sync.poll(now_ms)
    }

    /// Like [`tick`](ViewerSession::tick), ignoring the debounce.
    pub fn flush(&mut self, now_ms: f64) -> Option<HistoryWrite> {
        self.commit(now_ms);
        self.sync.flush()
    }

    fn commit(&mut self, now_ms: f64) {
        if let Some(camera) = self.pending_camera.take() {
            if self.camera != Some(camera) {
                self.camera = Some(camera);
                self.mark_dirty(WriteMode::Replace);
            }
        }
        if let Some(mode) = self.dirty.take() {
            self.sync.schedule(self.fragment(), mode, now_ms);
        }
    }

    /// Applies a fragment the location navigated to. Echoes of our own
    /// writes are ignored. Returns the segments that could not be applied.
    pub fn navigate(&mut self, fragment: &str) -> Vec<CodecError> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if self.sync.is_echo(fragment) {
            tracing::debug!(fragment, "ignoring echo of our own history write");
            return Vec::new();
        }

        let decoded = codec::decode(fragment);
        for error in &decoded.errors {
            tracing::warn!(%error, "skipping fragment segment");
        }
        self.sync.acknowledge(&codec::encode(&decoded.state));
        self.dirty = None;
        let orbited = self
            .pending_camera
            .take()
            .filter(|camera| self.camera != Some(*camera));
        if let Some(camera) = orbited {
            self.camera = Some(camera);
        }

        if self.model.is_some() {
            let keeps_camera = decoded.state.camera.is_none();
            self.apply_view(decoded.state);
            if keeps_camera && orbited.is_some() {
                // The link does not know about the orbit yet.
                self.mark_dirty(WriteMode::Replace);
            }
        } else {
            tracing::debug!("no model loaded yet, keeping view for later");
            self.pending_view = Some(decoded.state);
        }
        decoded.errors
    }

    fn apply_view(&mut self, view: ViewState) {
        // Without a `c:` segment the current camera stays.
        if let Some(camera) = view.camera {
            self.camera = Some(camera);
        }
        self.cut_planes = view.cut_planes.into_iter().filter(CutPlane::is_valid).collect();
        self.adapter
            .apply_batch(view.camera.as_ref(), Some(self.cut_planes.as_slice()));

        let Some(model) = &self.model else {
            return;
        };
        let mut targets = Vec::with_capacity(view.selection.len());
        for path in &view.selection {
            match resolve_path(&model.tree, path) {
                Ok(element) => targets.push(element.id()),
                Err(miss) => tracing::debug!(%path, %miss, "selection path does not resolve"),
            }
        }

        let mut transition = self.selection.clear_selection();
        // The view carries its own planes.
        transition.clear_cut_planes = false;
        let mut targets = targets.into_iter();
        if let Some(primary) = targets.next() {
            transition = transition.merge(self.selection.select_single(&model.tree, primary));
            for id in targets {
                transition = transition.merge(self.selection.add_to_selection(&model.tree, id));
            }
        }
        if transition.selection_changed {
            self.refresh_highlight();
        }
    }

    /// The current view, as it would be shared.
    pub fn view_state(&self) -> ViewState {
        let selection = match &self.model {
            Some(model) => self
                .selection
                .selection()
                .primary_first()
                .into_iter()
                .filter_map(|id| path_of(&model.tree, id))
                .collect(),
            None => Vec::new(),
        };
        ViewState {
            camera: self.pending_camera.or(self.camera),
            cut_planes: self.cut_planes.clone(),
            selection,
        }
    }

    pub fn fragment(&self) -> String {
        codec::encode(&self.view_state())
    }

    fn mark_dirty(&mut self, mode: WriteMode) {
        self.dirty = Some(match self.dirty {
            Some(current) => current.merge(mode),
            None => mode,
        });
    }

    // ---------- Accessors ----------

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Generation of the most recently started load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    pub fn tree(&self) -> Option<&ModelTree> {
        self.model.as_ref().map(|m| &m.tree)
    }

    /// Element lookup for the properties panel.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.tree()?.get(id)
    }

    pub fn selection(&self) -> &Selection {
        self.selection.selection()
    }

    pub fn camera(&self) -> Option<&CameraState> {
        self.pending_camera.as_ref().or(self.camera.as_ref())
    }

    pub fn cut_planes(&self) -> &[CutPlane] {
        &self.cut_planes
    }

    pub fn has_pending_view(&self) -> bool {
        self.pending_view.is_some()
    }

    pub fn adapter(&self) -> &EngineAdapter<E> {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut EngineAdapter<E> {
        &mut self.adapter
    }

    pub fn engine(&self) -> &E {
        self.adapter.engine()
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.adapter.engine_mut()
    }
}

impl<E: ViewerEngine + std::fmt::Debug> std::fmt::Debug for ViewerSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerSession")
            .field("generation", &self.generation)
            .field("elements", &self.tree().map(ModelTree::len))
            .field("selection", self.selection.selection())
            .field("camera", &self.camera)
            .field("cut_planes", &self.cut_planes)
            .field("adapter", &self.adapter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{EngineCommand, HeadlessEngine};
    use crate::camera::Axis;

    fn sample() -> RawElement {
        RawElement::new(1, "IfcProject").with_child(
            RawElement::new(2, "IfcSite").with_child(
                RawElement::new(3, "IfcBuildingStorey")
                    .with_child(RawElement::new(4, "IfcWall").with_property("Name", "Wall A"))
                    .with_child(RawElement::new(5, "IfcWindow").with_property("Name", "Window B")),
            ),
        )
    }

    fn session() -> ViewerSession<HeadlessEngine> {
        let mut session = ViewerSession::new(HeadlessEngine::new());
        session.load(Some(&sample())).unwrap();
        session
    }

    #[test]
    fn model_build_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ModelBuild>();
    }

    #[test]
    fn load_installs_model_and_expansion() {
        let session = session();
        let model = session.model().unwrap();
        assert_eq!(model.generation(), 1);
        assert_eq!(model.tree().len(), 5);
        assert_eq!(model.expanded(), &[ElementId(1), ElementId(2), ElementId(3), ElementId(4)]);
    }

    #[test]
    fn failed_load_keeps_previous_model() {
        let mut session = session();
        session.select(ElementId(4));
        let bad = RawElement::new(1, "IfcProject").with_child(RawElement::new(1, "IfcSite"));
        assert!(session.load(Some(&bad)).is_err());
        assert_eq!(session.tree().unwrap().len(), 5);
        assert_eq!(session.selection().primary(), Some(ElementId(4)));
    }

    #[test]
    fn selection_highlights_and_dirties_fragment() {
        let mut session = session();
        session.select(ElementId(4));
        assert_eq!(session.engine().highlighted, vec![ElementId(4)]);
        let write = session.tick(0.0);
        assert_eq!(write, None);
        let write = session.tick(250.0).unwrap();
        assert_eq!(write.fragment, "i:1,2,3,4");
        assert_eq!(write.mode, WriteMode::Push);
        assert_eq!(session.tick(1000.0), None);
    }

    #[test]
    fn element_without_geometry_is_still_selected() {
        let mut session = ViewerSession::new(HeadlessEngine::with_missing_geometry([ElementId(2)]));
        session.load(Some(&sample())).unwrap();
        assert!(session.select(ElementId(2)).selection_changed);
        assert_eq!(session.selection().primary(), Some(ElementId(2)));
        assert!(session.engine().highlighted.is_empty());
    }

    #[test]
    fn picks_route_through_selection() {
        let mut session = session();
        session.handle_pick(PickEvent::select(ElementId(4)));
        session.handle_pick(PickEvent::extend(ElementId(5)));
        assert_eq!(session.selection().selected(), &[ElementId(4), ElementId(5)]);

        session.handle_pick(PickEvent::hover(ElementId(3)));
        assert_eq!(session.engine().preselected, vec![ElementId(3)]);

        session.handle_pick(PickEvent::miss(PickKind::Select));
        assert!(session.selection().is_empty());
    }

    #[test]
    fn clearing_selection_clears_planes_by_default() {
        let mut session = session();
        session.select(ElementId(4));
        session.add_cut_plane(CutPlane::from_axis(Axis::Z, 3.0));
        session.clear_selection();
        assert!(session.cut_planes().is_empty());
        assert!(session.engine().cut_planes.is_empty());
    }

    #[test]
    fn clear_policy_can_keep_planes() {
        let config = SessionConfig {
            clear_cut_planes_on_deselect: false,
            ..SessionConfig::default()
        };
        let mut session = ViewerSession::with_config(HeadlessEngine::new(), config);
        session.load(Some(&sample())).unwrap();
        session.select(ElementId(4));
        session.add_cut_plane(CutPlane::from_axis(Axis::Z, 3.0));
        session.clear_selection();
        assert_eq!(session.cut_planes().len(), 1);
    }

    #[test]
    fn camera_updates_coalesce_and_replace_history() {
        let mut session = session();
        session.camera_moved(CameraState::new([1.0, 0.0, 0.0], [0.0; 3], true));
        session.camera_moved(CameraState::new([2.0, 0.0, 0.0], [0.0; 3], true));
        session.camera_moved(CameraState::new([f64::NAN, 0.0, 0.0], [0.0; 3], true));
        let write = session.flush(0.0).unwrap();
        assert_eq!(write.fragment, "c:2,0,0,0,0,0,true");
        assert_eq!(write.mode, WriteMode::Replace);
        // Orbiting is the engine's own motion; nothing is sent back to it.
        assert!(session.engine().commands.iter().all(|c| !matches!(c, EngineCommand::SetCamera(_))));
    }

    #[test]
    fn navigate_applies_camera_then_planes_then_selection() {
        let mut session = session();
        let errors = session.navigate("#c:1,2,3,4,5,6,false::p:x=2::i:1,2,3,5::q:1");
        assert_eq!(errors.len(), 1);
        assert_eq!(session.selection().primary(), Some(ElementId(5)));
        assert_eq!(session.cut_planes().len(), 1);

        let commands = &session.engine().commands;
        let camera_at = commands
            .iter()
            .position(|c| matches!(c, EngineCommand::SetCamera(_)))
            .unwrap();
        let plane_at = commands
            .iter()
            .position(|c| matches!(c, EngineCommand::AddCutPlane(_)))
            .unwrap();
        assert!(camera_at < plane_at);

        // Applying a link never writes it back.
        assert_eq!(session.flush(10_000.0), None);
    }

    #[test]
    fn own_writes_are_not_reapplied() {
        let mut session = session();
        session.select(ElementId(5));
        let write = session.flush(0.0).unwrap();
        session.engine_mut().commands.clear();
        assert!(session.navigate(&format!("#{}", write.fragment)).is_empty());
        assert!(session.engine().commands.is_empty());
    }

    #[test]
    fn navigation_keeps_an_orbit_not_yet_committed() {
        let mut session = session();
        let earlier = CameraState::new([1.0, 0.0, 0.0], [0.0; 3], true);
        let orbit = CameraState::new([9.0, 0.0, 0.0], [0.0; 3], true);
        session.camera_moved(earlier);
        session.flush(0.0).unwrap();

        session.engine_mut().orbit_to(orbit);
        session.camera_moved(orbit);
        session.engine_mut().commands.clear();
        assert!(session.navigate("#i:1,2").is_empty());

        assert_eq!(session.camera(), Some(&orbit));
        assert_eq!(session.engine().camera, Some(orbit));
        assert!(session.engine().commands.iter().all(|c| !matches!(c, EngineCommand::SetCamera(_))));
        assert_eq!(session.selection().primary(), Some(ElementId(2)));

        let write = session.flush(10.0).unwrap();
        assert_eq!(write.fragment, "c:9,0,0,0,0,0,true::i:1,2");
        assert_eq!(write.mode, WriteMode::Replace);
    }

    #[test]
    fn link_camera_overrides_pending_orbit() {
        let mut session = session();
        session.camera_moved(CameraState::new([9.0, 0.0, 0.0], [0.0; 3], true));
        session.navigate("c:1,2,3,4,5,6,false");
        assert_eq!(
            session.engine().camera,
            Some(CameraState::new([1.0, 2.0, 3.0], [4.0, 5.0, 6.0], false))
        );
        assert_eq!(session.flush(10.0), None);
    }

    #[test]
    fn replacing_the_model_resyncs_the_location() {
        let mut session = session();
        session.select(ElementId(2));
        assert_eq!(session.flush(0.0).unwrap().fragment, "i:1,2");

        session.load(Some(&sample())).unwrap();
        assert_eq!(session.fragment(), "");
        let write = session.flush(10.0).unwrap();
        assert_eq!(write.fragment, "");
        assert_eq!(write.mode, WriteMode::Replace);
        assert_eq!(session.flush(20.0), None);
    }

    #[test]
    fn first_load_writes_nothing() {
        let mut session = session();
        assert_eq!(session.flush(0.0), None);
    }

    #[test]
    fn unresolved_paths_become_no_selection() {
        let mut session = session();
        session.select(ElementId(4));
        session.navigate("i:1,9,4");
        assert!(session.selection().is_empty());
        assert!(session.engine().highlighted.is_empty());
    }

    #[test]
    fn view_from_url_waits_for_model() {
        let mut session = ViewerSession::new(HeadlessEngine::new());
        session.navigate("i:1,2,3,4::p:z=1");
        assert!(session.has_pending_view());
        session.load(Some(&sample())).unwrap();
        assert!(!session.has_pending_view());
        assert_eq!(session.selection().primary(), Some(ElementId(4)));
        assert_eq!(session.cut_planes().len(), 1);
    }

    #[test]
    fn stale_search_results_are_ignored() {
        let mut session = session();
        let results = session.search("wall");
        assert_eq!(results.ids, vec![ElementId(4)]);
        session.load(Some(&sample())).unwrap();
        assert!(session.select_search_results(&results).is_noop());
        assert!(session.selection().is_empty());
    }

    #[test]
    fn search_and_select_replaces_selection() {
        let mut session = session();
        session.select(ElementId(2));
        let results = session.search_and_select("ifcw");
        assert_eq!(results.ids, vec![ElementId(4), ElementId(5)]);
        assert_eq!(session.selection().selected(), &[ElementId(4), ElementId(5)]);
        assert_eq!(session.selection().primary(), None);
    }

    #[test]
    fn search_keeps_cut_planes() {
        let mut session = session();
        session.select(ElementId(4));
        session.add_cut_plane(CutPlane::from_axis(Axis::Z, 3.0));
        session.search_and_select("window");
        assert_eq!(session.selection().selected(), &[ElementId(5)]);
        assert_eq!(session.cut_planes().len(), 1);
        assert_eq!(session.engine().cut_planes.len(), 1);
    }

    #[test]
    fn search_respects_result_cap() {
        let config = SessionConfig {
            max_search_results: Some(1),
            ..SessionConfig::default()
        };
        let mut session = ViewerSession::with_config(HeadlessEngine::new(), config);
        session.load(Some(&sample())).unwrap();
        assert_eq!(session.search("ifcw").ids, vec![ElementId(4)]);
    }

    #[test]
    fn select_path_reports_misses() {
        let mut session = session();
        let path: ElementPath = "1,2,3,5".parse().unwrap();
        assert_eq!(session.select_path(&path), Ok(ElementId(5)));
        let stale: ElementPath = "1,3".parse().unwrap();
        assert!(session.select_path(&stale).is_err());
        assert_eq!(session.selection().primary(), Some(ElementId(5)));
    }

    #[test]
    fn cut_plane_editing() {
        let mut session = session();
        assert!(session.add_cut_plane(CutPlane::from_axis(Axis::X, 1.0)));
        assert!(session.add_cut_plane(CutPlane::from_axis(Axis::Y, 2.0)));
        assert!(!session.add_cut_plane(CutPlane::new([0.0; 3], [0.0; 3])));
        assert_eq!(session.remove_cut_plane(0), Some(CutPlane::from_axis(Axis::X, 1.0)));
        assert_eq!(session.remove_cut_plane(5), None);
        assert_eq!(session.engine().cut_planes, vec![CutPlane::from_axis(Axis::Y, 2.0)]);
        session.clear_cut_planes();
        assert!(session.engine().cut_planes.is_empty());
    }
}
