// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Lite View
//!
//! Spatial element index and view-state synchronization for the IFC-Lite
//! viewer.
//!
//! ## Overview
//!
//! The crate turns the loader's hierarchical scene description into a
//! queryable, path-addressable model and keeps the viewer's state (selection,
//! camera, cut planes) in step with a shareable URL fragment and an external
//! 3D engine:
//!
//! - **Model tree**: arena-backed element hierarchy with O(1) id lookup
//! - **Search index**: token postings over type names and properties
//! - **Element paths**: root-to-leaf id chains that survive a reload
//! - **Selection**: single/multiple selection plus hover preselection
//! - **Fragment codec**: tolerant `c:`/`p:`/`i:` link format
//! - **Engine adapter**: validated, deduplicated camera and clipping commands
//! - **Session**: the pipeline tying these together without update loops
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_lite_view::{HeadlessEngine, ModelBuild, ViewerSession};
//!
//! let mut session = ViewerSession::new(HeadlessEngine::new());
//! let ticket = session.begin_load();
//! let build = ModelBuild::from_json(scene_json);
//! session.finish_load(ticket, build)?;
//!
//! session.search_and_select("wall");
//! if let Some(write) = session.tick(now_ms) {
//!     history.replace_state(&format!("#{}", write.fragment));
//! }
//!
//! // A shared link opened later:
//! session.navigate("#c:10,5,10,0,0,0::p:z=3::i:1,2,3,4");
//! ```

pub mod adapter;
pub mod camera;
pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod keys;
pub mod path;
pub mod raw;
pub mod selection;
pub mod session;
pub mod sync;
pub mod tree;

pub use adapter::{EngineAdapter, EngineCommand, HeadlessEngine, PickEvent, PickKind, ViewerEngine};
pub use camera::{Axis, CameraState, CutPlane};
pub use codec::{canonicalize, decode, encode, Decoded, ViewState};
pub use config::SessionConfig;
pub use error::{CodecError, Error, PathMiss, PickMiss, Result, StructureError};
pub use index::SearchIndex;
pub use keys::{ElementId, ElementKey};
pub use path::{compute_path, path_of, resolve_path, ElementPath};
pub use raw::{parse_scene, RawElement};
pub use selection::{Selection, SelectionCoordinator, SelectionState, Transition};
pub use session::{LoadOutcome, LoadTicket, LoadedModel, ModelBuild, SearchResults, ViewerSession};
pub use sync::{FragmentSync, HistoryWrite, WriteMode};
pub use tree::{build_tree, Element, ModelTree};
