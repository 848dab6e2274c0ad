//! Declarative UI layout model with a reconciled per-component state store.
//!
//! A layout is a nested JSON description of typed components with attributes.
//! This crate turns it into:
//!
//! - **A component tree** walkable at any depth, plus a pre-order flat index
//! - **Settings**: one reserved component isolated from the renderable tree
//! - **A state store** keyed by component id, which can be reconciled with a
//!   previously exported snapshot after the layout has been edited
//!
//! # Example
//!
//! ```
//! use lattice_layout::prelude::*;
//! use serde_json::json;
//!
//! let layout = json!([
//!     { "type": "settings", "attributes": { "columns": 12 } },
//!     { "type": "block", "id": "hero", "attributes": { "title": "Welcome" } }
//! ]);
//!
//! // First session: create state and let the user edit it.
//! let model = LayoutModel::new(&layout, LayoutOptions::default())?;
//! model.create_store(DefaultState::value(json!({ "collapsed": false })));
//! model.get_component_state("hero").unwrap().update(|s| s["collapsed"] = json!(true));
//! let saved = model.export_store(false)?;
//!
//! // Next session: same layout, saved edits win.
//! let model = LayoutModel::new(&layout, LayoutOptions::default())?;
//! model.create_store(DefaultState::value(json!({ "collapsed": false })));
//! model.merge_store_json(&saved)?;
//! assert_eq!(model.get_component_state("hero").unwrap().get()["collapsed"], json!(true));
//! # Ok::<(), lattice_layout::LayoutError>(())
//! ```

mod error;
mod json;
pub mod model;
pub mod options;
pub mod settings;
pub mod store;

pub use error::{LayoutError, LayoutResult};
pub use model::LayoutModel;
pub use options::{LayoutOptions, DEFAULT_SETTINGS_COMPONENT_CODE};
pub use settings::{Settings, SettingsProjection, COMPONENT_ID_REF_FIELD};
pub use store::{ComponentStore, DefaultState, SharedState, ATTRIBUTE_HASH_FIELD};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::{
        ComponentStore, DefaultState, LayoutError, LayoutModel, LayoutOptions, LayoutResult,
        Settings, SharedState,
    };
    pub use lattice_layout_core::{
        Component, ComponentDescriptor, ComponentGroup, ComponentId, ComponentTree,
    };
}
