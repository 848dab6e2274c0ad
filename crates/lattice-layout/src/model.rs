//! The layout model.
//!
//! [`LayoutModel`] ties the pieces together: it builds the component tree from
//! a raw layout, pulls out the settings component, indexes every remaining
//! component in pre-order, and owns the per-component state store.
//!
//! # Lifecycle
//!
//! Everything derived from the layout is computed once in [`LayoutModel::new`]
//! and never changes afterwards. The store starts out absent; it is created by
//! [`LayoutModel::create_store`], replaced wholesale by
//! [`LayoutModel::merge_store`], and edited entry by entry through the
//! `*_component_state` methods. Store access goes through an internal lock, so
//! store operations take `&self` and can be combined with borrows of the tree:
//!
//! ```
//! use lattice_layout::{DefaultState, LayoutModel, LayoutOptions};
//! use serde_json::json;
//!
//! let model = LayoutModel::new(
//!     &json!([
//!         { "type": "settings", "attributes": { "theme": "dark" } },
//!         { "type": "tab", "attributes": { "label": "One" } },
//!         { "type": "tab", "attributes": { "label": "Two" } }
//!     ]),
//!     LayoutOptions::default(),
//! )?;
//! assert_eq!(model.settings().get("theme"), Some(&json!("dark")));
//!
//! model.create_store(DefaultState::value(json!({ "active": false })));
//! model.sync_component_states(model.components().group_by_type("tab"))?;
//!
//! // Ids follow declaration order, so the tabs are "1" and "2".
//! model.get_component_state("1").unwrap().update(|state| state["active"] = json!(true));
//! assert_eq!(model.get_component_state("2").unwrap().get()["active"], json!(true));
//! # Ok::<(), lattice_layout::LayoutError>(())
//! ```

use parking_lot::RwLock;
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

use lattice_layout_core::{
    json_kind, Component, ComponentDescriptor, ComponentId, ComponentKey, ComponentTree,
    TreeError,
};

use crate::error::{LayoutError, LayoutResult};
use crate::json;
use crate::options::LayoutOptions;
use crate::settings::{extract_settings, Settings};
use crate::store::{ComponentStore, DefaultState, SharedState};

/// A parsed layout with its settings and per-component state.
#[derive(Debug)]
pub struct LayoutModel {
    options: LayoutOptions,
    layout: Value,
    components: ComponentTree,
    flat_components: Vec<ComponentKey>,
    settings: Settings,
    store: RwLock<Option<ComponentStore>>,
}

static_assertions::assert_impl_all!(LayoutModel: Send, Sync);

impl LayoutModel {
    /// Build a model from a JSON layout.
    ///
    /// The layout must be an array of component descriptors; anything else
    /// fails with an invalid-argument error before any work is done. The
    /// caller's value is copied, never mutated.
    #[tracing::instrument(skip(layout), target = "lattice_layout::model", level = "debug")]
    pub fn new(layout: &Value, options: LayoutOptions) -> LayoutResult<Self> {
        if !layout.is_array() {
            return Err(TreeError::invalid_argument("layout", "an array", layout).into());
        }
        let components = ComponentTree::from_value(layout)?;
        Self::from_tree(layout.clone(), components, options)
    }

    /// Build a model from JSON text.
    pub fn from_json_str(text: &str, options: LayoutOptions) -> LayoutResult<Self> {
        let layout: Value = serde_json::from_str(text)?;
        Self::new(&layout, options)
    }

    /// Build a model from typed descriptors.
    pub fn from_descriptors(
        descriptors: &[ComponentDescriptor],
        options: LayoutOptions,
    ) -> LayoutResult<Self> {
        let layout = serde_json::to_value(descriptors)?;
        let components = ComponentTree::from_descriptors(descriptors)?;
        Self::from_tree(layout, components, options)
    }

    fn from_tree(
        layout: Value,
        mut components: ComponentTree,
        options: LayoutOptions,
    ) -> LayoutResult<Self> {
        let settings = extract_settings(&mut components, &options)?;
        let flat_components = components.flatten_keys();
        tracing::debug!(
            target: "lattice_layout::model",
            components = flat_components.len(),
            has_settings = !settings.is_empty(),
            "layout model built"
        );

        Ok(Self {
            options,
            layout,
            components,
            flat_components,
            settings,
            store: RwLock::new(None),
        })
    }

    // =========================================================================
    // Layout access
    // =========================================================================

    /// The options the model was built with.
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// The model's own copy of the raw layout.
    pub fn layout(&self) -> &Value {
        &self.layout
    }

    /// The component tree, without the settings component when it was pulled.
    pub fn components(&self) -> &ComponentTree {
        &self.components
    }

    /// Every component of the tree in pre-order.
    pub fn flat_components(&self) -> Vec<&Component> {
        self.flat_components
            .iter()
            .filter_map(|&key| self.components.get(key))
            .collect()
    }

    /// Look up a component by id, including a detached settings component.
    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.get_by_id(id)
    }

    /// The settings of the layout.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // =========================================================================
    // State store
    // =========================================================================

    /// Create a fresh store with one record per flat component.
    ///
    /// Replaces any existing store wholesale.
    #[tracing::instrument(skip_all, target = "lattice_layout::store", level = "debug")]
    pub fn create_store(&self, default: impl Into<DefaultState>) -> &Self {
        let default = default.into();
        let store = ComponentStore::seed(self.flat_components(), &default);
        tracing::debug!(target: "lattice_layout::store", entries = store.len(), "store created");
        *self.store.write() = Some(store);
        self
    }

    /// Reconcile the store with a previously saved snapshot.
    ///
    /// A snapshot that is not a JSON object is ignored with a warning. See
    /// [`ComponentStore::merged`] for the precedence rules.
    #[tracing::instrument(skip_all, target = "lattice_layout::store", level = "debug")]
    pub fn merge_store(&self, incoming: &Value) -> &Self {
        match incoming.as_object() {
            Some(map) => self.merge_store_map(map),
            None => {
                if !self.options.suppress_warnings {
                    tracing::warn!(
                        target: "lattice_layout::store",
                        got = json_kind(incoming),
                        "store snapshot is not an object, merge skipped"
                    );
                }
                self
            }
        }
    }

    /// Reconcile the store with a snapshot given as a JSON map.
    pub fn merge_store_map(&self, incoming: &Map<String, Value>) -> &Self {
        let mut guard = self.store.write();
        let merged = guard
            .as_ref()
            .map(|store| store.merged(incoming))
            .unwrap_or_default();
        tracing::debug!(
            target: "lattice_layout::store",
            entries = merged.len(),
            incoming = incoming.len(),
            "store merged"
        );
        *guard = Some(merged);
        self
    }

    /// Parse a snapshot exported by [`LayoutModel::export_store`] and merge it.
    pub fn merge_store_json(&self, text: &str) -> LayoutResult<&Self> {
        let incoming: Value = serde_json::from_str(text)?;
        Ok(self.merge_store(&incoming))
    }

    /// The state cell of a component, or `None` if unknown or no store exists.
    pub fn get_component_state(&self, id: &str) -> Option<SharedState> {
        self.store.read().as_ref()?.get(id).cloned()
    }

    /// Install a new record for a component, creating the entry if needed.
    ///
    /// Returns the handle of the written record.
    pub fn set_component_state(
        &self,
        id: impl Into<ComponentId>,
        state: Value,
    ) -> LayoutResult<SharedState> {
        let mut guard = self.store.write();
        let store = guard.as_mut().ok_or(LayoutError::StoreNotCreated)?;
        let cell = SharedState::new(state);
        store.insert(id.into(), cell.clone());
        Ok(cell)
    }

    /// Make every given component share the state of the first one.
    ///
    /// Accepts any ordered selection of components: a
    /// [`ComponentGroup`](lattice_layout_core::ComponentGroup), a
    /// `&ComponentTree`, a slice or vector of `&Component`. The same cell is
    /// installed under every id, so in-place edits through one id are visible
    /// through all of them until the store is next created or merged.
    ///
    /// If the first component has no state, every given id is left without
    /// state. The ids stay in the store, so a later merge fills them again.
    pub fn sync_component_states<'a, I>(&self, components: I) -> LayoutResult<&Self>
    where
        I: IntoIterator<Item = &'a Component>,
    {
        self.sync_component_ids(components.into_iter().map(Component::id))
    }

    /// Same as [`LayoutModel::sync_component_states`], addressed by id.
    pub fn sync_component_ids<I, T>(&self, ids: I) -> LayoutResult<&Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let ids: Vec<ComponentId> = ids.into_iter().map(|id| ComponentId::from(id.as_ref())).collect();
        let Some(first) = ids.first() else {
            return Err(LayoutError::EmptySelection);
        };

        let mut guard = self.store.write();
        let store = guard.as_mut().ok_or(LayoutError::StoreNotCreated)?;
        match store.get(first.as_str()).cloned() {
            Some(shared) => {
                for id in &ids {
                    store.insert(id.clone(), shared.clone());
                }
            }
            None => {
                // The first component has no state, so none of them do.
                for id in &ids {
                    store.vacate(id.clone());
                }
            }
        }
        tracing::debug!(target: "lattice_layout::store", key = %first, count = ids.len(), "component states synced");
        Ok(self)
    }

    /// Serialize the store; `pretty` output is tab-indented.
    pub fn export_store(&self, pretty: bool) -> LayoutResult<String> {
        self.store
            .read()
            .as_ref()
            .ok_or(LayoutError::StoreNotCreated)?
            .to_json_string(pretty)
    }

    /// A deep copy of the store as JSON, or `None` if no store exists.
    pub fn store_snapshot(&self) -> Option<Value> {
        self.store.read().as_ref().map(ComponentStore::snapshot)
    }

    /// Access the store with a read lock for complex queries.
    pub fn with_store<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&ComponentStore) -> R,
    {
        self.store.read().as_ref().map(f)
    }

    /// Serialize the component tree; `pretty` output is tab-indented.
    pub fn to_json(&self, pretty: bool) -> LayoutResult<String> {
        json::to_json_string(self, pretty)
    }
}

/// A model serializes as its component tree.
impl Serialize for LayoutModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.components.serialize(serializer)
    }
}
