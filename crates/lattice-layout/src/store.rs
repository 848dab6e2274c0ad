//! Per-component state store.
//!
//! The store maps every [`ComponentId`] to a JSON state record held in a
//! [`SharedState`] cell. Cells are normally owned by a single id; syncing a
//! group of components installs one cell under several ids so that in-place
//! edits through any of them are visible through all of them. Replacing the
//! store (create or merge) always allocates fresh cells, which ends any
//! sharing.
//!
//! An id can also be kept in the store with no state at all (see
//! [`ComponentStore::vacate`]). Such ids read as absent and are left out of
//! exports, but a merge still visits them and fills them from the snapshot.
//!
//! # Records
//!
//! Records created by [`ComponentStore::seed`] carry the reserved
//! [`ATTRIBUTE_HASH_FIELD`] holding the hash of the component's attributes at
//! the time the record was made. Merging compares this field to decide whether
//! a previously saved record still describes the same component definition.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use lattice_layout_core::{attribute_hash, Component, ComponentId};

use crate::error::LayoutResult;
use crate::json;

/// Reserved record field holding the attribute hash.
pub const ATTRIBUTE_HASH_FIELD: &str = "__attributes__";

/// A shared, mutable state record.
///
/// Cloning a `SharedState` clones the handle, not the record.
#[derive(Clone, Default)]
pub struct SharedState(Arc<RwLock<Value>>);

impl SharedState {
    /// Wrap a record in a new cell.
    pub fn new(value: Value) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// A deep copy of the current record.
    pub fn get(&self) -> Value {
        self.0.read().clone()
    }

    /// Borrow the record for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.0.read()
    }

    /// Borrow the record for in-place mutation.
    pub fn write(&self) -> RwLockWriteGuard<'_, Value> {
        self.0.write()
    }

    /// Replace the record in place, returning the previous one.
    pub fn replace(&self, value: Value) -> Value {
        std::mem::replace(&mut *self.0.write(), value)
    }

    /// Mutate the record in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut self.0.write())
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(&self, other: &SharedState) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The attribute hash stored in the record, if any.
    pub fn attribute_hash(&self) -> Option<String> {
        self.0
            .read()
            .get(ATTRIBUTE_HASH_FIELD)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }
}

impl fmt::Debug for SharedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedState").field(&*self.0.read()).finish()
    }
}

impl PartialEq for SharedState {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.read() == *other.0.read()
    }
}

impl Serialize for SharedState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.read().serialize(serializer)
    }
}

/// Source of the initial state of each component when a store is created.
pub enum DefaultState {
    /// A fixed value, copied for every component.
    Value(Value),
    /// A generator invoked once per component.
    Factory(Box<dyn Fn(&Component) -> Value + Send + Sync>),
}

impl DefaultState {
    /// A fixed default value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// A per-component default generator.
    pub fn factory(f: impl Fn(&Component) -> Value + Send + Sync + 'static) -> Self {
        Self::Factory(Box::new(f))
    }

    /// The default record for one component, never shared with another component.
    pub fn resolve(&self, component: &Component) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Factory(factory) => factory(component),
        }
    }
}

impl Default for DefaultState {
    fn default() -> Self {
        Self::Value(Value::Object(Map::new()))
    }
}

impl From<Value> for DefaultState {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Map<String, Value>> for DefaultState {
    fn from(map: Map<String, Value>) -> Self {
        Self::Value(Value::Object(map))
    }
}

impl fmt::Debug for DefaultState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Mapping from component id to state record, in component order.
#[derive(Debug, Clone, Default)]
pub struct ComponentStore {
    entries: IndexMap<ComponentId, Option<SharedState>>,
}

impl ComponentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record for every component.
    ///
    /// Fields of an object-shaped default become fields of the record; other
    /// defaults contribute no fields. Every record gets the attribute hash.
    pub fn seed<'a>(
        components: impl IntoIterator<Item = &'a Component>,
        default: &DefaultState,
    ) -> Self {
        let entries = components
            .into_iter()
            .map(|component| {
                let mut record = match default.resolve(component) {
                    Value::Object(map) => map,
                    other => {
                        tracing::trace!(
                            target: "lattice_layout::store",
                            id = %component.id(),
                            default = %other,
                            "non-object default state contributes no fields"
                        );
                        Map::new()
                    }
                };
                record.insert(
                    ATTRIBUTE_HASH_FIELD.to_string(),
                    Value::String(attribute_hash(component.attributes())),
                );
                (component.id().clone(), Some(SharedState::new(Value::Object(record))))
            })
            .collect();
        Self { entries }
    }

    /// Reconcile this store with a saved snapshot, producing a new store.
    ///
    /// Only ids known to this store are kept, including vacant ones. For each id:
    /// - if both records exist and their attribute hashes differ, the saved
    ///   record is the base and the current record overrides it;
    /// - otherwise the current record is the base and the saved record
    ///   overrides it.
    ///
    /// Every resulting record lives in a fresh cell.
    pub fn merged(&self, incoming: &Map<String, Value>) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(id, state)| {
                let active = state.as_ref().map_or(Value::Null, SharedState::get);
                let passed = incoming.get(id.as_str());
                let record = match passed {
                    Some(passed) if is_stale(&active, passed) => {
                        tracing::trace!(target: "lattice_layout::store", %id, "attributes changed, keeping current record");
                        overlay(passed, Some(&active))
                    }
                    _ => overlay(&active, passed),
                };
                (id.clone(), Some(SharedState::new(record)))
            })
            .collect();
        Self { entries }
    }

    /// Get the cell of a component, `None` if unknown or vacant.
    pub fn get(&self, id: &str) -> Option<&SharedState> {
        self.entries.get(id).and_then(Option::as_ref)
    }

    /// Install a cell under an id, returning the previous one.
    pub fn insert(&mut self, id: ComponentId, state: SharedState) -> Option<SharedState> {
        self.entries.insert(id, Some(state)).flatten()
    }

    /// Keep an id in the store with no state, returning the previous cell.
    pub fn vacate(&mut self, id: ComponentId) -> Option<SharedState> {
        self.entries.insert(id, None).flatten()
    }

    /// Remove a component's entry altogether.
    pub fn remove(&mut self, id: &str) -> Option<SharedState> {
        self.entries.shift_remove(id).flatten()
    }

    /// Whether a component has state.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Whether a component has an entry, vacant or not.
    pub fn contains_id(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of components with state.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no component has state.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Ids of components with state, in store order.
    pub fn ids(&self) -> impl Iterator<Item = &ComponentId> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// Components with state, in store order.
    pub fn iter(&self) -> impl Iterator<Item = (&ComponentId, &SharedState)> + '_ {
        self.entries
            .iter()
            .filter_map(|(id, state)| state.as_ref().map(|state| (id, state)))
    }

    /// A deep copy of the store as a JSON object.
    pub fn snapshot(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(id, state)| (id.to_string(), state.get()))
                .collect(),
        )
    }

    /// Serialize the store; `pretty` output is tab-indented.
    pub fn to_json_string(&self, pretty: bool) -> LayoutResult<String> {
        json::to_json_string(self, pretty)
    }
}

impl Serialize for ComponentStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (id, state) in self.iter() {
            map.serialize_entry(id, state)?;
        }
        map.end()
    }
}

/// Both records present and describing different attribute definitions.
fn is_stale(active: &Value, passed: &Value) -> bool {
    is_truthy(active)
        && is_truthy(passed)
        && active.get(ATTRIBUTE_HASH_FIELD) != passed.get(ATTRIBUTE_HASH_FIELD)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Shallow merge: keys of `base`, overridden by keys of `top`.
///
/// Non-object sides contribute no keys.
fn overlay(base: &Value, top: Option<&Value>) -> Value {
    let mut merged = base.as_object().cloned().unwrap_or_default();
    if let Some(top) = top.and_then(Value::as_object) {
        for (key, value) in top {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}
