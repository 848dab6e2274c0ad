//! Component tree built from a nested layout description.
//!
//! Provides the arena-backed tree with:
//! - Construction from JSON or typed descriptors, with stable id assignment
//! - Ordered iteration, grouping by type code and "first match" lookup
//! - Pre-order flattening of the whole tree or of any sub-tree
//! - Detaching a component from the presence list that holds it
//!
//! # Storage
//!
//! Every component ever built lives in a [`SlotMap`] arena for the lifetime of
//! the tree. Structure is expressed by ordered presence lists: the tree's root
//! list and each component's child list. Detaching a component only edits the
//! list that holds it; the component itself stays addressable through its
//! [`ComponentKey`], which is how a detached settings component remains
//! reachable after it has left the renderable tree.

use std::collections::HashMap;

use serde::Deserialize;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;
use slotmap::SlotMap;

use crate::component::{
    null_as_default, Attributes, Component, ComponentDescriptor, ComponentId, ComponentKey,
    DescriptorId,
};
use crate::error::{TreeError, TreeResult};

/// Descriptor shape read straight from JSON, children kept raw so errors can
/// report the exact declaration path.
#[derive(Deserialize)]
struct RawDescriptor {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    attributes: Attributes,
    #[serde(default, deserialize_with = "null_as_default")]
    children: Vec<Value>,
    #[serde(default)]
    id: Option<DescriptorId>,
}

/// Components without an authored id, with their declaration paths.
type PendingIds = Vec<(ComponentKey, String)>;

/// An ordered tree of layout components.
///
/// # Example
///
/// ```
/// use lattice_layout_core::ComponentTree;
/// use serde_json::json;
///
/// let tree = ComponentTree::from_value(&json!([
///     { "type": "settings", "attributes": { "theme": "dark" } },
///     { "type": "block", "children": [{ "type": "text" }] }
/// ]))?;
///
/// let flat: Vec<&str> = tree.flatten().into_iter().map(|c| c.id().as_str()).collect();
/// assert_eq!(flat, ["0", "1", "1.0"]);
/// assert_eq!(tree.group_by_type("block").len(), 1);
/// # Ok::<(), lattice_layout_core::TreeError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComponentTree {
    arena: SlotMap<ComponentKey, Component>,
    roots: Vec<ComponentKey>,
    index: HashMap<ComponentId, ComponentKey>,
}

impl ComponentTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a JSON layout description.
    ///
    /// The layout must be an array of descriptors; anything else fails with
    /// [`TreeError::InvalidArgument`] before any node is built.
    pub fn from_value(layout: &Value) -> TreeResult<Self> {
        let nodes = layout
            .as_array()
            .ok_or_else(|| TreeError::invalid_argument("layout", "an array", layout))?;

        let mut tree = Self::new();
        let mut pending = Vec::new();
        for (position, node) in nodes.iter().enumerate() {
            tree.insert_value(node, None, position.to_string(), &mut pending)?;
        }
        tree.assign_generated_ids(pending);
        tracing::debug!(
            target: "lattice_layout_core::tree",
            roots = tree.roots.len(),
            components = tree.arena.len(),
            "built component tree"
        );
        Ok(tree)
    }

    /// Build a tree from typed descriptors.
    pub fn from_descriptors(descriptors: &[ComponentDescriptor]) -> TreeResult<Self> {
        let mut tree = Self::new();
        let mut pending = Vec::new();
        for (position, descriptor) in descriptors.iter().enumerate() {
            tree.insert_descriptor(descriptor, None, position.to_string(), &mut pending)?;
        }
        tree.assign_generated_ids(pending);
        tracing::debug!(
            target: "lattice_layout_core::tree",
            roots = tree.roots.len(),
            components = tree.arena.len(),
            "built component tree"
        );
        Ok(tree)
    }

    fn insert_value(
        &mut self,
        node: &Value,
        parent: Option<ComponentKey>,
        path: String,
        pending: &mut PendingIds,
    ) -> TreeResult<ComponentKey> {
        let raw = RawDescriptor::deserialize(node)
            .map_err(|err| TreeError::invalid_descriptor(path.clone(), err))?;
        let key = self.insert_node(
            raw.id.as_ref().map(ComponentId::from),
            &path,
            raw.kind,
            raw.attributes,
            parent,
            pending,
        )?;
        for (position, child) in raw.children.iter().enumerate() {
            self.insert_value(child, Some(key), format!("{path}.{position}"), pending)?;
        }
        Ok(key)
    }

    fn insert_descriptor(
        &mut self,
        descriptor: &ComponentDescriptor,
        parent: Option<ComponentKey>,
        path: String,
        pending: &mut PendingIds,
    ) -> TreeResult<ComponentKey> {
        let key = self.insert_node(
            descriptor.id.as_ref().map(ComponentId::from),
            &path,
            descriptor.kind.clone(),
            descriptor.attributes.clone(),
            parent,
            pending,
        )?;
        for (position, child) in descriptor.children.iter().enumerate() {
            self.insert_descriptor(child, Some(key), format!("{path}.{position}"), pending)?;
        }
        Ok(key)
    }

    /// Insert a component and append it to its parent's child list (or the root list).
    ///
    /// Authored ids are claimed immediately. Components without one are queued
    /// in `pending` and named once every authored id is known.
    fn insert_node(
        &mut self,
        authored: Option<ComponentId>,
        path: &str,
        kind: String,
        attributes: Attributes,
        parent: Option<ComponentKey>,
        pending: &mut PendingIds,
    ) -> TreeResult<ComponentKey> {
        if let Some(id) = &authored {
            if self.index.contains_key(id) {
                return Err(TreeError::DuplicateComponentId(id.clone()));
            }
        }

        let is_authored = authored.is_some();
        let id = authored.unwrap_or_else(|| ComponentId::new(path));
        let key = self.arena.insert_with_key(|key| Component {
            key,
            id: id.clone(),
            kind,
            attributes,
            parent,
            children: Vec::new(),
        });
        tracing::trace!(target: "lattice_layout_core::tree", ?key, %path, authored = is_authored, "inserted component");
        if is_authored {
            self.index.insert(id, key);
        } else {
            pending.push((key, path.to_owned()));
        }

        match parent {
            Some(parent_key) => self
                .arena
                .get_mut(parent_key)
                .ok_or(TreeError::InvalidComponentKey)?
                .children
                .push(key),
            None => self.roots.push(key),
        }
        Ok(key)
    }

    /// Name every queued component after its declaration path.
    ///
    /// A path already claimed by an authored id gets a `~n` suffix. Paths never
    /// contain `~`, so generated ids cannot collide with each other.
    fn assign_generated_ids(&mut self, pending: PendingIds) {
        for (key, path) in pending {
            let mut id = ComponentId::new(path.as_str());
            let mut attempt = 1;
            while self.index.contains_key(&id) {
                id = ComponentId::new(format!("{path}~{attempt}"));
                attempt += 1;
            }
            if let Some(component) = self.arena.get_mut(key) {
                component.id = id.clone();
            }
            self.index.insert(id, key);
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Number of top-level components currently in the tree.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether the tree has no top-level components.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of components in the arena, detached ones included.
    pub fn component_count(&self) -> usize {
        self.arena.len()
    }

    /// Keys of the top-level components, in declaration order.
    pub fn roots(&self) -> &[ComponentKey] {
        &self.roots
    }

    /// Iterate over the top-level components in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Component> + '_ {
        self.roots.iter().filter_map(|&key| self.arena.get(key))
    }

    /// Get a component by key, attached or detached.
    pub fn get(&self, key: ComponentKey) -> Option<&Component> {
        self.arena.get(key)
    }

    /// Get a component by id, attached or detached.
    pub fn get_by_id(&self, id: &str) -> Option<&Component> {
        self.index.get(id).and_then(|&key| self.arena.get(key))
    }

    /// Get the parent of a component.
    pub fn parent(&self, key: ComponentKey) -> TreeResult<Option<&Component>> {
        let component = self.arena.get(key).ok_or(TreeError::InvalidComponentKey)?;
        Ok(component.parent.and_then(|parent| self.arena.get(parent)))
    }

    /// The attached children of a component, in order.
    pub fn children(&self, key: ComponentKey) -> TreeResult<ComponentGroup<'_>> {
        let component = self.arena.get(key).ok_or(TreeError::InvalidComponentKey)?;
        Ok(self.group_of(&component.children))
    }

    /// All top-level components as a group.
    pub fn components(&self) -> ComponentGroup<'_> {
        self.group_of(&self.roots)
    }

    /// Top-level components whose type code equals `code`, in order.
    pub fn group_by_type(&self, code: &str) -> ComponentGroup<'_> {
        self.components().group_by_type(code)
    }

    /// The first top-level component, if any.
    pub fn first(&self) -> Option<&Component> {
        self.iter().next()
    }

    /// Whether a component is reachable from the root list.
    pub fn is_attached(&self, key: ComponentKey) -> bool {
        let mut current = key;
        loop {
            match self.arena.get(current) {
                Some(component) => match component.parent {
                    Some(parent) => current = parent,
                    None => return self.roots.contains(&current),
                },
                None => return false,
            }
        }
    }

    fn group_of(&self, keys: &[ComponentKey]) -> ComponentGroup<'_> {
        ComponentGroup::new(keys.iter().filter_map(|&key| self.arena.get(key)).collect())
    }

    // =========================================================================
    // Flattening
    // =========================================================================

    /// Keys of every attached component in pre-order.
    ///
    /// A parent always precedes its descendants and siblings keep declaration order.
    pub fn flatten_keys(&self) -> Vec<ComponentKey> {
        let mut result = Vec::with_capacity(self.arena.len());
        self.flatten_into(&self.roots, &mut result);
        result
    }

    /// Every attached component in pre-order.
    pub fn flatten(&self) -> Vec<&Component> {
        self.resolve(self.flatten_keys())
    }

    /// The pre-order flattening of a component's children (the component itself excluded).
    pub fn flatten_children(&self, key: ComponentKey) -> TreeResult<Vec<&Component>> {
        let component = self.arena.get(key).ok_or(TreeError::InvalidComponentKey)?;
        let mut result = Vec::new();
        self.flatten_into(&component.children, &mut result);
        Ok(self.resolve(result))
    }

    fn flatten_into(&self, keys: &[ComponentKey], result: &mut Vec<ComponentKey>) {
        for &key in keys {
            if let Some(component) = self.arena.get(key) {
                result.push(key);
                self.flatten_into(&component.children, result);
            }
        }
    }

    fn resolve(&self, keys: Vec<ComponentKey>) -> Vec<&Component> {
        keys.into_iter().filter_map(|key| self.arena.get(key)).collect()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Detach a component from the presence list that holds it.
    ///
    /// The component (and its own children) stay in the arena and remain
    /// reachable by key or id, but no longer appear in iteration, grouping or
    /// flattening of this tree. Returns `false` if it was already detached.
    pub fn detach(&mut self, key: ComponentKey) -> TreeResult<bool> {
        let parent = self
            .arena
            .get(key)
            .ok_or(TreeError::InvalidComponentKey)?
            .parent;

        let siblings = match parent {
            Some(parent_key) => {
                &mut self
                    .arena
                    .get_mut(parent_key)
                    .ok_or(TreeError::InvalidComponentKey)?
                    .children
            }
            None => &mut self.roots,
        };
        let before = siblings.len();
        siblings.retain(|&sibling| sibling != key);
        let removed = siblings.len() != before;

        if removed {
            if let Some(component) = self.arena.get_mut(key) {
                component.parent = None;
            }
            tracing::trace!(target: "lattice_layout_core::tree", ?key, ?parent, "detached component");
        }
        Ok(removed)
    }
}

impl<'a> IntoIterator for &'a ComponentTree {
    type Item = &'a Component;
    type IntoIter = std::vec::IntoIter<&'a Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter().collect::<Vec<_>>().into_iter()
    }
}

/// An ordered selection of components borrowed from a tree.
///
/// Produced by [`ComponentTree::group_by_type`], [`ComponentTree::children`] and
/// friends. Order always follows the tree's declaration order.
#[derive(Debug, Clone, Default)]
pub struct ComponentGroup<'a> {
    components: Vec<&'a Component>,
}

impl<'a> ComponentGroup<'a> {
    /// Wrap an ordered list of components.
    pub fn new(components: Vec<&'a Component>) -> Self {
        Self { components }
    }

    /// The first component, if any.
    pub fn first(&self) -> Option<&'a Component> {
        self.components.first().copied()
    }

    /// Number of components in the group.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the group is empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Iterate over the components in order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Component> + '_ {
        self.components.iter().copied()
    }

    /// Components of this group whose type code equals `code`.
    pub fn group_by_type(&self, code: &str) -> ComponentGroup<'a> {
        Self::new(
            self.components
                .iter()
                .copied()
                .filter(|component| component.kind == code)
                .collect(),
        )
    }

    /// The components as a slice.
    pub fn as_slice(&self) -> &[&'a Component] {
        &self.components
    }
}

impl<'a> IntoIterator for ComponentGroup<'a> {
    type Item = &'a Component;
    type IntoIter = std::vec::IntoIter<&'a Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.into_iter()
    }
}

impl<'a, 'g> IntoIterator for &'g ComponentGroup<'a> {
    type Item = &'a Component;
    type IntoIter = std::iter::Copied<std::slice::Iter<'g, &'a Component>>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter().copied()
    }
}

// =========================================================================
// Serialization
// =========================================================================

/// Serializes as the nested descriptor list (with resolved ids) of the
/// attached components.
impl Serialize for ComponentTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SerializedChildren {
            tree: self,
            keys: &self.roots,
        }
        .serialize(serializer)
    }
}

struct SerializedChildren<'a> {
    tree: &'a ComponentTree,
    keys: &'a [ComponentKey],
}

impl Serialize for SerializedChildren<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.keys.len()))?;
        for component in self.keys.iter().filter_map(|&key| self.tree.arena.get(key)) {
            seq.serialize_element(&SerializedComponent {
                tree: self.tree,
                component,
            })?;
        }
        seq.end()
    }
}

struct SerializedComponent<'a> {
    tree: &'a ComponentTree,
    component: &'a Component,
}

impl Serialize for SerializedComponent<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("id", &self.component.id)?;
        map.serialize_entry("type", &self.component.kind)?;
        map.serialize_entry("attributes", &self.component.attributes)?;
        map.serialize_entry(
            "children",
            &SerializedChildren {
                tree: self.tree,
                keys: &self.component.children,
            },
        )?;
        map.end()
    }
}
