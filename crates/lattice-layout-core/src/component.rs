//! Component nodes and their identifiers.
//!
//! A [`Component`] is one materialized node of a layout: a type code, the
//! attributes exactly as authored, and the ordered keys of its children.
//! Components live in the arena owned by a [`ComponentTree`](crate::ComponentTree)
//! and are addressed two ways:
//!
//! - [`ComponentKey`] - arena handle, cheap to copy, only meaningful for the tree
//!   that issued it
//! - [`ComponentId`] - the stable string identity used as the state store key

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use slotmap::new_key_type;

new_key_type! {
    /// Arena handle for a component inside a [`ComponentTree`](crate::ComponentTree).
    ///
    /// Keys stay valid for the lifetime of the tree, including for components that
    /// have been detached from it.
    pub struct ComponentKey;
}

/// Ordered attribute mapping, preserved in authoring order.
pub type Attributes = serde_json::Map<String, Value>;

/// Stable identity of a component.
///
/// Ids are either authored in the layout (`"id"` field of a descriptor) or
/// derived from the component's declaration path (`"0"`, `"0.1"`, ...), so
/// parsing the same layout twice yields the same ids. A path that is already
/// taken by an authored id gets a `~n` suffix (`"1~1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Create an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ComponentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ComponentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ComponentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single materialized layout node.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub(crate) key: ComponentKey,
    pub(crate) id: ComponentId,
    pub(crate) kind: String,
    pub(crate) attributes: Attributes,
    pub(crate) parent: Option<ComponentKey>,
    pub(crate) children: Vec<ComponentKey>,
}

impl Component {
    /// Arena handle of this component.
    #[inline]
    pub fn key(&self) -> ComponentKey {
        self.key
    }

    /// Stable identity of this component.
    #[inline]
    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    /// The type code classifying this component's role.
    #[inline]
    pub fn component_type(&self) -> &str {
        &self.kind
    }

    /// Attributes exactly as authored.
    #[inline]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Look up a single attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// The parent component, `None` for top-level or detached components.
    #[inline]
    pub fn parent(&self) -> Option<ComponentKey> {
        self.parent
    }

    /// Keys of the children currently attached to this component, in order.
    #[inline]
    pub fn children(&self) -> &[ComponentKey] {
        &self.children
    }

    /// Whether this component has any attached children.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Authored identifier of a descriptor, accepted as a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptorId {
    Text(String),
    Number(serde_json::Number),
}

impl From<&DescriptorId> for ComponentId {
    fn from(id: &DescriptorId) -> Self {
        match id {
            DescriptorId::Text(text) => ComponentId::new(text.clone()),
            DescriptorId::Number(number) => ComponentId::new(number.to_string()),
        }
    }
}

/// A raw node description as it appears in a layout.
///
/// `null` is accepted for `attributes` and `children` and treated as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Type code of the node.
    #[serde(rename = "type")]
    pub kind: String,
    /// Attributes as authored.
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Attributes,
    /// Nested child descriptors.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ComponentDescriptor>,
    /// Optional authored id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DescriptorId>,
}

impl ComponentDescriptor {
    /// Create a descriptor with the given type code and no attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
            id: None,
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append a child descriptor.
    pub fn with_child(mut self, child: ComponentDescriptor) -> Self {
        self.children.push(child);
        self
    }

    /// Set the authored id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(DescriptorId::Text(id.into()));
        self
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
