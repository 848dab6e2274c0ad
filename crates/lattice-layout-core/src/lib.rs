//! Core systems for Lattice Layout.
//!
//! This crate provides the building blocks of the layout model:
//!
//! - **Components**: Layout nodes with stable identity, a type code and authored attributes
//! - **Component Tree**: Arena-backed ordered tree with grouping, lookup and detaching
//! - **Flattening**: Pre-order linearization of the whole tree or any sub-tree
//! - **Attribute Hashing**: Key-order independent structural hash of attributes
//! - **Debugging**: Tracing targets and tree visualization
//!
//! # Example
//!
//! ```
//! use lattice_layout_core::{attribute_hash, ComponentTree};
//! use serde_json::json;
//!
//! let mut tree = ComponentTree::from_value(&json!([
//!     { "type": "settings", "attributes": { "columns": 12 } },
//!     { "type": "block", "attributes": { "title": "Welcome" } }
//! ]))?;
//!
//! let settings = tree.group_by_type("settings").first().map(|c| c.key());
//! if let Some(key) = settings {
//!     tree.detach(key)?;
//! }
//!
//! let flat = tree.flatten();
//! assert_eq!(flat.len(), 1);
//! assert_eq!(attribute_hash(flat[0].attributes()).len(), 64);
//! # Ok::<(), lattice_layout_core::TreeError>(())
//! ```

pub mod component;
mod error;
pub mod hash;
pub mod logging;
pub mod tree;

pub use component::{Attributes, Component, ComponentDescriptor, ComponentId, ComponentKey, DescriptorId};
pub use error::{json_kind, TreeError, TreeResult};
pub use hash::attribute_hash;
pub use logging::{ComponentTreeDebug, TreeFormatOptions, TreeStyle};
pub use tree::{ComponentGroup, ComponentTree};
