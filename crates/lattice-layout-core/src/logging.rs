//! Logging and debugging facilities for Lattice Layout.
//!
//! This module provides:
//! - Target names for filtering the crate's `tracing` output
//! - Debug visualization for component trees
//!
//! # Tracing Integration
//!
//! Lattice Layout uses the `tracing` crate for instrumentation and never
//! installs a subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("lattice_layout=debug,lattice_layout_core=trace")
//!         .init();
//! }
//! ```
//!
//! # Debug Visualization
//!
//! Use [`ComponentTreeDebug`] to print the component hierarchy:
//!
//! ```
//! use lattice_layout_core::{ComponentTree, ComponentTreeDebug};
//! use serde_json::json;
//!
//! let tree = ComponentTree::from_value(&json!([
//!     { "type": "block", "children": [{ "type": "text" }] }
//! ]))?;
//! let output = ComponentTreeDebug::new().format_tree(&tree);
//! assert!(output.contains("block"));
//! # Ok::<(), lattice_layout_core::TreeError>(())
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::component::ComponentKey;
use crate::error::{TreeError, TreeResult};
use crate::tree::ComponentTree;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "lattice_layout_core";
    /// Component tree construction and mutation.
    pub const TREE: &str = "lattice_layout_core::tree";
    /// Layout model lifecycle.
    pub const MODEL: &str = "lattice_layout::model";
    /// State store creation, merge and sync.
    pub const STORE: &str = "lattice_layout::store";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    Unicode,
    /// Compact single-line representation.
    Compact,
}

impl Default for TreeStyle {
    fn default() -> Self {
        Self::Unicode
    }
}

/// Configuration for component tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show component ids.
    pub show_ids: bool,
    /// Whether to show the attribute hash next to each component.
    pub show_hashes: bool,
    /// Whether to list attribute keys under each component.
    pub show_attributes: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_hashes: false,
            show_attributes: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_hashes: true,
            show_attributes: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_hashes: false,
            show_attributes: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing component trees.
#[derive(Debug, Clone, Default)]
pub struct ComponentTreeDebug {
    options: TreeFormatOptions,
}

impl ComponentTreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format every attached component of the tree.
    pub fn format_tree(&self, tree: &ComponentTree) -> String {
        TreeDisplay {
            debug: self,
            tree,
            start: None,
        }
        .to_string()
    }

    /// Format a subtree starting from a specific component.
    ///
    /// Detached components can be formatted this way too.
    pub fn format_subtree(&self, tree: &ComponentTree, root: ComponentKey) -> TreeResult<String> {
        if tree.get(root).is_none() {
            return Err(TreeError::InvalidComponentKey);
        }
        Ok(TreeDisplay {
            debug: self,
            tree,
            start: Some(root),
        }
        .to_string())
    }

    fn write_subtree(
        &self,
        tree: &ComponentTree,
        key: ComponentKey,
        depth: usize,
        is_last: bool,
        output: &mut impl FmtWrite,
    ) -> fmt::Result {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }
        let Some(component) = tree.get(key) else {
            return Ok(());
        };

        output.write_str(&self.build_prefix(depth, is_last))?;
        output.write_str(component.component_type())?;

        if self.options.show_ids {
            write!(output, " [{}]", component.id())?;
        }

        if self.options.show_hashes {
            let hash = crate::hash::attribute_hash(component.attributes());
            write!(output, " #{}", &hash[..12])?;
        }

        output.write_char('\n')?;

        if self.options.show_attributes && !component.attributes().is_empty() {
            let attribute_prefix = self.build_attribute_prefix(depth);
            for name in component.attributes().keys() {
                writeln!(output, "{attribute_prefix}  .{name}")?;
            }
        }

        let child_count = component.children().len();
        for (i, &child) in component.children().iter().enumerate() {
            self.write_subtree(tree, child, depth + 1, i + 1 == child_count, output)?;
        }
        Ok(())
    }

    /// Build the prefix string for a tree node.
    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.extend(std::iter::repeat_n(' ', self.options.indent_size));
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }

    /// Build the prefix for attribute lines.
    fn build_attribute_prefix(&self, depth: usize) -> String {
        let branch = match self.options.style {
            TreeStyle::Ascii => "|",
            TreeStyle::Unicode => "\u{2502}",
            TreeStyle::Compact => "",
        };

        let mut prefix = String::new();
        for _ in 0..depth {
            prefix.push_str(branch);
            prefix.extend(std::iter::repeat_n(' ', self.options.indent_size));
        }
        prefix
    }
}

struct TreeDisplay<'a> {
    debug: &'a ComponentTreeDebug,
    tree: &'a ComponentTree,
    start: Option<ComponentKey>,
}

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            Some(key) => self.debug.write_subtree(self.tree, key, 0, true, f),
            None => {
                let count = self.tree.flatten_keys().len();
                writeln!(f, "Component Tree ({count} components):")?;
                if self.tree.is_empty() {
                    return writeln!(f, "  (empty)");
                }
                for &root in self.tree.roots() {
                    self.debug.write_subtree(self.tree, root, 0, true, f)?;
                }
                Ok(())
            }
        }
    }
}
