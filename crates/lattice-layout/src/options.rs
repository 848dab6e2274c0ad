//! Layout model configuration.
//!
//! Options can be built in code or read from JSON using the camelCase keys
//! layout authoring tools emit:
//!
//! ```
//! use lattice_layout::LayoutOptions;
//!
//! let options = LayoutOptions::from_json_str(r#"{ "settingsComponentCode": "page" }"#)?;
//! assert_eq!(options.settings_component_code, "page");
//! assert!(options.pull_settings_component);
//! # Ok::<(), lattice_layout::LayoutError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::LayoutResult;

/// Type code of the settings component when none is configured.
pub const DEFAULT_SETTINGS_COMPONENT_CODE: &str = "settings";

/// Options controlling how a [`LayoutModel`](crate::LayoutModel) is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    /// Type code identifying the settings component.
    pub settings_component_code: String,
    /// Expose the settings component itself instead of its attribute projection.
    pub expose_full_settings_component: bool,
    /// Detach the settings component from the renderable tree.
    pub pull_settings_component: bool,
    /// Silence soft-failure diagnostics.
    pub suppress_warnings: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            settings_component_code: DEFAULT_SETTINGS_COMPONENT_CODE.to_string(),
            expose_full_settings_component: false,
            pull_settings_component: true,
            suppress_warnings: false,
        }
    }
}

impl LayoutOptions {
    /// Parse options from JSON text. Missing keys take their defaults.
    pub fn from_json_str(text: &str) -> LayoutResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Set the settings component type code.
    pub fn with_settings_component_code(mut self, code: impl Into<String>) -> Self {
        self.settings_component_code = code.into();
        self
    }

    /// Expose the full settings component.
    pub fn with_expose_full_settings_component(mut self, expose: bool) -> Self {
        self.expose_full_settings_component = expose;
        self
    }

    /// Detach the settings component from the tree.
    pub fn with_pull_settings_component(mut self, pull: bool) -> Self {
        self.pull_settings_component = pull;
        self
    }

    /// Silence soft-failure diagnostics.
    pub fn with_suppress_warnings(mut self, suppress: bool) -> Self {
        self.suppress_warnings = suppress;
        self
    }
}
