//! Settings component extraction.
//!
//! A layout may carry one component holding page-level configuration rather
//! than renderable content. It is found among the top-level components by its
//! type code and, by default, detached from the tree so renderers never see it.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use lattice_layout_core::{Attributes, Component, ComponentId, ComponentTree};

use crate::error::LayoutResult;
use crate::options::LayoutOptions;

/// Field injected into a settings projection, holding the component's id.
pub const COMPONENT_ID_REF_FIELD: &str = "$componentId";

/// The settings of a layout, in the shape selected by [`LayoutOptions`].
#[derive(Debug, Clone, PartialEq)]
pub enum Settings {
    /// The settings component itself (`expose_full_settings_component`).
    Component(Component),
    /// A copy of the settings component's attributes plus its id.
    Projection(SettingsProjection),
    /// No settings component was found.
    Empty,
}

impl Settings {
    /// Whether no settings component was found.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Id of the settings component, if one was found.
    pub fn component_id(&self) -> Option<&ComponentId> {
        match self {
            Self::Component(component) => Some(component.id()),
            Self::Projection(projection) => Some(&projection.component_id),
            Self::Empty => None,
        }
    }

    /// The settings attributes, if a settings component was found.
    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            Self::Component(component) => Some(component.attributes()),
            Self::Projection(projection) => Some(&projection.attributes),
            Self::Empty => None,
        }
    }

    /// Look up a single settings attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes().and_then(|attributes| attributes.get(name))
    }

    /// Render the settings as JSON.
    ///
    /// A full component renders as `{id, type, attributes}`, a projection as
    /// its attributes plus [`COMPONENT_ID_REF_FIELD`], and empty settings as `{}`.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Component(component) => serde_json::json!({
                "id": component.id(),
                "type": component.component_type(),
                "attributes": component.attributes(),
            }),
            Self::Projection(projection) => projection.to_value(),
            Self::Empty => Value::Object(Attributes::new()),
        }
    }
}

/// Flattened view of a settings component.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsProjection {
    attributes: Attributes,
    component_id: ComponentId,
}

impl SettingsProjection {
    fn from_component(component: &Component) -> Self {
        Self {
            attributes: component.attributes().clone(),
            component_id: component.id().clone(),
        }
    }

    /// The copied attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Id of the component this projection was taken from.
    pub fn component_id(&self) -> &ComponentId {
        &self.component_id
    }

    /// The projection as a JSON object.
    pub fn to_value(&self) -> Value {
        let mut map = self.attributes.clone();
        map.insert(
            COMPONENT_ID_REF_FIELD.to_string(),
            Value::String(self.component_id.to_string()),
        );
        Value::Object(map)
    }
}

impl Serialize for SettingsProjection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in &self.attributes {
            if name != COMPONENT_ID_REF_FIELD {
                map.serialize_entry(name, value)?;
            }
        }
        map.serialize_entry(COMPONENT_ID_REF_FIELD, &self.component_id)?;
        map.end()
    }
}

/// Find the settings component among the tree's top-level components.
///
/// When `pull_settings_component` is set the component is detached from
/// `tree`, so later traversals of that tree no longer yield it.
pub(crate) fn extract_settings(
    tree: &mut ComponentTree,
    options: &LayoutOptions,
) -> LayoutResult<Settings> {
    let found = tree
        .group_by_type(&options.settings_component_code)
        .first()
        .cloned();

    let Some(component) = found else {
        if !options.suppress_warnings {
            tracing::warn!(
                target: "lattice_layout::model",
                code = %options.settings_component_code,
                "unable to find settings component"
            );
        }
        return Ok(Settings::Empty);
    };

    if options.pull_settings_component {
        tree.detach(component.key())?;
    }
    tracing::debug!(
        target: "lattice_layout::model",
        id = %component.id(),
        pulled = options.pull_settings_component,
        "found settings component"
    );

    Ok(if options.expose_full_settings_component {
        Settings::Component(component)
    } else {
        Settings::Projection(SettingsProjection::from_component(&component))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layout() -> ComponentTree {
        ComponentTree::from_value(&json!([
            { "type": "block" },
            { "type": "settings", "attributes": { "a": 1, "theme": "dark" } },
            { "type": "settings", "attributes": { "a": 2 } }
        ]))
        .unwrap()
    }

    #[test]
    fn test_projection_by_default() {
        let mut tree = layout();
        let settings = extract_settings(&mut tree, &LayoutOptions::default()).unwrap();

        assert_eq!(settings.to_value(), json!({ "a": 1, "theme": "dark", "$componentId": "1" }));
        assert_eq!(settings.component_id().unwrap().as_str(), "1");
        assert_eq!(settings.get("theme"), Some(&json!("dark")));

        // Only the first match is pulled.
        let remaining: Vec<&str> = tree.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(remaining, ["0", "2"]);
    }

    #[test]
    fn test_full_component_without_pull() {
        let mut tree = layout();
        let options = LayoutOptions::default()
            .with_expose_full_settings_component(true)
            .with_pull_settings_component(false);
        let settings = extract_settings(&mut tree, &options).unwrap();

        match &settings {
            Settings::Component(component) => {
                assert_eq!(component.component_type(), "settings");
                assert_eq!(component.attribute("a"), Some(&json!(1)));
            }
            other => panic!("expected full component, got {other:?}"),
        }
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_missing_settings_is_empty() {
        let mut tree = ComponentTree::from_value(&json!([{ "type": "block" }])).unwrap();
        let options = LayoutOptions::default().with_suppress_warnings(true);
        let settings = extract_settings(&mut tree, &options).unwrap();

        assert!(settings.is_empty());
        assert_eq!(settings.to_value(), json!({}));
        assert!(settings.component_id().is_none());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_custom_code() {
        let mut tree = ComponentTree::from_value(&json!([
            { "type": "settings" },
            { "type": "page", "attributes": { "title": "Home" } }
        ]))
        .unwrap();
        let options = LayoutOptions::default().with_settings_component_code("page");
        let settings = extract_settings(&mut tree, &options).unwrap();

        assert_eq!(settings.get("title"), Some(&json!("Home")));
        assert_eq!(tree.first().unwrap().component_type(), "settings");
    }

    #[test]
    fn test_projection_serialize() {
        let mut tree = layout();
        let settings = extract_settings(&mut tree, &LayoutOptions::default()).unwrap();
        let Settings::Projection(projection) = settings else {
            panic!("expected projection");
        };
        assert_eq!(serde_json::to_value(&projection).unwrap(), projection.to_value());
    }
}
