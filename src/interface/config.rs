//! Display configuration for parameter panels

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::constants::{panel, DEFAULT_DISPLAY_THRESHOLD, DEFAULT_PRECEDENCE};
use crate::error::{ParamError, Result};
use crate::param::{Action, Parameterized};
use crate::widgets::{Layout, LayoutKind, Widget, WidgetKind, WidgetUpdate};

/// Per-parameter replacement for the resolved control
#[derive(Debug, Clone)]
pub enum WidgetOverride {
    /// Use this control type instead of the resolved one
    Kind(WidgetKind),
    /// Extra configuration, optionally with an explicit control type
    Config {
        kind: Option<WidgetKind>,
        updates: Vec<WidgetUpdate>,
    },
    /// A ready-made control, used as is
    Instance(Widget),
}

/// Where expanded sub-object panels are placed
#[derive(Debug, Clone)]
pub enum ExpandLayout {
    /// Create a container of this type around the widget box
    Type(LayoutKind),
    /// Append into an existing container
    Instance(Layout),
    /// Container type given by name, resolved when the panel is built
    Named(String),
}

impl Default for ExpandLayout {
    fn default() -> Self {
        ExpandLayout::Type(LayoutKind::Column)
    }
}

impl ExpandLayout {
    /// Resolve a named layout into a container type
    pub fn resolve(&self) -> Result<ExpandLayout> {
        match self {
            ExpandLayout::Named(name) => LayoutKind::from_name(name)
                .map(ExpandLayout::Type)
                .ok_or_else(|| ParamError::InvalidExpandLayout { found: name.clone() }),
            other => Ok(other.clone()),
        }
    }

    /// Container type sub-panels end up in
    pub fn kind(&self) -> Option<LayoutKind> {
        match self {
            ExpandLayout::Type(kind) => Some(*kind),
            ExpandLayout::Instance(layout) => Some(layout.kind()),
            ExpandLayout::Named(name) => LayoutKind::from_name(name),
        }
    }
}

/// Serializable subset of [`ParamConfig`]: display flags, control types and
/// the expand container type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct ConfigSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_precedence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    show_labels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    show_name: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expand: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expand_button: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expand_layout: Option<LayoutKind>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    widgets: BTreeMap<String, WidgetKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
}

/// Configuration of a [`ParamPanel`](super::ParamPanel)
#[derive(Debug, Clone)]
pub struct ParamConfig {
    /// Whitelist of displayed parameters; `None` shows every parameter
    pub parameters: Option<Vec<String>>,
    /// Parameters with precedence below this value are not displayed
    pub display_threshold: f64,
    /// Precedence used for parameters that declare none
    pub default_precedence: f64,
    pub show_labels: bool,
    pub show_name: bool,
    /// Expand parameterized sub-objects on construction
    pub expand: bool,
    /// Add toggles for expanding sub-objects; `None` adds them unless `expand` is set
    pub expand_button: Option<bool>,
    pub expand_layout: ExpandLayout,
    pub widgets: HashMap<String, WidgetOverride>,
    /// Width of the widget box
    pub width: u32,
    /// Called with the object when the panel is constructed
    pub initializer: Option<Action>,
}

impl Default for ParamConfig {
    fn default() -> Self {
        Self {
            parameters: None,
            display_threshold: DEFAULT_DISPLAY_THRESHOLD,
            default_precedence: DEFAULT_PRECEDENCE,
            show_labels: true,
            show_name: true,
            expand: false,
            expand_button: None,
            expand_layout: ExpandLayout::default(),
            widgets: HashMap::new(),
            width: panel::DEFAULT_WIDTH,
            initializer: None,
        }
    }
}

impl ParamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(mut self, parameters: &[&str]) -> Self {
        self.parameters = Some(parameters.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn with_display_threshold(mut self, threshold: f64) -> Self {
        self.display_threshold = threshold;
        self
    }

    pub fn with_default_precedence(mut self, precedence: f64) -> Self {
        self.default_precedence = precedence;
        self
    }

    pub fn with_show_labels(mut self, show: bool) -> Self {
        self.show_labels = show;
        self
    }

    pub fn with_show_name(mut self, show: bool) -> Self {
        self.show_name = show;
        self
    }

    pub fn with_expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    pub fn with_expand_button(mut self, expand_button: Option<bool>) -> Self {
        self.expand_button = expand_button;
        self
    }

    pub fn with_expand_layout(mut self, layout: ExpandLayout) -> Self {
        self.expand_layout = layout;
        self
    }

    pub fn with_widget(mut self, name: &str, widget: WidgetOverride) -> Self {
        self.widgets.insert(name.to_string(), widget);
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn with_initializer(mut self, initializer: impl Fn(&Parameterized) + 'static) -> Self {
        self.initializer = Some(Action::new(initializer));
        self
    }

    /// Read a configuration from JSON, e.g.
    /// `{"show_name": false, "expand_layout": "Tabs", "widgets": {"x": "IntSlider"}}`.
    /// Missing keys keep their defaults.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let spec: ConfigSpec = serde_json::from_value(json.clone())?;
        let defaults = Self::default();
        let mut config = Self {
            parameters: spec.parameters,
            display_threshold: spec.display_threshold.unwrap_or(defaults.display_threshold),
            default_precedence: spec.default_precedence.unwrap_or(defaults.default_precedence),
            show_labels: spec.show_labels.unwrap_or(defaults.show_labels),
            show_name: spec.show_name.unwrap_or(defaults.show_name),
            expand: spec.expand.unwrap_or(defaults.expand),
            expand_button: spec.expand_button,
            width: spec.width.unwrap_or(defaults.width),
            ..defaults
        };
        if let Some(kind) = spec.expand_layout {
            config.expand_layout = ExpandLayout::Type(kind);
        }
        for (name, kind) in spec.widgets {
            config.widgets.insert(name, WidgetOverride::Kind(kind));
        }
        Ok(config)
    }

    /// Write the serializable part of the configuration as JSON. Control
    /// instances, extra control settings, layout instances and the
    /// initializer are left out.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let widgets = self
            .widgets
            .iter()
            .filter_map(|(name, widget)| {
                let kind = match widget {
                    WidgetOverride::Kind(kind) => Some(*kind),
                    WidgetOverride::Config { kind, .. } => *kind,
                    WidgetOverride::Instance(_) => None,
                };
                kind.map(|k| (name.clone(), k))
            })
            .collect();
        let spec = ConfigSpec {
            parameters: self.parameters.clone(),
            display_threshold: Some(self.display_threshold),
            default_precedence: Some(self.default_precedence),
            show_labels: Some(self.show_labels),
            show_name: Some(self.show_name),
            expand: Some(self.expand),
            expand_button: self.expand_button,
            expand_layout: match &self.expand_layout {
                ExpandLayout::Instance(_) => None,
                other => other.kind(),
            },
            widgets,
            width: Some(self.width),
        };
        Ok(serde_json::to_value(spec)?)
    }

    /// Whether sub-object toggles are added next to controls
    pub fn wants_toggle(&self) -> bool {
        match self.expand_button {
            Some(show) => show,
            None => !self.expand,
        }
    }

    /// Whether sub-objects are tracked for expansion at all
    pub fn links_subobjects(&self) -> bool {
        !(self.expand_button == Some(false) && !self.expand)
    }

    /// Configuration inherited by nested sub-object panels
    pub(crate) fn for_subobject(&self) -> Self {
        Self {
            parameters: None,
            initializer: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParamConfig::default();
        assert_eq!(config.default_precedence, 1e-8);
        assert_eq!(config.width, 300);
        assert!(config.show_name);
        assert!(config.wants_toggle());
        assert!(config.links_subobjects());
    }

    #[test]
    fn test_toggle_rules() {
        let expand = ParamConfig::new().with_expand(true);
        assert!(!expand.wants_toggle());
        assert!(expand.links_subobjects());

        let no_buttons = ParamConfig::new().with_expand_button(Some(false));
        assert!(!no_buttons.wants_toggle());
        assert!(!no_buttons.links_subobjects());

        let forced = ParamConfig::new().with_expand(true).with_expand_button(Some(true));
        assert!(forced.wants_toggle());
    }

    #[test]
    fn test_config_from_json() {
        let json = serde_json::json!({
            "parameters": ["a", "b"],
            "show_name": false,
            "expand_layout": "Tabs",
            "widgets": {"a": "IntSlider"},
        });
        let config = ParamConfig::from_json(&json).unwrap();
        assert_eq!(config.parameters, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(!config.show_name);
        assert!(config.show_labels);
        assert_eq!(config.width, 300);
        assert_eq!(config.expand_layout.kind(), Some(LayoutKind::Tabs));
        assert!(matches!(config.widgets.get("a"), Some(WidgetOverride::Kind(WidgetKind::IntSlider))));
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = ParamConfig::new()
            .with_display_threshold(-2.0)
            .with_expand(true)
            .with_expand_button(Some(true))
            .with_expand_layout(ExpandLayout::Named("row".into()))
            .with_widget("x", WidgetOverride::Config { kind: Some(WidgetKind::TextInput), updates: vec![] })
            .with_widget("y", WidgetOverride::Instance(Widget::new(WidgetKind::Checkbox, vec![])));

        let json = config.to_json().unwrap();
        assert_eq!(json["expand_layout"], "Row");
        assert_eq!(json["widgets"], serde_json::json!({"x": "TextInput"}));

        let restored = ParamConfig::from_json(&json).unwrap();
        assert_eq!(restored.display_threshold, -2.0);
        assert!(restored.expand);
        assert_eq!(restored.expand_button, Some(true));
        assert_eq!(restored.expand_layout.kind(), Some(LayoutKind::Row));
        assert!(restored.widgets.get("y").is_none());
        assert_eq!(restored.to_json().unwrap(), json);
    }

    #[test]
    fn test_config_rejects_unknown_control_type() {
        let json = serde_json::json!({"widgets": {"a": "Knob"}});
        assert!(matches!(ParamConfig::from_json(&json), Err(ParamError::Json(_))));
    }

    #[test]
    fn test_named_layout_resolution() {
        let tabs = ExpandLayout::Named("tabs".into()).resolve().unwrap();
        assert!(matches!(tabs, ExpandLayout::Type(LayoutKind::Tabs)));
        assert!(matches!(
            ExpandLayout::Named("grid".into()).resolve(),
            Err(ParamError::InvalidExpandLayout { .. })
        ));
    }
}
