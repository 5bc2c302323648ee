//! Control types and the configuration keys each one accepts

use serde::{Deserialize, Serialize};

/// Concrete UI control types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidgetKind {
    /// Free-form entry parsed as a literal value
    LiteralInput,
    Select,
    MultiSelect,
    Checkbox,
    FloatSlider,
    IntSlider,
    RangeSlider,
    DateRangeSlider,
    DatetimeInput,
    StaticText,
    /// Activated rather than valued; exposes a click counter
    Button,
    Toggle,
    TextInput,
    ColorPicker,
}

/// Configuration keys a control may accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Value,
    Options,
    Start,
    End,
    Step,
    Disabled,
    Name,
    Width,
    Margin,
}

impl WidgetKind {
    /// Whether this control type accepts the given configuration key
    pub fn accepts(&self, key: ConfigKey) -> bool {
        use WidgetKind::*;
        match key {
            ConfigKey::Disabled | ConfigKey::Name | ConfigKey::Width | ConfigKey::Margin => true,
            ConfigKey::Value => !matches!(self, Button),
            ConfigKey::Options => matches!(self, Select | MultiSelect),
            ConfigKey::Start | ConfigKey::End => matches!(
                self,
                FloatSlider | IntSlider | RangeSlider | DateRangeSlider | DatetimeInput
            ),
            ConfigKey::Step => matches!(self, FloatSlider | IntSlider | RangeSlider | DateRangeSlider),
        }
    }

    /// Whether the control allows unbounded numeric entry
    pub fn supports_free_numeric(&self) -> bool {
        matches!(self, WidgetKind::LiteralInput)
    }

    /// Button-like controls keep their label even when labels are hidden
    pub fn is_button(&self) -> bool {
        matches!(self, WidgetKind::Button | WidgetKind::Toggle)
    }

    pub fn name(&self) -> &'static str {
        use WidgetKind::*;
        match self {
            LiteralInput => "LiteralInput",
            Select => "Select",
            MultiSelect => "MultiSelect",
            Checkbox => "Checkbox",
            FloatSlider => "FloatSlider",
            IntSlider => "IntSlider",
            RangeSlider => "RangeSlider",
            DateRangeSlider => "DateRangeSlider",
            DatetimeInput => "DatetimeInput",
            StaticText => "StaticText",
            Button => "Button",
            Toggle => "Toggle",
            TextInput => "TextInput",
            ColorPicker => "ColorPicker",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sliders_accept_bounds() {
        assert!(WidgetKind::FloatSlider.accepts(ConfigKey::Start));
        assert!(WidgetKind::FloatSlider.accepts(ConfigKey::Step));
        assert!(!WidgetKind::Checkbox.accepts(ConfigKey::Start));
        assert!(!WidgetKind::DatetimeInput.accepts(ConfigKey::Step));
    }

    #[test]
    fn test_button_has_no_value() {
        assert!(!WidgetKind::Button.accepts(ConfigKey::Value));
        assert!(WidgetKind::Button.accepts(ConfigKey::Name));
        assert!(WidgetKind::Toggle.accepts(ConfigKey::Value));
    }

    #[test]
    fn test_only_literal_input_is_free_numeric() {
        assert!(WidgetKind::LiteralInput.supports_free_numeric());
        assert!(!WidgetKind::FloatSlider.supports_free_numeric());
    }
}
