//! Parameter type to control type resolution
//!
//! Mappings live in a process-wide registry keyed by [`ParamKind`]. Lookup
//! walks the parameter's kind ancestry most-specific first and returns the
//! first registered mapping. Registration is meant for start-up, before any
//! panel is built; nothing in a change handler writes to the registry.

use std::collections::HashMap;
use std::sync::RwLock;

use log::debug;
use once_cell::sync::Lazy;

use crate::param::{ParamKind, Parameter};
use crate::widgets::WidgetKind;

/// Registered mapping for one parameter kind
#[derive(Debug, Clone, Copy)]
pub enum WidgetMapping {
    Widget(WidgetKind),
    /// Decides the control type from the descriptor itself
    Factory(fn(&Parameter) -> WidgetKind),
}

impl WidgetMapping {
    fn resolve(&self, param: &Parameter) -> WidgetKind {
        match self {
            WidgetMapping::Widget(kind) => *kind,
            WidgetMapping::Factory(factory) => factory(param),
        }
    }
}

/// File selectors with a path pattern offer the matching files, otherwise free text
pub fn file_selector_widget(param: &Parameter) -> WidgetKind {
    if param.path.is_some() {
        WidgetKind::Select
    } else {
        WidgetKind::TextInput
    }
}

fn default_mappings() -> HashMap<ParamKind, WidgetMapping> {
    use WidgetMapping::{Factory, Widget};
    HashMap::from([
        (ParamKind::Action, Widget(WidgetKind::Button)),
        (ParamKind::Parameter, Widget(WidgetKind::LiteralInput)),
        (ParamKind::Color, Widget(WidgetKind::ColorPicker)),
        (ParamKind::Dict, Widget(WidgetKind::LiteralInput)),
        (ParamKind::Selector, Widget(WidgetKind::Select)),
        (ParamKind::ObjectSelector, Widget(WidgetKind::Select)),
        (ParamKind::FileSelector, Factory(file_selector_widget)),
        (ParamKind::Boolean, Widget(WidgetKind::Checkbox)),
        (ParamKind::Number, Widget(WidgetKind::FloatSlider)),
        (ParamKind::Integer, Widget(WidgetKind::IntSlider)),
        (ParamKind::Range, Widget(WidgetKind::RangeSlider)),
        (ParamKind::String, Widget(WidgetKind::TextInput)),
        (ParamKind::ListSelector, Widget(WidgetKind::MultiSelect)),
        (ParamKind::Date, Widget(WidgetKind::DatetimeInput)),
        (ParamKind::DateRange, Widget(WidgetKind::DateRangeSlider)),
    ])
}

static WIDGET_MAPPINGS: Lazy<RwLock<HashMap<ParamKind, WidgetMapping>>> =
    Lazy::new(|| RwLock::new(default_mappings()));

/// Install or replace the mapping for a parameter kind
pub fn register_widget_mapping(kind: ParamKind, mapping: WidgetMapping) {
    debug!("registering widget mapping for {}: {:?}", kind, mapping);
    let mut mappings = WIDGET_MAPPINGS.write().unwrap_or_else(|e| e.into_inner());
    mappings.insert(kind, mapping);
}

/// Resolve the control type for a descriptor using its own kind ancestry
pub fn resolve(param: &Parameter) -> Option<WidgetKind> {
    resolve_with(param, ParamKind::ancestors)
}

/// Resolve using a caller-supplied ancestry, most-specific first
pub fn resolve_with(param: &Parameter, ancestors: impl Fn(&ParamKind) -> Vec<ParamKind>) -> Option<WidgetKind> {
    let mappings = WIDGET_MAPPINGS.read().unwrap_or_else(|e| e.into_inner());
    ancestors(&param.kind)
        .iter()
        .find_map(|kind| mappings.get(kind))
        .map(|mapping| mapping.resolve(param))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Value;

    #[test]
    fn test_builtin_mappings() {
        assert_eq!(resolve(&Parameter::number("x", 0.0)), Some(WidgetKind::FloatSlider));
        assert_eq!(resolve(&Parameter::integer("i", 0)), Some(WidgetKind::IntSlider));
        assert_eq!(resolve(&Parameter::boolean("b", false)), Some(WidgetKind::Checkbox));
        assert_eq!(resolve(&Parameter::action("go", |_| {})), Some(WidgetKind::Button));
        assert_eq!(resolve(&Parameter::dict("d")), Some(WidgetKind::LiteralInput));
    }

    #[test]
    fn test_unmapped_kind_falls_back_to_ancestor() {
        // NumericTuple and Tuple have no mapping of their own
        let p = Parameter::new(
            "t",
            ParamKind::NumericTuple,
            Value::Tuple(vec![Value::Float(1.0), Value::Float(2.0)]),
        );
        assert_eq!(resolve(&p), Some(WidgetKind::LiteralInput));
    }

    #[test]
    fn test_file_selector_factory() {
        let with_path = Parameter::file_selector("f", Value::None, Some("*.csv"));
        let free = Parameter::file_selector("f", Value::None, None);
        assert_eq!(resolve(&with_path), Some(WidgetKind::Select));
        assert_eq!(resolve(&free), Some(WidgetKind::TextInput));
    }

    #[test]
    fn test_custom_kind_registration() {
        let kind = ParamKind::custom("ResolverTestPercent", ParamKind::Integer);
        let p = Parameter::new("pct", kind.clone(), 1i64);
        assert_eq!(resolve(&p), Some(WidgetKind::IntSlider));

        register_widget_mapping(kind, WidgetMapping::Widget(WidgetKind::LiteralInput));
        assert_eq!(resolve(&p), Some(WidgetKind::LiteralInput));
    }

    #[test]
    fn test_resolve_with_custom_ancestry() {
        let p = Parameter::integer("i", 0);
        let only_base = |_: &ParamKind| vec![ParamKind::Parameter];
        assert_eq!(resolve_with(&p, only_base), Some(WidgetKind::LiteralInput));
        assert_eq!(resolve_with(&p, |_| Vec::new()), None);
    }
}
