//! Control construction for a single parameter

use log::warn;

use crate::constants::{panel, toggle};
use crate::param::{HasBounds, HasOptions, Parameter, Value};
use crate::widgets::{ConfigKey, Layout, LayoutKind, Viewable, Widget, WidgetKind, WidgetUpdate};

use super::config::{ParamConfig, WidgetOverride};
use super::resolver;

/// Result of building the control for one parameter
#[derive(Debug, Clone)]
pub struct BuiltControl {
    /// Primary control bound to the parameter value
    pub widget: Widget,
    /// Expand toggle, present when the value or options hold sub-objects
    pub toggle: Option<Widget>,
    /// What is placed in the widget box: the control, or a row of control and toggle
    pub view: Viewable,
    /// Whether a step was forwarded, so step changes need a link
    pub has_step: bool,
}

/// Pick the control type, honouring per-parameter overrides
fn control_kind(param: &Parameter, override_: Option<&WidgetOverride>) -> WidgetKind {
    let explicit = match override_ {
        Some(WidgetOverride::Kind(kind)) => Some(*kind),
        Some(WidgetOverride::Config { kind, .. }) => *kind,
        Some(WidgetOverride::Instance(widget)) => Some(widget.kind()),
        None => None,
    };
    explicit.or_else(|| resolver::resolve(param)).unwrap_or_else(|| {
        warn!("no widget mapping for '{}' ({}), using LiteralInput", param.name, param.kind);
        WidgetKind::LiteralInput
    })
}

/// Build the configured control for `param`
pub fn build_control(param: &Parameter, config: &ParamConfig) -> BuiltControl {
    let override_ = config.widgets.get(&param.name);
    let mut kind = control_kind(param, override_);

    let label = if !config.show_labels && !kind.is_button() {
        String::new()
    } else {
        param.label.clone()
    };
    let mut updates = vec![
        WidgetUpdate::Value(param.value.clone()),
        WidgetUpdate::Disabled(param.constant),
        WidgetUpdate::Name(label),
    ];
    if let Some(WidgetOverride::Config { updates: extra, .. }) = override_ {
        updates.extend(extra.iter().cloned());
    }

    let mut options = Vec::new();
    if let Some(mut declared) = param.options() {
        if declared.is_empty() && !param.value.is_none() {
            declared = vec![param.value.clone()];
        }
        options = declared.clone();
        updates.push(WidgetUpdate::Options(declared));
    }

    let mut has_step = false;
    if let Some((start, end)) = param.soft_bounds() {
        if let Some(start) = start {
            updates.push(WidgetUpdate::Start(Some(start)));
        }
        if let Some(end) = end {
            updates.push(WidgetUpdate::End(Some(end)));
        }
        if (start.is_none() || end.is_none()) && !kind.supports_free_numeric() {
            kind = WidgetKind::LiteralInput;
        }
        if let Some(step) = param.step.filter(|_| kind.accepts(ConfigKey::Step)) {
            updates.push(WidgetUpdate::Step(Some(step)));
            has_step = true;
        }
    }

    let widget = match override_ {
        Some(WidgetOverride::Instance(widget)) => widget.clone(),
        _ => Widget::new(kind, updates),
    };

    let holds_subobject = param.value.is_parameterized() || options.iter().any(Value::is_parameterized);
    if !(holds_subobject && config.wants_toggle()) {
        return BuiltControl {
            view: Viewable::Widget(widget.clone()),
            widget,
            toggle: None,
            has_step,
        };
    }

    widget.apply(vec![
        WidgetUpdate::Margin(toggle::CONTROL_MARGIN),
        WidgetUpdate::Width(config.width.saturating_sub(panel::TOGGLE_RESERVED_WIDTH)),
    ]);
    let toggle = Widget::new(
        WidgetKind::Toggle,
        vec![
            WidgetUpdate::Name(toggle::GLYPH.to_string()),
            WidgetUpdate::Value(Value::Bool(false)),
            WidgetUpdate::Disabled(!param.value.is_parameterized()),
            WidgetUpdate::Width(toggle::MAX_WIDTH),
            WidgetUpdate::Margin(toggle::TOGGLE_MARGIN),
        ],
    );
    let row = Layout::with_children(
        LayoutKind::Row,
        vec![Viewable::Widget(widget.clone()), Viewable::Widget(toggle.clone())],
    );
    BuiltControl {
        widget,
        toggle: Some(toggle),
        view: Viewable::Layout(row),
        has_step,
    }
}
