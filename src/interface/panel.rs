//! Parameter panels: a tree of controls kept in sync with a parameterized object
//!
//! A [`ParamPanel`] owns the controls built for the whitelisted parameters
//! of its object, the links wiring them to the object, and any nested
//! panels expanded for parameterized sub-objects.
//!
//! Rebuilds happen when the object, the whitelist, the widget overrides or a
//! display flag (labels, name, expand settings) changes. A rebuild tears down
//! every link and nested panel before building anything new. Precedence and
//! threshold changes never rebuild: the visible set is recomputed from the
//! existing controls and the widget box is repopulated in order.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, warn};

use crate::constants::NAME_ENTRY;
use crate::error::{ParamError, Result};
use crate::param::{Parameterized, Value};
use crate::widgets::{Layout, LayoutKind, Viewable, WeakWidget, Widget, WidgetEvent, WidgetProperty, WidgetUpdate};

use super::builder::build_control;
use super::config::{ExpandLayout, ParamConfig, WidgetOverride};
use super::link::{link_parameter, LinkContext, LinkSet};

/// Lifecycle state of a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelStatus {
    NoObject,
    Built,
    Rebuilding,
}

/// Controls built for one parameter, or the name label
struct Entry {
    name: String,
    is_name: bool,
    widget: Widget,
    toggle: Option<Widget>,
    view: Viewable,
}

/// Nested panel expanded for a sub-object parameter
struct Expanded {
    name: String,
    panel: ParamPanel,
}

struct PanelInner {
    object: Option<Parameterized>,
    config: ParamConfig,
    /// Resolved whitelist
    parameters: Vec<String>,
    status: PanelStatus,
    entries: Vec<Entry>,
    links: LinkSet,
    widget_box: Layout,
    layout: Layout,
    expand_layout: Layout,
    expanded: Vec<Expanded>,
}

impl Drop for PanelInner {
    fn drop(&mut self) {
        for expanded in self.expanded.drain(..) {
            self.expand_layout.remove(&Viewable::Panel(expanded.panel.clone()));
            expanded.panel.dispose();
        }
    }
}

/// Shared handle to a parameter panel
#[derive(Clone)]
pub struct ParamPanel {
    inner: Rc<RefCell<PanelInner>>,
}

/// Non-owning panel handle held by link handlers
#[derive(Clone, Default)]
pub struct WeakParamPanel {
    inner: Weak<RefCell<PanelInner>>,
}

impl WeakParamPanel {
    /// A handle that never upgrades
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upgrade(&self) -> Option<ParamPanel> {
        self.inner.upgrade().map(|inner| ParamPanel { inner })
    }
}

impl fmt::Debug for ParamPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ParamPanel")
            .field("object", &inner.object.as_ref().map(Parameterized::name))
            .field("status", &inner.status)
            .field("entries", &inner.entries.len())
            .field("links", &inner.links.len())
            .finish()
    }
}

/// Whitelisted parameters of `object` in display order: ascending precedence,
/// declaration order within equal precedence
pub fn ordered_params(object: &Parameterized, parameters: &[String], default_precedence: f64) -> Vec<String> {
    let mut params: Vec<(String, f64)> = object
        .param_names()
        .into_iter()
        .filter(|name| parameters.contains(name))
        .map(|name| {
            let precedence = object
                .get(&name)
                .and_then(|p| p.precedence)
                .unwrap_or(default_precedence);
            (name, precedence)
        })
        .collect();
    // stable, so equal precedences (including -0.0 and 0.0) keep declaration order
    params.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    params.into_iter().map(|(name, _)| name).collect()
}

/// Whether a parameter is shown at the given threshold
fn is_shown(object: &Parameterized, name: &str, threshold: f64) -> bool {
    match object.get(name).and_then(|p| p.precedence) {
        None => true,
        Some(precedence) => precedence >= threshold,
    }
}

impl ParamPanel {
    /// Build a panel for `object`
    pub fn new(object: &Parameterized, config: ParamConfig) -> Result<Self> {
        Self::construct(Some(object.clone()), config)
    }

    /// Build an empty panel; controls appear once an object is set
    pub fn without_object(config: ParamConfig) -> Result<Self> {
        Self::construct(None, config)
    }

    /// Panel showing a single parameter, without the object name
    pub fn for_parameter(object: &Parameterized, name: &str) -> Result<Self> {
        Self::for_parameter_with(object, name, ParamConfig::default().with_show_name(false))
    }

    /// Panel showing a single parameter with explicit configuration
    pub fn for_parameter_with(object: &Parameterized, name: &str, config: ParamConfig) -> Result<Self> {
        if !object.has_param(name) {
            return Err(ParamError::UnknownParameter {
                object: object.name(),
                name: name.to_string(),
            });
        }
        Self::new(object, config.with_parameters(&[name]))
    }

    fn construct(object: Option<Parameterized>, mut config: ParamConfig) -> Result<Self> {
        let expand_layout = config.expand_layout.resolve()?;
        let widget_box = Layout::new(LayoutKind::Column).with_width(config.width);
        let (layout, expand_into) = match &expand_layout {
            ExpandLayout::Instance(existing) => (widget_box.clone(), existing.clone()),
            ExpandLayout::Type(kind) if *kind == widget_box.kind() => (widget_box.clone(), widget_box.clone()),
            ExpandLayout::Type(kind) => {
                let outer = Layout::new(*kind).with_width(config.width);
                if *kind == LayoutKind::Tabs {
                    let title = object.as_ref().map(Parameterized::name).unwrap_or_default();
                    outer.append_titled(title, widget_box.clone());
                } else {
                    outer.append(widget_box.clone());
                }
                (outer.clone(), outer)
            }
            ExpandLayout::Named(name) => {
                return Err(ParamError::InvalidExpandLayout { found: name.clone() });
            }
        };
        config.expand_layout = expand_layout;

        let parameters = match (&config.parameters, &object) {
            (Some(parameters), _) => parameters.clone(),
            (None, Some(object)) => object.param_names(),
            (None, None) => Vec::new(),
        };
        config.parameters = Some(parameters.clone());

        if let (Some(initializer), Some(object)) = (&config.initializer, &object) {
            initializer.invoke(object);
        }

        let panel = Self {
            inner: Rc::new(RefCell::new(PanelInner {
                object,
                config,
                parameters,
                status: PanelStatus::NoObject,
                entries: Vec::new(),
                links: LinkSet::new(),
                widget_box,
                layout,
                expand_layout: expand_into,
                expanded: Vec::new(),
            })),
        };
        panel.rebuild();
        Ok(panel)
    }

    pub fn ptr_eq(&self, other: &ParamPanel) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakParamPanel {
        WeakParamPanel {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn object(&self) -> Option<Parameterized> {
        self.inner.borrow().object.clone()
    }

    pub fn config(&self) -> ParamConfig {
        self.inner.borrow().config.clone()
    }

    pub fn status(&self) -> PanelStatus {
        self.inner.borrow().status
    }

    /// Current whitelist
    pub fn parameters(&self) -> Vec<String> {
        self.inner.borrow().parameters.clone()
    }

    /// Top-level renderable of the panel
    pub fn layout(&self) -> Layout {
        self.inner.borrow().layout.clone()
    }

    /// Container holding the parameter controls
    pub fn widget_box(&self) -> Layout {
        self.inner.borrow().widget_box.clone()
    }

    /// Container nested panels are placed into
    pub fn expand_layout(&self) -> Layout {
        self.inner.borrow().expand_layout.clone()
    }

    /// Whitelisted parameters in display order, hidden ones included
    pub fn ordered_params(&self) -> Vec<String> {
        let inner = self.inner.borrow();
        match &inner.object {
            Some(object) => ordered_params(object, &inner.parameters, inner.config.default_precedence),
            None => Vec::new(),
        }
    }

    /// Primary control bound to a parameter
    pub fn widget(&self, name: &str) -> Option<Widget> {
        self.inner
            .borrow()
            .entries
            .iter()
            .find(|e| !e.is_name && e.name == name)
            .map(|e| e.widget.clone())
    }

    /// Expand toggle paired with a parameter's control
    pub fn toggle(&self, name: &str) -> Option<Widget> {
        self.inner
            .borrow()
            .entries
            .iter()
            .find(|e| !e.is_name && e.name == name)
            .and_then(|e| e.toggle.clone())
    }

    /// What the widget box holds for a parameter: the control or its row with the toggle
    pub fn view(&self, name: &str) -> Option<Viewable> {
        self.inner
            .borrow()
            .entries
            .iter()
            .find(|e| !e.is_name && e.name == name)
            .map(|e| e.view.clone())
    }

    /// Static text showing the object name, when displayed
    pub fn name_widget(&self) -> Option<Widget> {
        self.inner
            .borrow()
            .entries
            .iter()
            .find(|e| e.is_name)
            .map(|e| e.widget.clone())
    }

    /// Every built parameter control in display order
    pub fn controls(&self) -> Vec<(String, Widget)> {
        self.inner
            .borrow()
            .entries
            .iter()
            .filter(|e| !e.is_name)
            .map(|e| (e.name.clone(), e.widget.clone()))
            .collect()
    }

    /// Parameters whose controls are currently in the widget box, in order
    pub fn visible_params(&self) -> Vec<String> {
        let inner = self.inner.borrow();
        inner
            .widget_box
            .objects()
            .iter()
            .filter_map(|view| {
                inner
                    .entries
                    .iter()
                    .find(|e| !e.is_name && e.view.ptr_eq(view))
                    .map(|e| e.name.clone())
            })
            .collect()
    }

    /// Nested panels currently expanded, in expansion order
    pub fn expanded_panels(&self) -> Vec<ParamPanel> {
        self.inner.borrow().expanded.iter().map(|e| e.panel.clone()).collect()
    }

    pub fn expanded_panel(&self, name: &str) -> Option<ParamPanel> {
        self.inner
            .borrow()
            .expanded
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.panel.clone())
    }

    /// Number of watchers this panel has installed
    pub fn link_count(&self) -> usize {
        self.inner.borrow().links.len()
    }

    pub fn set_object(&self, object: Option<Parameterized>) {
        {
            let mut inner = self.inner.borrow_mut();
            let same = match (&inner.object, &object) {
                (Some(a), Some(b)) => a.ptr_eq(b),
                (None, None) => true,
                _ => false,
            };
            if same {
                return;
            }
            inner.parameters = object.as_ref().map(Parameterized::param_names).unwrap_or_default();
            inner.config.parameters = Some(inner.parameters.clone());
            inner.object = object;
        }
        self.rebuild();
    }

    /// Replace the whitelist; `None` shows every parameter of the object
    pub fn set_parameters(&self, parameters: Option<Vec<String>>) {
        {
            let mut inner = self.inner.borrow_mut();
            let parameters = match (parameters, &inner.object) {
                (Some(parameters), _) => parameters,
                (None, Some(object)) => object.param_names(),
                (None, None) => Vec::new(),
            };
            if parameters == inner.parameters {
                return;
            }
            inner.config.parameters = Some(parameters.clone());
            inner.parameters = parameters;
        }
        self.rebuild();
    }

    pub fn set_display_threshold(&self, threshold: f64) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.config.display_threshold == threshold {
                return;
            }
            inner.config.display_threshold = threshold;
        }
        self.refresh_visibility();
    }

    pub fn set_show_labels(&self, show: bool) {
        self.update_config(|c| std::mem::replace(&mut c.show_labels, show) != show);
    }

    pub fn set_show_name(&self, show: bool) {
        self.update_config(|c| std::mem::replace(&mut c.show_name, show) != show);
    }

    pub fn set_expand(&self, expand: bool) {
        self.update_config(|c| std::mem::replace(&mut c.expand, expand) != expand);
    }

    pub fn set_expand_button(&self, expand_button: Option<bool>) {
        self.update_config(|c| std::mem::replace(&mut c.expand_button, expand_button) != expand_button);
    }

    pub fn set_widget(&self, name: &str, widget: WidgetOverride) {
        self.update_config(|c| {
            c.widgets.insert(name.to_string(), widget);
            true
        });
    }

    pub fn set_widgets(&self, widgets: HashMap<String, WidgetOverride>) {
        self.update_config(|c| {
            c.widgets = widgets;
            true
        });
    }

    /// Apply a configuration change, rebuilding when it reports a difference
    fn update_config(&self, apply: impl FnOnce(&mut ParamConfig) -> bool) {
        let changed = apply(&mut self.inner.borrow_mut().config);
        if changed {
            self.rebuild();
        }
    }

    /// Tear down every link and control, then build them again from the object
    pub fn rebuild(&self) {
        let (object, config, parameters, tabs) = {
            let mut inner = self.inner.borrow_mut();
            inner.status = PanelStatus::Rebuilding;
            inner.links.teardown();
            inner.entries.clear();
            (
                inner.object.clone(),
                inner.config.clone(),
                inner.parameters.clone(),
                inner.expand_layout.kind() == LayoutKind::Tabs,
            )
        };
        self.collapse_all();

        let Some(object) = object else {
            let mut inner = self.inner.borrow_mut();
            inner.widget_box.set_objects(Vec::new());
            inner.status = PanelStatus::NoObject;
            return;
        };

        let mut entries = Vec::new();
        let mut links = LinkSet::new();
        if config.show_name && !tabs {
            let label = Widget::static_text(format!("<b>{}</b>", object.name()));
            entries.push(Entry {
                name: NAME_ENTRY.to_string(),
                is_name: true,
                view: Viewable::Widget(label.clone()),
                widget: label,
                toggle: None,
            });
        }

        let weak = self.downgrade();
        for name in ordered_params(&object, &parameters, config.default_precedence) {
            let Some(param) = object.get(&name) else {
                continue;
            };
            let built = build_control(&param, &config);
            let ctx = LinkContext::new(&name, &object, &built.widget, weak.clone());
            links.extend(link_parameter(&ctx, &param, &built.widget, &object, built.has_step));
            entries.push(Entry {
                name,
                is_name: false,
                widget: built.widget,
                toggle: built.toggle,
                view: built.view,
            });
        }
        for missing in parameters.iter().filter(|p| !object.has_param(p)) {
            debug!("{}: whitelisted parameter '{}' does not exist", object.name(), missing);
        }

        {
            let mut inner = self.inner.borrow_mut();
            debug!("{}: built {} control(s), {} link(s)", object.name(), entries.len(), links.len());
            inner.entries = entries;
            inner.links = links;
            inner.status = PanelStatus::Built;
        }
        self.refresh_visibility();
        if config.links_subobjects() {
            self.link_subobjects(config.expand);
        }
    }

    /// Repopulate the widget box with the controls shown at the current threshold
    pub fn refresh_visibility(&self) {
        let inner = self.inner.borrow();
        if inner.status != PanelStatus::Built {
            return;
        }
        let Some(object) = &inner.object else {
            return;
        };
        let threshold = inner.config.display_threshold;
        let mut visible: Vec<Viewable> = inner
            .entries
            .iter()
            .filter(|e| e.is_name)
            .map(|e| e.view.clone())
            .collect();
        for name in ordered_params(object, &inner.parameters, inner.config.default_precedence) {
            if !is_shown(object, &name, threshold) {
                continue;
            }
            if let Some(entry) = inner.entries.iter().find(|e| !e.is_name && e.name == name) {
                visible.push(entry.view.clone());
            }
        }
        // sub-object panels expanded into the widget box itself stay after the controls
        if inner.expand_layout.ptr_eq(&inner.widget_box) {
            visible.extend(inner.expanded.iter().map(|e| Viewable::Panel(e.panel.clone())));
        }
        inner.widget_box.set_objects(visible);
    }

    /// Watch controls holding sub-objects so nested panels follow selection and toggles
    fn link_subobjects(&self, expand: bool) {
        let candidates: Vec<(String, Widget, Option<Widget>)> = self
            .inner
            .borrow()
            .entries
            .iter()
            .filter(|e| !e.is_name)
            .filter(|e| {
                e.widget.value().is_parameterized() || e.widget.options().iter().any(Value::is_parameterized)
            })
            .map(|e| (e.name.clone(), e.widget.clone(), e.toggle.clone()))
            .collect();

        let mut links = LinkSet::new();
        for (name, selector, toggle) in &candidates {
            let weak = self.downgrade();
            let param = name.clone();
            let weak_toggle = toggle.as_ref().map(Widget::downgrade);
            let id = selector.watch(WidgetProperty::Value, move |event| {
                if let Some(panel) = weak.upgrade() {
                    panel.update_pane(&param, weak_toggle.as_ref(), event);
                }
            });
            links.push_widget(selector, id);

            if let Some(toggle) = toggle {
                let weak = self.downgrade();
                let param = name.clone();
                let id = toggle.watch(WidgetProperty::Value, move |event| {
                    if let Some(panel) = weak.upgrade() {
                        panel.toggle_pane(&param, event.new.as_bool().unwrap_or(false));
                    }
                });
                links.push_widget(toggle, id);
            }
        }
        self.inner.borrow_mut().links.extend(links);

        if !expand {
            return;
        }
        for (name, _, toggle) in candidates {
            match toggle {
                Some(toggle) if !toggle.disabled() => toggle.set_value(true),
                Some(_) => {}
                None => self.toggle_pane(&name, true),
            }
        }
    }

    /// Insert or remove the nested panel for a sub-object parameter
    fn toggle_pane(&self, name: &str, expand: bool) {
        let (object, existing) = {
            let inner = self.inner.borrow();
            (
                inner.object.clone(),
                inner.expanded.iter().position(|e| e.name == name),
            )
        };
        let Some(object) = object else {
            return;
        };
        match (existing, expand) {
            (Some(index), false) => self.remove_expanded(index),
            (None, true) => {
                let Some(Value::Object(sub)) = object.value(name) else {
                    return;
                };
                let Some(panel) = self.nested_panel(&sub) else {
                    return;
                };
                let label = object.get(name).map(|p| p.label).unwrap_or_default();
                let expand_layout = self.expand_layout();
                if expand_layout.kind() == LayoutKind::Tabs {
                    expand_layout.append_titled(label, panel.clone());
                } else {
                    expand_layout.append(panel.clone());
                }
                self.inner.borrow_mut().expanded.push(Expanded {
                    name: name.to_string(),
                    panel,
                });
            }
            _ => {}
        }
    }

    /// Follow a selector change: swap or drop the nested panel for its slot
    fn update_pane(&self, name: &str, toggle: Option<&WeakWidget>, event: &WidgetEvent) {
        let toggle = toggle.and_then(WeakWidget::upgrade);
        if let Some(toggle) = &toggle {
            toggle.apply(vec![WidgetUpdate::Disabled(!event.new.is_parameterized())]);
        }
        let existing = self.inner.borrow().expanded.iter().position(|e| e.name == name);
        let Some(index) = existing else {
            return;
        };

        match &event.new {
            Value::Object(sub) => {
                let current = self.inner.borrow().expanded[index].panel.clone();
                if current.object().is_some_and(|o| o.ptr_eq(sub)) {
                    return;
                }
                let Some(panel) = self.nested_panel(sub) else {
                    return;
                };
                let expand_layout = self.expand_layout();
                if let Some(position) = expand_layout.position(&Viewable::Panel(current.clone())) {
                    expand_layout.replace(position, panel.clone());
                }
                self.inner.borrow_mut().expanded[index].panel = panel;
                current.dispose();
            }
            _ => {
                self.remove_expanded(index);
                if let Some(toggle) = toggle {
                    toggle.set_value(false);
                }
            }
        }
    }

    fn nested_panel(&self, sub: &Parameterized) -> Option<ParamPanel> {
        let config = self.inner.borrow().config.for_subobject();
        match ParamPanel::new(sub, config) {
            Ok(panel) => Some(panel),
            Err(err) => {
                warn!("{}: {}", sub.name(), err);
                None
            }
        }
    }

    fn remove_expanded(&self, index: usize) {
        let (expanded, expand_layout) = {
            let mut inner = self.inner.borrow_mut();
            (inner.expanded.remove(index), inner.expand_layout.clone())
        };
        expand_layout.remove(&Viewable::Panel(expanded.panel.clone()));
        expanded.panel.dispose();
    }

    fn collapse_all(&self) {
        while !self.inner.borrow().expanded.is_empty() {
            self.remove_expanded(0);
        }
    }

    /// Remove every link and nested panel; the controls stay in place but no
    /// longer follow the object
    pub fn dispose(&self) {
        self.inner.borrow_mut().links.teardown();
        self.collapse_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{Action, Parameter, What};
    use crate::widgets::WidgetKind;
    use std::cell::{Cell, RefCell};
    use std::sync::Once;

    thread_local!(static CAPTURED: RefCell<Vec<(log::Level, String)>> = RefCell::new(Vec::new()));

    /// Records log lines per test thread
    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            CAPTURED.with(|c| c.borrow_mut().push((record.level(), record.args().to_string())));
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    fn capture_logs() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Trace);
            }
        });
        CAPTURED.with(|c| c.borrow_mut().clear());
    }

    fn captured_warnings() -> Vec<String> {
        CAPTURED.with(|c| {
            c.borrow()
                .iter()
                .filter(|(level, _)| *level == log::Level::Warn)
                .map(|(_, message)| message.clone())
                .collect()
        })
    }

    fn example() -> Parameterized {
        Parameterized::new("Example")
            .with_param(Parameter::number("a", 0.0).with_bounds(0.0, 10.0))
            .with_param(Parameter::boolean("b", false))
    }

    fn bare() -> ParamConfig {
        ParamConfig::default().with_show_name(false)
    }

    fn with_child() -> (Parameterized, Parameterized, Parameterized) {
        let first = Parameterized::new("First").with_param(Parameter::integer("x", 1));
        let second = Parameterized::new("Second").with_param(Parameter::integer("y", 2));
        let owner = Parameterized::new("Owner").with_param(Parameter::object_selector(
            "child",
            first.clone(),
            vec![first.clone().into(), second.clone().into(), "nothing".into()],
        ));
        (owner, first, second)
    }

    #[test]
    fn test_two_controls_stay_in_sync() {
        let obj = example();
        let panel = ParamPanel::new(&obj, bare()).unwrap();
        assert_eq!(panel.controls().len(), 2);

        panel.widget("a").unwrap().set_value(5.0);
        assert_eq!(obj.value("a"), Some(Value::Float(5.0)));

        obj.set_param("b", true).unwrap();
        assert_eq!(panel.widget("b").unwrap().value(), Value::Bool(true));
        assert_eq!(panel.widget("b").unwrap().kind(), WidgetKind::Checkbox);
    }

    #[test]
    fn test_name_label_comes_first() {
        let panel = ParamPanel::new(&example(), ParamConfig::default()).unwrap();
        let children = panel.widget_box().objects();
        assert_eq!(children.len(), 3);
        let name = panel.name_widget().unwrap();
        assert!(children[0].ptr_eq(&Viewable::Widget(name.clone())));
        assert_eq!(name.value(), Value::Str("<b>Example</b>".into()));
        assert_eq!(panel.visible_params(), vec!["a", "b"]);
    }

    #[test]
    fn test_propagation_is_exactly_once() {
        let obj = example();
        let panel = ParamPanel::new(&obj, bare()).unwrap();
        let widget = panel.widget("a").unwrap();

        let object_events = Rc::new(Cell::new(0));
        let o = object_events.clone();
        obj.watch(&["a"], What::Value, move |_| o.set(o.get() + 1));
        let widget_events = Rc::new(Cell::new(0));
        let w = widget_events.clone();
        widget.watch(WidgetProperty::Value, move |_| w.set(w.get() + 1));

        widget.set_value(3.0);
        assert_eq!((object_events.get(), widget_events.get()), (1, 1));

        obj.set_param("a", 7.0).unwrap();
        assert_eq!((object_events.get(), widget_events.get()), (2, 2));
        assert_eq!(widget.value(), Value::Float(7.0));
    }

    #[test]
    fn test_rejected_write_does_not_stick_guard() {
        let obj = example();
        let panel = ParamPanel::new(&obj, bare()).unwrap();
        let widget = panel.widget("a").unwrap();

        widget.set_value(50.0);
        assert_eq!(obj.value("a"), Some(Value::Float(0.0)));

        widget.set_value(4.0);
        assert_eq!(obj.value("a"), Some(Value::Float(4.0)));
        obj.set_param("a", 6.0).unwrap();
        assert_eq!(widget.value(), Value::Float(6.0));
    }

    #[test]
    fn test_metadata_propagates() {
        let obj = Parameterized::new("Meta")
            .with_param(Parameter::number("a", 1.0).with_bounds(0.0, 10.0).with_step(0.5))
            .with_param(Parameter::selector("s", "x", vec!["x".into(), "y".into()]));
        let panel = ParamPanel::new(&obj, bare()).unwrap();
        let a = panel.widget("a").unwrap();
        let s = panel.widget("s").unwrap();

        obj.set_constant("a", true).unwrap();
        assert!(a.disabled());
        obj.set_label("a", "Alpha").unwrap();
        assert_eq!(a.name(), "Alpha");
        obj.set_bounds("a", Some((Some(-5.0), Some(5.0)))).unwrap();
        assert_eq!((a.start(), a.end()), (Some(-5.0), Some(5.0)));
        obj.set_step("a", Some(0.25)).unwrap();
        assert_eq!(a.step(), Some(0.25));
        obj.set_objects("s", vec!["x".into(), "y".into(), "z".into()]).unwrap();
        assert_eq!(s.options().len(), 3);
    }

    #[test]
    fn test_ordering_by_precedence_then_declaration() {
        let obj = Parameterized::new("Order")
            .with_param(Parameter::integer("c", 0))
            .with_param(Parameter::integer("a", 0).with_precedence(0.0))
            .with_param(Parameter::integer("d", 0).with_precedence(5.0))
            .with_param(Parameter::integer("b", 0));
        let panel = ParamPanel::new(&obj, bare()).unwrap();
        assert_eq!(panel.ordered_params(), vec!["a", "c", "b", "d"]);
        assert_eq!(panel.visible_params(), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_precedence_crossing_threshold_is_targeted() {
        let obj = example().with_param(Parameter::integer("c", 0).with_precedence(-1.0));
        let panel = ParamPanel::new(&obj, bare()).unwrap();
        assert_eq!(panel.visible_params(), vec!["a", "b"]);
        let links = panel.link_count();
        let c = panel.widget("c").unwrap();

        obj.set_precedence("c", Some(1.0)).unwrap();
        assert_eq!(panel.visible_params(), vec!["a", "b", "c"]);
        assert!(panel.widget("c").unwrap().ptr_eq(&c));

        obj.set_precedence("c", Some(-2.0)).unwrap();
        assert_eq!(panel.visible_params(), vec!["a", "b"]);
        assert_eq!(panel.link_count(), links);
    }

    #[test]
    fn test_threshold_is_reversible() {
        let obj = example().with_param(Parameter::integer("c", 0).with_precedence(0.5));
        let panel = ParamPanel::new(&obj, bare()).unwrap();
        let before = panel.visible_params();
        panel.set_display_threshold(1.0);
        assert_eq!(panel.visible_params(), vec!["a", "b"]);
        panel.set_display_threshold(0.0);
        assert_eq!(panel.visible_params(), before);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let obj = example();
        let panel = ParamPanel::new(&obj, bare()).unwrap();
        let snapshot = |p: &ParamPanel| {
            p.controls()
                .into_iter()
                .map(|(n, w)| (n, w.kind(), w.value()))
                .collect::<Vec<_>>()
        };
        let first = snapshot(&panel);
        let watchers = obj.watcher_count();
        panel.rebuild();
        panel.rebuild();
        assert_eq!(snapshot(&panel), first);
        assert_eq!(obj.watcher_count(), watchers);
        assert_eq!(panel.status(), PanelStatus::Built);
    }

    #[test]
    fn test_hidden_labels_rebuild() {
        let panel = ParamPanel::new(&example(), bare()).unwrap();
        let old = panel.widget("a").unwrap();
        panel.set_show_labels(false);
        let new = panel.widget("a").unwrap();
        assert!(!old.ptr_eq(&new));
        assert_eq!(new.name(), "");
        assert_eq!(old.watcher_count(), 0);
    }

    #[test]
    fn test_action_invoked_on_click() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let obj = Parameterized::new("Act").with_param(Parameter::action("run", move |o| {
            assert_eq!(o.name(), "Act");
            h.set(h.get() + 1);
        }));
        let panel = ParamPanel::new(&obj, bare()).unwrap();
        let button = panel.widget("run").unwrap();
        assert_eq!(button.kind(), WidgetKind::Button);
        button.click();
        assert_eq!(hits.get(), 1);

        let h = hits.clone();
        obj.set_param("run", Action::new(move |_| h.set(h.get() + 10))).unwrap();
        button.click();
        assert_eq!(hits.get(), 11);
    }

    #[test]
    fn test_toggle_expands_and_collapses() {
        let (owner, first, _) = with_child();
        let panel = ParamPanel::new(&owner, bare()).unwrap();
        let toggle = panel.toggle("child").unwrap();
        assert!(!toggle.disabled());
        assert!(panel.expanded_panels().is_empty());

        toggle.set_value(true);
        let nested = panel.expanded_panels();
        assert_eq!(nested.len(), 1);
        assert!(nested[0].object().unwrap().ptr_eq(&first));
        assert!(panel.expand_layout().contains(&Viewable::Panel(nested[0].clone())));

        // reordering keeps the nested panel in the shared box
        owner.set_precedence("child", Some(2.0)).unwrap();
        assert!(panel.widget_box().contains(&Viewable::Panel(nested[0].clone())));

        toggle.set_value(false);
        assert!(panel.expanded_panels().is_empty());
        assert!(!panel.expand_layout().contains(&Viewable::Panel(nested[0].clone())));
        assert_eq!(first.watcher_count(), 0);
    }

    #[test]
    fn test_selection_replaces_or_removes_nested_panel() {
        let (owner, _, second) = with_child();
        let panel = ParamPanel::new(&owner, bare()).unwrap();
        let toggle = panel.toggle("child").unwrap();
        toggle.set_value(true);

        owner.set_param("child", second.clone()).unwrap();
        let nested = panel.expanded_panels();
        assert_eq!(nested.len(), 1);
        assert!(nested[0].object().unwrap().ptr_eq(&second));

        owner.set_param("child", "nothing").unwrap();
        assert!(panel.expanded_panels().is_empty());
        assert!(toggle.disabled());
        assert_eq!(toggle.value(), Value::Bool(false));
    }

    #[test]
    fn test_expand_without_toggle() {
        let (owner, first, _) = with_child();
        let panel = ParamPanel::new(&owner, bare().with_expand(true)).unwrap();
        assert!(panel.toggle("child").is_none());
        let nested = panel.expanded_panel("child").unwrap();
        assert!(nested.object().unwrap().ptr_eq(&first));

        panel.rebuild();
        assert_eq!(panel.expanded_panels().len(), 1);
    }

    #[test]
    fn test_tabs_layout_titles_nested_panels() {
        let (owner, _, _) = with_child();
        let config = ParamConfig::default().with_expand_layout(ExpandLayout::Type(LayoutKind::Tabs));
        let panel = ParamPanel::new(&owner, config).unwrap();
        assert!(panel.name_widget().is_none());
        assert_eq!(panel.layout().kind(), LayoutKind::Tabs);

        panel.toggle("child").unwrap().set_value(true);
        assert_eq!(
            panel.layout().titles(),
            vec![Some("Owner".to_string()), Some("Child".to_string())]
        );
    }

    #[test]
    fn test_expand_into_existing_layout() {
        let (owner, _, _) = with_child();
        let target = Layout::new(LayoutKind::Row);
        let config = bare().with_expand_layout(ExpandLayout::Instance(target.clone()));
        let panel = ParamPanel::new(&owner, config).unwrap();
        assert!(panel.layout().ptr_eq(&panel.widget_box()));

        panel.toggle("child").unwrap().set_value(true);
        assert_eq!(target.len(), 1);
        drop(panel);
        assert!(target.is_empty());
    }

    #[test]
    fn test_invalid_expand_layout() {
        let config = ParamConfig::default().with_expand_layout(ExpandLayout::Named("grid".into()));
        assert!(matches!(
            ParamPanel::new(&example(), config),
            Err(ParamError::InvalidExpandLayout { .. })
        ));
    }

    #[test]
    fn test_for_parameter() {
        let obj = example();
        let panel = ParamPanel::for_parameter(&obj, "b").unwrap();
        assert!(panel.name_widget().is_none());
        assert_eq!(panel.visible_params(), vec!["b"]);
        assert!(ParamPanel::for_parameter(&obj, "zz").is_err());
    }

    #[test]
    fn test_set_object_resets_whitelist() {
        let first = example();
        let panel = ParamPanel::new(&first, bare().with_parameters(&["a"])).unwrap();
        assert_eq!(panel.visible_params(), vec!["a"]);

        let other = Parameterized::new("Other").with_param(Parameter::string("title", "t"));
        panel.set_object(Some(other.clone()));
        assert_eq!(panel.parameters(), vec!["title"]);
        assert_eq!(panel.visible_params(), vec!["title"]);
        assert_eq!(first.watcher_count(), 0);

        panel.set_object(None);
        assert_eq!(panel.status(), PanelStatus::NoObject);
        assert!(panel.widget_box().is_empty());
        assert_eq!(other.watcher_count(), 0);
    }

    #[test]
    fn test_initializer_runs_before_build() {
        let obj = example();
        let config = bare().with_initializer(|o| {
            let _ = o.set_param("a", 9.0);
        });
        let panel = ParamPanel::new(&obj, config).unwrap();
        assert_eq!(panel.widget("a").unwrap().value(), Value::Float(9.0));
    }

    #[test]
    fn test_dropping_panel_unlinks_object() {
        let obj = example();
        let panel = ParamPanel::new(&obj, bare()).unwrap();
        assert!(obj.watcher_count() > 0);
        drop(panel);
        assert_eq!(obj.watcher_count(), 0);
    }

    #[test]
    fn test_rejected_control_write_warns() {
        let obj = example();
        let panel = ParamPanel::new(&obj, bare()).unwrap();
        capture_logs();

        panel.widget("a").unwrap().set_value(50.0);
        assert_eq!(obj.value("a"), Some(Value::Float(0.0)));

        let warnings = captured_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Example: "));
        assert!(warnings[0].contains("outside bounds"));

        panel.widget("a").unwrap().set_value(4.0);
        assert_eq!(captured_warnings().len(), 1);
    }

    #[test]
    fn test_signed_zero_precedences_keep_declaration_order() {
        let obj = Parameterized::new("Zeros")
            .with_param(Parameter::integer("neg", 0).with_precedence(-0.0))
            .with_param(Parameter::integer("pos", 0).with_precedence(0.0));
        let names = obj.param_names();
        assert_eq!(ordered_params(&obj, &names, 0.0), vec!["neg", "pos"]);

        let obj = Parameterized::new("Zeros")
            .with_param(Parameter::integer("pos", 0).with_precedence(0.0))
            .with_param(Parameter::integer("neg", 0).with_precedence(-0.0))
            .with_param(Parameter::integer("plain", 0));
        let names = obj.param_names();
        assert_eq!(ordered_params(&obj, &names, 0.0), vec!["pos", "neg", "plain"]);
    }
}
