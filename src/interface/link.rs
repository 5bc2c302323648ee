//! Bidirectional links between parameters and their controls
//!
//! Every linked parameter gets one [`LinkContext`] shared by the handler
//! functions below. The context carries the re-entrancy guard for its
//! `(parameter, control)` pair: a two state machine, idle or propagating.
//! While propagating, nested value triggers from either side are dropped,
//! not queued. Metadata changes (constant, label, options, bounds, step,
//! precedence) always apply.

use std::cell::Cell;
use std::rc::Rc;

use log::{debug, warn};

use crate::param::{Action, Event, HasBounds, HasOptions, Parameter, Parameterized, Value, WatcherId, WeakParameterized, What};
use crate::widgets::{WeakWidget, Widget, WidgetEvent, WidgetProperty, WidgetUpdate, WidgetWatcherId};

use super::panel::WeakParamPanel;

/// RAII token marking a link as propagating; restores the prior state on drop
pub struct UpdateGuard {
    state: Rc<Cell<bool>>,
    previous: bool,
}

impl UpdateGuard {
    pub fn enter(state: &Rc<Cell<bool>>) -> Self {
        let previous = state.replace(true);
        Self {
            state: Rc::clone(state),
            previous,
        }
    }
}

impl Drop for UpdateGuard {
    fn drop(&mut self) {
        self.state.set(self.previous);
    }
}

/// Per-parameter record passed to the shared link handlers
pub struct LinkContext {
    pub name: String,
    object: WeakParameterized,
    widget: WeakWidget,
    panel: WeakParamPanel,
    updating: Rc<Cell<bool>>,
    /// Current click watcher of an action control
    click_watcher: Cell<Option<WidgetWatcherId>>,
}

impl LinkContext {
    pub fn new(name: &str, object: &Parameterized, widget: &Widget, panel: WeakParamPanel) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            object: object.downgrade(),
            widget: widget.downgrade(),
            panel,
            updating: Rc::new(Cell::new(false)),
            click_watcher: Cell::new(None),
        })
    }

    /// Whether a write through this link is in flight
    pub fn is_updating(&self) -> bool {
        self.updating.get()
    }
}

enum LinkRecord {
    Object(Parameterized, WatcherId),
    Widget(Widget, WidgetWatcherId),
    /// Click watcher that is swapped whenever the action callable changes
    Action(Widget, Rc<LinkContext>),
}

/// Every watcher installed for one built tree, torn down together
#[derive(Default)]
pub struct LinkSet {
    records: Vec<LinkRecord>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_object(&mut self, object: &Parameterized, id: WatcherId) {
        self.records.push(LinkRecord::Object(object.clone(), id));
    }

    pub fn push_widget(&mut self, widget: &Widget, id: WidgetWatcherId) {
        self.records.push(LinkRecord::Widget(widget.clone(), id));
    }

    fn push_action(&mut self, widget: &Widget, ctx: Rc<LinkContext>) {
        self.records.push(LinkRecord::Action(widget.clone(), ctx));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn extend(&mut self, other: LinkSet) {
        let mut other = other;
        self.records.append(&mut other.records);
    }

    /// Remove every watcher this set installed
    pub fn teardown(&mut self) {
        let count = self.records.len();
        for record in self.records.drain(..) {
            match record {
                LinkRecord::Object(object, id) => {
                    object.unwatch(id);
                }
                LinkRecord::Widget(widget, id) => {
                    widget.unwatch(id);
                }
                LinkRecord::Action(widget, ctx) => {
                    if let Some(id) = ctx.click_watcher.take() {
                        widget.unwatch(id);
                    }
                }
            }
        }
        if count > 0 {
            debug!("tore down {} link(s)", count);
        }
    }
}

impl Drop for LinkSet {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Wire `param` and its control together in both directions
pub fn link_parameter(ctx: &Rc<LinkContext>, param: &Parameter, widget: &Widget, object: &Parameterized, has_step: bool) -> LinkSet {
    let mut links = LinkSet::new();

    if param.is_action() {
        if let Some(action) = param.value.as_action() {
            bind_action(ctx, widget, action.clone());
        }
        links.push_action(widget, Rc::clone(ctx));
    } else {
        let handler = Rc::clone(ctx);
        let id = widget.watch(WidgetProperty::Value, move |event| on_control_value(&handler, event));
        links.push_widget(widget, id);
    }

    let mut watched = vec![What::Constant, What::Precedence, What::Label];
    if param.options().is_some() {
        watched.push(What::Objects);
    }
    if param.soft_bounds().is_some() {
        watched.push(What::Bounds);
    }
    if has_step {
        watched.push(What::Step);
    }
    watched.push(What::Value);

    for what in watched {
        let handler = Rc::clone(ctx);
        let id = object.watch(&[param.name.as_str()], what, move |event| on_param_change(&handler, event));
        links.push_object(object, id);
    }
    links
}

/// Replace the click watcher of an action control with one invoking `action`
fn bind_action(ctx: &LinkContext, widget: &Widget, action: Action) {
    if let Some(old) = ctx.click_watcher.take() {
        widget.unwatch(old);
    }
    let object = ctx.object.clone();
    let id = widget.watch(WidgetProperty::Clicks, move |_| {
        if let Some(object) = object.upgrade() {
            action.invoke(&object);
        }
    });
    ctx.click_watcher.set(Some(id));
}

/// Control to object: write the edited value back to the parameter
pub fn on_control_value(ctx: &LinkContext, event: &WidgetEvent) {
    if ctx.is_updating() {
        return;
    }
    let Some(object) = ctx.object.upgrade() else {
        return;
    };
    let _guard = UpdateGuard::enter(&ctx.updating);
    if let Err(err) = object.set_param(&ctx.name, event.new.clone()) {
        warn!("{}: {}", object.name(), err);
    }
}

/// Object to control: mirror a parameter change on the control
pub fn on_param_change(ctx: &LinkContext, event: &Event) {
    let Some(widget) = ctx.widget.upgrade() else {
        return;
    };
    let updates = match event.what {
        What::Constant => vec![WidgetUpdate::Disabled(event.new.as_bool().unwrap_or(false))],
        What::Precedence => {
            if let Some(panel) = ctx.panel.upgrade() {
                panel.refresh_visibility();
            }
            return;
        }
        What::Objects => match event.object.get(&ctx.name).and_then(|p| p.options()) {
            Some(options) => vec![WidgetUpdate::Options(options)],
            None => return,
        },
        What::Bounds => match event.object.get(&ctx.name).and_then(|p| p.soft_bounds()) {
            Some((start, end)) => vec![WidgetUpdate::Start(start), WidgetUpdate::End(end)],
            None => return,
        },
        What::Step => vec![WidgetUpdate::Step(event.new.as_f64())],
        What::Label => {
            let hidden = ctx.panel.upgrade().is_some_and(|p| !p.config().show_labels);
            if hidden && !widget.kind().is_button() {
                return;
            }
            vec![WidgetUpdate::Name(event.new.as_str().unwrap_or_default().to_string())]
        }
        What::Value if ctx.is_updating() => return,
        What::Value => {
            if let Value::Action(action) = &event.new {
                bind_action(ctx, &widget, action.clone());
                return;
            }
            vec![WidgetUpdate::Value(event.new.clone())]
        }
    };

    let updates = updates
        .into_iter()
        .filter(|u| widget.kind().accepts(u.key()))
        .collect();
    let _guard = UpdateGuard::enter(&ctx.updating);
    widget.apply(updates);
}
