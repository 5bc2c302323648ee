//! Control handles: value holders with per-property change watchers

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::param::Value;

use super::kind::{ConfigKey, WidgetKind};

static NEXT_WIDGET_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a control
pub type WidgetId = u64;

/// Observable properties of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetProperty {
    Value,
    Clicks,
    Disabled,
    Name,
    Options,
    Start,
    End,
    Step,
    Width,
}

/// One configuration change applied to a control
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetUpdate {
    Value(Value),
    Options(Vec<Value>),
    Start(Option<f64>),
    End(Option<f64>),
    Step(Option<f64>),
    Disabled(bool),
    Name(String),
    Width(u32),
    Margin([u32; 4]),
}

impl WidgetUpdate {
    pub fn key(&self) -> ConfigKey {
        match self {
            WidgetUpdate::Value(_) => ConfigKey::Value,
            WidgetUpdate::Options(_) => ConfigKey::Options,
            WidgetUpdate::Start(_) => ConfigKey::Start,
            WidgetUpdate::End(_) => ConfigKey::End,
            WidgetUpdate::Step(_) => ConfigKey::Step,
            WidgetUpdate::Disabled(_) => ConfigKey::Disabled,
            WidgetUpdate::Name(_) => ConfigKey::Name,
            WidgetUpdate::Width(_) => ConfigKey::Width,
            WidgetUpdate::Margin(_) => ConfigKey::Margin,
        }
    }
}

/// Change notification emitted by a control
#[derive(Debug, Clone)]
pub struct WidgetEvent {
    pub widget: Widget,
    pub property: WidgetProperty,
    pub old: Value,
    pub new: Value,
}

/// Handle returned by [`Widget::watch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetWatcherId(u64);

type WidgetCallback = Rc<dyn Fn(&WidgetEvent)>;

struct WidgetWatcher {
    id: WidgetWatcherId,
    property: WidgetProperty,
    callback: WidgetCallback,
}

struct WidgetInner {
    id: WidgetId,
    kind: WidgetKind,
    value: Value,
    name: String,
    disabled: bool,
    options: Vec<Value>,
    start: Option<f64>,
    end: Option<f64>,
    step: Option<f64>,
    clicks: u64,
    width: Option<u32>,
    margin: Option<[u32; 4]>,
    watchers: Vec<WidgetWatcher>,
    next_watcher: u64,
}

/// Shared handle to a UI control
#[derive(Clone)]
pub struct Widget {
    inner: Rc<RefCell<WidgetInner>>,
}

/// Non-owning control handle
#[derive(Clone)]
pub struct WeakWidget {
    inner: Weak<RefCell<WidgetInner>>,
}

impl WeakWidget {
    pub fn upgrade(&self) -> Option<Widget> {
        self.inner.upgrade().map(|inner| Widget { inner })
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Widget")
            .field("id", &inner.id)
            .field("kind", &inner.kind)
            .field("name", &inner.name)
            .field("value", &inner.value)
            .finish()
    }
}

impl Widget {
    /// Create a control of `kind`, applying the accepted subset of `config`
    pub fn new(kind: WidgetKind, config: Vec<WidgetUpdate>) -> Self {
        let widget = Self {
            inner: Rc::new(RefCell::new(WidgetInner {
                id: NEXT_WIDGET_ID.fetch_add(1, Ordering::Relaxed),
                kind,
                value: Value::None,
                name: String::new(),
                disabled: false,
                options: Vec::new(),
                start: None,
                end: None,
                step: None,
                clicks: 0,
                width: None,
                margin: None,
                watchers: Vec::new(),
                next_watcher: 0,
            })),
        };
        widget.apply(config.into_iter().filter(|u| kind.accepts(u.key())).collect());
        widget
    }

    /// Read-only text display
    pub fn static_text(text: impl Into<String>) -> Self {
        Self::new(WidgetKind::StaticText, vec![WidgetUpdate::Value(Value::Str(text.into()))])
    }

    pub fn id(&self) -> WidgetId {
        self.inner.borrow().id
    }

    pub fn kind(&self) -> WidgetKind {
        self.inner.borrow().kind
    }

    pub fn value(&self) -> Value {
        self.inner.borrow().value.clone()
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    pub fn disabled(&self) -> bool {
        self.inner.borrow().disabled
    }

    pub fn options(&self) -> Vec<Value> {
        self.inner.borrow().options.clone()
    }

    pub fn start(&self) -> Option<f64> {
        self.inner.borrow().start
    }

    pub fn end(&self) -> Option<f64> {
        self.inner.borrow().end
    }

    pub fn step(&self) -> Option<f64> {
        self.inner.borrow().step
    }

    pub fn clicks(&self) -> u64 {
        self.inner.borrow().clicks
    }

    pub fn width(&self) -> Option<u32> {
        self.inner.borrow().width
    }

    pub fn margin(&self) -> Option<[u32; 4]> {
        self.inner.borrow().margin
    }

    pub fn ptr_eq(&self, other: &Widget) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakWidget {
        WeakWidget {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Set the value as if edited by the user
    pub fn set_value(&self, value: impl Into<Value>) {
        self.apply(vec![WidgetUpdate::Value(value.into())]);
    }

    /// Activate a button-like control
    pub fn click(&self) {
        let (old, new) = {
            let mut inner = self.inner.borrow_mut();
            inner.clicks += 1;
            (inner.clicks - 1, inner.clicks)
        };
        self.notify(vec![(
            WidgetProperty::Clicks,
            Value::Int(old as i64),
            Value::Int(new as i64),
        )]);
    }

    /// Apply configuration changes, then notify watchers of each property
    /// that actually changed
    pub fn apply(&self, updates: Vec<WidgetUpdate>) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.borrow_mut();
            for update in updates {
                if let Some(event) = inner.apply_one(update) {
                    events.push(event);
                }
            }
        }
        self.notify(events);
    }

    /// Register a callback for changes of `property`
    pub fn watch(&self, property: WidgetProperty, callback: impl Fn(&WidgetEvent) + 'static) -> WidgetWatcherId {
        let mut inner = self.inner.borrow_mut();
        let id = WidgetWatcherId(inner.next_watcher);
        inner.next_watcher += 1;
        inner.watchers.push(WidgetWatcher {
            id,
            property,
            callback: Rc::new(callback),
        });
        id
    }

    pub fn unwatch(&self, id: WidgetWatcherId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.watchers.len();
        inner.watchers.retain(|w| w.id != id);
        before != inner.watchers.len()
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.borrow().watchers.len()
    }

    fn is_watching(&self, id: WidgetWatcherId) -> bool {
        self.inner.borrow().watchers.iter().any(|w| w.id == id)
    }

    fn notify(&self, events: Vec<(WidgetProperty, Value, Value)>) {
        for (property, old, new) in events {
            let targets: Vec<(WidgetWatcherId, WidgetCallback)> = self
                .inner
                .borrow()
                .watchers
                .iter()
                .filter(|w| w.property == property)
                .map(|w| (w.id, Rc::clone(&w.callback)))
                .collect();
            if targets.is_empty() {
                continue;
            }
            let event = WidgetEvent {
                widget: self.clone(),
                property,
                old,
                new,
            };
            for (id, callback) in targets {
                if self.is_watching(id) {
                    callback(&event);
                }
            }
        }
    }
}

impl WidgetInner {
    fn apply_one(&mut self, update: WidgetUpdate) -> Option<(WidgetProperty, Value, Value)> {
        fn opt(v: Option<f64>) -> Value {
            v.map(Value::Float).unwrap_or(Value::None)
        }
        match update {
            WidgetUpdate::Value(v) => {
                if self.value == v {
                    return None;
                }
                let old = std::mem::replace(&mut self.value, v.clone());
                Some((WidgetProperty::Value, old, v))
            }
            WidgetUpdate::Options(options) => {
                if self.options == options {
                    return None;
                }
                let old = std::mem::replace(&mut self.options, options.clone());
                Some((WidgetProperty::Options, Value::List(old), Value::List(options)))
            }
            WidgetUpdate::Start(start) => {
                if self.start == start {
                    return None;
                }
                let old = std::mem::replace(&mut self.start, start);
                Some((WidgetProperty::Start, opt(old), opt(start)))
            }
            WidgetUpdate::End(end) => {
                if self.end == end {
                    return None;
                }
                let old = std::mem::replace(&mut self.end, end);
                Some((WidgetProperty::End, opt(old), opt(end)))
            }
            WidgetUpdate::Step(step) => {
                if self.step == step {
                    return None;
                }
                let old = std::mem::replace(&mut self.step, step);
                Some((WidgetProperty::Step, opt(old), opt(step)))
            }
            WidgetUpdate::Disabled(disabled) => {
                if self.disabled == disabled {
                    return None;
                }
                self.disabled = disabled;
                Some((WidgetProperty::Disabled, Value::Bool(!disabled), Value::Bool(disabled)))
            }
            WidgetUpdate::Name(name) => {
                if self.name == name {
                    return None;
                }
                let old = std::mem::replace(&mut self.name, name.clone());
                Some((WidgetProperty::Name, Value::Str(old), Value::Str(name)))
            }
            WidgetUpdate::Width(width) => {
                if self.width == Some(width) {
                    return None;
                }
                let old = self.width.replace(width);
                Some((
                    WidgetProperty::Width,
                    old.map(|w| Value::Int(w as i64)).unwrap_or(Value::None),
                    Value::Int(width as i64),
                ))
            }
            WidgetUpdate::Margin(margin) => {
                self.margin = Some(margin);
                None
            }
        }
    }
}
