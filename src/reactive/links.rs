//! Cross-widget property links
//!
//! A link copies one property of a source widget onto a target widget
//! whenever it changes. Links are recorded per source in a thread-local
//! registry; reactive panes consult it to decide whether an output can be
//! merged in place or has to be replaced.

use std::cell::RefCell;
use std::collections::HashMap;

use log::debug;

use crate::param::Value;
use crate::widgets::{Widget, WidgetId, WidgetProperty, WidgetUpdate, WidgetWatcherId};

/// A registered property link between two widgets
#[derive(Debug, Clone)]
pub struct Link {
    pub source: Widget,
    pub target: Widget,
    pub property: WidgetProperty,
    watcher: WidgetWatcherId,
}

thread_local!(static LINK_REGISTRY: RefCell<HashMap<WidgetId, Vec<Link>>> = RefCell::new(HashMap::new()));

fn property_update(property: WidgetProperty, value: &Value) -> Option<WidgetUpdate> {
    match property {
        WidgetProperty::Value => Some(WidgetUpdate::Value(value.clone())),
        WidgetProperty::Disabled => value.as_bool().map(WidgetUpdate::Disabled),
        WidgetProperty::Name => value.as_str().map(|s| WidgetUpdate::Name(s.to_string())),
        WidgetProperty::Options => match value {
            Value::List(items) => Some(WidgetUpdate::Options(items.clone())),
            _ => None,
        },
        WidgetProperty::Start => Some(WidgetUpdate::Start(value.as_f64())),
        WidgetProperty::End => Some(WidgetUpdate::End(value.as_f64())),
        WidgetProperty::Step => Some(WidgetUpdate::Step(value.as_f64())),
        WidgetProperty::Width | WidgetProperty::Clicks => None,
    }
}

/// Mirror `property` of `source` onto `target` and record the link
pub fn link_widgets(source: &Widget, target: &Widget, property: WidgetProperty) -> Link {
    let weak_target = target.downgrade();
    let watcher = source.watch(property, move |event| {
        let Some(target) = weak_target.upgrade() else {
            return;
        };
        if let Some(update) = property_update(event.property, &event.new) {
            if target.kind().accepts(update.key()) {
                target.apply(vec![update]);
            }
        }
    });
    let link = Link {
        source: source.clone(),
        target: target.clone(),
        property,
        watcher,
    };
    debug!("linked widget {} -> {} ({:?})", source.id(), target.id(), property);
    LINK_REGISTRY.with(|registry| {
        registry.borrow_mut().entry(source.id()).or_default().push(link.clone());
    });
    link
}

/// Remove a link and its watcher; returns whether it was registered
pub fn unlink(link: &Link) -> bool {
    link.source.unwatch(link.watcher);
    LINK_REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        let Some(links) = registry.get_mut(&link.source.id()) else {
            return false;
        };
        let before = links.len();
        links.retain(|l| l.watcher != link.watcher);
        let removed = before != links.len();
        if links.is_empty() {
            registry.remove(&link.source.id());
        }
        removed
    })
}

/// Remove every link `widget` takes part in, as source or target.
/// Returns the number of links removed.
pub fn unlink_widget(widget: &Widget) -> usize {
    let id = widget.id();
    let removed: Vec<Link> = LINK_REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        let mut removed = registry.remove(&id).unwrap_or_default();
        for links in registry.values_mut() {
            let (targeting, kept): (Vec<Link>, Vec<Link>) =
                links.drain(..).partition(|l| l.target.id() == id);
            *links = kept;
            removed.extend(targeting);
        }
        registry.retain(|_, links| !links.is_empty());
        removed
    });
    for link in &removed {
        link.source.unwatch(link.watcher);
    }
    if !removed.is_empty() {
        debug!("unlinked widget {} ({} link(s))", id, removed.len());
    }
    removed.len()
}

/// Links whose source is `widget`
pub fn links_for(widget: &Widget) -> Vec<Link> {
    LINK_REGISTRY.with(|registry| registry.borrow().get(&widget.id()).cloned().unwrap_or_default())
}

/// Whether the widget takes part in any link, as source or target
pub fn is_linked(widget: &Widget) -> bool {
    let id = widget.id();
    LINK_REGISTRY.with(|registry| {
        let registry = registry.borrow();
        registry.contains_key(&id) || registry.values().flatten().any(|l| l.target.id() == id)
    })
}
