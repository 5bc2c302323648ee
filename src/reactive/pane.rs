//! Panes: renderable wrappers around the output of a reactive callable

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::interface::ParamPanel;
use crate::param::Value;
use crate::widgets::{Layout, LayoutKind, Viewable, Widget, WidgetKind, WidgetUpdate};

use super::links;

/// Output produced by a reactive callable
#[derive(Debug, Clone)]
pub enum Output {
    /// Markup text
    Text(String),
    Value(Value),
    /// A live control whose properties can be merged in place
    Widget(Widget),
    Layout(Layout),
    Panel(ParamPanel),
}

/// Kind of pane an output is rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneKind {
    Text,
    Value,
    Widget(WidgetKind),
    Layout(LayoutKind),
    Panel,
}

impl Output {
    pub fn pane_kind(&self) -> PaneKind {
        match self {
            Output::Text(_) => PaneKind::Text,
            Output::Value(_) => PaneKind::Value,
            Output::Widget(w) => PaneKind::Widget(w.kind()),
            Output::Layout(l) => PaneKind::Layout(l.kind()),
            Output::Panel(_) => PaneKind::Panel,
        }
    }

    /// Whether the output takes part in a cross-widget link
    pub fn is_linked(&self) -> bool {
        match self {
            Output::Widget(w) => links::is_linked(w),
            Output::Layout(l) => Viewable::Layout(l.clone()).widgets().iter().any(links::is_linked),
            _ => false,
        }
    }
}

impl From<&str> for Output {
    fn from(text: &str) -> Self {
        Output::Text(text.to_string())
    }
}

impl From<String> for Output {
    fn from(text: String) -> Self {
        Output::Text(text)
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Output::Value(value)
    }
}

impl From<Widget> for Output {
    fn from(widget: Widget) -> Self {
        Output::Widget(widget)
    }
}

impl From<Layout> for Output {
    fn from(layout: Layout) -> Self {
        Output::Layout(layout)
    }
}

struct PaneInner {
    kind: PaneKind,
    object: Output,
}

/// Shared handle to a pane
#[derive(Clone)]
pub struct Pane {
    inner: Rc<RefCell<PaneInner>>,
}

impl fmt::Debug for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pane").field("kind", &self.inner.borrow().kind).finish()
    }
}

impl Pane {
    pub fn new(object: Output) -> Self {
        Self {
            inner: Rc::new(RefCell::new(PaneInner {
                kind: object.pane_kind(),
                object,
            })),
        }
    }

    pub fn kind(&self) -> PaneKind {
        self.inner.borrow().kind
    }

    pub fn object(&self) -> Output {
        self.inner.borrow().object.clone()
    }

    pub fn ptr_eq(&self, other: &Pane) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Swap the wrapped output; the pane kind must stay the same
    pub fn set_object(&self, object: Output) {
        let mut inner = self.inner.borrow_mut();
        debug_assert_eq!(inner.kind, object.pane_kind());
        inner.object = object;
    }

    /// Merge a new output into this pane. Widget outputs keep the existing
    /// control and copy over the properties that differ; everything else
    /// replaces the wrapped output.
    pub fn merge(&self, object: Output) {
        let current = self.object();
        match (&current, &object) {
            (Output::Widget(existing), Output::Widget(new)) => {
                if existing.ptr_eq(new) {
                    return;
                }
                let updates: Vec<WidgetUpdate> = vec![
                    WidgetUpdate::Value(new.value()),
                    WidgetUpdate::Options(new.options()),
                    WidgetUpdate::Start(new.start()),
                    WidgetUpdate::End(new.end()),
                    WidgetUpdate::Step(new.step()),
                    WidgetUpdate::Disabled(new.disabled()),
                ]
                .into_iter()
                .filter(|u| existing.kind().accepts(u.key()))
                .collect();
                existing.apply(updates);
            }
            _ => self.set_object(object),
        }
    }

    /// Widgets rendered by this pane
    pub fn widgets(&self) -> Vec<Widget> {
        match self.object() {
            Output::Widget(w) => vec![w],
            Output::Layout(l) => Viewable::Layout(l).widgets(),
            Output::Panel(p) => Viewable::Panel(p).widgets(),
            Output::Text(_) | Output::Value(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_output() {
        assert_eq!(Output::from("x").pane_kind(), PaneKind::Text);
        assert_eq!(Output::Value(Value::Int(1)).pane_kind(), PaneKind::Value);
        let w = Widget::new(WidgetKind::Checkbox, vec![]);
        assert_eq!(Output::from(w).pane_kind(), PaneKind::Widget(WidgetKind::Checkbox));
    }

    #[test]
    fn test_widget_merge_keeps_identity() {
        let existing = Widget::new(WidgetKind::IntSlider, vec![WidgetUpdate::Value(Value::Int(1))]);
        let pane = Pane::new(existing.clone().into());
        let fresh = Widget::new(
            WidgetKind::IntSlider,
            vec![WidgetUpdate::Value(Value::Int(4)), WidgetUpdate::End(Some(9.0))],
        );
        pane.merge(fresh.into());
        let Output::Widget(current) = pane.object() else {
            panic!("expected widget output");
        };
        assert!(current.ptr_eq(&existing));
        assert_eq!(existing.value(), Value::Int(4));
        assert_eq!(existing.end(), Some(9.0));
    }

    #[test]
    fn test_text_merge_replaces_object() {
        let pane = Pane::new("a".into());
        pane.merge("b".into());
        assert!(matches!(pane.object(), Output::Text(ref s) if s == "b"));
    }
}
