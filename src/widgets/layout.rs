//! Ordered containers of renderable children

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::interface::ParamPanel;
use crate::reactive::{Pane, ReactivePane};

use super::widget::Widget;

/// Container types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutKind {
    Row,
    Column,
    /// Children shown one at a time, selected by title
    Tabs,
    /// Vertical box holding parameter controls
    WidgetBox,
}

impl LayoutKind {
    /// Parse a container type by its lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "row" => Some(LayoutKind::Row),
            "column" => Some(LayoutKind::Column),
            "tabs" => Some(LayoutKind::Tabs),
            "widgetbox" | "widget_box" => Some(LayoutKind::WidgetBox),
            _ => None,
        }
    }
}

/// Anything that can be placed in a layout
#[derive(Clone, Debug)]
pub enum Viewable {
    Widget(Widget),
    Layout(Layout),
    Panel(ParamPanel),
    Pane(Pane),
    Reactive(ReactivePane),
}

impl Viewable {
    /// Identity comparison
    pub fn ptr_eq(&self, other: &Viewable) -> bool {
        match (self, other) {
            (Viewable::Widget(a), Viewable::Widget(b)) => a.ptr_eq(b),
            (Viewable::Layout(a), Viewable::Layout(b)) => a.ptr_eq(b),
            (Viewable::Panel(a), Viewable::Panel(b)) => a.ptr_eq(b),
            (Viewable::Pane(a), Viewable::Pane(b)) => a.ptr_eq(b),
            (Viewable::Reactive(a), Viewable::Reactive(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn as_widget(&self) -> Option<&Widget> {
        match self {
            Viewable::Widget(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_layout(&self) -> Option<&Layout> {
        match self {
            Viewable::Layout(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_panel(&self) -> Option<&ParamPanel> {
        match self {
            Viewable::Panel(p) => Some(p),
            _ => None,
        }
    }

    /// Every widget reachable from this viewable, depth first
    pub fn widgets(&self) -> Vec<Widget> {
        match self {
            Viewable::Widget(w) => vec![w.clone()],
            Viewable::Layout(l) => l.objects().iter().flat_map(Viewable::widgets).collect(),
            Viewable::Panel(p) => Viewable::Layout(p.layout()).widgets(),
            Viewable::Pane(p) => p.widgets(),
            Viewable::Reactive(r) => Viewable::Layout(r.layout()).widgets(),
        }
    }
}

impl From<Widget> for Viewable {
    fn from(widget: Widget) -> Self {
        Viewable::Widget(widget)
    }
}

impl From<Layout> for Viewable {
    fn from(layout: Layout) -> Self {
        Viewable::Layout(layout)
    }
}

impl From<ParamPanel> for Viewable {
    fn from(panel: ParamPanel) -> Self {
        Viewable::Panel(panel)
    }
}

impl From<Pane> for Viewable {
    fn from(pane: Pane) -> Self {
        Viewable::Pane(pane)
    }
}

struct Child {
    title: Option<String>,
    item: Viewable,
}

struct LayoutInner {
    kind: LayoutKind,
    children: Vec<Child>,
    width: Option<u32>,
}

/// Shared handle to a container
#[derive(Clone)]
pub struct Layout {
    inner: Rc<RefCell<LayoutInner>>,
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Layout")
            .field("kind", &inner.kind)
            .field("children", &inner.children.len())
            .finish()
    }
}

impl Layout {
    pub fn new(kind: LayoutKind) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LayoutInner {
                kind,
                children: Vec::new(),
                width: None,
            })),
        }
    }

    pub fn with_children(kind: LayoutKind, children: Vec<Viewable>) -> Self {
        let layout = Self::new(kind);
        layout.set_objects(children);
        layout
    }

    pub fn with_width(self, width: u32) -> Self {
        self.inner.borrow_mut().width = Some(width);
        self
    }

    pub fn kind(&self) -> LayoutKind {
        self.inner.borrow().kind
    }

    pub fn width(&self) -> Option<u32> {
        self.inner.borrow().width
    }

    pub fn ptr_eq(&self, other: &Layout) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Children in display order
    pub fn objects(&self) -> Vec<Viewable> {
        self.inner.borrow().children.iter().map(|c| c.item.clone()).collect()
    }

    /// Tab titles, `None` for untitled children
    pub fn titles(&self) -> Vec<Option<String>> {
        self.inner.borrow().children.iter().map(|c| c.title.clone()).collect()
    }

    pub fn get(&self, index: usize) -> Option<Viewable> {
        self.inner.borrow().children.get(index).map(|c| c.item.clone())
    }

    /// Replace all children
    pub fn set_objects(&self, objects: Vec<Viewable>) {
        self.inner.borrow_mut().children = objects
            .into_iter()
            .map(|item| Child { title: None, item })
            .collect();
    }

    pub fn append(&self, item: impl Into<Viewable>) {
        self.inner.borrow_mut().children.push(Child {
            title: None,
            item: item.into(),
        });
    }

    pub fn append_titled(&self, title: impl Into<String>, item: impl Into<Viewable>) {
        self.inner.borrow_mut().children.push(Child {
            title: Some(title.into()),
            item: item.into(),
        });
    }

    /// Insert at `index`, clamped to the end
    pub fn insert(&self, index: usize, item: impl Into<Viewable>) {
        let mut inner = self.inner.borrow_mut();
        let index = index.min(inner.children.len());
        inner.children.insert(index, Child {
            title: None,
            item: item.into(),
        });
    }

    pub fn position(&self, item: &Viewable) -> Option<usize> {
        self.inner
            .borrow()
            .children
            .iter()
            .position(|c| c.item.ptr_eq(item))
    }

    pub fn contains(&self, item: &Viewable) -> bool {
        self.position(item).is_some()
    }

    /// Remove a child by identity; returns whether it was present
    pub fn remove(&self, item: &Viewable) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.children.len();
        inner.children.retain(|c| !c.item.ptr_eq(item));
        before != inner.children.len()
    }

    pub fn pop(&self, index: usize) -> Option<Viewable> {
        let mut inner = self.inner.borrow_mut();
        if index < inner.children.len() {
            Some(inner.children.remove(index).item)
        } else {
            None
        }
    }

    /// Replace the child at `index`, keeping its title
    pub fn replace(&self, index: usize, item: impl Into<Viewable>) -> Option<Viewable> {
        let mut inner = self.inner.borrow_mut();
        let child = inner.children.get_mut(index)?;
        Some(std::mem::replace(&mut child.item, item.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::WidgetKind;

    fn text(s: &str) -> Viewable {
        Viewable::Widget(Widget::static_text(s))
    }

    #[test]
    fn test_insert_remove_by_identity() {
        let layout = Layout::new(LayoutKind::Column);
        let a = text("a");
        let b = text("b");
        layout.append(a.clone());
        layout.insert(0, b.clone());
        assert_eq!(layout.position(&a), Some(1));
        assert!(layout.remove(&b));
        assert!(!layout.remove(&b));
        assert_eq!(layout.len(), 1);
    }

    #[test]
    fn test_replace_keeps_title() {
        let tabs = Layout::new(LayoutKind::Tabs);
        tabs.append_titled("First", text("x"));
        let y = text("y");
        tabs.replace(0, y.clone());
        assert_eq!(tabs.titles(), vec![Some("First".to_string())]);
        assert!(tabs.get(0).is_some_and(|v| v.ptr_eq(&y)));
        assert!(tabs.replace(3, text("z")).is_none());
    }

    #[test]
    fn test_nested_widgets_are_collected() {
        let row = Layout::with_children(
            LayoutKind::Row,
            vec![Viewable::Widget(Widget::new(WidgetKind::Checkbox, vec![])), text("t")],
        );
        let outer = Layout::with_children(LayoutKind::Column, vec![row.into()]);
        assert_eq!(Viewable::Layout(outer).widgets().len(), 2);
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!(LayoutKind::from_name("Tabs"), Some(LayoutKind::Tabs));
        assert_eq!(LayoutKind::from_name("grid"), None);
    }
}
