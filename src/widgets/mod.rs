//! UI controls and the containers they are arranged in

pub mod kind;
pub mod layout;
pub mod widget;

pub use kind::{ConfigKey, WidgetKind};
pub use layout::{Layout, LayoutKind, Viewable};
pub use widget::{WeakWidget, Widget, WidgetEvent, WidgetId, WidgetProperty, WidgetUpdate, WidgetWatcherId};
