//! Reactive re-rendering of callables and cross-widget links

pub mod links;
mod method;
mod pane;

pub use links::{is_linked, link_widgets, links_for, unlink, unlink_widget, Link};
pub use method::{ReactivePane, ReactiveStats};
pub use pane::{Output, Pane, PaneKind};
