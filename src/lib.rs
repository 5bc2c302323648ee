//! parambind - bidirectional binding between parameter objects and widget trees
//!
//! A [`Parameterized`] object declares typed parameters with metadata
//! (bounds, options, precedence, labels). A [`ParamPanel`] synthesizes one
//! control per parameter and keeps the two sides in sync: edits on a control
//! are written to the parameter, and parameter changes (values and metadata)
//! are mirrored on the control. [`ReactivePane`] re-renders a callable
//! whenever the parameters it depends on change.
//!
//! Rendering with egui is available behind the `egui` feature.

pub mod constants;
pub mod error;
pub mod interface;
pub mod param;
pub mod reactive;
pub mod widgets;

#[cfg(feature = "egui")]
pub mod render;

pub use error::{ParamError, Result};
pub use interface::{ExpandLayout, ParamConfig, ParamPanel, PanelStatus, WidgetOverride};
pub use param::{Dependency, Depends, Parameter, Parameterized, Value, What};
pub use reactive::{Output, ReactivePane};
pub use widgets::{Layout, LayoutKind, Viewable, Widget, WidgetKind};
