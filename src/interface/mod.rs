//! Parameter panels: controls synthesized from parameter metadata and kept
//! in sync with the object in both directions

pub mod builder;
pub mod config;
pub mod link;
pub mod panel;
pub mod resolver;

pub use builder::{build_control, BuiltControl};
pub use config::{ExpandLayout, ParamConfig, WidgetOverride};
pub use link::{LinkContext, LinkSet, UpdateGuard};
pub use panel::{ordered_params, PanelStatus, ParamPanel, WeakParamPanel};
pub use resolver::{register_widget_mapping, resolve, resolve_with, WidgetMapping};
