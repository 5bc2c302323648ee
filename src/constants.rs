//! Crate-wide constants and default values
//!
//! Centralized location for hard-coded values shared by the panel, builder
//! and reactive modules

/// Precedence used for parameters that declare none. Zero stays available
/// for forcing parameters to the top of the list.
pub const DEFAULT_PRECEDENCE: f64 = 1e-8;

/// Parameters with precedence below this value are hidden by default
pub const DEFAULT_DISPLAY_THRESHOLD: f64 = 0.0;

/// Name of the synthesized label entry showing the object's name
pub const NAME_ENTRY: &str = "name";

/// Panel sizing constants
pub mod panel {
    /// Default width of the widget box
    pub const DEFAULT_WIDTH: u32 = 300;

    /// Width reserved for the expand toggle beside a primary control
    pub const TOGGLE_RESERVED_WIDTH: u32 = 60;
}

/// Expand toggle appearance
pub mod toggle {
    /// Glyph shown on the expand/collapse toggle
    pub const GLYPH: &str = "\u{22EE}";

    /// Maximum toggle width
    pub const MAX_WIDTH: u32 = 20;

    /// Maximum toggle height
    pub const MAX_HEIGHT: u32 = 30;

    /// Margin applied to a primary control paired with a toggle (top, right, bottom, left)
    pub const CONTROL_MARGIN: [u32; 4] = [5, 0, 5, 10];

    /// Margin applied to the toggle itself
    pub const TOGGLE_MARGIN: [u32; 4] = [0, 0, 0, 10];
}

/// JSON initializer defaults
pub mod json_init {
    /// Environment variable consulted for JSON parameter settings
    pub const DEFAULT_VARNAME: &str = "PARAM_JSON_INIT";
}
