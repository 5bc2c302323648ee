//! Error types shared across the crate

use thiserror::Error;

/// Errors raised by the parameter model and the panel machinery
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    /// The object has no parameter with this name
    #[error("{object} has no parameter named '{name}'")]
    UnknownParameter { object: String, name: String },

    /// Attempted to write a constant parameter
    #[error("constant parameter '{name}' cannot be modified")]
    ConstantParameter { name: String },

    /// The value does not match the parameter's declared kind
    #[error("parameter '{name}' of kind {kind} does not accept {found}")]
    TypeMismatch {
        name: String,
        kind: String,
        found: String,
    },

    /// Numeric value outside the hard bounds
    #[error("parameter '{name}' value {value} is outside bounds {bounds}")]
    OutOfBounds {
        name: String,
        value: f64,
        bounds: String,
    },

    /// Selector value not among the declared options
    #[error("parameter '{name}' does not allow {value}; not one of the declared objects")]
    InvalidOption { name: String, value: String },

    /// Expand layout is neither a container instance nor a container type
    #[error("expand_layout expected a layout type or instance, found '{found}'")]
    InvalidExpandLayout { found: String },

    /// JSON data (initial values or panel configuration) could not be read or parsed
    #[error("invalid JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ParamError {
    fn from(err: serde_json::Error) -> Self {
        ParamError::Json(err.to_string())
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, ParamError>;
