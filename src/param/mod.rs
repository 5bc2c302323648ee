//! Parameter object model - declared parameters, values and change watchers

pub mod depends;
pub mod json_init;
pub mod kind;
pub mod parameter;
pub mod parameterized;
pub mod value;

pub use depends::{Args, Dependency, Depends};
pub use json_init::JsonInit;
pub use kind::ParamKind;
pub use parameter::{Bounds, HasBounds, HasOptions, Parameter};
pub use parameterized::{Event, ObjectId, Parameterized, WatcherId, WeakParameterized, What};
pub use value::{Action, Value};
