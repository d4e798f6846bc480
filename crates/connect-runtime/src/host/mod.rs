//! Engine-side collaborators: the engine connector handed to plugins and a
//! map-based permission authorizer.

mod authorizer;
mod engine;

pub use authorizer::{ConfirmCallback, MapPermissionAuthorizer, MAP_AUTHORIZER_TYPE};
pub use engine::{HostEngineConnector, OptionMap};
