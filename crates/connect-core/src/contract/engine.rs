use crate::error::ConnectorResult;
use crate::value::Value;
use std::any::{Any, TypeId};

/// Engine-side capability handle passed to plugins at lifecycle points.
///
/// The engine owns the implementation. Plugins only ever borrow it.
pub trait EngineConnector: Send + Sync {
    /// Check whether the engine has a value for the option.
    fn has_option_value(&self, name: &str) -> bool;

    /// Get the value of an engine option.
    fn option_value(&self, name: &str) -> Option<Value>;

    /// Request a permission on behalf of `requester`.
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError::PermissionDenied` when the permission is
    /// denied, or `ConnectorError::NoAuthorizer` when the engine has no
    /// authorizer to arbitrate the request.
    fn request_permission(
        &self,
        permission: &str,
        requester: &str,
        meta_information: Option<&str>,
    ) -> ConnectorResult<()>;

    /// Check whether an engine connector of another shape is available.
    fn is_other_engine_connector_available(&self, shape: TypeId) -> bool {
        self.other_engine_connector(shape).is_some()
    }

    /// Get an engine connector of another shape, identified by its type.
    fn other_engine_connector(&self, _shape: TypeId) -> Option<&dyn Any> {
        None
    }
}

/// Get an engine connector of the concrete type `T`, if the engine offers one.
pub fn other_engine_connector<T: Any>(engine: &dyn EngineConnector) -> Option<&T> {
    engine
        .other_engine_connector(TypeId::of::<T>())
        .and_then(|connector| connector.downcast_ref::<T>())
}
