use super::{
    FunctionConnector, NamespaceConnector, PermissionAuthorizer1, PermissionAuthorizer2,
    ProcessConnector1, ProcessConnector2, ProcessConnector3, VariableConnector,
};
use std::any::Any;

/// A loaded plugin instance.
///
/// Contract support is discovered at runtime through the `as_*` views. A
/// view returning `None` means the plugin does not satisfy that contract.
///
/// The legacy process views chain downwards: the default
/// [`as_process_connector2`](Connector::as_process_connector2) upcasts the
/// generation 3 view, and the default generation 1 view upcasts generation
/// 2. The authorizer views chain the same way.
pub trait Connector: Any + Send + Sync {
    /// Get the instance as `Any` for downcasting to its concrete type.
    fn as_any(&self) -> &dyn Any;

    fn as_function_connector(&self) -> Option<&dyn FunctionConnector> {
        None
    }

    fn as_variable_connector(&self) -> Option<&dyn VariableConnector> {
        None
    }

    /// View used by both the namespace and the library contract.
    fn as_namespace_connector(&self) -> Option<&dyn NamespaceConnector> {
        None
    }

    fn as_process_connector1(&self) -> Option<&dyn ProcessConnector1> {
        self.as_process_connector2()
            .map(|p| p as &dyn ProcessConnector1)
    }

    fn as_process_connector2(&self) -> Option<&dyn ProcessConnector2> {
        self.as_process_connector3()
            .map(|p| p as &dyn ProcessConnector2)
    }

    fn as_process_connector3(&self) -> Option<&dyn ProcessConnector3> {
        None
    }

    fn as_permission_authorizer1(&self) -> Option<&dyn PermissionAuthorizer1> {
        self.as_permission_authorizer2()
            .map(|p| p as &dyn PermissionAuthorizer1)
    }

    fn as_permission_authorizer2(&self) -> Option<&dyn PermissionAuthorizer2> {
        None
    }
}
