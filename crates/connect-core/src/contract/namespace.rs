use super::{EngineConnector, FunctionConnector, VariableConnector};
use crate::error::ConnectorResult;
use crate::permission::PermissionSet;
use std::sync::Arc;

/// Namespace and library connector contract (`XNCI1`, `XLCI1`).
///
/// A namespace groups functions and variables under one name and owns a
/// lifecycle of its own. At each transition the engine runs the `pre_` hook
/// of every namespace, then the hooks of the members, then the `post_`
/// hooks. All hooks default to no-ops.
pub trait NamespaceConnector: Send + Sync {
    fn namespace_name(&self) -> &str;

    /// Check whether members may only be referenced as `namespace.member`.
    fn is_mandatory_qualification(&self) -> bool {
        false
    }

    fn permissions(&self) -> PermissionSet {
        PermissionSet::default()
    }

    /// Get the functions, in discovery order.
    fn functions(&self) -> Vec<Arc<dyn FunctionConnector>>;

    /// Get the variables, in discovery order.
    fn variables(&self) -> Vec<Arc<dyn VariableConnector>>;

    fn pre_initialize_for_connection(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        Ok(())
    }

    fn post_initialize_for_connection(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        Ok(())
    }

    fn pre_finalize_for_disconnection(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        Ok(())
    }

    fn post_finalize_for_disconnection(
        &self,
        _engine: &dyn EngineConnector,
    ) -> ConnectorResult<()> {
        Ok(())
    }

    fn pre_initialize_for_execution(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        Ok(())
    }

    fn post_initialize_for_execution(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        Ok(())
    }

    fn pre_finalize_for_termination(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        Ok(())
    }

    fn post_finalize_for_termination(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        Ok(())
    }
}
