//! Capability contracts.
//!
//! Each contract is a trait. A plugin implements the traits of the contracts
//! it supports and exposes them through the views on [`Connector`].

mod authorizer;
mod connector;
mod engine;
mod function;
mod namespace;
mod process;
mod variable;

pub use authorizer::{PermissionAuthorizer1, PermissionAuthorizer2, PermissionMap, PermissionScope};
pub use connector::Connector;
pub use engine::{other_engine_connector, EngineConnector};
pub use function::FunctionConnector;
pub use namespace::NamespaceConnector;
pub use process::{ProcessConnector1, ProcessConnector2, ProcessConnector3};
pub use variable::VariableConnector;

use crate::error::ConnectorResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calling convention of a function or variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataExchangeMode {
    /// Host-native typed values cross the boundary.
    #[default]
    Converted,
    /// The engine passes shared data containers; slot 0 carries the return
    /// value of a function.
    SharedContainer,
}

impl DataExchangeMode {
    pub fn is_converted(&self) -> bool {
        matches!(self, DataExchangeMode::Converted)
    }
}

impl fmt::Display for DataExchangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataExchangeMode::Converted => f.write_str("converted"),
            DataExchangeMode::SharedContainer => f.write_str("shared-container"),
        }
    }
}

/// Lifecycle hooks of a single connected member.
///
/// Every hook receives the engine connector of the current engine. The
/// default implementations do nothing.
pub trait MemberHooks: Send + Sync {
    fn initialize_for_connection(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        Ok(())
    }

    fn finalize_for_disconnection(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        Ok(())
    }

    fn initialize_for_execution(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        Ok(())
    }

    fn finalize_for_termination(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        Ok(())
    }
}
