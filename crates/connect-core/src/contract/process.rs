//! Legacy general process contracts (`GPCI1` to `GPCI3`).
//!
//! Every argument and every return value is a flat list of strings. Each
//! generation is a supertrait-extension of the previous one.

use super::MemberHooks;
use crate::error::ConnectorResult;
use crate::permission::PermissionSet;

/// Generation 1: string-only function calls.
pub trait ProcessConnector1: Send + Sync {
    /// Check whether the plugin handles `function_name`.
    fn is_processable(&self, function_name: &str) -> bool;

    fn process(&self, function_name: &str, arguments: &[String]) -> ConnectorResult<Vec<String>>;
}

/// Generation 2: adds per-execution init and dispose.
pub trait ProcessConnector2: ProcessConnector1 {
    fn init(&self) -> ConnectorResult<()> {
        Ok(())
    }

    fn dispose(&self) -> ConnectorResult<()> {
        Ok(())
    }
}

/// Generation 3: adds permission queries and the engine connector handshake
/// through [`MemberHooks`].
pub trait ProcessConnector3: ProcessConnector2 + MemberHooks {
    fn necessary_permission_names(&self, _function_name: &str) -> Vec<String> {
        PermissionSet::default().necessary().to_vec()
    }

    fn unnecessary_permission_names(&self, _function_name: &str) -> Vec<String> {
        PermissionSet::default().unnecessary().to_vec()
    }
}
