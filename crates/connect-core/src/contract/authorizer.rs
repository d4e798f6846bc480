use super::MemberHooks;
use crate::error::ConnectorResult;
use crate::permission::PermissionValue;
use std::collections::BTreeMap;

/// Permission names mapped to their values.
pub type PermissionMap = BTreeMap<String, PermissionValue>;

/// Which permission map an authorizer call addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionScope {
    /// The permanent settings.
    Base,
    /// The settings of the current execution.
    Temporary,
}

/// Permission authorizer contract, generation 1 (`PACI1`).
pub trait PermissionAuthorizer1: MemberHooks {
    fn set_permission_map(&self, map: PermissionMap, scope: PermissionScope)
        -> ConnectorResult<()>;

    fn permission_map(&self, scope: PermissionScope) -> ConnectorResult<PermissionMap>;

    /// Arbitrate a permission request.
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError::PermissionDenied` when the request is denied.
    fn request_permission(
        &self,
        permission: &str,
        requester: &str,
        meta_information: Option<&str>,
    ) -> ConnectorResult<()>;
}

/// Permission authorizer contract, generation 2 (`PACI2`).
///
/// Adds single-value access and a snapshot of the temporary settings.
/// `called_by_engine` is `false` when a plugin reaches the authorizer through
/// the engine connector; implementations may refuse such calls.
pub trait PermissionAuthorizer2: PermissionAuthorizer1 {
    fn set_permission_value(
        &self,
        permission: &str,
        value: PermissionValue,
        scope: PermissionScope,
        called_by_engine: bool,
    ) -> ConnectorResult<()>;

    fn permission_value(
        &self,
        permission: &str,
        scope: PermissionScope,
        called_by_engine: bool,
    ) -> ConnectorResult<PermissionValue>;

    /// Store the temporary settings.
    ///
    /// With [`PermissionScope::Base`] they overwrite the base settings,
    /// otherwise they are kept as a snapshot for
    /// [`restore_temporary_permission_values`](Self::restore_temporary_permission_values).
    fn store_temporary_permission_values(
        &self,
        target: PermissionScope,
        called_by_engine: bool,
    ) -> ConnectorResult<()>;

    /// Restore the temporary settings from the base settings or the snapshot.
    fn restore_temporary_permission_values(
        &self,
        source: PermissionScope,
        called_by_engine: bool,
    ) -> ConnectorResult<()>;
}
