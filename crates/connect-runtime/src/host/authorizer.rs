//! Map-based permission authorizer.
//!
//! The base map holds the permanent settings. At the start of each execution
//! it is copied into the temporary map, which is what requests are checked
//! against. A request looks up the permission by name, then the `DEFAULT`
//! entry, and denies when neither exists.

use crate::native::NativeType;
use connect_core::permission::{canonical_name, names};
use connect_core::{
    Connector, ConnectorError, ConnectorResult, Contract, EngineConnector, MemberHooks,
    PermissionAuthorizer1, PermissionAuthorizer2, PermissionMap, PermissionScope,
    PermissionValue,
};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Name the authorizer is registered under in a type catalog.
pub const MAP_AUTHORIZER_TYPE: &str = "connect.host.MapPermissionAuthorizer";

/// Decides `ASK` permissions: receives the permission, the requester and
/// the meta information, returns whether to allow.
pub type ConfirmCallback = Arc<dyn Fn(&str, &str, Option<&str>) -> bool + Send + Sync>;

#[derive(Debug, Default)]
struct AuthorizerState {
    base: PermissionMap,
    temporary: PermissionMap,
    snapshot: Option<PermissionMap>,
    executing: bool,
}

fn canonical_map(map: PermissionMap) -> PermissionMap {
    map.into_iter()
        .map(|(name, value)| (canonical_name(&name).to_string(), value))
        .collect()
}

fn lookup(map: &PermissionMap, permission: &str) -> PermissionValue {
    map.get(permission)
        .or_else(|| map.get(names::DEFAULT))
        .copied()
        .unwrap_or(PermissionValue::Deny)
}

/// Permission authorizer backed by a base map and a temporary map.
#[derive(Default)]
pub struct MapPermissionAuthorizer {
    state: Mutex<AuthorizerState>,
    confirm: Option<ConfirmCallback>,
}

impl MapPermissionAuthorizer {
    pub fn new(base: PermissionMap) -> Self {
        let base = canonical_map(base);
        Self {
            state: Mutex::new(AuthorizerState {
                temporary: base.clone(),
                base,
                ..AuthorizerState::default()
            }),
            confirm: None,
        }
    }

    /// Resolve `ASK` through `confirm`. Without a callback `ASK` denies.
    pub fn with_confirmation<F>(mut self, confirm: F) -> Self
    where
        F: Fn(&str, &str, Option<&str>) -> bool + Send + Sync + 'static,
    {
        self.confirm = Some(Arc::new(confirm));
        self
    }

    /// Describe the authorizer for registration in a type catalog.
    pub fn native_type() -> NativeType {
        NativeType::new(MAP_AUTHORIZER_TYPE)
            .with_identity(Contract::PermissionAuthorizer2)
            .with_default_constructor::<MapPermissionAuthorizer>()
    }

    fn state(&self) -> MutexGuard<'_, AuthorizerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_engine(&self, called_by_engine: bool, operation: &str) -> ConnectorResult<()> {
        if called_by_engine {
            Ok(())
        } else {
            Err(ConnectorError::plugin(
                MAP_AUTHORIZER_TYPE,
                format!("{} may only be called by the engine", operation),
            ))
        }
    }

    fn deny(permission: &str, requester: &str, reason: &str) -> ConnectorError {
        ConnectorError::PermissionDenied {
            permission: permission.to_string(),
            requester: requester.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl MemberHooks for MapPermissionAuthorizer {
    fn initialize_for_execution(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        let mut state = self.state();
        state.temporary = state.base.clone();
        state.snapshot = None;
        state.executing = true;
        Ok(())
    }

    fn finalize_for_termination(&self, _engine: &dyn EngineConnector) -> ConnectorResult<()> {
        let mut state = self.state();
        state.temporary = state.base.clone();
        state.snapshot = None;
        state.executing = false;
        Ok(())
    }
}

impl PermissionAuthorizer1 for MapPermissionAuthorizer {
    fn set_permission_map(
        &self,
        map: PermissionMap,
        scope: PermissionScope,
    ) -> ConnectorResult<()> {
        let map = canonical_map(map);
        let mut state = self.state();
        match scope {
            PermissionScope::Base => {
                if !state.executing {
                    state.temporary = map.clone();
                }
                state.base = map;
            }
            PermissionScope::Temporary => state.temporary = map,
        }
        Ok(())
    }

    fn permission_map(&self, scope: PermissionScope) -> ConnectorResult<PermissionMap> {
        let state = self.state();
        Ok(match scope {
            PermissionScope::Base => state.base.clone(),
            PermissionScope::Temporary => state.temporary.clone(),
        })
    }

    fn request_permission(
        &self,
        permission: &str,
        requester: &str,
        meta_information: Option<&str>,
    ) -> ConnectorResult<()> {
        let permission = canonical_name(permission);
        if permission == names::NONE {
            return Ok(());
        }

        let value = lookup(&self.state().temporary, permission);
        debug!(permission, requester, value = %value, "Permission requested");

        match value {
            PermissionValue::Allow => Ok(()),
            PermissionValue::Deny => Err(Self::deny(permission, requester, "denied by the permission map")),
            PermissionValue::Ask => match &self.confirm {
                Some(confirm) if confirm(permission, requester, meta_information) => {
                    info!(permission, requester, "Permission confirmed");
                    Ok(())
                }
                Some(_) => Err(Self::deny(permission, requester, "denied on confirmation")),
                None => Err(Self::deny(permission, requester, "confirmation is not available")),
            },
        }
    }
}

impl PermissionAuthorizer2 for MapPermissionAuthorizer {
    fn set_permission_value(
        &self,
        permission: &str,
        value: PermissionValue,
        scope: PermissionScope,
        called_by_engine: bool,
    ) -> ConnectorResult<()> {
        self.check_engine(called_by_engine, "set_permission_value")?;

        let permission = canonical_name(permission).to_string();
        let mut state = self.state();
        match scope {
            PermissionScope::Base => state.base.insert(permission, value),
            PermissionScope::Temporary => state.temporary.insert(permission, value),
        };
        Ok(())
    }

    fn permission_value(
        &self,
        permission: &str,
        scope: PermissionScope,
        called_by_engine: bool,
    ) -> ConnectorResult<PermissionValue> {
        self.check_engine(called_by_engine, "permission_value")?;

        let permission = canonical_name(permission);
        let state = self.state();
        Ok(match scope {
            PermissionScope::Base => lookup(&state.base, permission),
            PermissionScope::Temporary => lookup(&state.temporary, permission),
        })
    }

    fn store_temporary_permission_values(
        &self,
        target: PermissionScope,
        called_by_engine: bool,
    ) -> ConnectorResult<()> {
        self.check_engine(called_by_engine, "store_temporary_permission_values")?;

        let mut state = self.state();
        match target {
            PermissionScope::Base => state.base = state.temporary.clone(),
            PermissionScope::Temporary => state.snapshot = Some(state.temporary.clone()),
        }
        Ok(())
    }

    fn restore_temporary_permission_values(
        &self,
        source: PermissionScope,
        called_by_engine: bool,
    ) -> ConnectorResult<()> {
        self.check_engine(called_by_engine, "restore_temporary_permission_values")?;

        let mut state = self.state();
        state.temporary = match source {
            PermissionScope::Base => state.base.clone(),
            PermissionScope::Temporary => state.snapshot.clone().ok_or_else(|| {
                ConnectorError::plugin(MAP_AUTHORIZER_TYPE, "no temporary permission values were stored")
            })?,
        };
        Ok(())
    }
}

impl Connector for MapPermissionAuthorizer {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_permission_authorizer2(&self) -> Option<&dyn PermissionAuthorizer2> {
        Some(self)
    }
}

impl fmt::Debug for MapPermissionAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapPermissionAuthorizer")
            .field("state", &*self.state())
            .field("confirm", &self.confirm.is_some())
            .finish()
    }
}
