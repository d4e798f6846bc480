use connect_core::permission::names;
use connect_core::{
    Connector, ConnectorError, ConnectorResult, EngineConnector, PermissionMap, PermissionScope,
    PermissionValue, Value,
};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Engine option names mapped to their values.
pub type OptionMap = BTreeMap<String, Value>;

/// Engine connector handed to plugins by the host.
///
/// Instances are immutable. The `with_*` methods return an updated copy, so
/// a plugin holding an earlier connector keeps seeing the settings it was
/// initialized with.
#[derive(Clone)]
pub struct HostEngineConnector {
    options: Arc<OptionMap>,
    permissions: Arc<PermissionMap>,
    authorizer: Option<Arc<dyn Connector>>,
    others: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl HostEngineConnector {
    /// Create a connector with no options and a permission map denying
    /// everything.
    pub fn new() -> Self {
        let mut permissions = PermissionMap::new();
        permissions.insert(names::DEFAULT.to_string(), PermissionValue::Deny);

        Self {
            options: Arc::new(OptionMap::new()),
            permissions: Arc::new(permissions),
            authorizer: None,
            others: HashMap::new(),
        }
    }

    pub fn with_options(&self, options: OptionMap) -> Self {
        Self {
            options: Arc::new(options),
            ..self.clone()
        }
    }

    pub fn with_option(&self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut options = self.options.as_ref().clone();
        options.insert(name.into(), value.into());
        self.with_options(options)
    }

    /// Replace the base permission map, reflecting it to the authorizer.
    pub fn with_permission_map(&self, permissions: PermissionMap) -> ConnectorResult<Self> {
        let updated = Self {
            permissions: Arc::new(permissions),
            ..self.clone()
        };
        updated.reflect_permissions()?;
        Ok(updated)
    }

    /// Connect a permission authorizer, reflecting the base permission map
    /// to it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidImplementation` when `authorizer` does not provide
    /// the authorizer contract, or the error raised by the authorizer when it
    /// rejects the permission map.
    pub fn with_authorizer(&self, authorizer: Arc<dyn Connector>) -> ConnectorResult<Self> {
        if authorizer.as_permission_authorizer1().is_none() {
            return Err(ConnectorError::plugin(
                "engine",
                "the connected authorizer does not provide PermissionAuthorizer1",
            ));
        }

        let updated = Self {
            authorizer: Some(authorizer),
            ..self.clone()
        };
        updated.reflect_permissions()?;
        Ok(updated)
    }

    /// Disconnect the permission authorizer.
    pub fn without_authorizer(&self) -> Self {
        Self {
            authorizer: None,
            ..self.clone()
        }
    }

    /// Offer an engine connector of another shape to plugins.
    pub fn with_other_connector<T: Any + Send + Sync>(&self, connector: T) -> Self {
        let mut updated = self.clone();
        updated
            .others
            .insert(TypeId::of::<T>(), Arc::new(connector));
        updated
    }

    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    pub fn permission_map(&self) -> &PermissionMap {
        &self.permissions
    }

    pub fn has_authorizer(&self) -> bool {
        self.authorizer.is_some()
    }

    fn reflect_permissions(&self) -> ConnectorResult<()> {
        if let Some(authorizer) = self
            .authorizer
            .as_ref()
            .and_then(|a| a.as_permission_authorizer1())
        {
            debug!(entries = self.permissions.len(), "Reflecting permission map");
            authorizer.set_permission_map(self.permissions.as_ref().clone(), PermissionScope::Base)?;
        }
        Ok(())
    }
}

impl Default for HostEngineConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConnector for HostEngineConnector {
    fn has_option_value(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    fn option_value(&self, name: &str) -> Option<Value> {
        self.options.get(name).cloned()
    }

    fn request_permission(
        &self,
        permission: &str,
        requester: &str,
        meta_information: Option<&str>,
    ) -> ConnectorResult<()> {
        let authorizer = self
            .authorizer
            .as_ref()
            .and_then(|a| a.as_permission_authorizer1())
            .ok_or_else(|| ConnectorError::NoAuthorizer {
                permission: permission.to_string(),
                requester: requester.to_string(),
            })?;

        authorizer.request_permission(permission, requester, meta_information)
    }

    fn other_engine_connector(&self, shape: TypeId) -> Option<&dyn Any> {
        self.others
            .get(&shape)
            .map(|connector| connector.as_ref() as &dyn Any)
    }
}

impl fmt::Debug for HostEngineConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostEngineConnector")
            .field("options", &self.options)
            .field("permissions", &self.permissions)
            .field("authorizer", &self.authorizer.is_some())
            .field("others", &self.others.len())
            .finish()
    }
}
