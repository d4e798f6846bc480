use super::contracts;
use connect_core::{
    Connector, Contract, FatalError, FunctionConnector, NamespaceConnector, PermissionAuthorizer1,
    PermissionAuthorizer2, PluginIdentity, ProcessConnector1, ProcessConnector2,
    ProcessConnector3, VariableConnector,
};
use std::fmt;
use std::sync::Arc;

/// A loaded plugin together with its resolved identity.
///
/// Containers are only built by the loader, after the implementation was
/// checked against the contract. Cloning is cheap; clones share the
/// implementation.
#[derive(Clone)]
pub struct ConnectorContainer {
    name: String,
    implementation: Arc<dyn Connector>,
    identity: PluginIdentity,
    contract: Contract,
}

impl ConnectorContainer {
    pub(crate) fn new(
        name: impl Into<String>,
        implementation: Arc<dyn Connector>,
        identity: PluginIdentity,
        contract: Contract,
    ) -> Self {
        Self {
            name: name.into(),
            implementation,
            identity,
            contract,
        }
    }

    /// Get the name the plugin was loaded by.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn implementation(&self) -> &Arc<dyn Connector> {
        &self.implementation
    }

    pub fn identity(&self) -> &PluginIdentity {
        &self.identity
    }

    pub fn type_id(&self) -> &str {
        self.identity.type_id()
    }

    pub fn generation(&self) -> &str {
        self.identity.generation()
    }

    pub fn contract(&self) -> Contract {
        self.contract
    }

    /// Check that the implementation still provides what the identity claims.
    pub fn verify(&self) -> Result<(), FatalError> {
        if contracts::satisfies(self.contract, self.implementation.as_ref()) {
            Ok(())
        } else {
            Err(self.mismatch(self.contract.required_capability()))
        }
    }

    fn mismatch(&self, required: &'static str) -> FatalError {
        FatalError::IdentityMismatch {
            name: self.name.clone(),
            identity: self.identity.clone(),
            required,
        }
    }

    fn view<'a, T: ?Sized>(
        &'a self,
        required: &'static str,
        view: Option<&'a T>,
    ) -> Result<&'a T, FatalError> {
        view.ok_or_else(|| self.mismatch(required))
    }

    pub fn function_connector(&self) -> Result<&dyn FunctionConnector, FatalError> {
        self.view("FunctionConnector", self.implementation.as_function_connector())
    }

    pub fn variable_connector(&self) -> Result<&dyn VariableConnector, FatalError> {
        self.view("VariableConnector", self.implementation.as_variable_connector())
    }

    pub fn namespace_connector(&self) -> Result<&dyn NamespaceConnector, FatalError> {
        self.view("NamespaceConnector", self.implementation.as_namespace_connector())
    }

    pub fn process_connector1(&self) -> Result<&dyn ProcessConnector1, FatalError> {
        self.view("ProcessConnector1", self.implementation.as_process_connector1())
    }

    pub fn process_connector2(&self) -> Result<&dyn ProcessConnector2, FatalError> {
        self.view("ProcessConnector2", self.implementation.as_process_connector2())
    }

    pub fn process_connector3(&self) -> Result<&dyn ProcessConnector3, FatalError> {
        self.view("ProcessConnector3", self.implementation.as_process_connector3())
    }

    pub fn permission_authorizer1(&self) -> Result<&dyn PermissionAuthorizer1, FatalError> {
        self.view(
            "PermissionAuthorizer1",
            self.implementation.as_permission_authorizer1(),
        )
    }

    pub fn permission_authorizer2(&self) -> Result<&dyn PermissionAuthorizer2, FatalError> {
        self.view(
            "PermissionAuthorizer2",
            self.implementation.as_permission_authorizer2(),
        )
    }
}

impl fmt::Debug for ConnectorContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorContainer")
            .field("name", &self.name)
            .field("identity", &self.identity)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}
