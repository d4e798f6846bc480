//! Namespace aggregation of a native type's members.
//!
//! A member is eligible when it is public and either static or backed by a
//! bound instance. Ineligible members are skipped. Adapters are built once,
//! at construction, and keep the declaration order of the type.

use crate::adapter::{FieldAdapter, MethodAdapter};
use crate::native::{Instance, NativeType};
use connect_core::{
    Connector, FunctionConnector, NamespaceConnector, PermissionSet, VariableConnector,
};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Exposes the eligible members of a native type as a namespace.
pub struct TypeNamespaceAdapter {
    type_name: String,
    namespace_name: String,
    mandatory_qualification: bool,
    permissions: PermissionSet,
    functions: Vec<Arc<dyn FunctionConnector>>,
    variables: Vec<Arc<dyn VariableConnector>>,
}

impl TypeNamespaceAdapter {
    /// Aggregate the members of `ty`, binding `instance` to its non-static
    /// members.
    pub fn new(ty: &NativeType, instance: Option<Instance>) -> Self {
        let owner = ty.name();
        let bound = instance.is_some();

        let functions: Vec<Arc<dyn FunctionConnector>> = ty
            .methods()
            .iter()
            .filter(|method| method.is_public() && (method.is_static() || bound))
            .map(|method| {
                let receiver = if method.is_static() { None } else { instance.clone() };
                Arc::new(MethodAdapter::new(owner, method.clone(), receiver))
                    as Arc<dyn FunctionConnector>
            })
            .collect();

        let variables: Vec<Arc<dyn VariableConnector>> = ty
            .fields()
            .iter()
            .filter(|field| field.is_public() && (field.is_static() || bound))
            .map(|field| {
                let receiver = if field.is_static() { None } else { instance.clone() };
                Arc::new(FieldAdapter::new(owner, field.clone(), receiver))
                    as Arc<dyn VariableConnector>
            })
            .collect();

        debug!(
            native_type = %owner,
            functions = functions.len(),
            variables = variables.len(),
            bound,
            "Aggregated native type"
        );

        Self {
            type_name: owner.to_string(),
            namespace_name: ty.simple_name().to_string(),
            mandatory_qualification: false,
            permissions: PermissionSet::default(),
            functions,
            variables,
        }
    }

    /// Override the namespace name, which defaults to the type's simple name.
    pub fn with_namespace_name(mut self, name: impl Into<String>) -> Self {
        self.namespace_name = name.into();
        self
    }

    pub fn with_mandatory_qualification(mut self, mandatory: bool) -> Self {
        self.mandatory_qualification = mandatory;
        self
    }

    pub fn with_permissions(mut self, permissions: PermissionSet) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}

impl NamespaceConnector for TypeNamespaceAdapter {
    fn namespace_name(&self) -> &str {
        &self.namespace_name
    }

    fn is_mandatory_qualification(&self) -> bool {
        self.mandatory_qualification
    }

    fn permissions(&self) -> PermissionSet {
        self.permissions.clone()
    }

    fn functions(&self) -> Vec<Arc<dyn FunctionConnector>> {
        self.functions.clone()
    }

    fn variables(&self) -> Vec<Arc<dyn VariableConnector>> {
        self.variables.clone()
    }
}

impl Connector for TypeNamespaceAdapter {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_namespace_connector(&self) -> Option<&dyn NamespaceConnector> {
        Some(self)
    }
}
