//! Generic adapters from native members to the function and variable
//! contracts.
//!
//! Adapters always use converted data exchange. Their lifecycle hooks are
//! no-ops and their permission sets start as a copy of the sandboxed
//! defaults; policy is applied by the aggregator or the engine.

use crate::native::{Instance, MemberFault, NativeField, NativeMethod, Receiver};
use connect_core::{
    ConnectorError, ConnectorResult, DataExchangeMode, FunctionConnector, MemberHooks,
    PermissionSet, Value, ValueType, VariableConnector,
};

fn describe(types: &[ValueType]) -> String {
    types
        .iter()
        .map(ValueType::name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|value| value.value_type().name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve the receiver for a member, never touching `instance` for static
/// members.
fn resolve_receiver<'a>(
    owner: &str,
    member: &str,
    is_static: bool,
    instance: &'a Option<Instance>,
) -> ConnectorResult<Receiver<'a>> {
    if is_static {
        return Ok(None);
    }
    match instance {
        Some(instance) => Ok(Some(instance.as_ref())),
        None => Err(ConnectorError::MissingInstance {
            owner: owner.to_string(),
            member: member.to_string(),
        }),
    }
}

fn translate_fault(owner: &str, member: &str, fault: MemberFault) -> ConnectorError {
    match fault {
        MemberFault::WrongReceiver(reason) => ConnectorError::SignatureMismatch {
            owner: owner.to_string(),
            member: member.to_string(),
            reason,
        },
        MemberFault::Raised(source) => ConnectorError::Raised {
            owner: owner.to_string(),
            member: member.to_string(),
            source,
        },
    }
}

fn not_public(owner: &str, member: &str) -> ConnectorError {
    ConnectorError::AccessViolation {
        owner: owner.to_string(),
        member: member.to_string(),
        reason: "it is not public".to_string(),
    }
}

/// Exposes a native method as a function connector.
#[derive(Debug, Clone)]
pub struct MethodAdapter {
    owner: String,
    method: NativeMethod,
    instance: Option<Instance>,
    permissions: PermissionSet,
}

impl MethodAdapter {
    /// Wrap `method` of the type named `owner`.
    ///
    /// `instance` may be absent even for an instance method; the call then
    /// fails with `MissingInstance`.
    pub fn new(owner: impl Into<String>, method: NativeMethod, instance: Option<Instance>) -> Self {
        Self {
            owner: owner.into(),
            method,
            instance,
            permissions: PermissionSet::default(),
        }
    }

    pub fn with_permissions(mut self, permissions: PermissionSet) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn method(&self) -> &NativeMethod {
        &self.method
    }

    pub fn has_instance(&self) -> bool {
        self.instance.is_some()
    }

    fn mismatch(&self, arguments: &[Value]) -> ConnectorError {
        ConnectorError::SignatureMismatch {
            owner: self.owner.clone(),
            member: self.method.name().to_string(),
            reason: format!(
                "expected ({}{}), got ({})",
                describe(self.method.parameter_types()),
                if self.method.is_variadic() { "..." } else { "" },
                describe_values(arguments)
            ),
        }
    }

    /// Check the arguments against the declared parameters, packing the
    /// trailing arguments of a variadic method into one array.
    fn shape_arguments(&self, arguments: &[Value]) -> ConnectorResult<Vec<Value>> {
        let parameters = self.method.parameter_types();

        if self.method.is_variadic() {
            let (last, fixed) = parameters
                .split_last()
                .ok_or_else(|| self.mismatch(arguments))?;
            let element = match last {
                ValueType::Array(element) => element.as_ref(),
                _ => return Err(self.mismatch(arguments)),
            };
            if arguments.len() < fixed.len()
                || !fixed.iter().zip(arguments).all(|(ty, arg)| ty.accepts(arg))
            {
                return Err(self.mismatch(arguments));
            }

            let rest = &arguments[fixed.len()..];
            // An already packed array is passed through unchanged.
            if rest.len() == 1 && last.accepts(&rest[0]) {
                return Ok(arguments.to_vec());
            }
            if !rest.iter().all(|arg| element.accepts(arg)) {
                return Err(self.mismatch(arguments));
            }
            let mut shaped = arguments[..fixed.len()].to_vec();
            shaped.push(Value::Array(rest.to_vec()));
            return Ok(shaped);
        }

        if arguments.len() != parameters.len()
            || !parameters.iter().zip(arguments).all(|(ty, arg)| ty.accepts(arg))
        {
            return Err(self.mismatch(arguments));
        }
        Ok(arguments.to_vec())
    }
}

impl MemberHooks for MethodAdapter {}

impl FunctionConnector for MethodAdapter {
    fn function_name(&self) -> &str {
        self.method.name()
    }

    fn parameter_types(&self) -> Vec<ValueType> {
        self.method.parameter_types().to_vec()
    }

    fn has_variadic_parameters(&self) -> bool {
        self.method.is_variadic()
    }

    fn return_type(&self, _parameter_types: &[ValueType]) -> ValueType {
        self.method.return_type().clone()
    }

    fn data_exchange_mode(&self) -> DataExchangeMode {
        DataExchangeMode::Converted
    }

    fn permissions(&self) -> PermissionSet {
        self.permissions.clone()
    }

    fn invoke(&self, arguments: &[Value]) -> ConnectorResult<Value> {
        let name = self.method.name();
        if !self.method.is_public() {
            return Err(not_public(&self.owner, name));
        }
        let arguments = self.shape_arguments(arguments)?;
        let receiver = resolve_receiver(&self.owner, name, self.method.is_static(), &self.instance)?;

        self.method
            .call(receiver, &arguments)
            .map_err(|fault| translate_fault(&self.owner, name, fault))
    }
}

/// Exposes a native field as a variable connector.
#[derive(Debug, Clone)]
pub struct FieldAdapter {
    owner: String,
    field: NativeField,
    instance: Option<Instance>,
    permissions: PermissionSet,
}

impl FieldAdapter {
    /// Wrap `field` of the type named `owner`.
    pub fn new(owner: impl Into<String>, field: NativeField, instance: Option<Instance>) -> Self {
        Self {
            owner: owner.into(),
            field,
            instance,
            permissions: PermissionSet::default(),
        }
    }

    pub fn with_permissions(mut self, permissions: PermissionSet) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn field(&self) -> &NativeField {
        &self.field
    }
}

impl MemberHooks for FieldAdapter {}

impl VariableConnector for FieldAdapter {
    fn variable_name(&self) -> &str {
        self.field.name()
    }

    fn data_type(&self) -> ValueType {
        self.field.value_type().clone()
    }

    fn is_constant(&self) -> bool {
        self.field.is_constant()
    }

    fn data_exchange_mode(&self) -> DataExchangeMode {
        DataExchangeMode::Converted
    }

    fn permissions(&self) -> PermissionSet {
        self.permissions.clone()
    }

    fn get_data(&self) -> ConnectorResult<Value> {
        let name = self.field.name();
        if !self.field.is_public() {
            return Err(not_public(&self.owner, name));
        }
        let receiver = resolve_receiver(&self.owner, name, self.field.is_static(), &self.instance)?;

        self.field
            .get(receiver)
            .map_err(|fault| translate_fault(&self.owner, name, fault))
    }

    fn set_data(&self, value: Value) -> ConnectorResult<()> {
        let name = self.field.name();
        if !self.field.is_public() {
            return Err(not_public(&self.owner, name));
        }
        if self.field.is_constant() {
            return Err(ConnectorError::AccessViolation {
                owner: self.owner.clone(),
                member: name.to_string(),
                reason: "it is constant".to_string(),
            });
        }
        if !self.field.value_type().accepts(&value) {
            return Err(ConnectorError::SignatureMismatch {
                owner: self.owner.clone(),
                member: name.to_string(),
                reason: format!(
                    "expected {}, got {}",
                    self.field.value_type(),
                    value.value_type()
                ),
            });
        }
        let receiver = resolve_receiver(&self.owner, name, self.field.is_static(), &self.instance)?;

        match self.field.set(receiver, value) {
            Some(result) => result.map_err(|fault| translate_fault(&self.owner, name, fault)),
            None => Ok(()),
        }
    }
}
