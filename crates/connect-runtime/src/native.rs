//! Introspection metadata for host-native types.
//!
//! A [`NativeType`] describes everything the loader and the aggregator need
//! to know about a host type: its name, how to construct it, the string
//! constants it declares and its callable and storage members. Members carry
//! their signature as [`ValueType`]s together with an opaque handle that
//! performs the actual call, read or write.

use connect_core::identity::{
    INTERFACE_GENERATION_FIELD, INTERFACE_TYPE_FIELD, LEGACY_INTERFACE_TYPE_FIELD,
};
use connect_core::{Connector, ConnectorError, ConnectorResult, Contract, NativeFault, Value, ValueType};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// An instance bound to non-static members.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// The receiver handed to a member handle; `None` for static members.
pub type Receiver<'a> = Option<&'a (dyn Any + Send + Sync)>;

type Constructor = Arc<dyn Fn() -> Result<Arc<dyn Connector>, NativeFault> + Send + Sync>;
type MethodHandle = Arc<dyn Fn(Receiver<'_>, &[Value]) -> Result<Value, MemberFault> + Send + Sync>;
type GetterHandle = Arc<dyn Fn(Receiver<'_>) -> Result<Value, MemberFault> + Send + Sync>;
type SetterHandle = Arc<dyn Fn(Receiver<'_>, Value) -> Result<(), MemberFault> + Send + Sync>;

fn getter_handle<G>(getter: G) -> GetterHandle
where
    G: Fn(Receiver<'_>) -> Result<Value, MemberFault> + Send + Sync + 'static,
{
    Arc::new(getter)
}

/// Failure reported by a member handle.
#[derive(Debug)]
pub enum MemberFault {
    /// The receiver or the arguments do not fit the member.
    WrongReceiver(String),
    /// The native code raised an error.
    Raised(NativeFault),
}

impl MemberFault {
    pub fn raised(fault: impl Into<NativeFault>) -> Self {
        MemberFault::Raised(fault.into())
    }
}

/// Downcast a receiver to the concrete instance type of a member.
pub fn downcast_receiver<T: Any>(receiver: Receiver<'_>) -> Result<&T, MemberFault> {
    receiver
        .and_then(|instance| instance.downcast_ref::<T>())
        .ok_or_else(|| {
            MemberFault::WrongReceiver(format!(
                "receiver is not an instance of {}",
                std::any::type_name::<T>()
            ))
        })
}

/// Visibility of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// A callable member.
#[derive(Clone)]
pub struct NativeMethod {
    name: String,
    visibility: Visibility,
    is_static: bool,
    parameter_types: Vec<ValueType>,
    return_type: ValueType,
    variadic: bool,
    handle: MethodHandle,
}

impl NativeMethod {
    fn new<F>(name: &str, is_static: bool, parameters: Vec<ValueType>, ret: ValueType, f: F) -> Self
    where
        F: Fn(Receiver<'_>, &[Value]) -> Result<Value, MemberFault> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            visibility: Visibility::Public,
            is_static,
            parameter_types: parameters,
            return_type: ret,
            variadic: false,
            handle: Arc::new(f),
        }
    }

    /// Create a public static method. The handle receives no receiver.
    pub fn static_method<F>(name: &str, parameters: Vec<ValueType>, ret: ValueType, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, MemberFault> + Send + Sync + 'static,
    {
        Self::new(name, true, parameters, ret, move |_, args| f(args))
    }

    /// Create a public instance method.
    pub fn instance_method<F>(name: &str, parameters: Vec<ValueType>, ret: ValueType, f: F) -> Self
    where
        F: Fn(Receiver<'_>, &[Value]) -> Result<Value, MemberFault> + Send + Sync + 'static,
    {
        Self::new(name, false, parameters, ret, f)
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Mark the last parameter as variadic. It must be declared as an array.
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn parameter_types(&self) -> &[ValueType] {
        &self.parameter_types
    }

    pub fn return_type(&self) -> &ValueType {
        &self.return_type
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Call the handle directly. No visibility or shape checks happen here.
    pub fn call(&self, receiver: Receiver<'_>, arguments: &[Value]) -> Result<Value, MemberFault> {
        (self.handle)(receiver, arguments)
    }
}

impl fmt::Debug for NativeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeMethod")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("parameter_types", &self.parameter_types)
            .field("return_type", &self.return_type)
            .field("variadic", &self.variadic)
            .finish_non_exhaustive()
    }
}

/// A storage member.
///
/// A field without a setter is a constant.
#[derive(Clone)]
pub struct NativeField {
    name: String,
    visibility: Visibility,
    is_static: bool,
    value_type: ValueType,
    getter: GetterHandle,
    setter: Option<SetterHandle>,
}

impl NativeField {
    /// Create a public static field, constant until a setter is attached.
    pub fn static_field<G>(name: &str, value_type: ValueType, getter: G) -> Self
    where
        G: Fn() -> Result<Value, MemberFault> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            visibility: Visibility::Public,
            is_static: true,
            value_type,
            getter: getter_handle(move |_| getter()),
            setter: None,
        }
    }

    /// Create a public instance field, constant until a setter is attached.
    pub fn instance_field<G>(name: &str, value_type: ValueType, getter: G) -> Self
    where
        G: Fn(Receiver<'_>) -> Result<Value, MemberFault> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            visibility: Visibility::Public,
            is_static: false,
            value_type,
            getter: Arc::new(getter),
            setter: None,
        }
    }

    pub fn with_setter<S>(mut self, setter: S) -> Self
    where
        S: Fn(Receiver<'_>, Value) -> Result<(), MemberFault> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_constant(&self) -> bool {
        self.setter.is_none()
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn get(&self, receiver: Receiver<'_>) -> Result<Value, MemberFault> {
        (self.getter)(receiver)
    }

    /// Write through the setter. Returns `None` for constants.
    pub fn set(&self, receiver: Receiver<'_>, value: Value) -> Option<Result<(), MemberFault>> {
        self.setter.as_ref().map(|setter| setter(receiver, value))
    }
}

impl fmt::Debug for NativeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeField")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("value_type", &self.value_type)
            .field("constant", &self.is_constant())
            .finish_non_exhaustive()
    }
}

/// Description of a host-native type.
#[derive(Clone)]
pub struct NativeType {
    name: String,
    constructor: Option<Constructor>,
    constants: BTreeMap<String, String>,
    methods: Vec<NativeMethod>,
    fields: Vec<NativeField>,
}

impl NativeType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: None,
            constants: BTreeMap::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Set the zero-argument constructor.
    pub fn with_constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Connector>, NativeFault> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    /// Use `T::default()` as the constructor.
    pub fn with_default_constructor<T>(self) -> Self
    where
        T: Connector + Default,
    {
        self.with_constructor(|| Ok(Arc::new(T::default()) as Arc<dyn Connector>))
    }

    /// Declare a public static string constant.
    pub fn with_constant(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }

    /// Declare the contract identity constants.
    pub fn with_identity(self, contract: Contract) -> Self {
        self.with_constant(INTERFACE_TYPE_FIELD, contract.type_id())
            .with_constant(INTERFACE_GENERATION_FIELD, contract.generation())
    }

    pub fn with_method(mut self, method: NativeMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_field(mut self, field: NativeField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the last segment of the dotted name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn constant(&self, name: &str) -> Option<&str> {
        self.constants.get(name).map(String::as_str)
    }

    /// Get the declared contract type ID, accepting the legacy field name.
    pub fn declared_type_id(&self) -> Option<&str> {
        self.constant(INTERFACE_TYPE_FIELD)
            .or_else(|| self.constant(LEGACY_INTERFACE_TYPE_FIELD))
    }

    pub fn declared_generation(&self) -> Option<&str> {
        self.constant(INTERFACE_GENERATION_FIELD)
    }

    /// Get the methods in declaration order.
    pub fn methods(&self) -> &[NativeMethod] {
        &self.methods
    }

    /// Get the fields in declaration order.
    pub fn fields(&self) -> &[NativeField] {
        &self.fields
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Construct an instance with the zero-argument constructor.
    pub fn instantiate(&self) -> ConnectorResult<Arc<dyn Connector>> {
        let constructor = self
            .constructor
            .as_ref()
            .ok_or_else(|| ConnectorError::NoConstructor {
                name: self.name.clone(),
            })?;

        constructor().map_err(|source| ConnectorError::InstantiationFailed {
            name: self.name.clone(),
            source,
        })
    }
}

impl fmt::Debug for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeType")
            .field("name", &self.name)
            .field("constructor", &self.constructor.is_some())
            .field("constants", &self.constants)
            .field("methods", &self.methods)
            .field("fields", &self.fields)
            .finish()
    }
}
