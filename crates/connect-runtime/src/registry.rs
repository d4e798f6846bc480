//! Registry of connected plugins.
//!
//! The registry attaches loaded containers, indexes the functions and
//! variables they provide, drives their lifecycle and routes calls to them.
//! Plugins whose lifecycle hook failed are marked failed and skipped by all
//! later lookups and transitions.

use crate::aggregator::TypeNamespaceAdapter;
use crate::dispatch::strategy_for;
use crate::host::{HostEngineConnector, OptionMap};
use crate::lifecycle::{fatal, run_hooks, LifecycleState, Transition};
use crate::loader::ConnectorContainer;
use crate::native::{Instance, NativeType};
use connect_core::{
    effective_required, Connector, ConnectorError, ConnectorResult, Contract, EngineConnector,
    FunctionConnector, PermissionMap, PermissionSet, Requirement, Value, ValueType,
    VariableConnector,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

enum FunctionSource {
    Container(usize),
    Member(Arc<dyn FunctionConnector>),
}

enum VariableSource {
    Container(usize),
    Member(Arc<dyn VariableConnector>),
}

/// Where a function or variable is reachable from.
struct Scope {
    owner: String,
    namespace: Option<String>,
    mandatory_qualification: bool,
    namespace_permissions: Option<PermissionSet>,
}

impl Scope {
    fn top_level(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            namespace: None,
            mandatory_qualification: false,
            namespace_permissions: None,
        }
    }

    /// Check whether `name` (possibly `namespace.member`) refers to `member`
    /// in this scope.
    fn matches(&self, name: &str, member: &str) -> bool {
        match name.rsplit_once('.') {
            Some((namespace, short)) => {
                self.namespace.as_deref() == Some(namespace) && short == member
            }
            None => !self.mandatory_qualification && name == member,
        }
    }
}

struct FunctionEntry {
    scope: Scope,
    source: FunctionSource,
}

struct VariableEntry {
    scope: Scope,
    source: VariableSource,
}

/// Check whether a value of type `actual` may be passed where `expected` is
/// declared. Element types of empty or mixed arrays are unknown and match.
fn compatible(expected: &ValueType, actual: &ValueType) -> bool {
    match (expected, actual) {
        (ValueType::Any, _) | (_, ValueType::Any) => true,
        (ValueType::Array(expected), ValueType::Array(actual)) => compatible(expected, actual),
        (expected, actual) => expected == actual,
    }
}

fn element_type(ty: &ValueType) -> &ValueType {
    match ty {
        ValueType::Array(element) => element_type(element),
        other => other,
    }
}

fn parameter_matches(
    expected: &ValueType,
    actual: &ValueType,
    type_arbitrary: bool,
    rank_arbitrary: bool,
) -> bool {
    match (type_arbitrary, rank_arbitrary) {
        (true, true) => true,
        (true, false) => expected.rank() == actual.rank(),
        (false, true) => compatible(element_type(expected), element_type(actual)),
        (false, false) => compatible(expected, actual),
    }
}

/// Check whether `function` accepts arguments of `argument_types`.
fn accepts(function: &dyn FunctionConnector, argument_types: &[ValueType]) -> bool {
    if function.is_parameter_count_arbitrary() {
        return true;
    }

    let parameters = function.parameter_types();
    let type_arbitrary = function.parameter_data_type_arbitrarinesses();
    let rank_arbitrary = function.parameter_array_rank_arbitrarinesses();
    let flag = |flags: &[bool], index: usize| flags.get(index).copied().unwrap_or(false);
    let matches = |index: usize, expected: &ValueType, actual: &ValueType| {
        parameter_matches(
            expected,
            actual,
            flag(&type_arbitrary, index),
            flag(&rank_arbitrary, index),
        )
    };

    if function.has_variadic_parameters() {
        let Some((last, fixed)) = parameters.split_last() else {
            return false;
        };
        if argument_types.len() < fixed.len() {
            return false;
        }
        let (head, rest) = argument_types.split_at(fixed.len());
        if !fixed
            .iter()
            .zip(head)
            .enumerate()
            .all(|(i, (expected, actual))| matches(i, expected, actual))
        {
            return false;
        }

        let index = fixed.len();
        let packed = rest.len() == 1 && matches(index, last, &rest[0]);
        let element = match last {
            ValueType::Array(element) => element.as_ref(),
            other => other,
        };
        return packed || rest.iter().all(|actual| matches(index, element, actual));
    }

    parameters.len() == argument_types.len()
        && parameters
            .iter()
            .zip(argument_types)
            .enumerate()
            .all(|(i, (expected, actual))| matches(i, expected, actual))
}

/// Registry of connected plugins.
pub struct PluginRegistry {
    containers: Vec<ConnectorContainer>,
    functions: Vec<FunctionEntry>,
    variables: Vec<VariableEntry>,
    processes: Vec<usize>,
    failed: HashSet<String>,
    engine: HostEngineConnector,
    state: LifecycleState,
}

impl PluginRegistry {
    /// Create an empty registry with a default engine connector.
    pub fn new() -> Self {
        Self::with_engine(HostEngineConnector::new())
    }

    /// Create an empty registry handing `engine` to its plugins.
    pub fn with_engine(engine: HostEngineConnector) -> Self {
        Self {
            containers: Vec::new(),
            functions: Vec::new(),
            variables: Vec::new(),
            processes: Vec::new(),
            failed: HashSet::new(),
            engine,
            state: LifecycleState::Unconnected,
        }
    }

    fn require_unconnected(&self, operation: &'static str) -> ConnectorResult<()> {
        if self.state == LifecycleState::Unconnected {
            Ok(())
        } else {
            Err(ConnectorError::InvalidTransition {
                transition: operation,
                state: self.state.name(),
            })
        }
    }

    fn require_executing(&self, operation: &'static str) -> ConnectorResult<()> {
        if self.state == LifecycleState::Executing {
            Ok(())
        } else {
            Err(ConnectorError::InvalidTransition {
                transition: operation,
                state: self.state.name(),
            })
        }
    }

    /// Attach a loaded plugin.
    ///
    /// # Errors
    ///
    /// Fails when plugins are already connected, when a plugin of the same
    /// name is attached, or when a second permission authorizer is attached.
    pub fn attach(&mut self, container: ConnectorContainer) -> ConnectorResult<()> {
        self.attach_as(container, None)
    }

    /// Attach a loaded plugin. Namespace plugins are reachable under `alias`
    /// instead of their own namespace name.
    pub fn attach_as(
        &mut self,
        container: ConnectorContainer,
        alias: Option<&str>,
    ) -> ConnectorResult<()> {
        self.require_unconnected("attach")?;

        if self.containers.iter().any(|c| c.name() == container.name()) {
            return Err(ConnectorError::plugin(
                container.name(),
                "a plugin of the same name is already attached",
            ));
        }

        let index = self.containers.len();
        let name = container.name().to_string();

        match container.contract() {
            Contract::Function1 => {
                fatal(container.function_connector());
                self.functions.push(FunctionEntry {
                    scope: Scope::top_level(&name),
                    source: FunctionSource::Container(index),
                });
            }
            Contract::Variable1 => {
                fatal(container.variable_connector());
                self.variables.push(VariableEntry {
                    scope: Scope::top_level(&name),
                    source: VariableSource::Container(index),
                });
            }
            Contract::Namespace1 | Contract::Library1 => {
                let namespace = fatal(container.namespace_connector());
                let namespace_name = alias.unwrap_or(namespace.namespace_name()).to_string();
                let scope = || Scope {
                    owner: name.clone(),
                    namespace: Some(namespace_name.clone()),
                    mandatory_qualification: namespace.is_mandatory_qualification(),
                    namespace_permissions: Some(namespace.permissions()),
                };

                for function in namespace.functions() {
                    self.functions.push(FunctionEntry {
                        scope: scope(),
                        source: FunctionSource::Member(function),
                    });
                }
                for variable in namespace.variables() {
                    self.variables.push(VariableEntry {
                        scope: scope(),
                        source: VariableSource::Member(variable),
                    });
                }
            }
            Contract::Process1 | Contract::Process2 | Contract::Process3 => {
                fatal(container.process_connector1());
                self.processes.push(index);
            }
            Contract::PermissionAuthorizer1 | Contract::PermissionAuthorizer2 => {
                if self.engine.has_authorizer() {
                    return Err(ConnectorError::plugin(
                        &name,
                        "a permission authorizer is already attached",
                    ));
                }
                self.engine = self
                    .engine
                    .with_authorizer(Arc::clone(container.implementation()))?;
            }
        }

        info!(plugin = %name, contract = %container.contract(), "Attached plugin");
        self.containers.push(container);
        Ok(())
    }

    /// Attach the public members of a native type as a namespace.
    ///
    /// Instance members are only exposed when `instance` is given.
    pub fn connect_native(
        &mut self,
        ty: &NativeType,
        instance: Option<Instance>,
        alias: Option<&str>,
    ) -> ConnectorResult<()> {
        let adapter = TypeNamespaceAdapter::new(ty, instance);
        let container = ConnectorContainer::new(
            ty.name(),
            Arc::new(adapter) as Arc<dyn Connector>,
            Contract::Namespace1.identity(),
            Contract::Namespace1,
        );
        self.attach_as(container, alias)
    }

    /// Detach every plugin.
    pub fn detach_all(&mut self) -> ConnectorResult<()> {
        self.require_unconnected("detach")?;

        self.containers.clear();
        self.functions.clear();
        self.variables.clear();
        self.processes.clear();
        self.failed.clear();
        self.engine = self.engine.without_authorizer();
        Ok(())
    }

    /// Replace the engine options handed to plugins connected from now on.
    pub fn set_options(&mut self, options: OptionMap) {
        self.engine = self.engine.with_options(options);
    }

    /// Replace the base permission map.
    pub fn set_permission_map(&mut self, permissions: PermissionMap) -> ConnectorResult<()> {
        self.engine = self.engine.with_permission_map(permissions)?;
        Ok(())
    }

    fn transition(&mut self, transition: Transition) -> ConnectorResult<()> {
        if self.state != transition.from() {
            return Err(ConnectorError::InvalidTransition {
                transition: transition.name(),
                state: self.state.name(),
            });
        }

        let active: Vec<ConnectorContainer> = self
            .containers
            .iter()
            .filter(|c| !self.failed.contains(c.name()))
            .cloned()
            .collect();

        if let Err(e) = run_hooks(&active, &self.engine, transition) {
            if let Some(plugin) = e.plugin_name() {
                warn!(plugin = %plugin, transition = %transition, "Plugin failed: {}", e);
                self.failed.insert(plugin.to_string());
            }
            return Err(e);
        }

        info!(transition = %transition, plugins = active.len(), "Lifecycle transition");
        self.state = transition.to();
        Ok(())
    }

    /// Initialize every plugin for connection.
    pub fn connect(&mut self) -> ConnectorResult<()> {
        self.transition(Transition::Connect)
    }

    /// Initialize every plugin for an execution.
    pub fn begin_execution(&mut self) -> ConnectorResult<()> {
        self.transition(Transition::BeginExecution)
    }

    /// Finalize every plugin after an execution.
    pub fn end_execution(&mut self) -> ConnectorResult<()> {
        self.transition(Transition::EndExecution)
    }

    /// Finalize every plugin for disconnection.
    pub fn disconnect(&mut self) -> ConnectorResult<()> {
        self.transition(Transition::Disconnect)
    }

    fn is_live(&self, scope: &Scope) -> bool {
        !self.failed.contains(&scope.owner)
    }

    fn function<'a>(&'a self, entry: &'a FunctionEntry) -> &'a dyn FunctionConnector {
        match &entry.source {
            FunctionSource::Container(index) => fatal(self.containers[*index].function_connector()),
            FunctionSource::Member(function) => function.as_ref(),
        }
    }

    fn variable<'a>(&'a self, entry: &'a VariableEntry) -> &'a dyn VariableConnector {
        match &entry.source {
            VariableSource::Container(index) => fatal(self.containers[*index].variable_connector()),
            VariableSource::Member(variable) => variable.as_ref(),
        }
    }

    fn find_function_entry(
        &self,
        name: &str,
        argument_types: Option<&[ValueType]>,
    ) -> Option<&FunctionEntry> {
        self.functions.iter().find(|entry| {
            let function = self.function(entry);
            self.is_live(&entry.scope)
                && entry.scope.matches(name, function.function_name())
                && argument_types.is_none_or(|types| accepts(function, types))
        })
    }

    fn find_variable_entry(&self, name: &str) -> Option<&VariableEntry> {
        self.variables.iter().find(|entry| {
            self.is_live(&entry.scope) && entry.scope.matches(name, self.variable(entry).variable_name())
        })
    }

    /// Find the first function named `name` accepting `argument_types`.
    ///
    /// `name` may be qualified as `namespace.function`. Functions of a
    /// namespace with mandatory qualification are only found qualified.
    pub fn find_function(
        &self,
        name: &str,
        argument_types: &[ValueType],
    ) -> Option<&dyn FunctionConnector> {
        self.find_function_entry(name, Some(argument_types))
            .map(|entry| self.function(entry))
    }

    /// Find the variable named `name`, possibly qualified.
    pub fn find_variable(&self, name: &str) -> Option<&dyn VariableConnector> {
        self.find_variable_entry(name)
            .map(|entry| self.variable(entry))
    }

    /// Call a function during an execution.
    pub fn call(&self, name: &str, arguments: &[Value]) -> ConnectorResult<Value> {
        self.require_executing("call")?;

        let argument_types: Vec<ValueType> = arguments.iter().map(Value::value_type).collect();
        let function = self.find_function(name, &argument_types).ok_or_else(|| {
            ConnectorError::NotConnected(format!(
                "function {}({})",
                name,
                argument_types
                    .iter()
                    .map(ValueType::name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        strategy_for(function.data_exchange_mode()).call(function, arguments)
    }

    /// Call a legacy process function during an execution.
    ///
    /// The first process plugin that handles `function_name` is used.
    pub fn process(&self, function_name: &str, arguments: &[String]) -> ConnectorResult<Vec<String>> {
        self.require_executing("process")?;

        let container = self
            .find_process(function_name)
            .ok_or_else(|| ConnectorError::NotConnected(format!("process {}", function_name)))?;
        fatal(container.process_connector1()).process(function_name, arguments)
    }

    fn find_process(&self, function_name: &str) -> Option<&ConnectorContainer> {
        self.processes
            .iter()
            .map(|index| &self.containers[*index])
            .filter(|container| !self.failed.contains(container.name()))
            .find(|container| fatal(container.process_connector1()).is_processable(function_name))
    }

    pub fn read_variable(&self, name: &str) -> ConnectorResult<Value> {
        self.require_executing("read")?;

        let variable = self
            .find_variable(name)
            .ok_or_else(|| ConnectorError::NotConnected(format!("variable {}", name)))?;
        strategy_for(variable.data_exchange_mode()).read(variable)
    }

    /// Write a variable during an execution.
    ///
    /// # Errors
    ///
    /// Returns `AccessViolation` for constants and `SignatureMismatch` when
    /// the value does not fit the declared type.
    pub fn write_variable(&self, name: &str, value: Value) -> ConnectorResult<()> {
        self.require_executing("write")?;

        let entry = self
            .find_variable_entry(name)
            .ok_or_else(|| ConnectorError::NotConnected(format!("variable {}", name)))?;
        let variable = self.variable(entry);

        if variable.is_constant() {
            return Err(ConnectorError::AccessViolation {
                owner: entry.scope.owner.clone(),
                member: variable.variable_name().to_string(),
                reason: "it is constant".to_string(),
            });
        }
        let declared = variable.data_type();
        let actual = value.value_type();
        if !parameter_matches(
            &declared,
            &actual,
            variable.is_data_type_arbitrary(),
            variable.is_array_rank_arbitrary(),
        ) {
            return Err(ConnectorError::SignatureMismatch {
                owner: entry.scope.owner.clone(),
                member: variable.variable_name().to_string(),
                reason: format!("expected {}, got {}", declared, actual),
            });
        }

        strategy_for(variable.data_exchange_mode()).write(variable, value)
    }

    /// Check whether calling `function_name` with `argument_types`
    /// requires `permission`.
    ///
    /// The overload is resolved the way `call` resolves it. A function that
    /// leaves the permission unspecified defers to the permission set of its
    /// namespace.
    pub fn permission_requirement(
        &self,
        function_name: &str,
        argument_types: &[ValueType],
        permission: &str,
    ) -> ConnectorResult<Requirement> {
        let entry = self
            .find_function_entry(function_name, Some(argument_types))
            .ok_or_else(|| ConnectorError::NotConnected(format!("function {}", function_name)))?;

        let requirement = self.function(entry).permissions().requirement(permission);
        Ok(match (&requirement, &entry.scope.namespace_permissions) {
            (Requirement::Unspecified, Some(namespace)) => namespace.requirement(permission),
            _ => requirement,
        })
    }

    /// Check whether the legacy process function `function_name` requires
    /// `permission`. Generations before 3 declare nothing.
    pub fn process_permission_requirement(
        &self,
        function_name: &str,
        permission: &str,
    ) -> ConnectorResult<Requirement> {
        let container = self
            .find_process(function_name)
            .ok_or_else(|| ConnectorError::NotConnected(format!("process {}", function_name)))?;

        Ok(match container.implementation().as_process_connector3() {
            Some(process) => effective_required(
                &process.necessary_permission_names(function_name),
                &process.unnecessary_permission_names(function_name),
                permission,
            ),
            None => Requirement::Unspecified,
        })
    }

    /// Request a permission through the engine's authorizer.
    pub fn request_permission(
        &self,
        permission: &str,
        requester: &str,
        meta_information: Option<&str>,
    ) -> ConnectorResult<()> {
        self.engine
            .request_permission(permission, requester, meta_information)
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn engine(&self) -> &HostEngineConnector {
        &self.engine
    }

    pub fn is_failed(&self, name: &str) -> bool {
        self.failed.contains(name)
    }

    /// Get the names of the attached plugins, in attach order.
    pub fn plugin_names(&self) -> Vec<String> {
        self.containers.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn plugin_count(&self) -> usize {
        self.containers.len()
    }

    /// List plugin information.
    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        self.containers
            .iter()
            .map(|c| PluginInfo {
                name: c.name().to_string(),
                contract: c.contract(),
                failed: self.failed.contains(c.name()),
            })
            .collect()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about an attached plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: String,
    pub contract: Contract,
    pub failed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{downcast_receiver, NativeField, NativeMethod};
    use connect_core::MemberHooks;
    use std::any::Any;
    use std::sync::Mutex;

    struct Counter {
        count: Mutex<i64>,
    }

    fn counter_type() -> NativeType {
        NativeType::new("demo.Counter")
            .with_method(
                NativeMethod::static_method(
                    "sum",
                    vec![ValueType::array_of(ValueType::Int64)],
                    ValueType::Int64,
                    |args| {
                        let items = args[0].as_array().unwrap_or_default();
                        let total: i64 = items.iter().filter_map(Value::as_i64).sum();
                        Ok(Value::Int(total))
                    },
                )
                .variadic(),
            )
            .with_method(NativeMethod::instance_method(
                "next",
                vec![],
                ValueType::Int64,
                |receiver, _| {
                    let counter = downcast_receiver::<Counter>(receiver)?;
                    let mut count = counter.count.lock().unwrap();
                    *count += 1;
                    Ok(Value::Int(*count))
                },
            ))
            .with_field(NativeField::static_field("LIMIT", ValueType::Int64, || {
                Ok(Value::Int(100))
            }))
    }

    fn counter() -> Instance {
        Arc::new(Counter {
            count: Mutex::new(0),
        })
    }

    struct Upper;

    impl MemberHooks for Upper {}

    impl FunctionConnector for Upper {
        fn function_name(&self) -> &str {
            "upper"
        }

        fn parameter_types(&self) -> Vec<ValueType> {
            vec![ValueType::Text]
        }

        fn return_type(&self, _parameter_types: &[ValueType]) -> ValueType {
            ValueType::Text
        }

        fn invoke(&self, arguments: &[Value]) -> ConnectorResult<Value> {
            Ok(Value::from(arguments[0].as_str().unwrap_or_default().to_uppercase()))
        }
    }

    impl Connector for Upper {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_function_connector(&self) -> Option<&dyn FunctionConnector> {
            Some(self)
        }
    }

    fn upper() -> ConnectorContainer {
        upper_named("demo.Upper")
    }

    fn upper_named(name: &str) -> ConnectorContainer {
        ConnectorContainer::new(
            name,
            Arc::new(Upper),
            Contract::Function1.identity(),
            Contract::Function1,
        )
    }

    struct Writer {
        parameter: ValueType,
        permissions: PermissionSet,
    }

    impl MemberHooks for Writer {}

    impl FunctionConnector for Writer {
        fn function_name(&self) -> &str {
            "write"
        }

        fn parameter_types(&self) -> Vec<ValueType> {
            vec![self.parameter.clone()]
        }

        fn return_type(&self, _parameter_types: &[ValueType]) -> ValueType {
            ValueType::Bool
        }

        fn permissions(&self) -> PermissionSet {
            self.permissions.clone()
        }

        fn invoke(&self, _arguments: &[Value]) -> ConnectorResult<Value> {
            Ok(Value::Bool(true))
        }
    }

    impl Connector for Writer {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_function_connector(&self) -> Option<&dyn FunctionConnector> {
            Some(self)
        }
    }

    fn writer(name: &str, parameter: ValueType, permissions: PermissionSet) -> ConnectorContainer {
        ConnectorContainer::new(
            name,
            Arc::new(Writer {
                parameter,
                permissions,
            }),
            Contract::Function1.identity(),
            Contract::Function1,
        )
    }

    #[test]
    fn test_call_requires_execution() {
        let mut registry = PluginRegistry::new();
        registry.attach(upper()).unwrap();

        let err = registry.call("upper", &[Value::from("a")]).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidTransition { .. }));

        registry.connect().unwrap();
        registry.begin_execution().unwrap();
        assert_eq!(
            registry.call("upper", &[Value::from("abc")]).unwrap(),
            Value::from("ABC")
        );
        assert!(matches!(
            registry.call("upper", &[Value::Int(1)]),
            Err(ConnectorError::NotConnected(_))
        ));
    }

    #[test]
    fn test_attach_rules() {
        let mut registry = PluginRegistry::new();
        registry.attach(upper()).unwrap();
        assert!(registry.attach(upper()).is_err());

        registry.connect().unwrap();
        assert!(matches!(
            registry.attach(upper_named("demo.Other")),
            Err(ConnectorError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_native_namespace_calls() {
        let mut registry = PluginRegistry::new();
        registry
            .connect_native(&counter_type(), Some(counter()), Some("counter"))
            .unwrap();
        registry.connect().unwrap();
        registry.begin_execution().unwrap();

        let total = registry
            .call("sum", &[Value::Int(1), Value::Int(2), Value::Int(3)])
            .unwrap();
        assert_eq!(total, Value::Int(6));
        assert_eq!(registry.call("counter.next", &[]).unwrap(), Value::Int(1));
        assert_eq!(registry.call("next", &[]).unwrap(), Value::Int(2));
        assert!(registry.call("Counter.next", &[]).is_err());

        assert_eq!(registry.read_variable("counter.LIMIT").unwrap(), Value::Int(100));
        let err = registry.write_variable("LIMIT", Value::Int(5)).unwrap_err();
        assert!(matches!(err, ConnectorError::AccessViolation { .. }));
    }

    #[test]
    fn test_argument_matching() {
        assert!(compatible(
            &ValueType::array_of(ValueType::Int64),
            &ValueType::array_of(ValueType::Any)
        ));
        assert!(!compatible(&ValueType::Int64, &ValueType::Float64));
        assert!(parameter_matches(
            &ValueType::Int64,
            &ValueType::Text,
            true,
            false
        ));
        assert!(parameter_matches(
            &ValueType::Int64,
            &ValueType::array_of(ValueType::Int64),
            false,
            true
        ));
        assert!(!parameter_matches(
            &ValueType::Int64,
            &ValueType::array_of(ValueType::Int64),
            true,
            false
        ));
    }

    #[test]
    fn test_namespace_permissions_fill_unspecified() {
        let mut registry = PluginRegistry::new();
        registry.connect_native(&counter_type(), None, None).unwrap();

        // Member adapters start sandboxed, so ALL is unnecessary.
        assert_eq!(
            registry
                .permission_requirement("sum", &[ValueType::Int64], "FILE_WRITE")
                .unwrap(),
            Requirement::NotRequired
        );
        assert!(registry
            .permission_requirement("missing", &[], "FILE_WRITE")
            .is_err());
    }

    #[test]
    fn test_permission_requirement_follows_overload() {
        let mut registry = PluginRegistry::new();
        registry
            .attach(writer(
                "demo.WriteInt",
                ValueType::Int64,
                PermissionSet::sandboxed(),
            ))
            .unwrap();
        registry
            .attach(writer(
                "demo.WriteText",
                ValueType::Text,
                PermissionSet::new(["FILE_WRITE"], ["ALL"]),
            ))
            .unwrap();

        assert_eq!(
            registry
                .permission_requirement("write", &[ValueType::Text], "FILE_WRITE")
                .unwrap(),
            Requirement::Required
        );
        assert_eq!(
            registry
                .permission_requirement("write", &[ValueType::Int64], "FILE_WRITE")
                .unwrap(),
            Requirement::NotRequired
        );
        assert!(registry
            .permission_requirement("write", &[ValueType::Bool], "FILE_WRITE")
            .is_err());
    }
}
