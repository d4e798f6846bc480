//! Integration tests for connect-core.
//!
//! These tests cover:
//! - Capability views and legacy generation upcasting
//! - Default calling-convention errors
//! - Permission sets declared in TOML
//! - Engine connector lookups by shape

use connect_core::permission::names;
use connect_core::{
    other_engine_connector, ArrayDataAccessor, Connector, ConnectorError, ConnectorResult,
    DataContainer, DataExchangeMode, EngineConnector, FunctionConnector, MemberHooks,
    PermissionSet, ProcessConnector1, ProcessConnector2, ProcessConnector3, Requirement, Value,
    ValueType,
};
use std::any::{Any, TypeId};

// ==============================================================================
// Test Fixture Helpers
// ==============================================================================

struct Echo;

impl ProcessConnector1 for Echo {
    fn is_processable(&self, function_name: &str) -> bool {
        function_name == "echo"
    }

    fn process(&self, _function_name: &str, arguments: &[String]) -> ConnectorResult<Vec<String>> {
        Ok(arguments.to_vec())
    }
}

impl ProcessConnector2 for Echo {}
impl MemberHooks for Echo {}
impl ProcessConnector3 for Echo {}

impl Connector for Echo {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_process_connector3(&self) -> Option<&dyn ProcessConnector3> {
        Some(self)
    }
}

struct SharedSum;

impl MemberHooks for SharedSum {}

impl FunctionConnector for SharedSum {
    fn function_name(&self) -> &str {
        "sum"
    }

    fn parameter_types(&self) -> Vec<ValueType> {
        vec![ValueType::array_of(ValueType::Int64)]
    }

    fn return_type(&self, _parameter_types: &[ValueType]) -> ValueType {
        ValueType::Int64
    }

    fn data_exchange_mode(&self) -> DataExchangeMode {
        DataExchangeMode::SharedContainer
    }

    fn invoke_shared(&self, containers: &mut [DataContainer]) -> ConnectorResult<()> {
        let total: i64 = match containers.get(1) {
            Some(DataContainer::Int64(values)) => values.array_data().unwrap_or(&[]).iter().sum(),
            _ => return Err(ConnectorError::plugin("sum", "expected an int array")),
        };
        match containers.get_mut(0) {
            Some(DataContainer::Int64(ret)) => {
                ret.set_array_data(vec![total], 0, vec![]);
                Ok(())
            }
            _ => Err(ConnectorError::plugin("sum", "expected an int return slot")),
        }
    }
}

struct Clock {
    ticks: u64,
}

struct QuietEngine {
    clock: Clock,
}

impl EngineConnector for QuietEngine {
    fn has_option_value(&self, _name: &str) -> bool {
        false
    }

    fn option_value(&self, _name: &str) -> Option<Value> {
        None
    }

    fn request_permission(
        &self,
        permission: &str,
        requester: &str,
        _meta_information: Option<&str>,
    ) -> ConnectorResult<()> {
        Err(ConnectorError::NoAuthorizer {
            permission: permission.to_string(),
            requester: requester.to_string(),
        })
    }

    fn other_engine_connector(&self, shape: TypeId) -> Option<&dyn Any> {
        if shape == TypeId::of::<Clock>() {
            Some(&self.clock)
        } else {
            None
        }
    }
}

// ==============================================================================
// Tests
// ==============================================================================

#[test]
fn test_generation_three_satisfies_older_generations() {
    let plugin: Box<dyn Connector> = Box::new(Echo);

    assert!(plugin.as_process_connector3().is_some());
    assert!(plugin.as_process_connector2().is_some());
    let gpci1 = plugin.as_process_connector1().unwrap();
    assert!(gpci1.is_processable("echo"));
    assert_eq!(
        gpci1.process("echo", &["a".to_string()]).unwrap(),
        vec!["a".to_string()]
    );

    assert!(plugin.as_function_connector().is_none());
    assert!(plugin.as_permission_authorizer1().is_none());
    assert!(plugin.as_any().downcast_ref::<Echo>().is_some());
}

#[test]
fn test_legacy_process_defaults_are_sandboxed() {
    let necessary = Echo.necessary_permission_names("echo");
    let unnecessary = Echo.unnecessary_permission_names("echo");

    let set = PermissionSet::new(necessary, unnecessary);
    assert_eq!(set.requirement(names::FILE_READ), Requirement::NotRequired);
}

#[test]
fn test_shared_function_rejects_converted_call() {
    let function = SharedSum;
    let err = function.invoke(&[Value::Int(1)]).unwrap_err();

    assert!(matches!(
        err,
        ConnectorError::ExchangeMismatch {
            expected: DataExchangeMode::SharedContainer,
            ..
        }
    ));
    assert_eq!(err.plugin_name(), Some("sum"));
}

#[test]
fn test_shared_function_writes_return_slot() {
    let function = SharedSum;
    let mut frame = vec![
        DataContainer::for_type(&ValueType::Int64).unwrap(),
        DataContainer::from_value(&Value::from(vec![1i64, 2, 3])).unwrap(),
    ];

    function.invoke_shared(&mut frame).unwrap();
    assert_eq!(frame[0].to_value(), Some(Value::Int(6)));
}

#[test]
fn test_permission_set_from_toml() {
    let set: PermissionSet = toml::from_str(
        r#"
necessary = ["FILE_WRITE"]
unnecessary = ["ALL"]
"#,
    )
    .unwrap();

    assert_eq!(set.requirement(names::FILE_WRITE), Requirement::Required);
    assert_eq!(set.requirement(names::FILE_READ), Requirement::NotRequired);

    let defaulted: PermissionSet = toml::from_str("").unwrap();
    assert_eq!(defaulted, PermissionSet::sandboxed());
}

#[test]
fn test_other_engine_connector_by_shape() {
    let engine = QuietEngine {
        clock: Clock { ticks: 42 },
    };

    assert!(engine.is_other_engine_connector_available(TypeId::of::<Clock>()));
    assert!(!engine.is_other_engine_connector_available(TypeId::of::<String>()));
    assert_eq!(other_engine_connector::<Clock>(&engine).map(|c| c.ticks), Some(42));

    let err = engine
        .request_permission(names::FILE_READ, "plugin", None)
        .unwrap_err();
    assert!(err.is_permission_denied());
}
