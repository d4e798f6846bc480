//! Demo plugin types linked into the host.
//!
//! - `demo.Greeter`: a function plugin greeting with the `greeting` option
//! - `demo.Echo`: a generation 3 process plugin
//! - `demo.Math`: a plain type, connected through the namespace aggregator
//!
//! The map permission authorizer is registered alongside them.

use connect_core::permission::names;
use connect_core::{
    Connector, ConnectorError, ConnectorResult, Contract, EngineConnector, FunctionConnector,
    MemberHooks, ProcessConnector1, ProcessConnector2, ProcessConnector3, Value,
    ValueType,
};
use connect_runtime::native::MemberFault;
use connect_runtime::{MapPermissionAuthorizer, NativeField, NativeMethod, NativeType, TypeCatalog};
use std::any::Any;
use std::process::Command;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

pub const GREETER_TYPE: &str = "demo.Greeter";
pub const ECHO_TYPE: &str = "demo.Echo";
pub const MATH_TYPE: &str = "demo.Math";

/// Register every demo type in `catalog`.
pub fn register_demo_types(catalog: &TypeCatalog) {
    catalog.register(
        NativeType::new(GREETER_TYPE)
            .with_identity(Contract::Function1)
            .with_default_constructor::<Greeter>(),
    );
    catalog.register(
        NativeType::new(ECHO_TYPE)
            .with_identity(Contract::Process3)
            .with_default_constructor::<Echo>(),
    );
    catalog.register(math_type());
    catalog.register(MapPermissionAuthorizer::native_type());
}

/// Greets with the engine's `greeting` option, captured at connection.
pub struct Greeter {
    greeting: Mutex<String>,
}

impl Default for Greeter {
    fn default() -> Self {
        Self {
            greeting: Mutex::new("Hello".to_string()),
        }
    }
}

impl MemberHooks for Greeter {
    fn initialize_for_connection(&self, engine: &dyn EngineConnector) -> ConnectorResult<()> {
        if let Some(greeting) = engine.option_value("greeting") {
            let greeting = greeting.as_str().ok_or_else(|| {
                ConnectorError::plugin(GREETER_TYPE, "the greeting option must be text")
            })?;
            *self.greeting.lock().unwrap_or_else(PoisonError::into_inner) = greeting.to_string();
        }
        Ok(())
    }
}

impl FunctionConnector for Greeter {
    fn function_name(&self) -> &str {
        "hello"
    }

    fn parameter_names(&self) -> Option<Vec<String>> {
        Some(vec!["name".to_string()])
    }

    fn parameter_types(&self) -> Vec<ValueType> {
        vec![ValueType::Text]
    }

    fn return_type(&self, _parameter_types: &[ValueType]) -> ValueType {
        ValueType::Text
    }

    fn invoke(&self, arguments: &[Value]) -> ConnectorResult<Value> {
        let greeting = self.greeting.lock().unwrap_or_else(PoisonError::into_inner);
        let name = arguments.first().and_then(Value::as_str).unwrap_or("world");
        Ok(Value::from(format!("{}, {}!", greeting, name)))
    }
}

impl Connector for Greeter {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_function_connector(&self) -> Option<&dyn FunctionConnector> {
        Some(self)
    }
}

/// Legacy process plugin: `echo` joins its arguments, `exec` runs a
/// command and needs `SYSTEM_PROCESS`.
#[derive(Default)]
pub struct Echo;

impl Echo {
    fn exec(arguments: &[String]) -> ConnectorResult<Vec<String>> {
        let (program, args) = arguments
            .split_first()
            .ok_or_else(|| ConnectorError::plugin(ECHO_TYPE, "exec needs a program"))?;

        debug!(program = %program, "Running command");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| ConnectorError::plugin(ECHO_TYPE, e.to_string()))?;

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }
}

impl ProcessConnector1 for Echo {
    fn is_processable(&self, function_name: &str) -> bool {
        matches!(function_name, "echo" | "exec")
    }

    fn process(&self, function_name: &str, arguments: &[String]) -> ConnectorResult<Vec<String>> {
        match function_name {
            "echo" => Ok(vec![arguments.join(" ")]),
            "exec" => Self::exec(arguments),
            other => Err(ConnectorError::plugin(
                ECHO_TYPE,
                format!("cannot process {}", other),
            )),
        }
    }
}

impl ProcessConnector2 for Echo {}
impl MemberHooks for Echo {}

impl ProcessConnector3 for Echo {
    fn necessary_permission_names(&self, function_name: &str) -> Vec<String> {
        match function_name {
            "exec" => vec![names::SYSTEM_PROCESS.to_string()],
            _ => vec![names::NONE.to_string()],
        }
    }

    fn unnecessary_permission_names(&self, _function_name: &str) -> Vec<String> {
        vec![names::ALL.to_string()]
    }
}

impl Connector for Echo {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_process_connector3(&self) -> Option<&dyn ProcessConnector3> {
        Some(self)
    }
}

fn int_arg(args: &[Value], index: usize) -> Result<i64, MemberFault> {
    args.get(index)
        .and_then(Value::as_i64)
        .ok_or_else(|| MemberFault::WrongReceiver(format!("argument {} is not an integer", index)))
}

/// A plain type without identity: static methods and a constant.
pub fn math_type() -> NativeType {
    NativeType::new(MATH_TYPE)
        .with_method(NativeMethod::static_method(
            "max",
            vec![ValueType::Int64, ValueType::Int64],
            ValueType::Int64,
            |args| Ok(Value::Int(int_arg(args, 0)?.max(int_arg(args, 1)?))),
        ))
        .with_method(
            NativeMethod::static_method(
                "sum",
                vec![ValueType::array_of(ValueType::Int64)],
                ValueType::Int64,
                |args| {
                    let items = args.first().and_then(Value::as_array).unwrap_or_default();
                    let total: i64 = items.iter().filter_map(Value::as_i64).sum();
                    Ok(Value::Int(total))
                },
            )
            .variadic(),
        )
        .with_method(
            NativeMethod::static_method("checksum", vec![ValueType::Text], ValueType::Int64, |args| {
                let text = args.first().and_then(Value::as_str).unwrap_or_default();
                Ok(Value::Int(text.bytes().map(i64::from).sum()))
            })
            .private(),
        )
        .with_field(NativeField::static_field("PI", ValueType::Float64, || {
            Ok(Value::Float(std::f64::consts::PI))
        }))
}
