//! Calls across the plugin boundary.
//!
//! Each function and variable declares a [`DataExchangeMode`]. The engine
//! always speaks host-native [`Value`]s; [`strategy_for`] selects the
//! strategy translating them into the calling convention the member uses.

use connect_core::{
    ConnectorError, ConnectorResult, DataContainer, DataExchangeMode, FunctionConnector, Value,
    ValueType, VariableConnector,
};

/// Arguments of one call, in the calling convention of the callee.
#[derive(Debug, Clone, PartialEq)]
pub enum CallFrame {
    /// Typed values.
    Converted(Vec<Value>),
    /// Shared containers. Slot 0 receives the return value.
    Shared(Vec<DataContainer>),
}

impl CallFrame {
    /// Call `function` with this frame and unpack its return value.
    pub fn invoke(self, function: &dyn FunctionConnector) -> ConnectorResult<Value> {
        match self {
            CallFrame::Converted(arguments) => function.invoke(&arguments),
            CallFrame::Shared(mut containers) => {
                function.invoke_shared(&mut containers)?;
                Ok(containers
                    .first()
                    .and_then(DataContainer::to_value)
                    .unwrap_or(Value::Void))
            }
        }
    }
}

/// Translates engine values into one calling convention.
pub trait ExchangeStrategy: Send + Sync {
    fn mode(&self) -> DataExchangeMode;

    /// Build the call frame for calling `function` with `arguments`.
    fn prepare(
        &self,
        function: &dyn FunctionConnector,
        arguments: &[Value],
    ) -> ConnectorResult<CallFrame>;

    fn call(&self, function: &dyn FunctionConnector, arguments: &[Value]) -> ConnectorResult<Value> {
        self.prepare(function, arguments)?.invoke(function)
    }

    fn read(&self, variable: &dyn VariableConnector) -> ConnectorResult<Value>;

    fn write(&self, variable: &dyn VariableConnector, value: Value) -> ConnectorResult<()>;
}

/// Passes values through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertedExchange;

impl ExchangeStrategy for ConvertedExchange {
    fn mode(&self) -> DataExchangeMode {
        DataExchangeMode::Converted
    }

    fn prepare(
        &self,
        _function: &dyn FunctionConnector,
        arguments: &[Value],
    ) -> ConnectorResult<CallFrame> {
        Ok(CallFrame::Converted(arguments.to_vec()))
    }

    fn read(&self, variable: &dyn VariableConnector) -> ConnectorResult<Value> {
        variable.get_data()
    }

    fn write(&self, variable: &dyn VariableConnector, value: Value) -> ConnectorResult<()> {
        variable.set_data(value)
    }
}

/// Packs values into shared containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedExchange;

impl SharedExchange {
    fn pack(name: &str, value: &Value) -> ConnectorResult<DataContainer> {
        DataContainer::from_value(value).ok_or_else(|| ConnectorError::SignatureMismatch {
            owner: name.to_string(),
            member: name.to_string(),
            reason: format!(
                "a {} value cannot be passed in a shared container",
                value.value_type()
            ),
        })
    }

    /// Allocate the return slot. Functions returning nothing or anything get
    /// a placeholder the plugin may replace.
    fn return_slot(ty: &ValueType) -> DataContainer {
        DataContainer::for_type(ty).unwrap_or_else(|| DataContainer::Bool(Default::default()))
    }
}

impl ExchangeStrategy for SharedExchange {
    fn mode(&self) -> DataExchangeMode {
        DataExchangeMode::SharedContainer
    }

    fn prepare(
        &self,
        function: &dyn FunctionConnector,
        arguments: &[Value],
    ) -> ConnectorResult<CallFrame> {
        let argument_types: Vec<ValueType> = arguments.iter().map(Value::value_type).collect();
        let mut containers = Vec::with_capacity(arguments.len() + 1);
        containers.push(Self::return_slot(&function.return_type(&argument_types)));

        for argument in arguments {
            containers.push(Self::pack(function.function_name(), argument)?);
        }
        Ok(CallFrame::Shared(containers))
    }

    fn read(&self, variable: &dyn VariableConnector) -> ConnectorResult<Value> {
        let mut container = Self::return_slot(&variable.data_type());
        variable.get_data_into(&mut container)?;
        Ok(container.to_value().unwrap_or(Value::Void))
    }

    fn write(&self, variable: &dyn VariableConnector, value: Value) -> ConnectorResult<()> {
        let container = Self::pack(variable.variable_name(), &value)?;
        variable.set_data_from(&container)
    }
}

static CONVERTED: ConvertedExchange = ConvertedExchange;
static SHARED: SharedExchange = SharedExchange;

/// Get the strategy for a calling convention.
pub fn strategy_for(mode: DataExchangeMode) -> &'static dyn ExchangeStrategy {
    match mode {
        DataExchangeMode::Converted => &CONVERTED,
        DataExchangeMode::SharedContainer => &SHARED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect_core::{ArrayDataAccessor, ArrayDataContainer, MemberHooks};
    use std::sync::Mutex;

    /// Sums a float array into slot 0.
    struct SharedSum;

    impl MemberHooks for SharedSum {}

    impl FunctionConnector for SharedSum {
        fn function_name(&self) -> &str {
            "sum"
        }

        fn parameter_types(&self) -> Vec<ValueType> {
            vec![ValueType::array_of(ValueType::Float64)]
        }

        fn return_type(&self, _parameter_types: &[ValueType]) -> ValueType {
            ValueType::Float64
        }

        fn data_exchange_mode(&self) -> DataExchangeMode {
            DataExchangeMode::SharedContainer
        }

        fn invoke_shared(&self, containers: &mut [DataContainer]) -> ConnectorResult<()> {
            let total: f64 = match &containers[1] {
                DataContainer::Float64(values) => values.elements().unwrap_or_default().iter().sum(),
                _ => 0.0,
            };
            containers[0] = DataContainer::Float64(ArrayDataContainer::scalar(total));
            Ok(())
        }
    }

    /// A counter exposed in shared-container mode.
    struct SharedCounter(Mutex<i64>);

    impl MemberHooks for SharedCounter {}

    impl VariableConnector for SharedCounter {
        fn variable_name(&self) -> &str {
            "counter"
        }

        fn data_type(&self) -> ValueType {
            ValueType::Int64
        }

        fn is_constant(&self) -> bool {
            false
        }

        fn data_exchange_mode(&self) -> DataExchangeMode {
            DataExchangeMode::SharedContainer
        }

        fn get_data_into(&self, container: &mut DataContainer) -> ConnectorResult<()> {
            if let DataContainer::Int64(c) = container {
                c.set_array_data(vec![*self.0.lock().unwrap()], 0, Vec::new());
            }
            Ok(())
        }

        fn set_data_from(&self, container: &DataContainer) -> ConnectorResult<()> {
            if let Some(Value::Int(value)) = container.to_value() {
                *self.0.lock().unwrap() = value;
            }
            Ok(())
        }
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(
            strategy_for(DataExchangeMode::Converted).mode(),
            DataExchangeMode::Converted
        );
        assert_eq!(
            strategy_for(DataExchangeMode::SharedContainer).mode(),
            DataExchangeMode::SharedContainer
        );
    }

    #[test]
    fn test_shared_call_uses_return_slot() {
        let strategy = strategy_for(SharedSum.data_exchange_mode());
        let arguments = [Value::Array(vec![
            Value::Float(1.5),
            Value::Float(2.0),
            Value::Float(0.5),
        ])];

        let frame = strategy.prepare(&SharedSum, &arguments).unwrap();
        match &frame {
            CallFrame::Shared(containers) => {
                assert_eq!(containers.len(), 2);
                assert!(!containers[0].has_data());
                assert_eq!(containers[1].lengths(), &[3]);
            }
            CallFrame::Converted(_) => panic!("expected a shared frame"),
        }

        assert_eq!(frame.invoke(&SharedSum).unwrap(), Value::Float(4.0));
    }

    #[test]
    fn test_converted_call_on_shared_function_fails() {
        let err = strategy_for(DataExchangeMode::Converted)
            .call(&SharedSum, &[])
            .unwrap_err();
        assert!(matches!(err, ConnectorError::ExchangeMismatch { .. }));
    }

    #[test]
    fn test_jagged_array_cannot_be_shared() {
        let jagged = Value::Array(vec![
            Value::Array(vec![Value::Float(1.0)]),
            Value::Array(vec![Value::Float(1.0), Value::Float(2.0)]),
        ]);
        let err = strategy_for(DataExchangeMode::SharedContainer)
            .prepare(&SharedSum, &[jagged])
            .unwrap_err();
        assert!(matches!(err, ConnectorError::SignatureMismatch { .. }));
    }

    #[test]
    fn test_shared_variable_access() {
        let counter = SharedCounter(Mutex::new(3));
        let strategy = strategy_for(counter.data_exchange_mode());

        assert_eq!(strategy.read(&counter).unwrap(), Value::Int(3));
        strategy.write(&counter, Value::Int(7)).unwrap();
        assert_eq!(strategy.read(&counter).unwrap(), Value::Int(7));
    }
}
