use super::{DataExchangeMode, MemberHooks};
use crate::accessor::DataContainer;
use crate::error::{ConnectorError, ConnectorResult};
use crate::permission::PermissionSet;
use crate::value::{Value, ValueType};

/// Function connector contract (`XFCI1`).
///
/// Per-parameter flag vectors default to `false` for every parameter.
pub trait FunctionConnector: MemberHooks {
    fn function_name(&self) -> &str;

    /// Get the parameter names, when the implementation knows them.
    fn parameter_names(&self) -> Option<Vec<String>> {
        None
    }

    fn parameter_types(&self) -> Vec<ValueType>;

    fn parameter_data_type_arbitrarinesses(&self) -> Vec<bool> {
        vec![false; self.parameter_types().len()]
    }

    fn parameter_array_rank_arbitrarinesses(&self) -> Vec<bool> {
        vec![false; self.parameter_types().len()]
    }

    /// Get which parameters are passed by reference.
    fn parameter_referencenesses(&self) -> Vec<bool> {
        vec![false; self.parameter_types().len()]
    }

    fn parameter_constantnesses(&self) -> Vec<bool> {
        vec![false; self.parameter_types().len()]
    }

    /// Check whether any number of arguments of any type is accepted.
    fn is_parameter_count_arbitrary(&self) -> bool {
        false
    }

    /// Check whether the last parameter is variadic.
    fn has_variadic_parameters(&self) -> bool {
        false
    }

    /// Get the return type for a call with the given argument types.
    fn return_type(&self, parameter_types: &[ValueType]) -> ValueType;

    fn is_return_data_type_arbitrary(&self) -> bool {
        false
    }

    fn is_return_array_rank_arbitrary(&self) -> bool {
        false
    }

    fn data_exchange_mode(&self) -> DataExchangeMode {
        DataExchangeMode::Converted
    }

    fn permissions(&self) -> PermissionSet {
        PermissionSet::default()
    }

    /// Call the function with converted arguments.
    fn invoke(&self, _arguments: &[Value]) -> ConnectorResult<Value> {
        Err(ConnectorError::ExchangeMismatch {
            name: self.function_name().to_string(),
            operation: "invoke",
            expected: self.data_exchange_mode(),
        })
    }

    /// Call the function with shared containers.
    ///
    /// Slot 0 receives the return value; the arguments follow from slot 1.
    fn invoke_shared(&self, _containers: &mut [DataContainer]) -> ConnectorResult<()> {
        Err(ConnectorError::ExchangeMismatch {
            name: self.function_name().to_string(),
            operation: "invoke_shared",
            expected: self.data_exchange_mode(),
        })
    }
}
