use super::{DataExchangeMode, MemberHooks};
use crate::accessor::DataContainer;
use crate::error::{ConnectorError, ConnectorResult};
use crate::permission::PermissionSet;
use crate::value::{Value, ValueType};

fn mismatch<V: VariableConnector + ?Sized>(variable: &V, operation: &'static str) -> ConnectorError {
    ConnectorError::ExchangeMismatch {
        name: variable.variable_name().to_string(),
        operation,
        expected: variable.data_exchange_mode(),
    }
}

/// Variable connector contract (`XVCI1`).
///
/// Converted variables implement [`get_data`](VariableConnector::get_data)
/// and [`set_data`](VariableConnector::set_data); shared-container variables
/// implement the `_into`/`_from` pair.
pub trait VariableConnector: MemberHooks {
    fn variable_name(&self) -> &str;

    fn data_type(&self) -> ValueType;

    fn is_constant(&self) -> bool;

    fn is_reference(&self) -> bool {
        false
    }

    fn is_data_type_arbitrary(&self) -> bool {
        false
    }

    fn is_array_rank_arbitrary(&self) -> bool {
        false
    }

    fn data_exchange_mode(&self) -> DataExchangeMode {
        DataExchangeMode::Converted
    }

    fn permissions(&self) -> PermissionSet {
        PermissionSet::default()
    }

    fn get_data(&self) -> ConnectorResult<Value> {
        Err(mismatch(self, "get_data"))
    }

    /// Copy the current value into a shared container.
    fn get_data_into(&self, _container: &mut DataContainer) -> ConnectorResult<()> {
        Err(mismatch(self, "get_data_into"))
    }

    fn set_data(&self, _value: Value) -> ConnectorResult<()> {
        Err(mismatch(self, "set_data"))
    }

    fn set_data_from(&self, _container: &DataContainer) -> ConnectorResult<()> {
        Err(mismatch(self, "set_data_from"))
    }
}
