//! Contract resolution for loaded instances.

use crate::native::NativeType;
use connect_core::{Connector, ConnectorError, ConnectorResult, Contract, PluginIdentity};

/// Legacy contracts probed when a type declares no identity, newest first.
pub const STRUCTURAL_FALLBACK: [Contract; 3] =
    [Contract::Process3, Contract::Process2, Contract::Process1];

/// Check whether `instance` provides the capability `contract` requires.
pub fn satisfies(contract: Contract, instance: &dyn Connector) -> bool {
    match contract {
        Contract::Function1 => instance.as_function_connector().is_some(),
        Contract::Variable1 => instance.as_variable_connector().is_some(),
        Contract::Namespace1 | Contract::Library1 => instance.as_namespace_connector().is_some(),
        Contract::Process1 => instance.as_process_connector1().is_some(),
        Contract::Process2 => instance.as_process_connector2().is_some(),
        Contract::Process3 => instance.as_process_connector3().is_some(),
        Contract::PermissionAuthorizer1 => instance.as_permission_authorizer1().is_some(),
        Contract::PermissionAuthorizer2 => instance.as_permission_authorizer2().is_some(),
    }
}

/// Find the newest legacy contract `instance` satisfies structurally.
pub fn structural_match(instance: &dyn Connector) -> Option<Contract> {
    STRUCTURAL_FALLBACK
        .into_iter()
        .find(|contract| satisfies(*contract, instance))
}

/// Resolve the identity of an instance of `ty`, loaded as the plugin `name`.
///
/// A complete declared identity is authoritative. The structural probe only
/// runs when the type declares no identity or only half of one.
pub fn resolve_identity(
    name: &str,
    ty: &NativeType,
    instance: &dyn Connector,
) -> ConnectorResult<PluginIdentity> {
    let type_id = ty.declared_type_id();
    let generation = ty.declared_generation();

    if let (Some(type_id), Some(generation)) = (type_id, generation) {
        return Ok(PluginIdentity::new(type_id, generation));
    }

    structural_match(instance)
        .map(|contract| contract.identity())
        .ok_or_else(|| ConnectorError::UnknownInterface {
            name: name.to_string(),
            type_id: type_id.map(str::to_string),
            generation: generation.map(str::to_string),
        })
}

/// Look up the contract of `identity` and check that `instance` satisfies it.
pub fn validate(
    name: &str,
    identity: &PluginIdentity,
    instance: &dyn Connector,
) -> ConnectorResult<Contract> {
    let contract = Contract::from_code(&identity.code()).ok_or_else(|| {
        ConnectorError::UnsupportedInterface {
            name: name.to_string(),
            identity: identity.clone(),
        }
    })?;

    if !satisfies(contract, instance) {
        return Err(ConnectorError::InvalidImplementation {
            name: name.to_string(),
            identity: identity.clone(),
            required: contract.required_capability(),
        });
    }

    Ok(contract)
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect_core::{MemberHooks, ProcessConnector1, ProcessConnector2, ProcessConnector3};
    use std::any::Any;

    #[derive(Default)]
    struct Gen2;

    impl ProcessConnector1 for Gen2 {
        fn is_processable(&self, _function_name: &str) -> bool {
            true
        }

        fn process(&self, _function_name: &str, arguments: &[String]) -> ConnectorResult<Vec<String>> {
            Ok(arguments.to_vec())
        }
    }

    impl ProcessConnector2 for Gen2 {}

    impl Connector for Gen2 {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_process_connector2(&self) -> Option<&dyn ProcessConnector2> {
            Some(self)
        }
    }

    #[derive(Default)]
    struct Gen3;

    impl ProcessConnector1 for Gen3 {
        fn is_processable(&self, _function_name: &str) -> bool {
            true
        }

        fn process(&self, _function_name: &str, _arguments: &[String]) -> ConnectorResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    impl ProcessConnector2 for Gen3 {}
    impl MemberHooks for Gen3 {}
    impl ProcessConnector3 for Gen3 {}

    impl Connector for Gen3 {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_process_connector3(&self) -> Option<&dyn ProcessConnector3> {
            Some(self)
        }
    }

    struct Nothing;

    impl Connector for Nothing {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_structural_match_prefers_newest() {
        assert_eq!(structural_match(&Gen3), Some(Contract::Process3));
        assert_eq!(structural_match(&Gen2), Some(Contract::Process2));
        assert_eq!(structural_match(&Nothing), None);

        assert!(satisfies(Contract::Process1, &Gen3));
        assert!(!satisfies(Contract::Process3, &Gen2));
    }

    #[test]
    fn test_declared_identity_is_authoritative() {
        // Declares GPCI2 although it also satisfies GPCI3 structurally.
        let ty = NativeType::new("demo.Gen3").with_identity(Contract::Process2);
        let identity = resolve_identity("demo.Gen3", &ty, &Gen3).unwrap();
        assert_eq!(identity.code(), "GPCI2");
    }

    #[test]
    fn test_partial_identity_falls_back() {
        let ty = NativeType::new("demo.Gen2").with_constant("INTERFACE_TYPE", "GPCI");
        assert_eq!(resolve_identity("demo.Gen2", &ty, &Gen2).unwrap().code(), "GPCI2");

        let err = resolve_identity("demo.Gen2", &ty, &Nothing).unwrap_err();
        assert_eq!(err.identity(), Some((Some("GPCI"), None)));
    }

    #[test]
    fn test_validate() {
        let identity = Contract::Process3.identity();
        assert_eq!(validate("demo.Gen3", &identity, &Gen3).unwrap(), Contract::Process3);

        let err = validate("demo.Gen2", &identity, &Gen2).unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::InvalidImplementation {
                required: "ProcessConnector3",
                ..
            }
        ));

        let unknown = PluginIdentity::new("ZZZZ", "9");
        assert!(matches!(
            validate("demo.Gen3", &unknown, &Gen3),
            Err(ConnectorError::UnsupportedInterface { .. })
        ));
    }
}
