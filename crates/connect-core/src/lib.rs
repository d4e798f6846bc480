//! # connect-core
//!
//! Capability contracts for the plugin connector protocol.
//!
//! This crate provides:
//! - The contracts a plugin may implement (function, variable, namespace,
//!   legacy process, permission authorizer) and the engine-side connector
//! - Contract identities (`XFCI1`, `GPCI3`, ...)
//! - Permission names, legacy permission codes and permission negotiation
//! - The array/scalar data accessors used for zero-copy exchange
//!
//! ## Capability discovery
//!
//! A loaded plugin is an `Arc<dyn Connector>`. Each contract is reachable
//! through an `as_*` view on [`Connector`]; a view that returns `None`
//! means the plugin does not satisfy that contract. Newer generations of the
//! legacy process contract are supersets of older ones, so a plugin that
//! exposes generation 3 satisfies generations 2 and 1 as well.

pub mod accessor;
pub mod contract;
pub mod error;
pub mod identity;
pub mod permission;
pub mod value;

pub use accessor::{
    ArrayDataAccessor, ArrayDataContainer, BoolScalarDataAccessor, DataContainer,
    Float64ScalarDataAccessor, StringScalarDataAccessor,
};
pub use contract::{
    other_engine_connector, Connector, DataExchangeMode, EngineConnector, FunctionConnector,
    MemberHooks, NamespaceConnector, PermissionAuthorizer1, PermissionAuthorizer2, PermissionMap,
    PermissionScope, ProcessConnector1, ProcessConnector2, ProcessConnector3, VariableConnector,
};
pub use error::{ConnectorError, ConnectorResult, FatalError, NativeFault};
pub use identity::{Contract, PluginIdentity};
pub use permission::{effective_required, PermissionSet, PermissionValue, Requirement};
pub use value::{Value, ValueType};
