//! # connect-runtime
//!
//! Engine-side machinery of the plugin connector protocol.
//!
//! This crate provides:
//! - Introspection metadata for host-native types ([`NativeType`])
//! - Generic adapters exposing native methods and fields as function and
//!   variable connectors, and the namespace aggregator built on them
//! - Type location through a catalog of linked types and manifests on a
//!   search path
//! - The [`ConnectorLoader`], which resolves and validates plugin identities
//! - Call dispatch for both data exchange modes
//! - The lifecycle driver and the [`PluginRegistry`] of connected plugins
//! - A host engine connector and a map-based permission authorizer
//!
//! ## Loading a plugin
//!
//! ```ignore
//! let loader = ConnectorLoader::with_search_paths(vec!["plugins".into()]);
//! let container = loader.load("demo.Hello")?;
//!
//! let mut registry = PluginRegistry::new();
//! registry.attach(container)?;
//! registry.connect()?;
//! registry.begin_execution()?;
//! let greeting = registry.call("hello", &[Value::from("world")])?;
//! ```

pub mod adapter;
pub mod aggregator;
pub mod dispatch;
pub mod host;
pub mod lifecycle;
pub mod loader;
pub mod locate;
pub mod native;
pub mod registry;

pub use adapter::{FieldAdapter, MethodAdapter};
pub use aggregator::TypeNamespaceAdapter;
pub use dispatch::{strategy_for, CallFrame, ConvertedExchange, ExchangeStrategy, SharedExchange};
pub use host::{HostEngineConnector, MapPermissionAuthorizer, OptionMap};
pub use lifecycle::{LifecycleState, Transition};
pub use loader::{ConnectorContainer, ConnectorLoader};
pub use locate::{
    read_plugin_list, LocateError, SearchPathLocator, TypeCatalog, TypeLocator, TypeManifest,
};
pub use native::{Instance, NativeField, NativeMethod, NativeType};
pub use registry::{PluginInfo, PluginRegistry};
