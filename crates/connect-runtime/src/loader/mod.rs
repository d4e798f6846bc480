//! Connector loading.
//!
//! Loading a plugin by name locates its native type, instantiates it,
//! resolves the contract identity it implements and checks the instance
//! against that contract. The result is a [`ConnectorContainer`].

mod container;
pub mod contracts;

pub use container::ConnectorContainer;

use crate::locate::{SearchPathLocator, TypeCatalog, TypeLocator};
use crate::native::NativeType;
use connect_core::{ConnectorError, ConnectorResult};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

type LocatorFactory = Box<dyn Fn() -> Arc<dyn TypeLocator> + Send + Sync>;

/// Loads plugins by name.
///
/// The type locator is built on first use, at most once per loader, even
/// when the first loads happen concurrently.
pub struct ConnectorLoader {
    locator: Mutex<Option<Arc<dyn TypeLocator>>>,
    factory: LocatorFactory,
}

impl ConnectorLoader {
    /// Create a loader searching the current directory for manifests of
    /// types in the global catalog.
    pub fn new() -> Self {
        Self::with_locator_factory(|| {
            Arc::new(SearchPathLocator::current_dir()) as Arc<dyn TypeLocator>
        })
    }

    /// Create a loader using an existing locator.
    pub fn with_locator(locator: Arc<dyn TypeLocator>) -> Self {
        Self {
            locator: Mutex::new(Some(locator)),
            factory: Box::new(|| Arc::new(TypeCatalog::new()) as Arc<dyn TypeLocator>),
        }
    }

    /// Create a loader searching `roots` for manifests of types in the
    /// global catalog.
    pub fn with_search_paths(roots: Vec<PathBuf>) -> Self {
        Self::with_locator_factory(move || {
            Arc::new(SearchPathLocator::new(roots.clone(), TypeCatalog::global()))
                as Arc<dyn TypeLocator>
        })
    }

    /// Create a loader whose locator is built by `factory` on first use.
    pub fn with_locator_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<dyn TypeLocator> + Send + Sync + 'static,
    {
        Self {
            locator: Mutex::new(None),
            factory: Box::new(factory),
        }
    }

    /// Get the type locator, building it on first use.
    pub fn locator(&self) -> Arc<dyn TypeLocator> {
        let mut guard = self.locator.lock().unwrap_or_else(PoisonError::into_inner);
        let locator = guard.get_or_insert_with(|| {
            debug!("Building type locator");
            (self.factory)()
        });
        Arc::clone(locator)
    }

    /// Load the plugin named `name`.
    ///
    /// # Errors
    ///
    /// Returns `TypeNotFound` when the type cannot be located,
    /// `NoConstructor` or `InstantiationFailed` when it cannot be
    /// instantiated, and `UnknownInterface`, `UnsupportedInterface` or
    /// `InvalidImplementation` when its identity cannot be resolved or is
    /// not honored by the instance.
    pub fn load(&self, name: &str) -> ConnectorResult<ConnectorContainer> {
        let ty = self
            .locator()
            .locate(name)
            .map_err(|e| ConnectorError::TypeNotFound {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        self.load_type(name, &ty)
    }

    /// Load an already located type under the plugin name `name`.
    pub fn load_type(&self, name: &str, ty: &NativeType) -> ConnectorResult<ConnectorContainer> {
        let instance = ty.instantiate()?;
        let identity = contracts::resolve_identity(name, ty, instance.as_ref())?;
        let contract = contracts::validate(name, &identity, instance.as_ref())?;

        info!(plugin = %name, contract = %contract, "Loaded plugin");
        Ok(ConnectorContainer::new(name, instance, identity, contract))
    }
}

impl Default for ConnectorLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnectorLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let built = self
            .locator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        f.debug_struct("ConnectorLoader")
            .field("locator_built", &built)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect_core::{Connector, Contract, FunctionConnector, MemberHooks, Value, ValueType};
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Answer;

    impl MemberHooks for Answer {}

    impl FunctionConnector for Answer {
        fn function_name(&self) -> &str {
            "answer"
        }

        fn parameter_types(&self) -> Vec<ValueType> {
            Vec::new()
        }

        fn return_type(&self, _parameter_types: &[ValueType]) -> ValueType {
            ValueType::Int64
        }

        fn invoke(&self, _arguments: &[Value]) -> ConnectorResult<Value> {
            Ok(Value::Int(42))
        }
    }

    impl Connector for Answer {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_function_connector(&self) -> Option<&dyn FunctionConnector> {
            Some(self)
        }
    }

    fn catalog() -> Arc<TypeCatalog> {
        let catalog = Arc::new(TypeCatalog::new());
        catalog.register(
            NativeType::new("demo.Answer")
                .with_identity(Contract::Function1)
                .with_default_constructor::<Answer>(),
        );
        catalog.register(NativeType::new("demo.Abstract").with_identity(Contract::Function1));
        catalog.register(
            NativeType::new("demo.Liar")
                .with_identity(Contract::Variable1)
                .with_default_constructor::<Answer>(),
        );
        catalog
    }

    #[test]
    fn test_load_declared_function() {
        let loader = ConnectorLoader::with_locator(catalog());
        let container = loader.load("demo.Answer").unwrap();

        assert_eq!(container.identity().code(), "XFCI1");
        assert_eq!(container.contract(), Contract::Function1);
        let function = container.function_connector().unwrap();
        assert_eq!(function.invoke(&[]).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_load_failures() {
        let loader = ConnectorLoader::with_locator(catalog());

        assert!(matches!(
            loader.load("demo.Missing"),
            Err(ConnectorError::TypeNotFound { .. })
        ));
        assert!(matches!(
            loader.load("demo.Abstract"),
            Err(ConnectorError::NoConstructor { .. })
        ));
        assert!(matches!(
            loader.load("demo.Liar"),
            Err(ConnectorError::InvalidImplementation {
                required: "VariableConnector",
                ..
            })
        ));
    }

    #[test]
    fn test_locator_is_built_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let loader = ConnectorLoader::with_locator_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(10));
            catalog() as Arc<dyn TypeLocator>
        });

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| loader.load("demo.Answer").map(|_| ()));
            }
        });

        assert_eq!(built.load(Ordering::SeqCst), 1);
    }
}
