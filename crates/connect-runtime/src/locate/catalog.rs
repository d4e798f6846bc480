use super::{LocateError, LocateResult, TypeLocator};
use crate::native::NativeType;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::debug;

static GLOBAL: LazyLock<Arc<TypeCatalog>> = LazyLock::new(|| Arc::new(TypeCatalog::new()));

/// In-memory registry of native types, keyed by type name.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    types: RwLock<HashMap<String, Arc<NativeType>>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the process-wide catalog of linked native types.
    pub fn global() -> Arc<TypeCatalog> {
        Arc::clone(&GLOBAL)
    }

    /// Register a type, replacing any previous type of the same name.
    pub fn register(&self, ty: NativeType) -> Arc<NativeType> {
        let ty = Arc::new(ty);
        debug!(native_type = %ty.name(), "Registered native type");
        self.types
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ty.name().to_string(), Arc::clone(&ty));
        ty
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<NativeType>> {
        self.types
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<NativeType>> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Get all registered type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TypeLocator for TypeCatalog {
    fn locate(&self, name: &str) -> LocateResult<Arc<NativeType>> {
        self.get(name)
            .ok_or_else(|| LocateError::NotRegistered(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_locate() {
        let catalog = TypeCatalog::new();
        catalog.register(NativeType::new("demo.A"));
        catalog.register(NativeType::new("demo.B"));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names(), vec!["demo.A", "demo.B"]);
        assert_eq!(catalog.locate("demo.A").unwrap().name(), "demo.A");
        assert!(matches!(
            catalog.locate("demo.C"),
            Err(LocateError::NotRegistered(_))
        ));
    }

    #[test]
    fn test_unregister() {
        let catalog = TypeCatalog::new();
        catalog.register(NativeType::new("demo.A"));

        assert!(catalog.unregister("demo.A").is_some());
        assert!(!catalog.contains("demo.A"));
        assert!(catalog.is_empty());
    }
}
