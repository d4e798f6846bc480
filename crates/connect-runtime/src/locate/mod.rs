//! Type location.
//!
//! A [`TypeLocator`] turns a plugin name into a [`NativeType`]. Native types
//! are linked into the host and registered in a [`TypeCatalog`]; the
//! [`SearchPathLocator`] additionally requires a manifest on its search path
//! to make a registered type loadable by name.

mod catalog;
mod list;
mod manifest;
mod search;

pub use catalog::TypeCatalog;
pub use list::{normalize_plugin_name, parse_plugin_list, read_plugin_list};
pub use manifest::{ManifestMetadata, TypeManifest};
pub use search::{DiscoveredType, SearchPathLocator};

use crate::native::NativeType;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while locating a type.
#[derive(Error, Debug)]
pub enum LocateError {
    /// No manifest for the name exists on the search path.
    #[error("No manifest for {name} on the search path {searched:?}")]
    NotFound { name: String, searched: Vec<PathBuf> },

    /// The native type is not linked into the host.
    #[error("Native type not registered: {0}")]
    NotRegistered(String),

    /// The manifest disables the plugin.
    #[error("Plugin is disabled: {0}")]
    Disabled(String),

    /// The manifest parsed but is not valid.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for type location.
pub type LocateResult<T> = std::result::Result<T, LocateError>;

/// Resolves plugin names to native types.
pub trait TypeLocator: Send + Sync {
    fn locate(&self, name: &str) -> LocateResult<Arc<NativeType>>;
}
