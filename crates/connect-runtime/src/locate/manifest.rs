//! Type manifest parsing.
//!
//! A manifest `<root>/<name with dots as slashes>.toml` makes a linked native
//! type loadable under a plugin name.

use super::{LocateError, LocateResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Type manifest structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeManifest {
    /// Plugin metadata.
    pub plugin: ManifestMetadata,

    /// Free-form settings for the plugin.
    #[serde(default)]
    pub config: HashMap<String, toml::Value>,
}

/// Plugin metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Name the plugin is loaded by.
    pub name: String,

    /// Name of the linked native type in the catalog.
    pub native_type: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub authors: Vec<String>,

    /// Disabled plugins are found but never loaded.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl TypeManifest {
    /// Load a manifest from a TOML file.
    pub fn from_file(path: &Path) -> LocateResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a manifest from a TOML string.
    pub fn from_str(content: &str) -> LocateResult<Self> {
        let manifest: TypeManifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> LocateResult<()> {
        if self.plugin.name.trim().is_empty() {
            return Err(LocateError::InvalidManifest(
                "Plugin name cannot be empty".to_string(),
            ));
        }

        if self.plugin.native_type.trim().is_empty() {
            return Err(LocateError::InvalidManifest(format!(
                "Native type of {} cannot be empty",
                self.plugin.name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let toml = r#"
[plugin]
name = "demo.Hello"
native_type = "demo.HelloFunction"
description = "Says hello"

[config]
greeting = "Hi"
"#;

        let manifest = TypeManifest::from_str(toml).unwrap();
        assert_eq!(manifest.plugin.name, "demo.Hello");
        assert_eq!(manifest.plugin.native_type, "demo.HelloFunction");
        assert!(manifest.plugin.enabled);
        assert_eq!(
            manifest.config.get("greeting").and_then(|v| v.as_str()),
            Some("Hi")
        );
    }

    #[test]
    fn test_invalid_manifest() {
        let toml = r#"
[plugin]
name = "demo.Hello"
native_type = ""
"#;

        let result = TypeManifest::from_str(toml);
        assert!(matches!(result, Err(LocateError::InvalidManifest(_))));
    }
}
