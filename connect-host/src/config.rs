//! Host configuration.
//!
//! The host reads `config.toml` from the platform configuration directory
//! unless a path is given. A missing file is replaced by a commented default.

use anyhow::{Context, Result};
use connect_core::permission::{is_known, names};
use connect_core::{PermissionMap, PermissionValue, Value};
use connect_runtime::OptionMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Main host configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Host-specific configuration
    #[serde(default)]
    pub host: HostConfig,
    /// Type location configuration
    #[serde(default)]
    pub loader: LoaderConfig,
    /// Engine options handed to plugins
    #[serde(default)]
    pub options: OptionMap,
    /// Base permission map of the authorizer
    #[serde(default = "default_permissions")]
    pub permissions: PermissionMap,
    /// Native types connected directly as namespaces
    #[serde(default, rename = "namespace", skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<NamespaceConfig>,
    /// Function calls made during the execution
    #[serde(default, rename = "call", skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallConfig>,
    /// Legacy process calls made during the execution
    #[serde(default, rename = "process", skip_serializing_if = "Vec::is_empty")]
    pub processes: Vec<ProcessCallConfig>,
}

/// Host configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    /// Log level (trace, debug, info, warn, error)
    /// Default: "info"
    pub log_level: String,
    /// File listing the plugins to load, one name per line
    /// Default: "plugins.txt"
    pub plugin_list: PathBuf,
}

/// Type location configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Roots searched for type manifests, in priority order
    /// Default: ["."]
    pub search_paths: Vec<PathBuf>,
}

/// A native type connected as a namespace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamespaceConfig {
    /// Name of the type in the catalog
    #[serde(rename = "type")]
    pub type_name: String,
    /// Namespace name, defaults to the simple name of the type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// A function call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallConfig {
    /// Function name, optionally qualified as `namespace.function`
    pub function: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

/// A legacy process call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessCallConfig {
    pub function: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

fn default_permissions() -> PermissionMap {
    PermissionMap::from([(names::DEFAULT.to_string(), PermissionValue::Deny)])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: HostConfig::default(),
            loader: LoaderConfig::default(),
            options: OptionMap::new(),
            permissions: default_permissions(),
            namespaces: Vec::new(),
            calls: Vec::new(),
            processes: Vec::new(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            plugin_list: PathBuf::from("plugins.txt"),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from(".")],
        }
    }
}

impl Config {
    /// Read, parse and validate the configuration file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from its default location, writing the
    /// commented default file first when none exists
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_file(&config_path)?;
        }

        Self::load(&config_path)
    }

    /// `$XDG_CONFIG_HOME/connect/config.toml` on Linux
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "raibid-labs", "connect")
            .context("Failed to determine project directories")?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    fn create_default_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config file: {}", path.display()))?;

        tracing::info!("Created default configuration file at: {}", path.display());
        Ok(())
    }

    fn default_config_content() -> String {
        r#"# Connect Host Configuration

[host]
# Log level: trace, debug, info, warn, error
# Default: "info"
log_level = "info"

# File listing the plugins to load, one name per line.
# Blank lines and lines starting with '#' are ignored.
# Default: "plugins.txt"
plugin_list = "plugins.txt"

[loader]
# Roots searched for type manifests (<root>/<name as path>.toml).
# Earlier roots take priority.
# Default: ["."]
search_paths = ["."]

# Engine options, readable by plugins while they are connected.
[options]
# greeting = "Hello"

# Base permission map of the permission authorizer.
# Values: "ALLOW", "DENY", "ASK". Unlisted permissions fall back to DEFAULT.
[permissions]
DEFAULT = "DENY"
# FILE_READ = "ALLOW"

# Native types connected directly as namespaces.
# [[namespace]]
# type = "demo.Math"
# alias = "math"

# Function calls made during the execution.
# [[call]]
# function = "hello"
# arguments = ["world"]

# Legacy process calls made during the execution.
# [[process]]
# function = "exec"
# arguments = ["echo", "hi"]
"#
        .to_string()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.host.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log_level: {}. Must be one of: {}",
                self.host.log_level,
                valid_log_levels.join(", ")
            );
        }

        if self.loader.search_paths.is_empty() {
            anyhow::bail!("loader.search_paths must name at least one root");
        }

        for call in &self.calls {
            if call.function.trim().is_empty() {
                anyhow::bail!("call.function cannot be empty");
            }
        }

        for namespace in &self.namespaces {
            if namespace.type_name.trim().is_empty() {
                anyhow::bail!("namespace.type cannot be empty");
            }
        }

        // Engine-specific permissions are allowed, they just negotiate by name.
        for name in self.permissions.keys().filter(|name| !is_known(name)) {
            warn!(permission = %name, "Unknown permission name in configuration");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host.log_level, "info");
        assert_eq!(config.host.plugin_list, PathBuf::from("plugins.txt"));
        assert_eq!(config.loader.search_paths, vec![PathBuf::from(".")]);
        assert!(config.options.is_empty());
        assert_eq!(
            config.permissions.get(names::DEFAULT),
            Some(&PermissionValue::Deny)
        );
    }

    #[test]
    fn test_default_content_parses() {
        let config: Config = toml::from_str(&Config::default_config_content()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[host]
log_level = "debug"
plugin_list = "plugins/plugins.txt"

[loader]
search_paths = ["plugins", "/opt/connect"]

[options]
greeting = "Hi"
retries = 3

[permissions]
DEFAULT = "DENY"
FILE_READ = "ALLOW"
SYSTEM_PROCESS = "ASK"

[[namespace]]
type = "demo.Math"
alias = "math"

[[call]]
function = "math.max"
arguments = [3, 7]

[[process]]
function = "exec"
arguments = ["echo", "hi"]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.host.log_level, "debug");
        assert_eq!(config.loader.search_paths.len(), 2);
        assert_eq!(config.options.get("greeting"), Some(&Value::from("Hi")));
        assert_eq!(config.options.get("retries"), Some(&Value::Int(3)));
        assert_eq!(
            config.permissions.get("FILE_READ"),
            Some(&PermissionValue::Allow)
        );
        assert_eq!(config.namespaces[0].alias.as_deref(), Some("math"));
        assert_eq!(config.calls[0].arguments, vec![Value::Int(3), Value::Int(7)]);
        assert_eq!(config.processes[0].arguments, vec!["echo", "hi"]);
    }

    #[test]
    fn test_load_minimal_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[host]\nlog_level = \"warn\"\nplugin_list = \"list.txt\"\n").unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.host.log_level, "warn");
        assert_eq!(config.loader, LoaderConfig::default());
        assert_eq!(config.permissions, default_permissions());
        assert!(config.calls.is_empty());
    }

    #[test]
    fn test_load_rejects_unknown_permission_value() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[permissions]\nFILE_READ = \"MAYBE\"\n").unwrap();

        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.host.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_search_paths() {
        let mut config = Config::default();
        config.loader.search_paths.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_engine_specific_permission() {
        let mut config = Config::default();
        config
            .permissions
            .insert("NETWORK_ACCESS".to_string(), PermissionValue::Ask);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config_roundtrip() {
        let mut config = Config::default();
        config.host.log_level = "debug".to_string();
        config.options.insert("greeting".to_string(), Value::from("Hey"));
        config.calls.push(CallConfig {
            function: "hello".to_string(),
            arguments: vec![Value::from("world")],
        });

        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, deserialized);
    }
}
