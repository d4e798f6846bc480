//! Host session: loads the configured plugins and drives one execution.

use crate::config::{CallConfig, Config, NamespaceConfig, ProcessCallConfig};
use anyhow::{Context, Result};
use connect_core::permission::PERMISSION_UNIVERSE;
use connect_core::{ConnectorResult, Requirement, Value, ValueType};
use connect_runtime::{
    ConnectorLoader, HostEngineConnector, PluginInfo, PluginRegistry, SearchPathLocator,
    TypeCatalog, TypeLocator,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one configured call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    /// Name of the called function or process function.
    pub target: String,
    /// Rendered return value, or the error message.
    pub result: Result<String, String>,
}

/// Everything a finished cycle reports.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub outcomes: Vec<CallOutcome>,
    pub plugins: Vec<PluginInfo>,
}

/// A loader and a registry wired from one configuration.
pub struct HostSession {
    loader: ConnectorLoader,
    catalog: Arc<TypeCatalog>,
    registry: PluginRegistry,
}

impl HostSession {
    /// Create a session locating types in the process-wide catalog.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_catalog(config, TypeCatalog::global())
    }

    /// Create a session locating types in `catalog`.
    pub fn with_catalog(config: &Config, catalog: Arc<TypeCatalog>) -> Result<Self> {
        let roots: Vec<PathBuf> = config.loader.search_paths.clone();
        let locator_catalog = Arc::clone(&catalog);
        let loader = ConnectorLoader::with_locator_factory(move || {
            Arc::new(SearchPathLocator::new(roots.clone(), Arc::clone(&locator_catalog)))
                as Arc<dyn TypeLocator>
        });

        let engine = HostEngineConnector::new()
            .with_options(config.options.clone())
            .with_permission_map(config.permissions.clone())
            .context("Failed to apply the permission map")?;

        Ok(Self {
            loader,
            catalog,
            registry: PluginRegistry::with_engine(engine),
        })
    }

    /// Load and attach every plugin in `names`.
    ///
    /// Plugins that fail to load are logged and skipped. Returns the number
    /// of attached plugins.
    pub fn load_plugins(&mut self, names: &[String]) -> usize {
        let mut attached = 0;

        for name in names {
            let result = self
                .loader
                .load(name)
                .and_then(|container| self.registry.attach(container));
            match result {
                Ok(()) => attached += 1,
                Err(e) => warn!(plugin = %name, "Skipping plugin: {}", e),
            }
        }

        info!("Attached {} of {} plugin(s)", attached, names.len());
        attached
    }

    /// Connect catalog types directly as namespaces.
    pub fn connect_namespaces(&mut self, namespaces: &[NamespaceConfig]) -> Result<()> {
        for namespace in namespaces {
            let ty = self
                .catalog
                .get(&namespace.type_name)
                .with_context(|| format!("Unknown native type: {}", namespace.type_name))?;
            self.registry
                .connect_native(&ty, None, namespace.alias.as_deref())
                .with_context(|| format!("Failed to connect {}", namespace.type_name))?;
        }
        Ok(())
    }

    /// Connect, execute the configured calls, then terminate and disconnect.
    ///
    /// A failing call is reported in its outcome and does not stop the
    /// cycle. A failing transition does.
    pub fn run_cycle(
        &mut self,
        calls: &[CallConfig],
        processes: &[ProcessCallConfig],
    ) -> Result<CycleReport> {
        self.registry.connect().context("Connection failed")?;

        if let Err(e) = self.registry.begin_execution() {
            self.shutdown();
            return Err(e).context("Execution start failed");
        }

        let mut outcomes = Vec::with_capacity(calls.len() + processes.len());
        for call in calls {
            let result = self.call(call);
            outcomes.push(Self::outcome(&call.function, result.map(|v| v.to_string())));
        }
        for process in processes {
            let result = self.process(process);
            outcomes.push(Self::outcome(&process.function, result.map(|v| v.join("\n"))));
        }

        self.registry.end_execution().context("Execution end failed")?;
        let plugins = self.registry.list_plugins();
        self.registry.disconnect().context("Disconnection failed")?;

        Ok(CycleReport { outcomes, plugins })
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.registry.disconnect() {
            warn!("Disconnection after a failed start failed: {}", e);
        }
    }

    fn outcome(target: &str, result: ConnectorResult<String>) -> CallOutcome {
        if let Err(e) = &result {
            warn!(target = %target, "Call failed: {}", e);
        }
        CallOutcome {
            target: target.to_string(),
            result: result.map_err(|e| e.to_string()),
        }
    }

    /// Request every permission the call does not declare as unnecessary.
    ///
    /// Permissions left unspecified are requested too, so the authorizer's
    /// `DEFAULT` decides them.
    fn call(&self, call: &CallConfig) -> ConnectorResult<Value> {
        let argument_types: Vec<ValueType> = call.arguments.iter().map(Value::value_type).collect();
        for permission in PERMISSION_UNIVERSE {
            let requirement =
                self.registry
                    .permission_requirement(&call.function, &argument_types, permission)?;
            if requirement != Requirement::NotRequired {
                self.registry
                    .request_permission(permission, &call.function, None)?;
            }
        }
        self.registry.call(&call.function, &call.arguments)
    }

    fn process(&self, process: &ProcessCallConfig) -> ConnectorResult<Vec<String>> {
        for permission in PERMISSION_UNIVERSE {
            if self
                .registry
                .process_permission_requirement(&process.function, permission)?
                != Requirement::NotRequired
            {
                let meta = process.arguments.join(" ");
                self.registry
                    .request_permission(permission, &process.function, Some(&meta))?;
            }
        }
        self.registry.process(&process.function, &process.arguments)
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }
}
