//! # connect-host
//!
//! Host for connector plugins.
//!
//! The host:
//! - Reads its configuration (options, base permission map, search path)
//! - Loads the plugins named in the plugin list file
//! - Connects native types directly as namespaces
//! - Drives one full cycle: connect, execute the configured calls,
//!   terminate and disconnect
//!
//! ## Configuration
//!
//! The host reads `$XDG_CONFIG_HOME/connect/config.toml`, or the file given
//! as the first argument.
//!
//! ## Running
//!
//! ```bash
//! cargo run --bin connect-host -- plugins/connect.toml
//!
//! # With debug logging
//! RUST_LOG=debug cargo run --bin connect-host -- plugins/connect.toml
//! ```

use anyhow::{Context, Result};
use connect_host::config::Config;
use connect_host::demo::register_demo_types;
use connect_host::session::HostSession;
use connect_runtime::{read_plugin_list, TypeCatalog};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn load_config() -> Result<Config> {
    match std::env::args().nth(1) {
        Some(path) => Config::load(&path),
        None => Config::load_default(),
    }
}

fn run(config: Config) -> Result<()> {
    register_demo_types(&TypeCatalog::global());

    let names = read_plugin_list(&config.host.plugin_list).with_context(|| {
        format!(
            "Failed to read plugin list: {}",
            config.host.plugin_list.display()
        )
    })?;

    let mut session = HostSession::new(&config)?;
    session.load_plugins(&names);
    session.connect_namespaces(&config.namespaces)?;

    let report = session.run_cycle(&config.calls, &config.processes)?;
    for plugin in &report.plugins {
        info!(
            "Plugin: {} ({}){}",
            plugin.name,
            plugin.contract,
            if plugin.failed { " - failed" } else { "" }
        );
    }
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(value) => info!("{} => {}", outcome.target, value),
            Err(e) => info!("{} failed: {}", outcome.target, e),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.host.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting connect-host v{}", env!("CARGO_PKG_VERSION"));

    // Plugin code is synchronous and may block.
    tokio::task::spawn_blocking(move || run(config))
        .await
        .context("Plugin task panicked")??;

    info!("Host stopped");
    Ok(())
}
