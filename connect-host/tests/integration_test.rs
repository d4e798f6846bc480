//! Integration tests for connect-host.
//!
//! These tests cover:
//! - Loading a configuration and a plugin list from disk
//! - One full cycle over the demo plugins
//! - Permission checks through the map authorizer

use connect_core::permission::names;
use connect_core::{
    Connector, ConnectorResult, Contract, FunctionConnector, MemberHooks, PermissionSet,
    PermissionValue, Value, ValueType,
};
use connect_host::config::{CallConfig, Config, NamespaceConfig, ProcessCallConfig};
use connect_host::demo::{register_demo_types, ECHO_TYPE, GREETER_TYPE, MATH_TYPE};
use connect_host::session::HostSession;
use connect_runtime::host::MAP_AUTHORIZER_TYPE;
use connect_runtime::{read_plugin_list, LifecycleState, NativeType, TypeCatalog};
use std::any::Any;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// ==============================================================================
// Test Fixture Helpers
// ==============================================================================

fn write_manifest(root: &Path, name: &str) {
    let mut path = root.to_path_buf();
    for segment in name.split('.') {
        path.push(segment);
    }
    path.set_extension("toml");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        &path,
        format!("[plugin]\nname = \"{}\"\nnative_type = \"{}\"\n", name, name),
    )
    .unwrap();
}

/// Write manifests for every demo plugin and a config pointing at them.
fn setup_host(temp_dir: &TempDir, extra_config: &str) -> Config {
    let plugins = temp_dir.path().join("plugins");
    for name in [GREETER_TYPE, ECHO_TYPE, MAP_AUTHORIZER_TYPE] {
        write_manifest(&plugins, name);
    }

    let list = temp_dir.path().join("plugins.txt");
    fs::write(
        &list,
        "# demo plugins\n./demo/Greeter.class\n\ndemo.Echo\ndemo.Missing\nconnect.host.MapPermissionAuthorizer\n",
    )
    .unwrap();

    let config_path = temp_dir.path().join("config.toml");
    let content = format!(
        r#"
[host]
plugin_list = "{}"

[loader]
search_paths = ["{}"]

[options]
greeting = "Welcome"

[permissions]
DEFAULT = "DENY"
{}
"#,
        list.display(),
        plugins.display(),
        extra_config
    );
    fs::write(&config_path, content).unwrap();

    Config::load(&config_path).unwrap()
}

fn demo_catalog() -> Arc<TypeCatalog> {
    let catalog = Arc::new(TypeCatalog::new());
    register_demo_types(&catalog);
    catalog
}

const READER_TYPE: &str = "test.Reader";

/// Declares FILE_WRITE unnecessary and says nothing about the rest.
#[derive(Default)]
struct Reader;

impl MemberHooks for Reader {}

impl FunctionConnector for Reader {
    fn function_name(&self) -> &str {
        "read"
    }

    fn parameter_types(&self) -> Vec<ValueType> {
        vec![]
    }

    fn return_type(&self, _parameter_types: &[ValueType]) -> ValueType {
        ValueType::Text
    }

    fn permissions(&self) -> PermissionSet {
        PermissionSet::new([names::NONE], [names::FILE_WRITE])
    }

    fn invoke(&self, _arguments: &[Value]) -> ConnectorResult<Value> {
        Ok(Value::from("contents"))
    }
}

impl Connector for Reader {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_function_connector(&self) -> Option<&dyn FunctionConnector> {
        Some(self)
    }
}

/// Load the reader and the map authorizer with `config`'s permission map.
fn reader_session(temp_dir: &TempDir, config: &Config) -> HostSession {
    let plugins = temp_dir.path().join("plugins");
    write_manifest(&plugins, READER_TYPE);

    let catalog = demo_catalog();
    catalog.register(
        NativeType::new(READER_TYPE)
            .with_identity(Contract::Function1)
            .with_default_constructor::<Reader>(),
    );

    let mut session = HostSession::with_catalog(config, catalog).unwrap();
    let names = [READER_TYPE.to_string(), MAP_AUTHORIZER_TYPE.to_string()];
    assert_eq!(session.load_plugins(&names), 2);
    session
}

fn call(function: &str, arguments: Vec<Value>) -> CallConfig {
    CallConfig {
        function: function.to_string(),
        arguments,
    }
}

fn process(function: &str, arguments: &[&str]) -> ProcessCallConfig {
    ProcessCallConfig {
        function: function.to_string(),
        arguments: arguments.iter().map(|a| a.to_string()).collect(),
    }
}

// ==============================================================================
// Tests
// ==============================================================================

#[test]
fn test_load_plugins_from_list() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup_host(&temp_dir, "");

    let names = read_plugin_list(&config.host.plugin_list).unwrap();
    assert_eq!(
        names,
        vec![GREETER_TYPE, ECHO_TYPE, "demo.Missing", MAP_AUTHORIZER_TYPE]
    );

    let mut session = HostSession::with_catalog(&config, demo_catalog()).unwrap();
    assert_eq!(session.load_plugins(&names), 3);
    assert_eq!(
        session.registry().plugin_names(),
        vec![GREETER_TYPE, ECHO_TYPE, MAP_AUTHORIZER_TYPE]
    );
    assert!(session.registry().engine().has_authorizer());
    assert_eq!(
        session.registry().engine().permission_map().get("DEFAULT"),
        Some(&PermissionValue::Deny)
    );
}

#[test]
fn test_full_cycle() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup_host(&temp_dir, "");
    let names = read_plugin_list(&config.host.plugin_list).unwrap();

    let mut session = HostSession::with_catalog(&config, demo_catalog()).unwrap();
    session.load_plugins(&names);
    session
        .connect_namespaces(&[NamespaceConfig {
            type_name: MATH_TYPE.to_string(),
            alias: None,
        }])
        .unwrap();

    let calls = [
        call("hello", vec![Value::from("Ada")]),
        call("Math.sum", vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        call("hello", vec![Value::Int(1)]),
    ];
    let processes = [process("echo", &["a", "b"]), process("exec", &["true"])];
    let report = session.run_cycle(&calls, &processes).unwrap();

    let results: Vec<_> = report.outcomes.iter().map(|o| o.result.clone()).collect();
    assert_eq!(results[0], Ok("Welcome, Ada!".to_string()));
    assert_eq!(results[1], Ok("6".to_string()));
    assert!(results[2].is_err());
    assert_eq!(results[3], Ok("a b".to_string()));

    // SYSTEM_PROCESS falls back to DEFAULT.
    let denied = results[4].as_ref().unwrap_err();
    assert!(denied.contains("SYSTEM_PROCESS"));

    assert_eq!(report.plugins.len(), 4);
    assert!(report.plugins.iter().all(|p| !p.failed));
    assert_eq!(session.registry().state(), LifecycleState::Unconnected);
}

#[test]
fn test_ask_without_confirmation_denies() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup_host(&temp_dir, "SYSTEM_PROCESS = \"ASK\"");
    let names = read_plugin_list(&config.host.plugin_list).unwrap();

    let mut session = HostSession::with_catalog(&config, demo_catalog()).unwrap();
    session.load_plugins(&names);

    let report = session
        .run_cycle(&[], &[process("exec", &["true"])])
        .unwrap();
    assert!(report.outcomes[0].result.is_err());
}

#[test]
fn test_missing_plugin_list() {
    let temp_dir = TempDir::new().unwrap();
    assert!(read_plugin_list(&temp_dir.path().join("absent.txt")).is_err());
}

#[test]
fn test_transition_failure_stops_cycle() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = setup_host(&temp_dir, "");
    config
        .options
        .insert("greeting".to_string(), Value::Int(42));
    let names = read_plugin_list(&config.host.plugin_list).unwrap();

    let mut session = HostSession::with_catalog(&config, demo_catalog()).unwrap();
    session.load_plugins(&names);

    // The greeter rejects a non-text greeting at connection.
    let err = session.run_cycle(&[], &[]).unwrap_err();
    assert!(err.to_string().contains("Connection failed"));
    assert!(session.registry().is_failed(GREETER_TYPE));
    assert_eq!(session.registry().state(), LifecycleState::Unconnected);
}

#[test]
fn test_unspecified_permissions_follow_default() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup_host(&temp_dir, "");

    let mut session = reader_session(&temp_dir, &config);
    let report = session.run_cycle(&[call("read", vec![])], &[]).unwrap();
    assert!(report.outcomes[0].result.is_err());

    let mut allowing = config.clone();
    allowing
        .permissions
        .insert(names::DEFAULT.to_string(), PermissionValue::Allow);
    allowing
        .permissions
        .insert(names::FILE_READ.to_string(), PermissionValue::Deny);

    let mut session = reader_session(&temp_dir, &allowing);
    let report = session.run_cycle(&[call("read", vec![])], &[]).unwrap();
    let denied = report.outcomes[0].result.as_ref().unwrap_err();
    assert!(denied.contains(names::FILE_READ));

    allowing.permissions.remove(names::FILE_READ);
    let mut session = reader_session(&temp_dir, &allowing);
    let report = session.run_cycle(&[call("read", vec![])], &[]).unwrap();
    assert_eq!(report.outcomes[0].result, Ok("contents".to_string()));
}
