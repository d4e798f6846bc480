//! Lifecycle driver.
//!
//! Plugins move through `Unconnected -> Connected -> Executing -> Connected
//! -> Unconnected`. At each transition every namespace runs its `pre_` hook
//! before any member is (de)initialized and its `post_` hook after the last
//! one. The permission authorizer is initialized before every other plugin
//! and finalized after every other plugin. Hooks run strictly one after
//! another and the first failure aborts the transition.

use crate::loader::ConnectorContainer;
use connect_core::{
    Contract, ConnectorError, ConnectorResult, EngineConnector, FatalError, MemberHooks,
    NamespaceConnector, ProcessConnector2,
};
use std::fmt;
use tracing::debug;

/// Lifecycle state of the connected plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Unconnected,
    Connected,
    Executing,
}

impl LifecycleState {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Unconnected => "unconnected",
            LifecycleState::Connected => "connected",
            LifecycleState::Executing => "executing",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Connect,
    BeginExecution,
    EndExecution,
    Disconnect,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Connect => "connect",
            Transition::BeginExecution => "begin execution",
            Transition::EndExecution => "end execution",
            Transition::Disconnect => "disconnect",
        }
    }

    /// Get the state the transition starts from.
    pub fn from(&self) -> LifecycleState {
        match self {
            Transition::Connect => LifecycleState::Unconnected,
            Transition::BeginExecution | Transition::Disconnect => LifecycleState::Connected,
            Transition::EndExecution => LifecycleState::Executing,
        }
    }

    /// Get the state the transition leads to.
    pub fn to(&self) -> LifecycleState {
        match self {
            Transition::Connect | Transition::EndExecution => LifecycleState::Connected,
            Transition::BeginExecution => LifecycleState::Executing,
            Transition::Disconnect => LifecycleState::Unconnected,
        }
    }

    /// Check whether the transition initializes rather than finalizes.
    pub fn is_opening(&self) -> bool {
        matches!(self, Transition::Connect | Transition::BeginExecution)
    }

    fn member_hook(&self) -> &'static str {
        match self {
            Transition::Connect => "initialize_for_connection",
            Transition::BeginExecution => "initialize_for_execution",
            Transition::EndExecution => "finalize_for_termination",
            Transition::Disconnect => "finalize_for_disconnection",
        }
    }

    fn pre_hook(&self) -> &'static str {
        match self {
            Transition::Connect => "pre_initialize_for_connection",
            Transition::BeginExecution => "pre_initialize_for_execution",
            Transition::EndExecution => "pre_finalize_for_termination",
            Transition::Disconnect => "pre_finalize_for_disconnection",
        }
    }

    fn post_hook(&self) -> &'static str {
        match self {
            Transition::Connect => "post_initialize_for_connection",
            Transition::BeginExecution => "post_initialize_for_execution",
            Transition::EndExecution => "post_finalize_for_termination",
            Transition::Disconnect => "post_finalize_for_disconnection",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unwrap a container view. A container whose implementation stopped
/// honoring its identity is a broken plugin.
pub(crate) fn fatal<T>(view: Result<T, FatalError>) -> T {
    match view {
        Ok(view) => view,
        Err(e) => panic!("{}", e),
    }
}

fn failed(plugin: &str, hook: &'static str, source: ConnectorError) -> ConnectorError {
    ConnectorError::HookFailed {
        plugin: plugin.to_string(),
        hook,
        source: Box::new(source),
    }
}

fn run_member_hook(
    plugin: &str,
    hooks: &dyn MemberHooks,
    engine: &dyn EngineConnector,
    transition: Transition,
) -> ConnectorResult<()> {
    let result = match transition {
        Transition::Connect => hooks.initialize_for_connection(engine),
        Transition::BeginExecution => hooks.initialize_for_execution(engine),
        Transition::EndExecution => hooks.finalize_for_termination(engine),
        Transition::Disconnect => hooks.finalize_for_disconnection(engine),
    };
    result.map_err(|e| failed(plugin, transition.member_hook(), e))
}

fn run_namespace_hook(
    plugin: &str,
    namespace: &dyn NamespaceConnector,
    engine: &dyn EngineConnector,
    transition: Transition,
    pre: bool,
) -> ConnectorResult<()> {
    let result = match (transition, pre) {
        (Transition::Connect, true) => namespace.pre_initialize_for_connection(engine),
        (Transition::Connect, false) => namespace.post_initialize_for_connection(engine),
        (Transition::BeginExecution, true) => namespace.pre_initialize_for_execution(engine),
        (Transition::BeginExecution, false) => namespace.post_initialize_for_execution(engine),
        (Transition::EndExecution, true) => namespace.pre_finalize_for_termination(engine),
        (Transition::EndExecution, false) => namespace.post_finalize_for_termination(engine),
        (Transition::Disconnect, true) => namespace.pre_finalize_for_disconnection(engine),
        (Transition::Disconnect, false) => namespace.post_finalize_for_disconnection(engine),
    };
    let hook = if pre {
        transition.pre_hook()
    } else {
        transition.post_hook()
    };
    result.map_err(|e| failed(plugin, hook, e))
}

fn is_authorizer(container: &ConnectorContainer) -> bool {
    matches!(
        container.contract(),
        Contract::PermissionAuthorizer1 | Contract::PermissionAuthorizer2
    )
}

fn is_namespace(container: &ConnectorContainer) -> bool {
    matches!(container.contract(), Contract::Namespace1 | Contract::Library1)
}

fn run_authorizer_hooks(
    containers: &[ConnectorContainer],
    engine: &dyn EngineConnector,
    transition: Transition,
) -> ConnectorResult<()> {
    for container in containers.iter().filter(|c| is_authorizer(c)) {
        let authorizer = fatal(container.permission_authorizer1());
        run_member_hook(container.name(), authorizer, engine, transition)?;
    }
    Ok(())
}

fn run_plugin_hooks(
    container: &ConnectorContainer,
    engine: &dyn EngineConnector,
    transition: Transition,
) -> ConnectorResult<()> {
    let plugin = container.name();

    match container.contract() {
        Contract::Function1 => {
            let function = fatal(container.function_connector());
            run_member_hook(plugin, function, engine, transition)
        }
        Contract::Variable1 => {
            let variable = fatal(container.variable_connector());
            run_member_hook(plugin, variable, engine, transition)
        }
        Contract::Namespace1 | Contract::Library1 => {
            let namespace = fatal(container.namespace_connector());
            for function in namespace.functions() {
                run_member_hook(plugin, function.as_ref(), engine, transition)?;
            }
            for variable in namespace.variables() {
                run_member_hook(plugin, variable.as_ref(), engine, transition)?;
            }
            Ok(())
        }
        Contract::Process1 => Ok(()),
        Contract::Process2 => {
            let process = fatal(container.process_connector2());
            run_process_hooks(plugin, process, transition)
        }
        Contract::Process3 => {
            let process = fatal(container.process_connector3());
            if transition.is_opening() {
                run_member_hook(plugin, process, engine, transition)?;
                run_process_hooks(plugin, process, transition)
            } else {
                run_process_hooks(plugin, process, transition)?;
                run_member_hook(plugin, process, engine, transition)
            }
        }
        Contract::PermissionAuthorizer1 | Contract::PermissionAuthorizer2 => Ok(()),
    }
}

fn run_process_hooks(
    plugin: &str,
    process: &dyn ProcessConnector2,
    transition: Transition,
) -> ConnectorResult<()> {
    match transition {
        Transition::BeginExecution => process.init().map_err(|e| failed(plugin, "init", e)),
        Transition::EndExecution => process.dispose().map_err(|e| failed(plugin, "dispose", e)),
        Transition::Connect | Transition::Disconnect => Ok(()),
    }
}

/// Run every hook of `transition` over `containers`, in attach order.
///
/// # Errors
///
/// Returns `HookFailed` for the first hook that fails; no later hook runs.
///
/// # Panics
///
/// Panics when a container's implementation does not provide the contract
/// its identity names.
pub fn run_hooks(
    containers: &[ConnectorContainer],
    engine: &dyn EngineConnector,
    transition: Transition,
) -> ConnectorResult<()> {
    debug!(transition = %transition, plugins = containers.len(), "Running lifecycle hooks");

    if transition.is_opening() {
        run_authorizer_hooks(containers, engine, transition)?;
    }

    for container in containers.iter().filter(|c| is_namespace(c)) {
        let namespace = fatal(container.namespace_connector());
        run_namespace_hook(container.name(), namespace, engine, transition, true)?;
    }

    for container in containers.iter().filter(|c| !is_authorizer(c)) {
        run_plugin_hooks(container, engine, transition)?;
    }

    for container in containers.iter().filter(|c| is_namespace(c)) {
        let namespace = fatal(container.namespace_connector());
        run_namespace_hook(container.name(), namespace, engine, transition, false)?;
    }

    if !transition.is_opening() {
        run_authorizer_hooks(containers, engine, transition)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_states() {
        let cycle = [
            Transition::Connect,
            Transition::BeginExecution,
            Transition::EndExecution,
            Transition::Disconnect,
        ];

        let mut state = LifecycleState::default();
        for transition in cycle {
            assert_eq!(transition.from(), state);
            state = transition.to();
        }
        assert_eq!(state, LifecycleState::Unconnected);
    }

    #[test]
    fn test_opening_transitions() {
        assert!(Transition::Connect.is_opening());
        assert!(Transition::BeginExecution.is_opening());
        assert!(!Transition::EndExecution.is_opening());
        assert!(!Transition::Disconnect.is_opening());
    }
}
