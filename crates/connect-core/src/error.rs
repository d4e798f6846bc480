//! Error types for the connector protocol.
//!
//! Two severities are kept apart. [`ConnectorError`] is recoverable and must
//! be handled or propagated by the engine. [`FatalError`] signals a broken
//! plugin or engine, for example a container whose identity contradicts the
//! capabilities of its implementation.

use crate::contract::DataExchangeMode;
use crate::identity::PluginIdentity;
use thiserror::Error;

/// Error raised by native plugin code, kept as the source of a
/// [`ConnectorError`].
pub type NativeFault = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Recoverable errors of the connector protocol.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// The type could not be located.
    #[error("Loading failed: {name} ({reason})")]
    TypeNotFound { name: String, reason: String },

    /// The type has no accessible no-argument constructor.
    #[error("Instantiation failed: {name} has no accessible no-argument constructor")]
    NoConstructor { name: String },

    /// The constructor of the type raised an error.
    #[error("Instantiation failed: {name}")]
    InstantiationFailed {
        name: String,
        #[source]
        source: NativeFault,
    },

    /// Neither a declared identity nor a structural match was found.
    #[error(
        "Invalid implementation (unknown interface): {name} (interface-type-id: {}, interface-generation: {})",
        .type_id.as_deref().unwrap_or("null"),
        .generation.as_deref().unwrap_or("null")
    )]
    UnknownInterface {
        name: String,
        type_id: Option<String>,
        generation: Option<String>,
    },

    /// The identity does not name any registered contract.
    #[error("Invalid implementation (unsupported interface): {name} ({identity})")]
    UnsupportedInterface {
        name: String,
        identity: PluginIdentity,
    },

    /// The instance does not satisfy the contract its identity names.
    #[error("Invalid implementation (should implement {required}): {name}")]
    InvalidImplementation {
        name: String,
        identity: PluginIdentity,
        required: &'static str,
    },

    /// No member matches the given argument shapes.
    #[error("{owner} has no member named \"{member}\" with expected parameters ({reason})")]
    SignatureMismatch {
        owner: String,
        member: String,
        reason: String,
    },

    /// The member exists but is not accessible.
    #[error("The member \"{member}\" of {owner} is not accessible ({reason})")]
    AccessViolation {
        owner: String,
        member: String,
        reason: String,
    },

    /// An instance member was used without a bound instance.
    #[error("The member \"{member}\" of {owner} requires a bound instance")]
    MissingInstance { owner: String, member: String },

    /// The native member raised an error.
    #[error("The member \"{member}\" of {owner} raised an error: {source}")]
    Raised {
        owner: String,
        member: String,
        #[source]
        source: NativeFault,
    },

    /// The operation was called with a calling convention it does not use.
    #[error("{name} does not support {operation} (data exchange: {expected})")]
    ExchangeMismatch {
        name: String,
        operation: &'static str,
        expected: DataExchangeMode,
    },

    /// The permission request was denied.
    #[error("Permission denied: {permission} (requested by {requester}): {reason}")]
    PermissionDenied {
        permission: String,
        requester: String,
        reason: String,
    },

    /// A permission was requested while no authorizer is connected.
    #[error("No permission authorizer is connected (requested: {permission} by {requester})")]
    NoAuthorizer {
        permission: String,
        requester: String,
    },

    /// A lifecycle hook failed and aborted its transition.
    #[error("Lifecycle hook {hook} failed for {plugin}: {source}")]
    HookFailed {
        plugin: String,
        hook: &'static str,
        #[source]
        source: Box<ConnectorError>,
    },

    /// A lifecycle transition was requested from the wrong state.
    #[error("Invalid lifecycle transition: cannot {transition} while {state}")]
    InvalidTransition {
        transition: &'static str,
        state: &'static str,
    },

    /// No connected plugin provides the requested function or variable.
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// Error reported by plugin code.
    #[error("{plugin}: {message}")]
    Plugin { plugin: String, message: String },
}

impl ConnectorError {
    /// Create an error reported by plugin code.
    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Get the name of the offending plugin or member owner, if known.
    pub fn plugin_name(&self) -> Option<&str> {
        match self {
            Self::TypeNotFound { name, .. }
            | Self::NoConstructor { name }
            | Self::InstantiationFailed { name, .. }
            | Self::UnknownInterface { name, .. }
            | Self::UnsupportedInterface { name, .. }
            | Self::InvalidImplementation { name, .. }
            | Self::ExchangeMismatch { name, .. } => Some(name),
            Self::SignatureMismatch { owner, .. }
            | Self::AccessViolation { owner, .. }
            | Self::MissingInstance { owner, .. }
            | Self::Raised { owner, .. } => Some(owner),
            Self::PermissionDenied { requester, .. } | Self::NoAuthorizer { requester, .. } => {
                Some(requester)
            }
            Self::HookFailed { plugin, .. } | Self::Plugin { plugin, .. } => Some(plugin),
            Self::InvalidTransition { .. } | Self::NotConnected(_) => None,
        }
    }

    /// Get the partially resolved identity carried by a load failure.
    pub fn identity(&self) -> Option<(Option<&str>, Option<&str>)> {
        match self {
            Self::UnknownInterface {
                type_id,
                generation,
                ..
            } => Some((type_id.as_deref(), generation.as_deref())),
            Self::UnsupportedInterface { identity, .. }
            | Self::InvalidImplementation { identity, .. } => {
                Some((Some(identity.type_id()), Some(identity.generation())))
            }
            _ => None,
        }
    }

    /// Check whether this error is a permission denial.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::NoAuthorizer { .. })
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;

/// Contract-invariant violations. These indicate a broken plugin or engine
/// and are not meant to be recovered from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
    /// A container's identity contradicts what its implementation provides.
    #[error("Container of {name} claims {identity} but does not provide {required}")]
    IdentityMismatch {
        name: String,
        identity: PluginIdentity,
        required: &'static str,
    },
}
