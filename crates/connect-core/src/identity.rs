//! Contract identities.
//!
//! A plugin names the contract it implements with two string constants,
//! [`INTERFACE_TYPE_FIELD`] and [`INTERFACE_GENERATION_FIELD`]. Their
//! concatenation (e.g. `XFCI1`) is the key into the fixed contract registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the constant declaring the contract type ID.
pub const INTERFACE_TYPE_FIELD: &str = "INTERFACE_TYPE";

/// Older name of the type ID constant, still accepted.
pub const LEGACY_INTERFACE_TYPE_FIELD: &str = "INTERFACE_TYPE_ID";

/// Name of the constant declaring the contract generation.
pub const INTERFACE_GENERATION_FIELD: &str = "INTERFACE_GENERATION";

/// The contract and generation a plugin claims.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginIdentity {
    type_id: String,
    generation: String,
}

impl PluginIdentity {
    pub fn new(type_id: impl Into<String>, generation: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            generation: generation.into(),
        }
    }

    /// Get the type ID (abbreviated contract name, e.g. `XFCI`).
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Get the generation (e.g. `1`).
    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Get the registry key: the type ID followed by the generation.
    pub fn code(&self) -> String {
        format!("{}{}", self.type_id, self.generation)
    }
}

impl fmt::Display for PluginIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "interface-type-id: {}, interface-generation: {}",
            self.type_id, self.generation
        )
    }
}

/// Every contract known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contract {
    /// External function connector, generation 1 (`XFCI1`).
    Function1,
    /// External variable connector, generation 1 (`XVCI1`).
    Variable1,
    /// External namespace connector, generation 1 (`XNCI1`).
    Namespace1,
    /// External library connector, generation 1 (`XLCI1`).
    Library1,
    /// General process connector, generations 1 to 3 (`GPCI1`..`GPCI3`).
    Process1,
    Process2,
    Process3,
    /// Permission authorizer connector, generations 1 and 2 (`PACI1`, `PACI2`).
    PermissionAuthorizer1,
    PermissionAuthorizer2,
}

impl Contract {
    /// All contracts, in registry order.
    pub const ALL: [Contract; 9] = [
        Contract::Function1,
        Contract::Variable1,
        Contract::Namespace1,
        Contract::Library1,
        Contract::Process1,
        Contract::Process2,
        Contract::Process3,
        Contract::PermissionAuthorizer1,
        Contract::PermissionAuthorizer2,
    ];

    pub fn type_id(&self) -> &'static str {
        match self {
            Contract::Function1 => "XFCI",
            Contract::Variable1 => "XVCI",
            Contract::Namespace1 => "XNCI",
            Contract::Library1 => "XLCI",
            Contract::Process1 | Contract::Process2 | Contract::Process3 => "GPCI",
            Contract::PermissionAuthorizer1 | Contract::PermissionAuthorizer2 => "PACI",
        }
    }

    pub fn generation(&self) -> &'static str {
        match self {
            Contract::Function1
            | Contract::Variable1
            | Contract::Namespace1
            | Contract::Library1
            | Contract::Process1
            | Contract::PermissionAuthorizer1 => "1",
            Contract::Process2 | Contract::PermissionAuthorizer2 => "2",
            Contract::Process3 => "3",
        }
    }

    /// Get the registry key of this contract.
    pub fn code(&self) -> &'static str {
        match self {
            Contract::Function1 => "XFCI1",
            Contract::Variable1 => "XVCI1",
            Contract::Namespace1 => "XNCI1",
            Contract::Library1 => "XLCI1",
            Contract::Process1 => "GPCI1",
            Contract::Process2 => "GPCI2",
            Contract::Process3 => "GPCI3",
            Contract::PermissionAuthorizer1 => "PACI1",
            Contract::PermissionAuthorizer2 => "PACI2",
        }
    }

    /// Get the name of the capability an implementation must provide.
    pub fn required_capability(&self) -> &'static str {
        match self {
            Contract::Function1 => "FunctionConnector",
            Contract::Variable1 => "VariableConnector",
            Contract::Namespace1 | Contract::Library1 => "NamespaceConnector",
            Contract::Process1 => "ProcessConnector1",
            Contract::Process2 => "ProcessConnector2",
            Contract::Process3 => "ProcessConnector3",
            Contract::PermissionAuthorizer1 => "PermissionAuthorizer1",
            Contract::PermissionAuthorizer2 => "PermissionAuthorizer2",
        }
    }

    /// Look up a contract by its registry key.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|contract| contract.code() == code)
    }

    /// Get the identity naming this contract.
    pub fn identity(&self) -> PluginIdentity {
        PluginIdentity::new(self.type_id(), self.generation())
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
