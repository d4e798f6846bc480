//! Permission vocabulary and negotiation.
//!
//! Every operation of a plugin declares two sets of permission names: the
//! permissions it needs and the permissions it explicitly does not need.
//! [`effective_required`] decides, for a single candidate permission, which
//! of the two sets applies. A name present in both sets is required.
//!
//! The meta-name [`names::ALL`] stands for every permission and
//! [`names::NONE`] for no permission at all. A plugin that declares
//! `unnecessary = ["ALL"]` is sandboxed: it gets nothing beyond what it lists
//! as necessary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Long-form permission names.
pub mod names {
    /// Every permission.
    pub const ALL: &str = "ALL";
    /// No permission.
    pub const NONE: &str = "NONE";
    /// Fallback entry of a permission map.
    pub const DEFAULT: &str = "DEFAULT";

    pub const PROGRAM_EXIT: &str = "PROGRAM_EXIT";
    pub const PROGRAM_RESET: &str = "PROGRAM_RESET";
    pub const PROGRAM_CHANGE: &str = "PROGRAM_CHANGE";
    pub const SYSTEM_PROCESS: &str = "SYSTEM_PROCESS";
    pub const DIRECTORY_CREATE: &str = "DIRECTORY_CREATE";
    pub const DIRECTORY_DELETE: &str = "DIRECTORY_DELETE";
    pub const DIRECTORY_LIST: &str = "DIRECTORY_LIST";
    pub const FILE_CREATE: &str = "FILE_CREATE";
    pub const FILE_DELETE: &str = "FILE_DELETE";
    pub const FILE_WRITE: &str = "FILE_WRITE";
    pub const FILE_READ: &str = "FILE_READ";
    pub const FILE_OVERWRITE: &str = "FILE_OVERWRITE";
    pub const FILE_INFORMATION_CHANGE: &str = "FILE_INFORMATION_CHANGE";
}

/// Every concrete permission, excluding the meta-names.
pub const PERMISSION_UNIVERSE: [&str; 13] = [
    names::PROGRAM_EXIT,
    names::PROGRAM_RESET,
    names::PROGRAM_CHANGE,
    names::SYSTEM_PROCESS,
    names::DIRECTORY_CREATE,
    names::DIRECTORY_DELETE,
    names::DIRECTORY_LIST,
    names::FILE_CREATE,
    names::FILE_DELETE,
    names::FILE_WRITE,
    names::FILE_READ,
    names::FILE_OVERWRITE,
    names::FILE_INFORMATION_CHANGE,
];

/// Compact legacy codes and the long-form names they stand for.
pub const LEGACY_CODES: [(&str, &str); 11] = [
    ("a", names::ALL),
    ("n", names::NONE),
    ("pe", names::PROGRAM_EXIT),
    ("pr", names::PROGRAM_RESET),
    ("pc", names::PROGRAM_CHANGE),
    ("sp", names::SYSTEM_PROCESS),
    ("fw", names::FILE_WRITE),
    ("fr", names::FILE_READ),
    ("fo", names::FILE_OVERWRITE),
    ("fc", names::FILE_INFORMATION_CHANGE),
    ("fd", names::FILE_DELETE),
];

/// Default "necessary" table of a sandboxed operation.
pub const DEFAULT_NECESSARY: [&str; 1] = [names::NONE];

/// Default "unnecessary" table of a sandboxed operation.
pub const DEFAULT_UNNECESSARY: [&str; 1] = [names::ALL];

/// Map a long-form name or a legacy code to its canonical long-form name.
///
/// Names outside the known vocabulary are returned unchanged so that
/// engine-specific permissions still negotiate by exact match.
pub fn canonical_name(name: &str) -> &str {
    LEGACY_CODES
        .iter()
        .find(|(code, _)| *code == name)
        .map(|(_, long)| *long)
        .unwrap_or(name)
}

/// Get the legacy code of a permission, if one exists.
pub fn legacy_code(name: &str) -> Option<&'static str> {
    let name = canonical_name(name);
    LEGACY_CODES
        .iter()
        .find(|(_, long)| *long == name)
        .map(|(code, _)| *code)
}

/// Check whether a name belongs to the known vocabulary, meta-names included.
pub fn is_known(name: &str) -> bool {
    let name = canonical_name(name);
    PERMISSION_UNIVERSE.contains(&name)
        || [names::ALL, names::NONE, names::DEFAULT].contains(&name)
}

/// Outcome of negotiating one permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The permission is listed as necessary (or necessary contains `ALL`).
    Required,
    /// The permission is listed as unnecessary and not as necessary.
    NotRequired,
    /// Neither set mentions the permission; the engine's policy decides.
    Unspecified,
}

impl Requirement {
    /// Convert to a definite answer, `None` when unspecified.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Requirement::Required => Some(true),
            Requirement::NotRequired => Some(false),
            Requirement::Unspecified => None,
        }
    }
}

fn mentions<S: AsRef<str>>(set: &[S], candidate: &str) -> bool {
    set.iter()
        .map(|entry| canonical_name(entry.as_ref()))
        .filter(|entry| *entry != names::NONE)
        .any(|entry| entry == candidate || entry == names::ALL)
}

/// Decide whether `candidate` is required, given the declared sets.
///
/// `necessary` always wins over `unnecessary`. `NONE` entries contribute
/// nothing. Legacy codes are accepted on both sides.
pub fn effective_required<S: AsRef<str>>(
    necessary: &[S],
    unnecessary: &[S],
    candidate: &str,
) -> Requirement {
    let candidate = canonical_name(candidate);
    if mentions(necessary, candidate) {
        Requirement::Required
    } else if mentions(unnecessary, candidate) {
        Requirement::NotRequired
    } else {
        Requirement::Unspecified
    }
}

/// Value assigned to a permission by an authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionValue {
    Allow,
    Deny,
    /// Ask the user each time.
    Ask,
}

impl PermissionValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionValue::Allow => "ALLOW",
            PermissionValue::Deny => "DENY",
            PermissionValue::Ask => "ASK",
        }
    }

    /// Parse a permission value, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ALLOW" => Some(PermissionValue::Allow),
            "DENY" => Some(PermissionValue::Deny),
            "ASK" => Some(PermissionValue::Ask),
            _ => None,
        }
    }
}

impl fmt::Display for PermissionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_necessary() -> Vec<String> {
    DEFAULT_NECESSARY.iter().map(|s| s.to_string()).collect()
}

fn default_unnecessary() -> Vec<String> {
    DEFAULT_UNNECESSARY.iter().map(|s| s.to_string()).collect()
}

/// The permissions declared by one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    #[serde(default = "default_necessary")]
    necessary: Vec<String>,
    #[serde(default = "default_unnecessary")]
    unnecessary: Vec<String>,
}

impl PermissionSet {
    /// Create a permission set. Entries are canonicalized.
    pub fn new<I, J, S>(necessary: I, unnecessary: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let canonical = |s: S| canonical_name(s.as_ref()).to_string();
        Self {
            necessary: necessary.into_iter().map(canonical).collect(),
            unnecessary: unnecessary.into_iter().map(canonical).collect(),
        }
    }

    /// The sandboxed default: nothing necessary, everything unnecessary.
    pub fn sandboxed() -> Self {
        Self {
            necessary: default_necessary(),
            unnecessary: default_unnecessary(),
        }
    }

    pub fn necessary(&self) -> &[String] {
        &self.necessary
    }

    pub fn unnecessary(&self) -> &[String] {
        &self.unnecessary
    }

    /// Negotiate a single permission against this set.
    pub fn requirement(&self, candidate: &str) -> Requirement {
        effective_required(&self.necessary, &self.unnecessary, candidate)
    }

    /// Expand the necessary set into concrete permission names.
    pub fn required_permissions(&self) -> Vec<&'static str> {
        PERMISSION_UNIVERSE
            .iter()
            .copied()
            .filter(|name| self.requirement(name) == Requirement::Required)
            .collect()
    }
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::sandboxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_necessary_wins_over_unnecessary_all() {
        let set = PermissionSet::new([names::FILE_WRITE], [names::ALL]);

        assert_eq!(set.requirement(names::FILE_WRITE), Requirement::Required);
        assert_eq!(set.requirement(names::FILE_READ), Requirement::NotRequired);
        assert_eq!(set.required_permissions(), vec![names::FILE_WRITE]);
    }

    #[test]
    fn test_overlap_is_required() {
        let required = effective_required(
            &[names::FILE_READ],
            &[names::FILE_READ],
            names::FILE_READ,
        );
        assert_eq!(required, Requirement::Required);
    }

    #[test]
    fn test_unmentioned_is_unspecified() {
        let set = PermissionSet::new([names::NONE], [names::PROGRAM_EXIT]);

        assert_eq!(set.requirement(names::FILE_READ), Requirement::Unspecified);
        assert_eq!(set.requirement(names::FILE_READ).as_bool(), None);
        assert_eq!(set.requirement(names::PROGRAM_EXIT).as_bool(), Some(false));
    }

    #[test]
    fn test_none_contributes_nothing() {
        let set = PermissionSet::sandboxed();
        assert_eq!(set.requirement(names::NONE), Requirement::NotRequired);
        assert!(set.required_permissions().is_empty());
    }

    #[test]
    fn test_none_entry_never_matches() {
        assert_eq!(
            effective_required(&[names::NONE], &[names::ALL], names::NONE),
            Requirement::NotRequired
        );
        assert_eq!(
            effective_required(&["n"], &[] as &[&str], names::NONE),
            Requirement::Unspecified
        );
        assert_eq!(
            effective_required(&[names::NONE, names::FILE_WRITE], &[names::ALL], names::FILE_WRITE),
            Requirement::Required
        );
    }

    #[test]
    fn test_legacy_codes_negotiate_like_long_names() {
        let set = PermissionSet::new(["fw"], ["a"]);

        assert_eq!(set.necessary(), &[names::FILE_WRITE.to_string()]);
        assert_eq!(set.requirement("fw"), Requirement::Required);
        assert_eq!(set.requirement(names::FILE_WRITE), Requirement::Required);
        assert_eq!(set.requirement("fr"), Requirement::NotRequired);
    }

    #[test]
    fn test_legacy_code_lookup() {
        assert_eq!(legacy_code(names::FILE_INFORMATION_CHANGE), Some("fc"));
        assert_eq!(legacy_code("fd"), Some("fd"));
        assert_eq!(legacy_code(names::DIRECTORY_LIST), None);
        assert!(is_known("sp"));
        assert!(!is_known("NETWORK"));
    }

    #[test]
    fn test_permission_value_parse() {
        assert_eq!(PermissionValue::parse("ask"), Some(PermissionValue::Ask));
        assert_eq!(PermissionValue::parse("ALLOW"), Some(PermissionValue::Allow));
        assert_eq!(PermissionValue::parse("maybe"), None);
        assert_eq!(PermissionValue::Deny.to_string(), "DENY");
    }

    #[test]
    fn test_default_tables_are_copied() {
        let mut a = PermissionSet::default();
        let b = PermissionSet::default();
        a.necessary.push(names::FILE_READ.to_string());

        assert_ne!(a, b);
        assert_eq!(b.necessary(), &[names::NONE.to_string()]);
    }
}
