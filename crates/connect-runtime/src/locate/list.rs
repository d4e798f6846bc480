//! Plugin list files.
//!
//! One plugin name per line. Blank lines and lines starting with `#` are
//! ignored. Names may be written as relative paths (`./demo/Hello.class`);
//! they are normalized to dotted names (`demo.Hello`).

use super::LocateResult;
use std::path::Path;

const CURRENT_DIR_PREFIXES: [&str; 2] = ["./", ".\\"];
const TYPE_FILE_SUFFIXES: [&str; 2] = [".class", ".toml"];

/// Normalize a plugin name written as a relative path to its dotted form.
pub fn normalize_plugin_name(raw: &str) -> String {
    let mut name = raw.trim();

    for prefix in CURRENT_DIR_PREFIXES {
        if let Some(stripped) = name.strip_prefix(prefix) {
            name = stripped;
            break;
        }
    }
    for suffix in TYPE_FILE_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped;
            break;
        }
    }

    name.replace(['/', '\\'], ".")
}

/// Parse the contents of a plugin list file.
pub fn parse_plugin_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_plugin_name)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Read and parse a plugin list file.
pub fn read_plugin_list(path: &Path) -> LocateResult<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_plugin_list(&content))
}
