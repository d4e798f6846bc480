//! Manifest lookup on a search path.
//!
//! The plugin `demo.math.Calc` is looked up as `demo/math/Calc.toml` under
//! each root, in order. The first manifest found wins.

use super::{LocateError, LocateResult, TypeCatalog, TypeLocator, TypeManifest};
use crate::native::NativeType;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const MANIFEST_EXTENSION: &str = "toml";

/// A manifest found while scanning the search path.
#[derive(Debug, Clone)]
pub struct DiscoveredType {
    /// Plugin name derived from the manifest path.
    pub name: String,

    /// Path to the manifest file.
    pub path: PathBuf,

    /// Parsed manifest.
    pub manifest: TypeManifest,
}

/// Locates types through manifests on a search path.
#[derive(Debug, Clone)]
pub struct SearchPathLocator {
    roots: Vec<PathBuf>,
    catalog: Arc<TypeCatalog>,
}

impl SearchPathLocator {
    pub fn new(roots: Vec<PathBuf>, catalog: Arc<TypeCatalog>) -> Self {
        Self { roots, catalog }
    }

    /// Search the current working directory, against the global catalog.
    pub fn current_dir() -> Self {
        Self::new(vec![PathBuf::from(".")], TypeCatalog::global())
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Get the manifest path of `name` relative to a root.
    pub fn manifest_path(root: &Path, name: &str) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in name.split('.') {
            path.push(segment);
        }
        path.set_extension(MANIFEST_EXTENSION);
        path
    }

    fn find_manifest(&self, name: &str) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| Self::manifest_path(root, name))
            .find(|path| path.is_file())
    }

    /// Scan every root for manifests. Roots earlier on the search path take
    /// priority over later ones for the same plugin name.
    pub fn discover(&self) -> LocateResult<Vec<DiscoveredType>> {
        let mut found = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for root in &self.roots {
            debug!("Scanning search path root: {:?}", root);
            scan_directory(root, root, &mut found, &mut seen)?;
        }

        info!("Discovered {} type manifests", found.len());
        Ok(found)
    }
}

impl Default for SearchPathLocator {
    fn default() -> Self {
        Self::current_dir()
    }
}

impl TypeLocator for SearchPathLocator {
    fn locate(&self, name: &str) -> LocateResult<Arc<NativeType>> {
        let path = self.find_manifest(name).ok_or_else(|| LocateError::NotFound {
            name: name.to_string(),
            searched: self.roots.clone(),
        })?;

        debug!(plugin = %name, "Reading manifest {:?}", path);
        let manifest = TypeManifest::from_file(&path)?;
        if !manifest.plugin.enabled {
            return Err(LocateError::Disabled(name.to_string()));
        }

        self.catalog
            .get(&manifest.plugin.native_type)
            .ok_or(LocateError::NotRegistered(manifest.plugin.native_type))
    }
}

fn plugin_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let segments: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(segments.join("."))
}

fn scan_directory(
    root: &Path,
    dir: &Path,
    found: &mut Vec<DiscoveredType>,
    seen: &mut std::collections::HashSet<String>,
) -> LocateResult<()> {
    if !dir.exists() {
        return Ok(());
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("Failed to read search path directory {:?}: {}", dir, e);
            return Ok(());
        }
    };

    let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            scan_directory(root, &path, found, seen)?;
            continue;
        }

        if path.extension().and_then(|ext| ext.to_str()) != Some(MANIFEST_EXTENSION) {
            continue;
        }

        let Some(name) = plugin_name(root, &path) else {
            continue;
        };
        if seen.contains(&name) {
            debug!("Skipping shadowed manifest: {}", name);
            continue;
        }

        match TypeManifest::from_file(&path) {
            Ok(manifest) => {
                seen.insert(name.clone());
                found.push(DiscoveredType {
                    name,
                    path,
                    manifest,
                });
            }
            Err(e) => {
                warn!("Failed to load manifest from {:?}: {}", path, e);
            }
        }
    }

    Ok(())
}
