//! Snapshot persistence.
//!
//! The snapshot is a pretty-printed JSON document keyed by component id,
//! carrying everything a separate process needs to reuse the analysis
//! without re-parsing: kind, paths, span, source text, and edges. One
//! snapshot per scan, overwritten wholesale on rebuild.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use super::registry::ComponentRegistry;
use super::types::Component;
use crate::error::{KeelError, Result};

/// Serialize the full registry to `path`.
///
/// The write is all-or-nothing: content goes to a temporary file in the
/// target directory first and is atomically renamed over `path`, so a
/// concurrent reader never sees a partially-written snapshot.
pub fn save_snapshot(registry: &ComponentRegistry, path: &Path) -> Result<()> {
    let json =
        serde_json::to_vec_pretty(registry.components()).map_err(|e| KeelError::SnapshotFormat {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir).map_err(|e| KeelError::SnapshotIo {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let mut tmp = NamedTempFile::new_in(dir.unwrap_or(Path::new("."))).map_err(|e| {
        KeelError::SnapshotIo {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    tmp.write_all(&json).map_err(|e| KeelError::SnapshotIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    tmp.persist(path).map_err(|e| KeelError::SnapshotIo {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    info!(
        path = %path.display(),
        components = registry.len(),
        "snapshot written"
    );
    Ok(())
}

/// Load a snapshot written by `save_snapshot`. Exact inverse: every field
/// round-trips. Fails on unreadable, corrupt, or closed-world-violating
/// content; a partial registry is never returned.
pub fn load_snapshot(path: &Path) -> Result<ComponentRegistry> {
    let raw = std::fs::read_to_string(path).map_err(|e| KeelError::SnapshotIo {
        path: path.to_path_buf(),
        source: e,
    })?;

    let components: BTreeMap<String, Component> =
        serde_json::from_str(&raw).map_err(|e| KeelError::SnapshotFormat {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    for (key, component) in &components {
        if key != &component.id {
            return Err(KeelError::SnapshotFormat {
                path: path.to_path_buf(),
                message: format!("key {key} does not match component id {}", component.id),
            });
        }
    }

    let registry = ComponentRegistry::from_components(components);
    let missing = registry.dangling_references();
    if !missing.is_empty() {
        return Err(KeelError::InvalidSnapshot { missing });
    }

    Ok(registry)
}

/// Conventional snapshot file name for a repository root: the directory
/// name with non-alphanumerics folded to `_`.
pub fn snapshot_file_name(repo_root: &Path) -> String {
    let name = repo_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repo".to_string());
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{sanitized}_dependency_graph.json")
}
