//! Scan configuration.
//!
//! A `ScanConfig` tells the builder where to scan and which files to keep.
//! It can be constructed in code or loaded from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{KeelError, Result};

/// Configuration for a repository scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Root directory of the tree to scan. Only files under this root are read.
    pub root: PathBuf,
    /// File extensions to include. Empty means "every supported language".
    pub extensions: Vec<String>,
    /// Directory names skipped anywhere in the tree (vendored/generated code).
    pub exclude_dirs: Vec<String>,
    /// Honor .gitignore files while walking.
    pub respect_gitignore: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extensions: Vec::new(),
            exclude_dirs: vec![
                ".git".to_string(),
                "target".to_string(),
                "node_modules".to_string(),
                "dist".to_string(),
                "build".to_string(),
                "vendor".to_string(),
                "__pycache__".to_string(),
                ".venv".to_string(),
                "venv".to_string(),
            ],
            respect_gitignore: true,
        }
    }
}

impl ScanConfig {
    /// Config for a root with default filters.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| KeelError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Whether a root-relative path falls inside an excluded directory.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        relative.components().any(|c| {
            let name = c.as_os_str().to_string_lossy();
            self.exclude_dirs.iter().any(|d| d.as_str() == name)
        })
    }

    /// Whether a path passes the extension filter.
    pub fn matches_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_excludes_vendored_dirs() {
        let config = ScanConfig::default();
        assert!(config.is_excluded(Path::new("node_modules/pkg/index.js")));
        assert!(config.is_excluded(Path::new("src/vendor/lib.py")));
        assert!(!config.is_excluded(Path::new("src/app/main.py")));
    }

    #[test]
    fn empty_extension_filter_accepts_everything() {
        let config = ScanConfig::default();
        assert!(config.matches_extension(Path::new("a.py")));
        assert!(config.matches_extension(Path::new("a.rs")));
    }

    #[test]
    fn extension_filter_restricts() {
        let config = ScanConfig {
            extensions: vec!["py".to_string()],
            ..ScanConfig::default()
        };
        assert!(config.matches_extension(Path::new("a.py")));
        assert!(!config.matches_extension(Path::new("a.rs")));
        assert!(!config.matches_extension(Path::new("Makefile")));
    }

    #[test]
    fn loads_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keel.toml");
        std::fs::write(
            &path,
            "root = \"/repo\"\nextensions = [\"py\"]\nrespect_gitignore = false\n",
        )
        .unwrap();

        let config = ScanConfig::from_file(&path).unwrap();
        assert_eq!(config.root, PathBuf::from("/repo"));
        assert_eq!(config.extensions, vec!["py".to_string()]);
        assert!(!config.respect_gitignore);
        // Unspecified fields keep their defaults.
        assert!(config.exclude_dirs.contains(&"node_modules".to_string()));
    }
}
