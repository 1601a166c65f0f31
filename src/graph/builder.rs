//! Repository scanning — walks a source tree and builds the registry.
//!
//! Two strict phases. Parse-parallel: every candidate file is parsed
//! independently on the rayon pool, results collected in path order.
//! Resolve: after the sequential merge barrier, references are resolved
//! per file against the complete registry (reads only), then written back
//! sequentially. The caller owns the resulting registry.

use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::registry::ComponentRegistry;
use super::resolver::{resolve_file, ResolverIndex};
use super::types::{Component, FileExtraction, ParseDiagnostic};
use crate::config::ScanConfig;
use crate::error::Result;
use crate::parser::{extract_file, SupportedLanguage};

/// Everything a scan produces: the resolved registry plus the per-file
/// problems that were skipped over.
#[derive(Debug)]
pub struct ScanResult {
    pub registry: ComponentRegistry,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Scan the configured root and build a fully resolved registry.
///
/// Individual files that cannot be read or parsed become diagnostics and
/// the scan continues; only I/O failure on the root itself is fatal.
pub fn scan_repository(config: &ScanConfig) -> Result<ScanResult> {
    if !config.root.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("scan root is not a directory: {}", config.root.display()),
        )
        .into());
    }

    let files = candidate_files(config);
    info!(
        root = %config.root.display(),
        files = files.len(),
        "scanning repository"
    );

    // Phase 1: parse in parallel, merge sequentially in path order.
    let parsed: Vec<std::result::Result<FileExtraction, ParseDiagnostic>> = files
        .par_iter()
        .map(|path| {
            let source = std::fs::read_to_string(path).map_err(|e| ParseDiagnostic {
                path: path.clone(),
                message: format!("unreadable: {e}"),
            })?;
            extract_file(&config.root, path, &source).map_err(|e| ParseDiagnostic {
                path: path.clone(),
                message: e.to_string(),
            })
        })
        .collect();

    let mut registry = ComponentRegistry::new();
    let mut extractions = Vec::new();
    let mut diagnostics = Vec::new();
    for outcome in parsed {
        match outcome {
            Ok(extraction) => {
                for raw in &extraction.components {
                    registry.insert(Component {
                        id: raw.id.clone(),
                        kind: raw.kind,
                        relative_path: extraction.relative_path.clone(),
                        absolute_path: extraction.absolute_path.clone(),
                        span: raw.span,
                        source_text: raw.source_text.clone(),
                        depends_on: Vec::new(),
                    });
                }
                extractions.push(extraction);
            }
            Err(diagnostic) => {
                warn!(
                    path = %diagnostic.path.display(),
                    message = %diagnostic.message,
                    "skipping file"
                );
                diagnostics.push(diagnostic);
            }
        }
    }

    // Phase 2: resolve against the complete registry. Parallel reads,
    // sequential write-back.
    let index = ResolverIndex::new(&registry);
    let resolved: Vec<Vec<(String, Vec<String>)>> = extractions
        .par_iter()
        .map(|extraction| resolve_file(&index, extraction))
        .collect();
    drop(index);

    let mut edge_count = 0usize;
    for file_edges in resolved {
        for (id, depends_on) in file_edges {
            edge_count += depends_on.len();
            registry.set_depends_on(&id, depends_on);
        }
    }

    debug_assert!(registry.dangling_references().is_empty());
    info!(
        components = registry.len(),
        edges = edge_count,
        skipped = diagnostics.len(),
        "scan complete"
    );
    Ok(ScanResult {
        registry,
        diagnostics,
    })
}

/// Collect the files a scan will parse, sorted by path so every later
/// stage sees a deterministic order.
fn candidate_files(config: &ScanConfig) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(&config.root)
        .hidden(true)
        .git_ignore(config.respect_gitignore)
        .git_global(config.respect_gitignore)
        .git_exclude(config.respect_gitignore)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| SupportedLanguage::from_path(path).is_some())
        .filter(|path| config.matches_extension(path))
        .filter(|path| {
            let relative = path.strip_prefix(&config.root).unwrap_or(path);
            if config.is_excluded(relative) {
                debug!(path = %path.display(), "excluded by filter");
                false
            } else {
                true
            }
        })
        .collect();
    files.sort();
    files
}
