//! # keel
//!
//! A static dependency-graph engine for codebases.
//!
//! keel scans a source tree, parses each file with tree-sitter, extracts
//! named code components (modules, classes, functions, methods), resolves
//! cross-references between them into a directed graph, and provides the
//! graph algorithms downstream tooling needs to process a codebase in
//! dependency-safe order: cycle resolution, topological ordering,
//! entry-point classification, and dependency-closure traversal.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keel::{scan_repository, DependencyGraph, ScanConfig};
//!
//! let result = scan_repository(&ScanConfig::new(".")).unwrap();
//! let graph = DependencyGraph::from_registry(&result.registry);
//!
//! // Components nothing else references: the tree's top-level seeds.
//! let seeds = graph.entry_points();
//!
//! // Everything needed to understand one component, dependencies first.
//! let context = graph.closure(&seeds[0]);
//! ```
//!
//! The registry is built once per scan, owned by the caller, and read-only
//! for every consumer afterwards. A snapshot written with `save_snapshot`
//! round-trips losslessly through `load_snapshot`, so a later run (or a
//! separate process) can reuse the analysis without re-parsing.

pub mod config;
pub mod error;
pub mod graph;
pub mod parser;

// Re-exports for convenience
pub use config::ScanConfig;
pub use error::{KeelError, Result};

// Graph re-exports
pub use graph::{
    load_snapshot, resolve_cycles, save_snapshot, scan_repository, snapshot_file_name,
    topological_order, topological_order_with, Component, ComponentKind, ComponentRegistry,
    CycleResolution, DependencyGraph, GraphStats, ParseDiagnostic, ScanResult, Span,
};
pub use parser::{extract_file, SupportedLanguage};
