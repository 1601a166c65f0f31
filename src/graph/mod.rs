//! Dependency graph module — the structural backbone of keel.
//!
//! Provides the component data model, the registry, reference resolution,
//! repository scanning, the graph engine, ordering, and persistence.

pub mod builder;
pub mod engine;
pub mod persistence;
pub mod registry;
pub(crate) mod resolver;
pub mod toposort;
pub mod types;

pub use builder::{scan_repository, ScanResult};
pub use engine::{DependencyGraph, GraphStats};
pub use persistence::{load_snapshot, save_snapshot, snapshot_file_name};
pub use registry::ComponentRegistry;
pub use toposort::{resolve_cycles, topological_order, topological_order_with, CycleResolution};
pub use types::{Component, ComponentKind, ParseDiagnostic, Span};
