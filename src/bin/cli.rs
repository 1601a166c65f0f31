//! keel CLI - scan a repository and query its dependency graph.
//!
//! Usage:
//!   keel scan [-r <root>]             # Build registry, write snapshot
//!   keel stats [-r <root>]            # Registry/graph statistics
//!   keel order [-r <root>]            # Dependency-safe component order
//!   keel closure <id> [-r <root>]     # Transitive dependencies of one id
//!   keel entry-points [-r <root>]     # Components nothing references
//!
//! The engine itself has no CLI behavior; this binary is orchestration
//! around `scan_repository` and the snapshot file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use keel::{
    load_snapshot, resolve_cycles, save_snapshot, scan_repository, snapshot_file_name,
    topological_order, ComponentKind, ComponentRegistry, DependencyGraph, ScanConfig,
};

#[derive(Parser)]
#[command(name = "keel")]
#[command(about = "Static dependency-graph engine for codebases", long_about = None)]
struct Cli {
    /// Repository root directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Optional TOML config file for scan filters
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the tree, resolve references, and write the snapshot
    Scan {
        /// Snapshot output path (default: <root>/.keel/<name>_dependency_graph.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show registry and graph statistics
    Stats,

    /// Print all components in dependency-safe order
    Order,

    /// Print the dependency closure of one component, dependencies first
    Closure {
        /// Component id (e.g. app.services.UserService)
        id: String,
    },

    /// Print components nothing else in the tree references
    EntryPoints,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = cli.root.canonicalize().unwrap_or(cli.root);
    let config = match &cli.config {
        Some(path) => {
            let mut config = ScanConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            config.root = root.clone();
            config
        }
        None => ScanConfig::new(root.clone()),
    };
    let snapshot_path = root.join(".keel").join(snapshot_file_name(&root));

    match cli.command {
        Commands::Scan { out } => {
            let result = scan_repository(&config)?;
            let path = out.unwrap_or(snapshot_path);
            save_snapshot(&result.registry, &path)?;

            let graph = DependencyGraph::from_registry(&result.registry);
            print_stats(&result.registry, &graph);
            if !result.diagnostics.is_empty() {
                println!();
                println!("Skipped {} file(s):", result.diagnostics.len());
                for diagnostic in &result.diagnostics {
                    println!("  {}: {}", diagnostic.path.display(), diagnostic.message);
                }
            }
            println!();
            println!("Snapshot: {}", path.display());
        }

        Commands::Stats => {
            let registry = load_registry(&config, &snapshot_path)?;
            let graph = DependencyGraph::from_registry(&registry);
            print_stats(&registry, &graph);
        }

        Commands::Order => {
            let registry = load_registry(&config, &snapshot_path)?;
            let graph = DependencyGraph::from_registry(&registry);
            let resolution = resolve_cycles(&graph);
            for (from, to) in &resolution.dropped_edges {
                eprintln!("cycle broken: {from} -> {to}");
            }
            for id in topological_order(&graph)? {
                println!("{id}");
            }
        }

        Commands::Closure { id } => {
            let registry = load_registry(&config, &snapshot_path)?;
            let graph = DependencyGraph::from_registry(&registry);
            let closure = graph.closure(&id);
            if closure.is_empty() {
                anyhow::bail!("unknown component id: {id}");
            }
            for id in closure {
                println!("{id}");
            }
        }

        Commands::EntryPoints => {
            let registry = load_registry(&config, &snapshot_path)?;
            let graph = DependencyGraph::from_registry(&registry);
            for id in graph.entry_points() {
                println!("{id}");
            }
        }
    }

    Ok(())
}

/// Reuse the snapshot when one exists, otherwise scan and write it.
fn load_registry(config: &ScanConfig, snapshot_path: &std::path::Path) -> Result<ComponentRegistry> {
    if snapshot_path.exists() {
        return Ok(load_snapshot(snapshot_path)?);
    }
    eprintln!("Building registry (first run)...");
    let result = scan_repository(config)?;
    save_snapshot(&result.registry, snapshot_path)?;
    Ok(result.registry)
}

fn print_stats(registry: &ComponentRegistry, graph: &DependencyGraph) {
    let stats = graph.stats();
    println!("keel - Dependency Graph");
    println!("═══════════════════════");
    println!();
    println!("Components:   {}", stats.component_count);
    println!("  modules     {}", registry.count_kind(ComponentKind::Module));
    println!("  classes     {}", registry.count_kind(ComponentKind::Class));
    println!("  functions   {}", registry.count_kind(ComponentKind::Function));
    println!("  methods     {}", registry.count_kind(ComponentKind::Method));
    println!("Edges:        {}", stats.edge_count);
    println!("Entry points: {}", stats.entry_point_count);
}
