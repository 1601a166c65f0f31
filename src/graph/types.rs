//! Core types for the dependency graph.
//!
//! Defines component kinds, spans, the `Component` record itself, and the
//! intermediate extraction types the parser hands to the resolver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The kind of a code component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// A source file as a whole.
    Module,
    /// A class (or struct/enum/trait/interface in languages that have them).
    Class,
    /// A free function at module level.
    Function,
    /// A function defined inside a class.
    Method,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Module => write!(f, "module"),
            ComponentKind::Class => write!(f, "class"),
            ComponentKind::Function => write!(f, "function"),
            ComponentKind::Method => write!(f, "method"),
        }
    }
}

/// A 1-indexed, inclusive line range within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
}

impl Span {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }
}

/// A single named, analyzable unit of source: module, class, function,
/// or method. The atomic unit of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Globally unique id, derived from the fully-qualified dotted path
    /// (e.g. `app.services.UserService.create`). Stable across runs.
    pub id: String,
    /// What kind of component this is.
    pub kind: ComponentKind,
    /// Path of the defining file, relative to the scanned root.
    pub relative_path: PathBuf,
    /// Absolute path of the defining file.
    pub absolute_path: PathBuf,
    /// Line range of the definition within the file.
    pub span: Span,
    /// Exact source slice for the span. Never re-formatted; reproducible
    /// byte-for-byte from `(absolute_path, span)`.
    pub source_text: String,
    /// Ids of components this one statically uses. De-duplicated,
    /// insertion order preserved. Every id is a registry key.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Component {
    /// The simple (unqualified) name: the last dotted segment of the id.
    pub fn name(&self) -> &str {
        self.id.rsplit('.').next().unwrap_or(&self.id)
    }
}

// ─── Extraction Intermediates ─────────────────────────────────────────────────

/// An unresolved reference captured while walking a definition body.
#[derive(Debug, Clone)]
pub struct RawReference {
    /// The referenced name (bare identifier, attribute name, or call target).
    pub name: String,
    /// Receiver text for attribute access (`receiver.name`), dotted.
    pub receiver: Option<String>,
    /// Line of the reference (1-indexed).
    pub line: usize,
}

impl RawReference {
    pub fn bare(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            receiver: None,
            line,
        }
    }

    pub fn attribute(receiver: impl Into<String>, name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            receiver: Some(receiver.into()),
            line,
        }
    }
}

/// An import declaration binding a local name to a dotted target path.
#[derive(Debug, Clone)]
pub struct ImportBinding {
    /// The name visible in the importing file.
    pub local: String,
    /// The dotted path of the imported entity, absolute where the language
    /// allows it to be computed (relative imports are resolved against the
    /// importing module).
    pub target: String,
    /// Line of the import (1-indexed).
    pub line: usize,
}

/// A component as extracted from a single file, references still unresolved.
#[derive(Debug, Clone)]
pub struct RawComponent {
    pub id: String,
    pub kind: ComponentKind,
    /// Simple name (last id segment).
    pub name: String,
    /// Enclosing class id, for methods.
    pub parent: Option<String>,
    pub span: Span,
    pub source_text: String,
    /// Everything in the body that could plausibly name another component.
    pub references: Vec<RawReference>,
}

/// All extracted information for one source file: the module component,
/// its definitions, and the file's import table.
#[derive(Debug, Clone)]
pub struct FileExtraction {
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    /// Id of this file's module component.
    pub module_id: String,
    /// Components defined in the file, module component first.
    pub components: Vec<RawComponent>,
    /// Import bindings declared by the file.
    pub imports: Vec<ImportBinding>,
}

/// A per-file problem recorded during a scan. Never fatal to the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDiagnostic {
    pub path: PathBuf,
    pub message: String,
}
