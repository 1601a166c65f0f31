//! Component extraction — parses a source file into its components.
//!
//! `extract_file` parses one file with tree-sitter and emits the file's
//! module component plus one component per class, top-level function, and
//! method, each carrying its raw (unresolved) reference list. Resolution
//! against the whole tree happens later in `graph::resolver`.

pub mod language;

mod javascript;
mod python;
mod rust;

pub use language::SupportedLanguage;

use std::path::{Component as PathComponent, Path};
use tree_sitter::{Node, Parser};

use crate::error::{KeelError, Result};
use crate::graph::types::{
    ComponentKind, FileExtraction, ImportBinding, RawComponent, RawReference, Span,
};

/// Parse one file and extract its components and raw references.
///
/// `root` determines the relative path (and therefore the module id); `path`
/// may be absolute or root-relative. Fails with `UnsupportedLanguage` for
/// unknown extensions and with `Parse` when the grammar rejects the file;
/// a whole-tree scan treats the latter as a per-file diagnostic.
pub fn extract_file(root: &Path, path: &Path, source: &str) -> Result<FileExtraction> {
    let language = SupportedLanguage::from_path(path)
        .ok_or_else(|| KeelError::UnsupportedLanguage(path.display().to_string()))?;

    let mut parser = Parser::new();
    parser
        .set_language(&language.tree_sitter_language())
        .map_err(|e| KeelError::Parse {
            path: path.to_path_buf(),
            message: format!("failed to load {} grammar: {e}", language.name()),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| KeelError::Parse {
            path: path.to_path_buf(),
            message: "parser returned no tree".to_string(),
        })?;

    if tree.root_node().has_error() {
        return Err(KeelError::Parse {
            path: path.to_path_buf(),
            message: "source contains syntax errors".to_string(),
        });
    }

    let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    let module_id = module_id_for(&relative);

    let mut ctx = ExtractCtx::new(source, &module_id, &relative);
    match language {
        SupportedLanguage::Python => python::extract(&mut ctx, tree.root_node()),
        SupportedLanguage::Rust => rust::extract(&mut ctx, tree.root_node()),
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => {
            javascript::extract(&mut ctx, tree.root_node())
        }
    }

    let line_count = source.split_inclusive('\n').count().max(1);
    let module = RawComponent {
        id: module_id.clone(),
        kind: ComponentKind::Module,
        name: module_id
            .rsplit('.')
            .next()
            .unwrap_or(&module_id)
            .to_string(),
        parent: None,
        span: Span::new(1, line_count),
        source_text: source.to_string(),
        references: std::mem::take(&mut ctx.module_refs),
    };

    let mut components = Vec::with_capacity(ctx.components.len() + 1);
    components.push(module);
    components.append(&mut ctx.components);
    let imports = std::mem::take(&mut ctx.imports);

    Ok(FileExtraction {
        relative_path: relative,
        absolute_path: path.to_path_buf(),
        module_id,
        components,
        imports,
    })
}

/// Derive a module id from a root-relative path: separators fold to dots,
/// the extension is stripped, and filesystem-level index stems
/// (`__init__`, `mod`, `index`) collapse into the containing directory.
pub fn module_id_for(relative: &Path) -> String {
    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            PathComponent::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(file) = segments.pop() {
        let stem = Path::new(&file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file);
        let is_index = matches!(stem.as_str(), "__init__" | "mod" | "index");
        if !is_index || segments.is_empty() {
            segments.push(stem);
        }
    }

    segments.join(".")
}

/// Exact source slice for a 1-indexed inclusive line range, including
/// each line's terminator. This is the byte-for-byte definition of a
/// component's `source_text`.
pub fn line_slice(source: &str, span: Span) -> String {
    source
        .split_inclusive('\n')
        .skip(span.start_line.saturating_sub(1))
        .take(span.end_line.saturating_sub(span.start_line) + 1)
        .collect()
}

/// Shared accumulator the per-language walkers fill in.
pub(crate) struct ExtractCtx<'a> {
    pub source: &'a str,
    pub bytes: &'a [u8],
    pub module_id: &'a str,
    pub relative_path: &'a Path,
    pub components: Vec<RawComponent>,
    pub imports: Vec<ImportBinding>,
    /// References in top-level code, outside any definition.
    pub module_refs: Vec<RawReference>,
}

impl<'a> ExtractCtx<'a> {
    fn new(source: &'a str, module_id: &'a str, relative_path: &'a Path) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            module_id,
            relative_path,
            components: Vec::new(),
            imports: Vec::new(),
            module_refs: Vec::new(),
        }
    }

    pub fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.bytes).unwrap_or("")
    }

    pub fn span(&self, node: Node) -> Span {
        Span::new(node.start_position().row + 1, node.end_position().row + 1)
    }

    pub fn slice(&self, span: Span) -> String {
        line_slice(self.source, span)
    }

    pub fn line(&self, node: Node) -> usize {
        node.start_position().row + 1
    }

    /// The dotted path of the package containing this module. For a
    /// package index file the module is its own package.
    pub fn package_id(&self) -> String {
        let stem = self
            .relative_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if matches!(stem.as_str(), "__init__" | "mod" | "index") {
            return self.module_id.to_string();
        }
        match self.module_id.rsplit_once('.') {
            Some((package, _)) => package.to_string(),
            None => String::new(),
        }
    }
}
