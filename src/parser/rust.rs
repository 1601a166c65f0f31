//! Rust extraction rules.
//!
//! Functions become function components; struct/enum/trait/union items
//! become class components; functions inside an `impl` block become
//! methods of the implemented type. `use` declarations populate the
//! binding table with `::` paths folded to dots.

use tree_sitter::Node;

use super::ExtractCtx;
use crate::graph::types::{ComponentKind, ImportBinding, RawComponent, RawReference};

pub(crate) fn extract(ctx: &mut ExtractCtx, root: Node) {
    let module_id = ctx.module_id.to_string();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        item(ctx, child, &module_id);
    }
}

fn item(ctx: &mut ExtractCtx, node: Node, prefix: &str) {
    match node.kind() {
        "use_declaration" => {
            if let Some(argument) = node.child_by_field_name("argument") {
                use_tree(ctx, argument, "", ctx.line(node));
            }
        }
        "function_item" => {
            named_component(ctx, node, prefix, ComponentKind::Function, None);
        }
        "struct_item" | "enum_item" | "trait_item" | "union_item" => {
            named_component(ctx, node, prefix, ComponentKind::Class, None);
        }
        "impl_item" => impl_block(ctx, node, prefix),
        "mod_item" => {
            // Inline modules only extend the id prefix of their items.
            let name = node
                .child_by_field_name("name")
                .map(|n| ctx.text(n).to_string());
            if let (Some(name), Some(body)) = (name, node.child_by_field_name("body")) {
                let nested = format!("{prefix}.{name}");
                let mut cursor = body.walk();
                for child in body.children(&mut cursor) {
                    item(ctx, child, &nested);
                }
            }
        }
        "const_item" | "static_item" | "type_item" => {
            let mut refs = Vec::new();
            collect_refs(ctx, node, &mut refs);
            ctx.module_refs.append(&mut refs);
        }
        _ => {}
    }
}

fn named_component(
    ctx: &mut ExtractCtx,
    node: Node,
    prefix: &str,
    kind: ComponentKind,
    parent: Option<&str>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_string();
    let id = format!("{prefix}.{name}");
    let span = ctx.span(node);
    let mut references = Vec::new();
    collect_refs(ctx, node, &mut references);
    ctx.components.push(RawComponent {
        kind,
        name,
        parent: parent.map(str::to_string),
        span,
        source_text: ctx.slice(span),
        references,
        id,
    });
}

/// `impl Type { .. }` / `impl Trait for Type { .. }`: functions inside
/// become methods of `Type`; the header's trait and type names count as
/// module-level references.
fn impl_block(ctx: &mut ExtractCtx, node: Node, prefix: &str) {
    let type_name = node
        .child_by_field_name("type")
        .map(|n| base_type_name(ctx.text(n)));
    let Some(type_name) = type_name else { return };
    let class_id = format!("{prefix}.{type_name}");

    let line = ctx.line(node);
    ctx.module_refs
        .push(RawReference::bare(type_name.as_str(), line));
    if let Some(trait_node) = node.child_by_field_name("trait") {
        ctx.module_refs
            .push(RawReference::bare(base_type_name(ctx.text(trait_node)), line));
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if child.kind() == "function_item" {
                named_component(ctx, child, &class_id, ComponentKind::Method, Some(&class_id));
            }
        }
    }
}

/// `Vec<Foo>` -> `Vec`, `a::b::C` -> `C`.
fn base_type_name(text: &str) -> String {
    let no_generics = text.split('<').next().unwrap_or(text);
    no_generics
        .rsplit("::")
        .next()
        .unwrap_or(no_generics)
        .trim()
        .to_string()
}

// ─── Use Declarations ─────────────────────────────────────────────────────────

fn use_tree(ctx: &mut ExtractCtx, node: Node, prefix: &str, line: usize) {
    match node.kind() {
        "identifier" | "type_identifier" | "crate" | "self" | "super" => {
            let name = ctx.text(node);
            let target = join_path(prefix, name);
            ctx.imports.push(ImportBinding {
                local: name.to_string(),
                target,
                line,
            });
        }
        "scoped_identifier" => {
            let target = dotted(ctx.text(node));
            let local = target.rsplit('.').next().unwrap_or(&target).to_string();
            ctx.imports.push(ImportBinding {
                local,
                target: join_path(prefix, &target),
                line,
            });
        }
        "use_as_clause" => {
            let path = node
                .child_by_field_name("path")
                .map(|n| dotted(ctx.text(n)))
                .unwrap_or_default();
            let alias = node
                .child_by_field_name("alias")
                .map(|n| ctx.text(n).to_string());
            if let Some(alias) = alias {
                ctx.imports.push(ImportBinding {
                    local: alias,
                    target: join_path(prefix, &path),
                    line,
                });
            }
        }
        "scoped_use_list" => {
            let path = node
                .child_by_field_name("path")
                .map(|n| dotted(ctx.text(n)))
                .unwrap_or_default();
            let nested = join_path(prefix, &path);
            if let Some(list) = node.child_by_field_name("list") {
                let mut cursor = list.walk();
                for child in list.children(&mut cursor) {
                    use_tree(ctx, child, &nested, line);
                }
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                use_tree(ctx, child, prefix, line);
            }
        }
        // Wildcards bind nothing nameable.
        "use_wildcard" => {}
        _ => {}
    }
}

fn dotted(path: &str) -> String {
    path.replace("::", ".")
}

fn join_path(prefix: &str, rest: &str) -> String {
    if prefix.is_empty() {
        rest.to_string()
    } else if rest.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}.{rest}")
    }
}

// ─── Reference Collection ─────────────────────────────────────────────────────

fn collect_refs(ctx: &ExtractCtx, node: Node, out: &mut Vec<RawReference>) {
    match node.kind() {
        "identifier" | "type_identifier" => {
            out.push(RawReference::bare(ctx.text(node), ctx.line(node)));
        }
        "field_expression" => {
            let value = node.child_by_field_name("value");
            let field = node.child_by_field_name("field");
            if let (Some(value), Some(field)) = (value, field) {
                out.push(RawReference::attribute(
                    normalize_receiver(ctx.text(value)),
                    ctx.text(field),
                    ctx.line(node),
                ));
                collect_refs(ctx, value, out);
            }
        }
        "scoped_identifier" => {
            let path = node.child_by_field_name("path");
            let name = node.child_by_field_name("name");
            if let (Some(path), Some(name)) = (path, name) {
                out.push(RawReference::attribute(
                    normalize_receiver(&dotted(ctx.text(path))),
                    ctx.text(name),
                    ctx.line(node),
                ));
            }
        }
        "function_item" | "struct_item" | "enum_item" | "trait_item" | "union_item"
        | "mod_item" => {
            let name = node.child_by_field_name("name");
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if Some(child.id()) == name.map(|n| n.id()) {
                    continue;
                }
                collect_refs(ctx, child, out);
            }
        }
        "parameter" => {
            // Pattern names are locals; the type may reference components.
            if let Some(ty) = node.child_by_field_name("type") {
                collect_refs(ctx, ty, out);
            }
        }
        "let_declaration" => {
            if let Some(ty) = node.child_by_field_name("type") {
                collect_refs(ctx, ty, out);
            }
            if let Some(value) = node.child_by_field_name("value") {
                collect_refs(ctx, value, out);
            }
        }
        "use_declaration" | "string_literal" | "line_comment" | "block_comment" => {}
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_refs(ctx, child, out);
            }
        }
    }
}

/// Receivers keep their dotted form; crate-local prefixes are stripped so
/// they can match import bindings and module ids.
fn normalize_receiver(receiver: &str) -> String {
    let r = receiver.trim();
    for prefix in ["crate.", "self.", "super."] {
        if let Some(rest) = r.strip_prefix(prefix) {
            return rest.to_string();
        }
    }
    r.to_string()
}

#[cfg(test)]
mod tests {
    use super::super::extract_file;
    use crate::graph::types::ComponentKind;
    use std::path::Path;

    fn extract(path: &str, source: &str) -> crate::graph::types::FileExtraction {
        extract_file(Path::new("."), Path::new(path), source).unwrap()
    }

    #[test]
    fn extracts_functions_types_and_methods() {
        let source = "\
pub struct Engine {
    count: usize,
}

impl Engine {
    pub fn new() -> Self {
        Engine { count: 0 }
    }

    pub fn run(&self) -> usize {
        self.tick()
    }
}

fn main() {
    let engine = Engine::new();
    engine.run();
}
";
        let extraction = extract("src/engine.rs", source);
        let ids: Vec<&str> = extraction
            .components
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "src.engine",
                "src.engine.Engine",
                "src.engine.Engine.new",
                "src.engine.Engine.run",
                "src.engine.main",
            ]
        );

        let run = extraction
            .components
            .iter()
            .find(|c| c.id == "src.engine.Engine.run")
            .unwrap();
        assert_eq!(run.kind, ComponentKind::Method);
        assert!(run
            .references
            .iter()
            .any(|r| r.name == "tick" && r.receiver.as_deref() == Some("self")));

        let main = extraction
            .components
            .iter()
            .find(|c| c.id == "src.engine.main")
            .unwrap();
        assert!(main
            .references
            .iter()
            .any(|r| r.name == "new" && r.receiver.as_deref() == Some("Engine")));
    }

    #[test]
    fn use_declarations_become_bindings() {
        let source = "\
use crate::config::ScanConfig;
use std::collections::{HashMap, HashSet};
use serde_json as json;

fn noop() {}
";
        let extraction = extract("src/lib.rs", source);
        let bindings: Vec<(&str, &str)> = extraction
            .imports
            .iter()
            .map(|b| (b.local.as_str(), b.target.as_str()))
            .collect();
        assert_eq!(
            bindings,
            vec![
                ("ScanConfig", "crate.config.ScanConfig"),
                ("HashMap", "std.collections.HashMap"),
                ("HashSet", "std.collections.HashSet"),
                ("json", "serde_json"),
            ]
        );
    }

    #[test]
    fn mod_rs_collapses_into_directory_id() {
        let extraction = extract("src/graph/mod.rs", "pub fn build() {}\n");
        assert_eq!(extraction.module_id, "src.graph");
        assert_eq!(extraction.components[1].id, "src.graph.build");
    }

    #[test]
    fn inline_modules_extend_the_prefix() {
        let source = "\
mod inner {
    pub fn helper() {}
}
";
        let extraction = extract("src/lib.rs", source);
        assert!(extraction
            .components
            .iter()
            .any(|c| c.id == "src.lib.inner.helper"));
    }
}
