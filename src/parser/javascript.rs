//! JavaScript / TypeScript extraction rules.
//!
//! Function and class declarations (including TS interfaces, enums, and
//! type aliases) become components; methods come from class bodies.
//! Only relative imports produce bindings — package imports point outside
//! the scanned tree and can never resolve.

use std::path::Path;
use tree_sitter::Node;

use super::{module_id_for, ExtractCtx};
use crate::graph::types::{ComponentKind, ImportBinding, RawComponent, RawReference};

pub(crate) fn extract(ctx: &mut ExtractCtx, root: Node) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        top_level_statement(ctx, child);
    }
}

fn top_level_statement(ctx: &mut ExtractCtx, node: Node) {
    match node.kind() {
        "import_statement" => import_statement(ctx, node),
        "export_statement" => {
            if let Some(declaration) = node.child_by_field_name("declaration") {
                top_level_statement(ctx, declaration);
            }
        }
        "function_declaration" | "generator_function_declaration" => {
            named_component(ctx, node, ComponentKind::Function);
        }
        "class_declaration" | "abstract_class_declaration" => class_declaration(ctx, node),
        "interface_declaration" | "enum_declaration" | "type_alias_declaration" => {
            named_component(ctx, node, ComponentKind::Class);
        }
        "lexical_declaration" | "variable_declaration" => {
            variable_declaration(ctx, node);
        }
        _ => {
            let mut refs = Vec::new();
            collect_refs(ctx, node, &mut refs);
            ctx.module_refs.append(&mut refs);
        }
    }
}

fn named_component(ctx: &mut ExtractCtx, node: Node, kind: ComponentKind) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_string();
    let id = format!("{}.{name}", ctx.module_id);
    let span = ctx.span(node);
    let mut references = Vec::new();
    collect_refs(ctx, node, &mut references);
    ctx.components.push(RawComponent {
        kind,
        name,
        parent: None,
        span,
        source_text: ctx.slice(span),
        references,
        id,
    });
}

fn class_declaration(ctx: &mut ExtractCtx, node: Node) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_string();
    let class_id = format!("{}.{name}", ctx.module_id);
    let span = ctx.span(node);

    let mut class_refs = Vec::new();
    // `extends Base` and decorators reference other components.
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "class_heritage" || child.kind() == "decorator" {
            collect_refs(ctx, child, &mut class_refs);
        }
    }

    let body = node.child_by_field_name("body");
    if let Some(body) = body {
        // Field initializers reference on behalf of the class.
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.kind() != "method_definition" {
                collect_refs(ctx, member, &mut class_refs);
            }
        }
    }

    ctx.components.push(RawComponent {
        kind: ComponentKind::Class,
        name,
        parent: None,
        span,
        source_text: ctx.slice(span),
        references: class_refs,
        id: class_id.clone(),
    });

    if let Some(body) = body {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.kind() == "method_definition" {
                method_component(ctx, member, &class_id);
            }
        }
    }
}

fn method_component(ctx: &mut ExtractCtx, node: Node, class_id: &str) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_string();
    let id = format!("{class_id}.{name}");
    let span = ctx.span(node);
    let mut references = Vec::new();
    collect_refs(ctx, node, &mut references);
    ctx.components.push(RawComponent {
        kind: ComponentKind::Method,
        name,
        parent: Some(class_id.to_string()),
        span,
        source_text: ctx.slice(span),
        references,
        id,
    });
}

/// `const f = () => ...` at top level counts as a function definition.
fn variable_declaration(ctx: &mut ExtractCtx, node: Node) {
    let mut module_refs = Vec::new();
    let mut cursor = node.walk();
    for declarator in node.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let name = declarator.child_by_field_name("name");
        let value = declarator.child_by_field_name("value");
        match (name, value) {
            (Some(name_node), Some(value_node))
                if matches!(
                    value_node.kind(),
                    "arrow_function" | "function_expression" | "generator_function"
                ) && name_node.kind() == "identifier" =>
            {
                let name = ctx.text(name_node).to_string();
                let id = format!("{}.{name}", ctx.module_id);
                let span = ctx.span(node);
                let mut references = Vec::new();
                collect_refs(ctx, value_node, &mut references);
                ctx.components.push(RawComponent {
                    kind: ComponentKind::Function,
                    name,
                    parent: None,
                    span,
                    source_text: ctx.slice(span),
                    references,
                    id,
                });
            }
            (_, Some(value_node)) => collect_refs(ctx, value_node, &mut module_refs),
            _ => {}
        }
    }
    ctx.module_refs.append(&mut module_refs);
}

// ─── Imports ──────────────────────────────────────────────────────────────────

fn import_statement(ctx: &mut ExtractCtx, node: Node) {
    let line = ctx.line(node);
    let Some(source_node) = node.child_by_field_name("source") else {
        return;
    };
    let raw = ctx.text(source_node);
    let spec = raw.trim_matches(|c| c == '"' || c == '\'' || c == '`');
    if !spec.starts_with('.') {
        // Package import: outside the tree, never resolvable.
        return;
    }
    let Some(target_module) = relative_module_id(ctx.relative_path, spec) else {
        return;
    };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "import_clause" {
            continue;
        }
        let mut clause_cursor = child.walk();
        for clause in child.children(&mut clause_cursor) {
            match clause.kind() {
                // Default import binds the module itself.
                "identifier" => ctx.imports.push(ImportBinding {
                    local: ctx.text(clause).to_string(),
                    target: target_module.clone(),
                    line,
                }),
                "namespace_import" => {
                    let mut ns_cursor = clause.walk();
                    for part in clause.children(&mut ns_cursor) {
                        if part.kind() == "identifier" {
                            ctx.imports.push(ImportBinding {
                                local: ctx.text(part).to_string(),
                                target: target_module.clone(),
                                line,
                            });
                        }
                    }
                }
                "named_imports" => {
                    let mut named_cursor = clause.walk();
                    for spec_node in clause.children(&mut named_cursor) {
                        if spec_node.kind() != "import_specifier" {
                            continue;
                        }
                        let imported = spec_node
                            .child_by_field_name("name")
                            .map(|n| ctx.text(n).to_string())
                            .unwrap_or_default();
                        if imported.is_empty() {
                            continue;
                        }
                        let local = spec_node
                            .child_by_field_name("alias")
                            .map(|n| ctx.text(n).to_string())
                            .unwrap_or_else(|| imported.clone());
                        ctx.imports.push(ImportBinding {
                            local,
                            target: format!("{target_module}.{imported}"),
                            line,
                        });
                    }
                }
                _ => {}
            }
        }
    }
}

/// Resolve `./x` / `../y/z` against the importing file's directory and
/// fold the result into a module id.
fn relative_module_id(importer: &Path, spec: &str) -> Option<String> {
    let mut segments: Vec<String> = importer
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    for part in spec.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            name => segments.push(name.to_string()),
        }
    }

    let joined: std::path::PathBuf = segments.iter().collect();
    Some(module_id_for(&joined))
}

// ─── Reference Collection ─────────────────────────────────────────────────────

fn collect_refs(ctx: &ExtractCtx, node: Node, out: &mut Vec<RawReference>) {
    match node.kind() {
        "identifier" | "type_identifier" => {
            out.push(RawReference::bare(ctx.text(node), ctx.line(node)));
        }
        "this" => {}
        "member_expression" => {
            let object = node.child_by_field_name("object");
            let property = node.child_by_field_name("property");
            if let (Some(object), Some(property)) = (object, property) {
                let receiver = if object.kind() == "this" {
                    "this".to_string()
                } else {
                    ctx.text(object).to_string()
                };
                out.push(RawReference::attribute(
                    receiver,
                    ctx.text(property),
                    ctx.line(node),
                ));
                collect_refs(ctx, object, out);
            }
        }
        "function_declaration" | "generator_function_declaration" | "class_declaration"
        | "method_definition" => {
            let name = node.child_by_field_name("name");
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if Some(child.id()) == name.map(|n| n.id()) {
                    continue;
                }
                collect_refs(ctx, child, out);
            }
        }
        "formal_parameters" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    // Parameter names bind locals; annotations and default
                    // values can still reference components.
                    "required_parameter" | "optional_parameter" => {
                        if let Some(ty) = child.child_by_field_name("type") {
                            collect_refs(ctx, ty, out);
                        }
                        if let Some(value) = child.child_by_field_name("value") {
                            collect_refs(ctx, value, out);
                        }
                    }
                    "identifier" => {}
                    _ => collect_refs(ctx, child, out),
                }
            }
        }
        "import_statement" | "string" | "template_string" | "comment" => {}
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_refs(ctx, child, out);
            }
        }
    }
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
    fn extracts_classes_and_methods() {
        let source = "\
class ApiClient {
    fetch(endpoint) {
        return this.request(endpoint);
    }
}

function createApp() {
    return new ApiClient();
}
";
        let extraction = extract("src/client.js", source);
        let ids: Vec<&str> = extraction
            .components
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "src.client",
                "src.client.ApiClient",
                "src.client.ApiClient.fetch",
                "src.client.createApp",
            ]
        );

        let fetch = extraction
            .components
            .iter()
            .find(|c| c.id == "src.client.ApiClient.fetch")
            .unwrap();
        assert_eq!(fetch.kind, ComponentKind::Method);
        assert!(fetch
            .references
            .iter()
            .any(|r| r.name == "request" && r.receiver.as_deref() == Some("this")));

        let create = extraction
            .components
            .iter()
            .find(|c| c.id == "src.client.createApp")
            .unwrap();
        assert!(create.references.iter().any(|r| r.name == "ApiClient"));
    }

    #[test]
    fn arrow_function_consts_are_functions() {
        let source = "const handler = (req) => req.body;\n";
        let extraction = extract("src/handlers.js", source);
        let handler = extraction
            .components
            .iter()
            .find(|c| c.id == "src.handlers.handler")
            .unwrap();
        assert_eq!(handler.kind, ComponentKind::Function);
    }

    #[test]
    fn relative_imports_bind_named_symbols() {
        let source = "\
import { ApiClient, helper as h } from './client';
import * as util from '../shared/util';
import axios from 'axios';
";
        let extraction = extract("src/app/main.js", source);
        let bindings: Vec<(&str, &str)> = extraction
            .imports
            .iter()
            .map(|b| (b.local.as_str(), b.target.as_str()))
            .collect();
        assert_eq!(
            bindings,
            vec![
                ("ApiClient", "src.app.client.ApiClient"),
                ("h", "src.app.client.helper"),
                ("util", "src.shared.util"),
            ]
        );
    }

    #[test]
    fn typescript_interfaces_and_enums_are_classes() {
        let source = "\
interface UserDTO {
    id: number;
}

enum Role {
    Admin,
    Guest,
}
";
        let extraction = extract("src/types.ts", source);
        let kinds: Vec<(&str, ComponentKind)> = extraction
            .components
            .iter()
            .skip(1)
            .map(|c| (c.id.as_str(), c.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("src.types.UserDTO", ComponentKind::Class),
                ("src.types.Role", ComponentKind::Class),
            ]
        );
    }
}
