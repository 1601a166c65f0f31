//! Python extraction rules.
//!
//! Top-level `def` and `class` statements become components; functions
//! inside a class body become methods. Import statements populate the
//! file's binding table, with relative imports resolved against the
//! importing module's package.

use tree_sitter::Node;

use super::ExtractCtx;
use crate::graph::types::{ComponentKind, ImportBinding, RawComponent, RawReference};

pub(crate) fn extract(ctx: &mut ExtractCtx, root: Node) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        top_level_statement(ctx, child);
    }
}

fn top_level_statement(ctx: &mut ExtractCtx, node: Node) {
    match node.kind() {
        "import_statement" => plain_import(ctx, node),
        "import_from_statement" => from_import(ctx, node),
        "future_import_statement" => {}
        "decorated_definition" => {
            if let Some(definition) = node.child_by_field_name("definition") {
                definition_component(ctx, definition, Some(node), None);
            }
        }
        "function_definition" | "class_definition" => {
            definition_component(ctx, node, None, None);
        }
        _ => {
            let mut refs = Vec::new();
            collect_refs(ctx, node, &mut refs);
            ctx.module_refs.append(&mut refs);
        }
    }
}

/// Emit a component for a def/class. `outer` is the decorated wrapper (its
/// span covers the decorators); `parent` is the enclosing class id.
fn definition_component(
    ctx: &mut ExtractCtx,
    definition: Node,
    outer: Option<Node>,
    parent: Option<&str>,
) {
    let Some(name_node) = definition.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_string();
    let id = match parent {
        Some(class_id) => format!("{class_id}.{name}"),
        None => format!("{}.{name}", ctx.module_id),
    };
    let span = ctx.span(outer.unwrap_or(definition));

    let mut references = Vec::new();
    if let Some(outer) = outer {
        // Decorator expressions reference other components too.
        let mut cursor = outer.walk();
        for child in outer.children(&mut cursor) {
            if child.kind() == "decorator" {
                collect_refs(ctx, child, &mut references);
            }
        }
    }

    match definition.kind() {
        "class_definition" => {
            if let Some(bases) = definition.child_by_field_name("superclasses") {
                collect_refs(ctx, bases, &mut references);
            }
            let body = definition.child_by_field_name("body");
            if let Some(body) = body {
                // Class-level statements reference on behalf of the class.
                let mut cursor = body.walk();
                for child in body.children(&mut cursor) {
                    if !matches!(child.kind(), "function_definition" | "decorated_definition") {
                        collect_refs(ctx, child, &mut references);
                    }
                }
            }
            let class_id = id.clone();
            ctx.components.push(RawComponent {
                kind: ComponentKind::Class,
                name,
                parent: None,
                span,
                source_text: ctx.slice(span),
                references,
                id,
            });
            if let Some(body) = body {
                class_methods(ctx, body, &class_id);
            }
        }
        "function_definition" => {
            collect_refs(ctx, definition, &mut references);
            ctx.components.push(RawComponent {
                kind: if parent.is_some() {
                    ComponentKind::Method
                } else {
                    ComponentKind::Function
                },
                name,
                parent: parent.map(str::to_string),
                span,
                source_text: ctx.slice(span),
                references,
                id,
            });
        }
        _ => {}
    }
}

/// Second pass over a class body: functions become method components.
fn class_methods(ctx: &mut ExtractCtx, body: Node, class_id: &str) {
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "function_definition" => definition_component(ctx, child, None, Some(class_id)),
            "decorated_definition" => {
                if let Some(definition) = child.child_by_field_name("definition") {
                    definition_component(ctx, definition, Some(child), Some(class_id));
                }
            }
            _ => {}
        }
    }
}

// ─── Imports ──────────────────────────────────────────────────────────────────

/// `import a.b.c` / `import a.b.c as d`
fn plain_import(ctx: &mut ExtractCtx, node: Node) {
    let line = ctx.line(node);
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        match name.kind() {
            "dotted_name" => {
                let target = ctx.text(name).to_string();
                ctx.imports.push(ImportBinding {
                    local: target.clone(),
                    target,
                    line,
                });
            }
            "aliased_import" => {
                let target = name
                    .child_by_field_name("name")
                    .map(|n| ctx.text(n).to_string())
                    .unwrap_or_default();
                let local = name
                    .child_by_field_name("alias")
                    .map(|n| ctx.text(n).to_string())
                    .unwrap_or_else(|| target.clone());
                if !target.is_empty() {
                    ctx.imports.push(ImportBinding { local, target, line });
                }
            }
            _ => {}
        }
    }
}

/// `from a.b import C, D as E` / `from .sibling import f`
fn from_import(ctx: &mut ExtractCtx, node: Node) {
    let line = ctx.line(node);
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return;
    };
    let Some(base) = import_base(ctx, module_node) else {
        return;
    };

    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let (imported, local) = match name.kind() {
            "dotted_name" => {
                let text = ctx.text(name).to_string();
                let local = text.rsplit('.').next().unwrap_or(&text).to_string();
                (text, local)
            }
            "aliased_import" => {
                let imported = name
                    .child_by_field_name("name")
                    .map(|n| ctx.text(n).to_string())
                    .unwrap_or_default();
                let local = name
                    .child_by_field_name("alias")
                    .map(|n| ctx.text(n).to_string())
                    .unwrap_or_else(|| imported.clone());
                (imported, local)
            }
            _ => continue, // wildcard imports carry no binding
        };
        if imported.is_empty() {
            continue;
        }
        let target = if base.is_empty() {
            imported
        } else {
            format!("{base}.{imported}")
        };
        ctx.imports.push(ImportBinding { local, target, line });
    }
}

/// Absolute dotted path of the `from X` part. Relative imports resolve
/// against the importing module's package.
fn import_base(ctx: &ExtractCtx, module_node: Node) -> Option<String> {
    match module_node.kind() {
        "dotted_name" => Some(ctx.text(module_node).to_string()),
        "relative_import" => {
            let mut dots = 0usize;
            let mut suffix = String::new();
            let mut cursor = module_node.walk();
            for child in module_node.children(&mut cursor) {
                match child.kind() {
                    "import_prefix" => dots = ctx.text(child).chars().filter(|&c| c == '.').count(),
                    "dotted_name" => suffix = ctx.text(child).to_string(),
                    _ => {}
                }
            }
            if dots == 0 {
                return None;
            }
            let package = ctx.package_id();
            let mut segments: Vec<&str> = if package.is_empty() {
                Vec::new()
            } else {
                package.split('.').collect()
            };
            // One dot is the current package, each further dot climbs once.
            for _ in 1..dots {
                segments.pop()?;
            }
            let mut base = segments.join(".");
            if !suffix.is_empty() {
                if base.is_empty() {
                    base = suffix;
                } else {
                    base = format!("{base}.{suffix}");
                }
            }
            Some(base)
        }
        _ => None,
    }
}

// ─── Reference Collection ─────────────────────────────────────────────────────

/// Record every name, attribute access, and call target under `node` that
/// could plausibly name another component. Local binders (def names,
/// parameters, keyword-argument names) are skipped; over-collection is
/// tolerable because resolution restricts matches to the registry.
fn collect_refs(ctx: &ExtractCtx, node: Node, out: &mut Vec<RawReference>) {
    match node.kind() {
        "identifier" => out.push(RawReference::bare(ctx.text(node), ctx.line(node))),
        "attribute" => {
            let receiver = node.child_by_field_name("object");
            let attr = node.child_by_field_name("attribute");
            if let (Some(receiver), Some(attr)) = (receiver, attr) {
                out.push(RawReference::attribute(
                    ctx.text(receiver),
                    ctx.text(attr),
                    ctx.line(node),
                ));
                collect_refs(ctx, receiver, out);
            }
        }
        "function_definition" | "class_definition" => {
            let name = node.child_by_field_name("name");
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if Some(child.id()) == name.map(|n| n.id()) {
                    continue;
                }
                collect_refs(ctx, child, out);
            }
        }
        "parameters" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    // Parameter names are locals; annotations and default
                    // values may still reference components.
                    "typed_parameter" | "typed_default_parameter" | "default_parameter" => {
                        if let Some(ty) = child.child_by_field_name("type") {
                            collect_refs(ctx, ty, out);
                        }
                        if let Some(value) = child.child_by_field_name("value") {
                            collect_refs(ctx, value, out);
                        }
                    }
                    _ => {}
                }
            }
        }
        "keyword_argument" => {
            if let Some(value) = node.child_by_field_name("value") {
                collect_refs(ctx, value, out);
            }
        }
        "string" | "comment" => {}
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_refs(ctx, child, out);
            }
        }
    }
}
