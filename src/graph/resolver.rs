//! Reference resolution — turns raw references into `depends_on` edges.
//!
//! Runs after the whole tree has been merged into the registry, because a
//! reference in one file may target a component defined in another. For a
//! same-named ambiguity the policy prefers, in order: an import binding of
//! the referencing file, a definition in the same file, then a globally
//! unique candidate. Anything still ambiguous is dropped — a missed edge
//! is acceptable, a spurious one is not.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::registry::ComponentRegistry;
use super::types::{FileExtraction, ImportBinding, RawComponent, RawReference};

/// Read-only lookup structures shared by every per-file resolution call.
pub(crate) struct ResolverIndex<'a> {
    registry: &'a ComponentRegistry,
    /// Simple name -> candidate ids, in ascending id order.
    by_name: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> ResolverIndex<'a> {
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        let mut by_name: HashMap<&str, Vec<&str>> = HashMap::new();
        for (id, component) in registry.iter() {
            by_name.entry(component.name()).or_default().push(id);
        }
        Self { registry, by_name }
    }

    /// Map an import target (dotted path) to a registry id. Exact match
    /// first; otherwise a unique suffix match, which absorbs language
    /// prefixes like `crate`/`self` that never appear in module ids.
    fn resolve_target(&self, target: &str) -> Option<&'a str> {
        if let Some(component) = self.registry.get(target) {
            return Some(component.id.as_str());
        }
        let trimmed = target
            .strip_prefix("crate.")
            .or_else(|| target.strip_prefix("self."))
            .or_else(|| target.strip_prefix("super."))
            .unwrap_or(target);
        if let Some(component) = self.registry.get(trimmed) {
            return Some(component.id.as_str());
        }
        let suffix = format!(".{trimmed}");
        let mut hits = self.registry.ids().filter(|id| id.ends_with(&suffix));
        match (hits.next(), hits.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    fn unique_global(&self, name: &str) -> Option<&'a str> {
        match self.by_name.get(name).map(Vec::as_slice) {
            Some([only]) => Some(*only),
            _ => None,
        }
    }
}

/// Per-file context: the import table and the file's own definitions.
pub(crate) struct FileScope<'a> {
    imports: &'a [ImportBinding],
    /// Simple name -> id, for components defined in this file. First
    /// definition wins, matching extraction order.
    local: HashMap<&'a str, &'a str>,
}

impl<'a> FileScope<'a> {
    pub fn new(extraction: &'a FileExtraction) -> Self {
        let mut local = HashMap::new();
        for component in &extraction.components {
            local
                .entry(component.name.as_str())
                .or_insert(component.id.as_str());
        }
        Self {
            imports: &extraction.imports,
            local,
        }
    }

    fn binding(&self, local_name: &str) -> Option<&'a ImportBinding> {
        self.imports.iter().find(|b| b.local == local_name)
    }
}

/// Resolve one file's components. Returns `(component_id, depends_on)`
/// pairs, de-duplicated with first-occurrence order preserved.
pub(crate) fn resolve_file(
    index: &ResolverIndex<'_>,
    extraction: &FileExtraction,
) -> Vec<(String, Vec<String>)> {
    let scope = FileScope::new(extraction);
    extraction
        .components
        .iter()
        .map(|component| {
            let mut seen = HashSet::new();
            let mut resolved = Vec::new();
            let mut push = |id: &str| {
                if id != component.id && seen.insert(id.to_string()) {
                    resolved.push(id.to_string());
                }
            };

            // The module component depends on everything its file imports
            // from inside the tree, in import order.
            if component.id == extraction.module_id {
                for binding in &extraction.imports {
                    if let Some(id) = index.resolve_target(&binding.target) {
                        push(id);
                    }
                }
            }

            for reference in &component.references {
                if let Some(id) = resolve_reference(index, &scope, component, reference) {
                    push(id);
                }
            }

            debug!(
                component = %component.id,
                edges = resolved.len(),
                "resolved references"
            );
            (component.id.clone(), resolved)
        })
        .collect()
}

fn resolve_reference<'a>(
    index: &ResolverIndex<'a>,
    scope: &FileScope<'_>,
    component: &RawComponent,
    reference: &RawReference,
) -> Option<&'a str> {
    match reference.receiver.as_deref() {
        // Methods reached through the instance resolve inside the
        // enclosing class; an inherited method is a missed edge, not a
        // guessed one.
        Some("self") | Some("this") | Some("cls") | Some("Self") => {
            let class_id = component.parent.as_deref()?;
            let candidate = format!("{class_id}.{}", reference.name);
            index.registry.get(&candidate).map(|c| c.id.as_str())
        }
        Some(receiver) => {
            let base = resolve_receiver(index, scope, receiver)?;
            let candidate = format!("{base}.{}", reference.name);
            if let Some(target) = index.registry.get(&candidate) {
                return Some(target.id.as_str());
            }
            // `pkg.helper()` where `pkg` is a package index module.
            index.resolve_target(&candidate)
        }
        None => {
            if let Some(binding) = scope.binding(&reference.name) {
                return index.resolve_target(&binding.target);
            }
            if let Some(id) = scope.local.get(reference.name.as_str()) {
                return index.registry.get(id).map(|c| c.id.as_str());
            }
            index.unique_global(&reference.name)
        }
    }
}

/// Resolve the receiver of an attribute access to a component id prefix.
fn resolve_receiver<'a>(
    index: &ResolverIndex<'a>,
    scope: &FileScope<'_>,
    receiver: &str,
) -> Option<&'a str> {
    if let Some(binding) = scope.binding(receiver) {
        return index.resolve_target(&binding.target);
    }
    if let Some(id) = scope.local.get(receiver) {
        return index.registry.get(id).map(|c| c.id.as_str());
    }
    // A dotted receiver can name a module id directly.
    if receiver.contains('.') {
        if let Some(component) = index.registry.get(receiver) {
            return Some(component.id.as_str());
        }
    }
    index.unique_global(receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{Component, ComponentKind, Span};
    use std::path::PathBuf;

    fn component(id: &str, kind: ComponentKind, path: &str) -> Component {
        Component {
            id: id.to_string(),
            kind,
            relative_path: PathBuf::from(path),
            absolute_path: PathBuf::from(format!("/repo/{path}")),
            span: Span::new(1, 1),
            source_text: String::new(),
            depends_on: Vec::new(),
        }
    }

    fn raw(id: &str, kind: ComponentKind, refs: Vec<RawReference>) -> RawComponent {
        RawComponent {
            id: id.to_string(),
            kind,
            name: id.rsplit('.').next().unwrap().to_string(),
            parent: None,
            span: Span::new(1, 1),
            source_text: String::new(),
            references: refs,
        }
    }

    fn registry(ids: &[(&str, ComponentKind, &str)]) -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        for (id, kind, path) in ids {
            registry.insert(component(id, *kind, path));
        }
        registry
    }

    #[test]
    fn import_binding_beats_global_candidates() {
        // Two classes named Handler; the import picks one of them.
        let registry = registry(&[
            ("a.web", ComponentKind::Module, "a/web.py"),
            ("a.web.Handler", ComponentKind::Class, "a/web.py"),
            ("a.jobs", ComponentKind::Module, "a/jobs.py"),
            ("a.jobs.Handler", ComponentKind::Class, "a/jobs.py"),
            ("a.main", ComponentKind::Module, "a/main.py"),
        ]);
        let index = ResolverIndex::new(&registry);
        let extraction = FileExtraction {
            relative_path: PathBuf::from("a/main.py"),
            absolute_path: PathBuf::from("/repo/a/main.py"),
            module_id: "a.main".to_string(),
            components: vec![raw(
                "a.main",
                ComponentKind::Module,
                vec![RawReference::bare("Handler", 3)],
            )],
            imports: vec![ImportBinding {
                local: "Handler".to_string(),
                target: "a.web.Handler".to_string(),
                line: 1,
            }],
        };

        let resolved = resolve_file(&index, &extraction);
        assert_eq!(resolved[0].1, vec!["a.web.Handler".to_string()]);
    }

    #[test]
    fn same_file_definition_beats_global() {
        let registry = registry(&[
            ("a.one", ComponentKind::Module, "a/one.py"),
            ("a.one.helper", ComponentKind::Function, "a/one.py"),
            ("a.two", ComponentKind::Module, "a/two.py"),
            ("a.two.helper", ComponentKind::Function, "a/two.py"),
        ]);
        let index = ResolverIndex::new(&registry);
        let extraction = FileExtraction {
            relative_path: PathBuf::from("a/one.py"),
            absolute_path: PathBuf::from("/repo/a/one.py"),
            module_id: "a.one".to_string(),
            components: vec![
                raw("a.one", ComponentKind::Module, vec![]),
                raw(
                    "a.one.caller",
                    ComponentKind::Function,
                    vec![RawReference::bare("helper", 5)],
                ),
                raw("a.one.helper", ComponentKind::Function, vec![]),
            ],
            imports: vec![],
        };

        let resolved = resolve_file(&index, &extraction);
        let caller = resolved.iter().find(|(id, _)| id == "a.one.caller").unwrap();
        assert_eq!(caller.1, vec!["a.one.helper".to_string()]);
    }

    #[test]
    fn ambiguous_without_import_is_dropped() {
        let registry = registry(&[
            ("a.one.helper", ComponentKind::Function, "a/one.py"),
            ("a.two.helper", ComponentKind::Function, "a/two.py"),
            ("a.main", ComponentKind::Module, "a/main.py"),
        ]);
        let index = ResolverIndex::new(&registry);
        let extraction = FileExtraction {
            relative_path: PathBuf::from("a/main.py"),
            absolute_path: PathBuf::from("/repo/a/main.py"),
            module_id: "a.main".to_string(),
            components: vec![raw(
                "a.main",
                ComponentKind::Module,
                vec![RawReference::bare("helper", 2)],
            )],
            imports: vec![],
        };

        let resolved = resolve_file(&index, &extraction);
        assert!(resolved[0].1.is_empty());
    }

    #[test]
    fn unique_global_candidate_resolves_without_import() {
        let registry = registry(&[
            ("a.util.normalize", ComponentKind::Function, "a/util.py"),
            ("a.main", ComponentKind::Module, "a/main.py"),
        ]);
        let index = ResolverIndex::new(&registry);
        let extraction = FileExtraction {
            relative_path: PathBuf::from("a/main.py"),
            absolute_path: PathBuf::from("/repo/a/main.py"),
            module_id: "a.main".to_string(),
            components: vec![raw(
                "a.main",
                ComponentKind::Module,
                vec![RawReference::bare("normalize", 2)],
            )],
            imports: vec![],
        };

        let resolved = resolve_file(&index, &extraction);
        assert_eq!(resolved[0].1, vec!["a.util.normalize".to_string()]);
    }

    #[test]
    fn self_receiver_resolves_in_enclosing_class() {
        let registry = registry(&[
            ("m.C", ComponentKind::Class, "m.py"),
            ("m.C.load", ComponentKind::Method, "m.py"),
            ("m.C.parse", ComponentKind::Method, "m.py"),
        ]);
        let index = ResolverIndex::new(&registry);
        let mut load = raw(
            "m.C.load",
            ComponentKind::Method,
            vec![RawReference::attribute("self", "parse", 2)],
        );
        load.parent = Some("m.C".to_string());
        let extraction = FileExtraction {
            relative_path: PathBuf::from("m.py"),
            absolute_path: PathBuf::from("/repo/m.py"),
            module_id: "m".to_string(),
            components: vec![load],
            imports: vec![],
        };

        let resolved = resolve_file(&index, &extraction);
        assert_eq!(resolved[0].1, vec!["m.C.parse".to_string()]);
    }

    #[test]
    fn duplicates_keep_first_occurrence_order() {
        let registry = registry(&[
            ("m.a", ComponentKind::Function, "m.py"),
            ("m.b", ComponentKind::Function, "m.py"),
            ("m.caller", ComponentKind::Function, "m.py"),
        ]);
        let index = ResolverIndex::new(&registry);
        let extraction = FileExtraction {
            relative_path: PathBuf::from("m.py"),
            absolute_path: PathBuf::from("/repo/m.py"),
            module_id: "m".to_string(),
            components: vec![raw(
                "m.caller",
                ComponentKind::Function,
                vec![
                    RawReference::bare("b", 2),
                    RawReference::bare("a", 3),
                    RawReference::bare("b", 4),
                ],
            )],
            imports: vec![],
        };

        let resolved = resolve_file(&index, &extraction);
        assert_eq!(resolved[0].1, vec!["m.b".to_string(), "m.a".to_string()]);
    }

    #[test]
    fn self_edges_are_dropped() {
        let registry = registry(&[("m.f", ComponentKind::Function, "m.py")]);
        let index = ResolverIndex::new(&registry);
        let extraction = FileExtraction {
            relative_path: PathBuf::from("m.py"),
            absolute_path: PathBuf::from("/repo/m.py"),
            module_id: "m".to_string(),
            components: vec![raw(
                "m.f",
                ComponentKind::Function,
                vec![RawReference::bare("f", 2)],
            )],
            imports: vec![],
        };

        let resolved = resolve_file(&index, &extraction);
        assert!(resolved[0].1.is_empty());
    }
}
