//! The component registry — the single owned store of scan results.
//!
//! One registry is built per repository scan, passed by reference to every
//! later stage, and treated as read-only once resolution completes. There
//! is no global state; the caller of the scan owns the registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::types::{Component, ComponentKind};

/// Mapping `id -> Component` for everything found in a scan.
///
/// Backed by a `BTreeMap` so iteration order is the sorted id order,
/// which keeps every downstream stage deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentRegistry {
    components: BTreeMap<String, Component>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an already-keyed map (snapshot loading).
    pub fn from_components(components: BTreeMap<String, Component>) -> Self {
        Self { components }
    }

    /// Insert a component under its own id.
    ///
    /// Ids are unique by construction (full-path qualification); if two
    /// files ever map to the same id the first insertion wins and the
    /// collision is logged, so the registry stays deterministic.
    pub fn insert(&mut self, component: Component) {
        if let Some(existing) = self.components.get(&component.id) {
            warn!(
                id = %component.id,
                kept = %existing.relative_path.display(),
                dropped = %component.relative_path.display(),
                "duplicate component id, keeping first"
            );
            return;
        }
        self.components.insert(component.id.clone(), component);
    }

    pub fn get(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Components in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Component)> {
        self.components.iter().map(|(id, c)| (id.as_str(), c))
    }

    /// The underlying id-keyed map (snapshot serialization).
    pub fn components(&self) -> &BTreeMap<String, Component> {
        &self.components
    }

    /// Replace a component's resolved dependency list.
    pub(crate) fn set_depends_on(&mut self, id: &str, depends_on: Vec<String>) {
        if let Some(component) = self.components.get_mut(id) {
            component.depends_on = depends_on;
        }
    }

    /// Count components of a given kind.
    pub fn count_kind(&self, kind: ComponentKind) -> usize {
        self.components.values().filter(|c| c.kind == kind).count()
    }

    /// Check the closed-world property: every id in any `depends_on` list
    /// must be a registry key. Returns the sorted set of missing ids.
    pub fn dangling_references(&self) -> Vec<String> {
        let mut missing: Vec<String> = self
            .components
            .values()
            .flat_map(|c| c.depends_on.iter())
            .filter(|id| !self.components.contains_key(*id))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}
