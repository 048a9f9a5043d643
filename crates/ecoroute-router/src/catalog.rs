// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static registry of routable models.
//!
//! Built once from configuration and shared read-only. Iteration follows
//! declaration order, which the complex-query rule depends on.

use std::collections::BTreeSet;

use ecoroute_config::model::ModelEntry;
use ecoroute_core::Capability;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub capabilities: BTreeSet<Capability>,
    /// kWh per thousand generated tokens.
    pub energy_per_1k_tokens: f64,
    pub max_context: u32,
    pub performance_score: f64,
}

impl ModelDescriptor {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

impl From<&ModelEntry> for ModelDescriptor {
    fn from(entry: &ModelEntry) -> Self {
        Self {
            id: entry.id.clone(),
            capabilities: entry.capabilities.iter().copied().collect(),
            energy_per_1k_tokens: entry.energy_per_1k_tokens,
            max_context: entry.max_context,
            performance_score: entry.performance_score,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
}

impl ModelCatalog {
    /// Build a catalog. Later duplicates of an id are ignored.
    pub fn new(models: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        let mut catalog = Self::default();
        for model in models {
            if !catalog.contains(&model.id) {
                catalog.models.push(model);
            }
        }
        catalog
    }

    pub fn from_entries(entries: &[ModelEntry]) -> Self {
        Self::new(entries.iter().map(ModelDescriptor::from))
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Highest energy cost in the catalog, `0.0` when empty.
    pub fn max_energy(&self) -> f64 {
        self.models
            .iter()
            .map(|m| m.energy_per_1k_tokens)
            .fold(0.0, f64::max)
    }

    /// Fraction of energy `id` saves relative to the hungriest model.
    ///
    /// `0.0` for unknown ids or when every model is free.
    pub fn carbon_savings(&self, id: &str) -> f64 {
        let max = self.max_energy();
        match self.get(id) {
            Some(model) if max > 0.0 => 1.0 - model.energy_per_1k_tokens / max,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoroute_config::EcorouteConfig;

    fn default_catalog() -> ModelCatalog {
        ModelCatalog::from_entries(&EcorouteConfig::default().models)
    }

    #[test]
    fn preserves_declaration_order() {
        let catalog = default_catalog();
        let ids: Vec<&str> = catalog.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["tinyllama", "gpt2", "codellama"]);
    }

    #[test]
    fn lookup_and_capabilities() {
        let catalog = default_catalog();
        let codellama = catalog.get("codellama").unwrap();
        assert!(codellama.has(Capability::Code));
        assert!(!codellama.has(Capability::Qa));
        assert_eq!(codellama.max_context, 4096);
        assert!(catalog.get("llama-70b").is_none());
    }

    #[test]
    fn savings_relative_to_hungriest_model() {
        let catalog = default_catalog();
        assert!((catalog.max_energy() - 0.02).abs() < 1e-12);
        assert!((catalog.carbon_savings("tinyllama") - 0.95).abs() < 1e-12);
        assert!((catalog.carbon_savings("gpt2") - 0.5).abs() < 1e-12);
        assert_eq!(catalog.carbon_savings("codellama"), 0.0);
        assert_eq!(catalog.carbon_savings("unknown"), 0.0);
    }

    #[test]
    fn empty_catalog_has_no_savings() {
        let catalog = ModelCatalog::default();
        assert!(catalog.is_empty());
        assert_eq!(catalog.max_energy(), 0.0);
        assert_eq!(catalog.carbon_savings("x"), 0.0);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let mut entries = EcorouteConfig::default().models;
        let mut dup = entries[0].clone();
        dup.max_context = 1;
        entries.push(dup);
        let catalog = ModelCatalog::from_entries(&entries);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("tinyllama").unwrap().max_context, 2048);
    }
}
