// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carbon-aware model routing for Ecoroute.
//!
//! A query flows through four stages:
//!
//! - [`QueryAnalyzer`] turns text into a [`QueryProfile`](ecoroute_core::QueryProfile)
//!   using keyword heuristics.
//! - [`CarbonTierClassifier`] maps the current grid intensity to a tier.
//! - [`SelectionPolicy`] picks a model, loading it on demand through the
//!   [`ModelLifecycleManager`], which guarantees at most one load per model
//!   at a time.
//! - [`RoutingEngine`] ties the stages together, records every decision in
//!   the request ledger, and retries failed generations on the baseline.

pub mod analyzer;
pub mod catalog;
pub mod engine;
pub mod lifecycle;
pub mod policy;
pub mod tier;

pub use analyzer::{KeywordSets, QueryAnalyzer};
pub use catalog::{ModelCatalog, ModelDescriptor};
pub use engine::{AUTO_MODEL, Answer, EngineHealth, Generation, RoutingEngine, Selection};
pub use lifecycle::{LoadError, ModelLifecycleManager, ResidentModel};
pub use policy::{PolicyDecision, PolicySettings, SelectionPolicy};
pub use tier::CarbonTierClassifier;
