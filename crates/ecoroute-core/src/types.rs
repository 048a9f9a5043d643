// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared by the router, ledger, and adapters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter plugged into the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Backend,
    CarbonReader,
    Observability,
}

/// Where a carbon-intensity value came from.
///
/// The engine treats every source as a usable number; the distinction only
/// matters for reporting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReadingSource {
    /// Fresh value from the upstream provider.
    Live,
    /// Previously fetched value served from the reader's cache.
    Cached,
    /// Synthetic value (development mode or operator-supplied).
    Mock,
    /// Default value substituted after an upstream failure.
    Error,
}

/// A carbon-intensity reading in gCO2eq/kWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonReading {
    /// Intensity in gCO2eq/kWh.
    pub value: f64,
    /// When the value was measured or last refreshed.
    pub as_of: DateTime<Utc>,
    /// Provenance of the value.
    pub source: ReadingSource,
    /// Grid zone the reading applies to, if known.
    #[serde(default)]
    pub zone: Option<String>,
    /// Whether the upstream marked the value as estimated.
    #[serde(default)]
    pub is_estimated: Option<bool>,
    /// Error text when the value is a cached or default substitute.
    #[serde(default)]
    pub error: Option<String>,
}

impl CarbonReading {
    /// Build a reading with only a value and source, stamped now.
    pub fn new(value: f64, source: ReadingSource) -> Self {
        Self {
            value,
            as_of: Utc::now(),
            source,
            zone: None,
            is_estimated: None,
            error: None,
        }
    }
}

/// Capabilities a catalog model can advertise.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    General,
    Qa,
    Analysis,
    Code,
    Classification,
    Technical,
}

/// Task categories a query can be classified into.
///
/// Declaration order is significant: when two categories tie on score, the
/// one declared first wins.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    General,
    Analysis,
    Code,
    Qa,
}

impl TaskKind {
    /// All task kinds in tie-break order.
    pub const ALL: [TaskKind; 4] = [
        TaskKind::General,
        TaskKind::Analysis,
        TaskKind::Code,
        TaskKind::Qa,
    ];

    /// The catalog capability a model needs to serve this task.
    pub fn capability(self) -> Capability {
        match self {
            TaskKind::General => Capability::General,
            TaskKind::Analysis => Capability::Analysis,
            TaskKind::Code => Capability::Code,
            TaskKind::Qa => Capability::Qa,
        }
    }
}

/// Discrete carbon-cost bucket derived from an intensity reading.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CarbonTier {
    Low,
    Medium,
    High,
}

/// Capability and complexity profile of a single query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryProfile {
    /// Whether the query warrants a larger model.
    pub is_complex: bool,
    /// Task category the query most likely needs.
    pub capability_hint: TaskKind,
    /// Per-category keyword scores.
    pub task_scores: BTreeMap<TaskKind, usize>,
    /// Number of distinct lower-cased words.
    pub word_count: usize,
    /// Whether the code-keyword rules fired.
    pub is_code: bool,
    /// Code keyword matches divided by distinct word count.
    pub code_score: f64,
}

impl QueryProfile {
    /// Profile of an empty or whitespace-only query.
    pub fn empty() -> Self {
        Self {
            is_complex: false,
            capability_hint: TaskKind::General,
            task_scores: TaskKind::ALL.iter().map(|t| (*t, 0)).collect(),
            word_count: 0,
            is_code: false,
            code_score: 0.0,
        }
    }
}

/// Which selection rule produced the chosen model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SelectionStage {
    /// Explicit model requested by the caller.
    Override,
    /// Code-capable model for code queries.
    Code,
    /// First capable catalog model for complex queries.
    Complex,
    /// Always-resident baseline model.
    Baseline,
}
