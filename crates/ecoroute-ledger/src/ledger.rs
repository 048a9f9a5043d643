// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory request ledger for routing decisions.
//!
//! Every selection the engine makes is appended as a [`SelectionRecord`].
//! Records are never mutated after creation. The ledger retains a bounded
//! window: once `max_records` is reached the oldest record is dropped on
//! each append.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use ecoroute_core::{CarbonTier, QueryProfile, ReadingSource, SelectionStage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One routing decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRecord {
    /// Unique record identifier (UUID v4).
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Catalog id of the model that will serve the request.
    pub chosen_model_id: String,
    pub tier: CarbonTier,
    /// Carbon intensity (gCO2eq/kWh) the tier was derived from.
    pub carbon_reading: f64,
    pub carbon_source: ReadingSource,
    pub profile: QueryProfile,
    /// True when a preferred candidate failed to load and a fallback was chosen.
    pub fallback_occurred: bool,
    pub stage: SelectionStage,
    /// Fraction of energy saved relative to the most energy-hungry catalog model.
    pub carbon_savings: f64,
    pub performance_score: f64,
}

/// Aggregates over the retained history.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerMetrics {
    pub total_requests: usize,
    pub average_carbon_savings: f64,
    pub average_performance_score: f64,
}

/// Append-only, bounded history of selection records.
///
/// Appends and reads take a single lock, so concurrent `record` calls are
/// linearized and `history`/`metrics` always see a consistent prefix.
#[derive(Debug)]
pub struct RequestLedger {
    records: RwLock<VecDeque<SelectionRecord>>,
    max_records: Option<usize>,
}

impl RequestLedger {
    /// Create a ledger retaining at most `max_records` entries. `0` disables the cap.
    pub fn new(max_records: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            max_records: (max_records > 0).then_some(max_records),
        }
    }

    /// Create a ledger with no retention cap.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Append a record, dropping the oldest if the cap is reached.
    pub fn record(&self, record: SelectionRecord) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(cap) = self.max_records {
            while records.len() >= cap {
                records.pop_front();
            }
        }
        debug!(
            record_id = %record.id,
            model_id = %record.chosen_model_id,
            tier = %record.tier,
            "selection recorded"
        );
        records.push_back(record);
    }

    /// The last `limit` records, most recent last.
    pub fn history(&self, limit: usize) -> Vec<SelectionRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let skip = records.len().saturating_sub(limit);
        records.iter().skip(skip).cloned().collect()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Totals and averages over the retained history, zeros when empty.
    pub fn metrics(&self) -> LedgerMetrics {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let (savings, performance) = records
            .iter()
            .fold((0.0, 0.0), |(s, p), r| (s + r.carbon_savings, p + r.performance_score));

        let total = records.len();
        if total == 0 {
            return LedgerMetrics::default();
        }
        LedgerMetrics {
            total_requests: total,
            average_carbon_savings: savings / total as f64,
            average_performance_score: performance / total as f64,
        }
    }
}

impl Default for RequestLedger {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl SelectionRecord {
    /// Create a record stamped now with a fresh id.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chosen_model_id: impl Into<String>,
        tier: CarbonTier,
        carbon_reading: f64,
        carbon_source: ReadingSource,
        profile: QueryProfile,
        fallback_occurred: bool,
        stage: SelectionStage,
        carbon_savings: f64,
        performance_score: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            chosen_model_id: chosen_model_id.into(),
            tier,
            carbon_reading,
            carbon_source,
            profile,
            fallback_occurred,
            stage,
            carbon_savings,
            performance_score,
        }
    }
}
