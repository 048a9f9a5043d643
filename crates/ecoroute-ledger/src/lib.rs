// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Selection history and aggregate reporting for the Ecoroute router.
//!
//! The [`RequestLedger`] keeps a bounded, append-only window of
//! [`SelectionRecord`]s and derives [`LedgerMetrics`] from it. The
//! [`OptimizationAdvisor`] suggests a model-compression strategy for a
//! chosen model given its carbon cost and performance score.

pub mod ledger;
pub mod optimization;

pub use ledger::{LedgerMetrics, RequestLedger, SelectionRecord};
pub use optimization::{OptimizationAdvisor, Recommendation, Strategy, StrategyKind};
