// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Ecoroute carbon-aware model router.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Ecoroute workspace. Model backends and
//! carbon readers implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::EcorouteError;
pub use types::{
    AdapterType, CarbonReading, CarbonTier, Capability, HealthStatus, QueryProfile,
    ReadingSource, SelectionStage, TaskKind,
};

pub use traits::{CarbonReader, ModelBackend, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn ecoroute_error_has_all_variants() {
        let _config = EcorouteError::Config("test".into());
        let _backend = EcorouteError::Backend {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _carbon = EcorouteError::carbon("test");
        let _not_found = EcorouteError::ModelNotFound {
            model_id: "x".into(),
        };
        let _timeout = EcorouteError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _baseline = EcorouteError::BaselineUnavailable {
            model_id: "tinyllama".into(),
        };
        let _generation = EcorouteError::Generation {
            model_id: "gpt2".into(),
            message: "boom".into(),
        };
        let _internal = EcorouteError::Internal("test".into());
    }

    #[test]
    fn baseline_unavailable_message_names_model() {
        let err = EcorouteError::BaselineUnavailable {
            model_id: "tinyllama".into(),
        };
        assert!(err.to_string().contains("tinyllama"));
    }

    #[test]
    fn task_kind_order_is_tie_break_order() {
        let mut kinds = TaskKind::ALL.to_vec();
        kinds.sort();
        assert_eq!(kinds, TaskKind::ALL.to_vec());
        assert_eq!(TaskKind::ALL[0], TaskKind::General);
        assert_eq!(TaskKind::ALL[3], TaskKind::Qa);
    }

    #[test]
    fn task_kind_maps_to_capability() {
        assert_eq!(TaskKind::Code.capability(), Capability::Code);
        assert_eq!(TaskKind::Qa.capability(), Capability::Qa);
        assert_eq!(TaskKind::Analysis.capability(), Capability::Analysis);
        assert_eq!(TaskKind::General.capability(), Capability::General);
    }

    #[test]
    fn enums_display_lowercase_and_parse_back() {
        assert_eq!(CarbonTier::Medium.to_string(), "medium");
        assert_eq!(ReadingSource::Cached.to_string(), "cached");
        assert_eq!(SelectionStage::Baseline.to_string(), "baseline");
        assert_eq!(Capability::from_str("technical").unwrap(), Capability::Technical);
        assert_eq!(TaskKind::from_str("qa").unwrap(), TaskKind::Qa);
    }

    #[test]
    fn carbon_reading_serializes_source_lowercase() {
        let reading = CarbonReading::new(120.0, ReadingSource::Mock);
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["source"], "mock");
        assert_eq!(json["value"], 120.0);
    }

    #[test]
    fn empty_profile_is_degenerate() {
        let profile = QueryProfile::empty();
        assert_eq!(profile.word_count, 0);
        assert!(!profile.is_complex);
        assert_eq!(profile.capability_hint, TaskKind::General);
        assert!(profile.task_scores.values().all(|v| *v == 0));
        assert_eq!(profile.task_scores.len(), 4);
    }

    #[test]
    fn profile_serializes_task_scores_by_name() {
        let json = serde_json::to_value(QueryProfile::empty()).unwrap();
        assert_eq!(json["task_scores"]["analysis"], 0);
        assert_eq!(json["capability_hint"], "general");
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_model_backend<T: ModelBackend>() {}
        fn _assert_carbon_reader<T: CarbonReader>() {}
    }
}
