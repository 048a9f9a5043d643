// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. With no recorder installed every call is a no-op.

use std::time::Duration;

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Ecoroute metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "ecoroute_selections_total",
        "Routing decisions by chosen model and carbon tier"
    );
    describe_counter!(
        "ecoroute_fallbacks_total",
        "Candidates abandoned in favour of a fallback, by stage"
    );
    describe_counter!(
        "ecoroute_model_loads_total",
        "Model load attempts by model and outcome"
    );
    describe_histogram!(
        "ecoroute_model_load_seconds",
        "Time spent in model load attempts"
    );
    describe_gauge!(
        "ecoroute_carbon_intensity",
        "Last carbon intensity used for routing, gCO2eq/kWh"
    );
}

/// Record one routing decision.
pub fn record_selection(model: &str, tier: &str) {
    metrics::counter!(
        "ecoroute_selections_total",
        "model" => model.to_string(),
        "tier" => tier.to_string()
    )
    .increment(1);
}

/// Record a candidate that was skipped in favour of a fallback.
pub fn record_fallback(stage: &str) {
    metrics::counter!("ecoroute_fallbacks_total", "stage" => stage.to_string()).increment(1);
}

/// Record a finished load attempt. `outcome` is `ok`, `timeout`, or `failed`.
pub fn record_model_load(model: &str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "ecoroute_model_loads_total",
        "model" => model.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("ecoroute_model_load_seconds", "model" => model.to_string())
        .record(elapsed.as_secs_f64());
}

/// Set the carbon-intensity gauge.
pub fn set_carbon_intensity(value: f64) {
    metrics::gauge!("ecoroute_carbon_intensity").set(value);
}
