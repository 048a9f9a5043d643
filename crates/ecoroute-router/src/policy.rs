// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model selection rules.
//!
//! Rules are tried in order and the first that yields a ready model wins:
//!
//! 1. Code queries outside the high tier try the code model.
//! 2. Otherwise, complex queries outside the high tier try each catalog
//!    model with the hinted capability, in declaration order.
//! 3. The baseline model.
//!
//! A code query whose code model fails goes straight to the baseline; other
//! code-capable models are not tried. Load failures never escape `select`:
//! they are logged and counted, and the next rule runs. The only error is a
//! baseline that is not resident.

use std::time::Duration;

use ecoroute_core::{CarbonTier, EcorouteError, QueryProfile, SelectionStage, TaskKind};
use tracing::{debug, warn};

use crate::lifecycle::{LoadError, ModelLifecycleManager};

/// Model ids and load budgets used by the rules.
#[derive(Debug, Clone)]
pub struct PolicySettings {
    pub baseline_model: String,
    pub code_model: String,
    pub code_load_timeout: Duration,
    pub complex_load_timeout: Duration,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            baseline_model: "tinyllama".to_string(),
            code_model: "codellama".to_string(),
            code_load_timeout: Duration::from_secs(60),
            complex_load_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&ecoroute_config::RoutingConfig> for PolicySettings {
    fn from(routing: &ecoroute_config::RoutingConfig) -> Self {
        Self {
            baseline_model: routing.baseline_model.clone(),
            code_model: routing.code_model.clone(),
            code_load_timeout: routing.code_load_timeout(),
            complex_load_timeout: routing.complex_load_timeout(),
        }
    }
}

/// Outcome of one `select` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub model_id: String,
    pub stage: SelectionStage,
    /// True when at least one preferred candidate failed to load.
    pub fallback_occurred: bool,
}

#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    lifecycle: ModelLifecycleManager,
    settings: PolicySettings,
}

impl SelectionPolicy {
    pub fn new(lifecycle: ModelLifecycleManager, settings: PolicySettings) -> Self {
        Self {
            lifecycle,
            settings,
        }
    }

    pub fn settings(&self) -> &PolicySettings {
        &self.settings
    }

    /// Pick a ready model for `profile` under `tier`.
    ///
    /// Suspends only while waiting on model loads.
    pub async fn select(
        &self,
        profile: &QueryProfile,
        tier: CarbonTier,
    ) -> Result<PolicyDecision, EcorouteError> {
        let mut fallback_occurred = false;

        if profile.capability_hint == TaskKind::Code && tier != CarbonTier::High {
            let code_model = &self.settings.code_model;
            match self
                .lifecycle
                .ensure_loaded(code_model, self.settings.code_load_timeout)
                .await
            {
                Ok(_) => return Ok(self.decide(code_model, SelectionStage::Code, false)),
                Err(e) => {
                    absorb(&e, SelectionStage::Code, tier, profile);
                    fallback_occurred = true;
                }
            }
        } else if profile.is_complex && tier != CarbonTier::High {
            let capability = profile.capability_hint.capability();
            let candidates: Vec<String> = self
                .lifecycle
                .catalog()
                .iter()
                .filter(|m| m.has(capability))
                .map(|m| m.id.clone())
                .collect();

            for model_id in &candidates {
                match self
                    .lifecycle
                    .ensure_loaded(model_id, self.settings.complex_load_timeout)
                    .await
                {
                    Ok(_) => {
                        return Ok(self.decide(
                            model_id,
                            SelectionStage::Complex,
                            fallback_occurred,
                        ));
                    }
                    Err(e) => {
                        absorb(&e, SelectionStage::Complex, tier, profile);
                        fallback_occurred = true;
                    }
                }
            }
        }

        self.baseline(fallback_occurred)
    }

    /// The baseline decision, or the terminal error if it is not resident.
    pub fn baseline(&self, fallback_occurred: bool) -> Result<PolicyDecision, EcorouteError> {
        let baseline = &self.settings.baseline_model;
        if !self.lifecycle.is_resident(baseline) {
            return Err(EcorouteError::BaselineUnavailable {
                model_id: baseline.clone(),
            });
        }
        Ok(self.decide(baseline, SelectionStage::Baseline, fallback_occurred))
    }

    fn decide(&self, model_id: &str, stage: SelectionStage, fallback_occurred: bool) -> PolicyDecision {
        debug!(model_id, %stage, fallback_occurred, "model selected");
        PolicyDecision {
            model_id: model_id.to_string(),
            stage,
            fallback_occurred,
        }
    }
}

/// Log and count a candidate that could not be made ready.
pub(crate) fn absorb(
    err: &LoadError,
    stage: SelectionStage,
    tier: CarbonTier,
    profile: &QueryProfile,
) {
    warn!(
        model_id = err.model_id(),
        %stage,
        %tier,
        capability = %profile.capability_hint,
        is_complex = profile.is_complex,
        word_count = profile.word_count,
        error = %err,
        "candidate model unavailable, falling back"
    );
    ecoroute_prometheus::record_fallback(&stage.to_string());
}
