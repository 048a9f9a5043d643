// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The routing engine: analysis, tiering, selection, and recording in one place.
//!
//! [`RoutingEngine`] is created once at process start and shared by every
//! request. It owns the lifecycle manager (no global registry), records each
//! decision in the [`RequestLedger`], and wraps generation with the
//! one-shot baseline retry that every caller relies on.

use std::sync::Arc;
use std::time::Duration;

use ecoroute_config::EcorouteConfig;
use ecoroute_core::{
    CarbonReading, CarbonTier, EcorouteError, ModelBackend, QueryProfile, ReadingSource,
    SelectionStage,
};
use ecoroute_ledger::{OptimizationAdvisor, Recommendation, RequestLedger, SelectionRecord};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::analyzer::QueryAnalyzer;
use crate::catalog::ModelCatalog;
use crate::lifecycle::ModelLifecycleManager;
use crate::policy::{self, PolicyDecision, PolicySettings, SelectionPolicy};
use crate::tier::CarbonTierClassifier;

/// Model id that requests policy routing explicitly.
pub const AUTO_MODEL: &str = "auto";

/// What the engine decided for one query.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub model_id: String,
    pub tier: CarbonTier,
    pub profile: QueryProfile,
    pub stage: SelectionStage,
    pub fallback_occurred: bool,
    pub carbon_intensity: f64,
    pub carbon_source: ReadingSource,
    pub carbon_savings: f64,
    pub performance_score: f64,
    /// Compression strategy worth applying to the chosen model, if any qualifies.
    pub optimization: Option<Recommendation>,
    /// Id of the ledger record for this decision.
    pub record_id: String,
}

/// Text produced for a selection, possibly by the baseline after a retry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    pub text: String,
    /// Model that actually produced `text`.
    pub model_id: String,
    /// True when the selected model failed and the baseline answered instead.
    pub fell_back: bool,
}

/// Selection plus generated answer.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub selection: Selection,
    pub generation: Generation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineHealth {
    pub baseline_model: String,
    pub baseline_ready: bool,
    pub resident_models: Vec<String>,
    pub catalog_size: usize,
}

#[derive(Debug)]
pub struct RoutingEngine {
    analyzer: QueryAnalyzer,
    classifier: CarbonTierClassifier,
    lifecycle: ModelLifecycleManager,
    policy: SelectionPolicy,
    ledger: Arc<RequestLedger>,
    advisor: OptimizationAdvisor,
    performance_threshold: f64,
    startup_timeout: Duration,
    override_timeout: Duration,
}

impl RoutingEngine {
    /// Build an engine without loading anything. See [`RoutingEngine::start`].
    pub fn new(config: &EcorouteConfig, backend: Arc<dyn ModelBackend>) -> Self {
        let catalog = Arc::new(ModelCatalog::from_entries(&config.models));
        let lifecycle = ModelLifecycleManager::new(backend, catalog);
        let settings = PolicySettings::from(&config.routing);
        let override_timeout = settings.code_load_timeout.max(settings.complex_load_timeout);

        Self {
            analyzer: QueryAnalyzer::default(),
            classifier: CarbonTierClassifier::new(
                config.carbon.low_threshold,
                config.carbon.medium_threshold,
            ),
            policy: SelectionPolicy::new(lifecycle.clone(), settings),
            lifecycle,
            ledger: Arc::new(RequestLedger::new(config.ledger.max_records)),
            advisor: OptimizationAdvisor::default(),
            performance_threshold: config.routing.performance_threshold,
            startup_timeout: config.routing.startup_timeout(),
            override_timeout,
        }
    }

    /// Replace the keyword analyzer.
    pub fn with_analyzer(mut self, analyzer: QueryAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Build an engine and eagerly load the baseline model.
    pub async fn start(
        config: &EcorouteConfig,
        backend: Arc<dyn ModelBackend>,
    ) -> Result<Self, EcorouteError> {
        let engine = Self::new(config, backend);
        engine.preload_baseline().await?;
        Ok(engine)
    }

    /// Load the baseline within the startup budget.
    pub async fn preload_baseline(&self) -> Result<(), EcorouteError> {
        let baseline = self.baseline_model();
        match self
            .lifecycle
            .ensure_loaded(baseline, self.startup_timeout)
            .await
        {
            Ok(model) => {
                info!(
                    model_id = %model.model_id,
                    load_ms = model.load_time.as_millis() as u64,
                    "baseline model ready"
                );
                Ok(())
            }
            Err(e) => {
                warn!(model_id = baseline, error = %e, "baseline model failed to load");
                Err(EcorouteError::BaselineUnavailable {
                    model_id: baseline.to_string(),
                })
            }
        }
    }

    pub fn baseline_model(&self) -> &str {
        &self.policy.settings().baseline_model
    }

    pub fn catalog(&self) -> &ModelCatalog {
        self.lifecycle.catalog()
    }

    pub fn lifecycle(&self) -> &ModelLifecycleManager {
        &self.lifecycle
    }

    pub fn ledger(&self) -> &Arc<RequestLedger> {
        &self.ledger
    }

    pub fn analyzer(&self) -> &QueryAnalyzer {
        &self.analyzer
    }

    pub fn classifier(&self) -> &CarbonTierClassifier {
        &self.classifier
    }

    pub fn health(&self) -> EngineHealth {
        let baseline = self.baseline_model();
        EngineHealth {
            baseline_model: baseline.to_string(),
            baseline_ready: self.lifecycle.is_resident(baseline),
            resident_models: self.lifecycle.resident_models(),
            catalog_size: self.catalog().len(),
        }
    }

    /// Choose a model for `query` under `reading` and record the decision.
    ///
    /// `model_override` of `None`, `""`, or `"auto"` means policy routing.
    /// Any other value must be a catalog id; if it cannot be loaded the
    /// baseline is chosen and the decision is marked as a fallback.
    #[instrument(skip_all, fields(carbon_intensity = reading.value))]
    pub async fn select(
        &self,
        query: &str,
        reading: &CarbonReading,
        model_override: Option<&str>,
    ) -> Result<Selection, EcorouteError> {
        let profile = self.analyzer.analyze(query);
        let tier = self.classifier.classify(reading.value);
        ecoroute_prometheus::set_carbon_intensity(reading.value);

        let decision = match model_override.filter(|m| !m.is_empty() && *m != AUTO_MODEL) {
            Some(model_id) => self.select_override(model_id, &profile, tier).await?,
            None => self.policy.select(&profile, tier).await?,
        };

        Ok(self.record(decision, profile, tier, reading))
    }

    /// [`select`](Self::select) with an overall time limit.
    ///
    /// If the policy is still waiting on a model load when `limit` expires,
    /// the baseline is chosen and recorded as a fallback instead of failing
    /// the request.
    pub async fn select_within(
        &self,
        query: &str,
        reading: &CarbonReading,
        model_override: Option<&str>,
        limit: Duration,
    ) -> Result<Selection, EcorouteError> {
        match tokio::time::timeout(limit, self.select(query, reading, model_override)).await {
            Ok(selection) => selection,
            Err(_) => {
                let profile = self.analyzer.analyze(query);
                let tier = self.classifier.classify(reading.value);
                warn!(
                    limit_secs = limit.as_secs_f64(),
                    %tier,
                    capability = %profile.capability_hint,
                    "selection time limit reached, using baseline"
                );
                ecoroute_prometheus::record_fallback("deadline");
                let decision = self.policy.baseline(true)?;
                Ok(self.record(decision, profile, tier, reading))
            }
        }
    }

    async fn select_override(
        &self,
        model_id: &str,
        profile: &QueryProfile,
        tier: CarbonTier,
    ) -> Result<PolicyDecision, EcorouteError> {
        if !self.catalog().contains(model_id) {
            return Err(EcorouteError::ModelNotFound {
                model_id: model_id.to_string(),
            });
        }
        match self
            .lifecycle
            .ensure_loaded(model_id, self.override_timeout)
            .await
        {
            Ok(_) => Ok(PolicyDecision {
                model_id: model_id.to_string(),
                stage: SelectionStage::Override,
                fallback_occurred: false,
            }),
            Err(e) => {
                policy::absorb(&e, SelectionStage::Override, tier, profile);
                self.policy.baseline(true)
            }
        }
    }

    fn record(
        &self,
        decision: PolicyDecision,
        profile: QueryProfile,
        tier: CarbonTier,
        reading: &CarbonReading,
    ) -> Selection {
        let catalog = self.catalog();
        let carbon_savings = catalog.carbon_savings(&decision.model_id);
        let descriptor = catalog.get(&decision.model_id);
        let performance_score = descriptor.map(|m| m.performance_score).unwrap_or(0.0);
        let optimization = descriptor.and_then(|m| {
            self.advisor.recommend(
                m.energy_per_1k_tokens * reading.value,
                m.performance_score,
                self.performance_threshold,
            )
        });

        let record = SelectionRecord::new(
            decision.model_id.clone(),
            tier,
            reading.value,
            reading.source,
            profile.clone(),
            decision.fallback_occurred,
            decision.stage,
            carbon_savings,
            performance_score,
        );
        let record_id = record.id.clone();
        self.ledger.record(record);
        ecoroute_prometheus::record_selection(&decision.model_id, &tier.to_string());

        info!(
            model_id = %decision.model_id,
            %tier,
            stage = %decision.stage,
            capability = %profile.capability_hint,
            is_complex = profile.is_complex,
            fallback = decision.fallback_occurred,
            "query routed"
        );

        Selection {
            model_id: decision.model_id,
            tier,
            profile,
            stage: decision.stage,
            fallback_occurred: decision.fallback_occurred,
            carbon_intensity: reading.value,
            carbon_source: reading.source,
            carbon_savings,
            performance_score,
            optimization,
            record_id,
        }
    }

    /// Generate on `model_id`, retrying once on the baseline if it fails.
    ///
    /// A failure of the baseline itself, or of the retry, is returned as
    /// [`EcorouteError::Generation`] without further attempts.
    #[instrument(skip(self, prompt))]
    pub async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Generation, EcorouteError> {
        let backend = self.lifecycle.backend();
        let baseline = self.baseline_model();

        match backend.generate(model_id, prompt, max_tokens).await {
            Ok(text) => Ok(Generation {
                text,
                model_id: model_id.to_string(),
                fell_back: false,
            }),
            Err(e) if model_id != baseline => {
                warn!(model_id, baseline, error = %e, "generation failed, retrying on baseline");
                ecoroute_prometheus::record_fallback("generate");
                backend
                    .generate(baseline, prompt, max_tokens)
                    .await
                    .map(|text| Generation {
                        text,
                        model_id: baseline.to_string(),
                        fell_back: true,
                    })
                    .map_err(|e| EcorouteError::Generation {
                        model_id: baseline.to_string(),
                        message: e.to_string(),
                    })
            }
            Err(e) => Err(EcorouteError::Generation {
                model_id: model_id.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Select a model and generate an answer with it.
    pub async fn ask(
        &self,
        query: &str,
        reading: &CarbonReading,
        model_override: Option<&str>,
        max_tokens: u32,
    ) -> Result<Answer, EcorouteError> {
        let selection = self.select(query, reading, model_override).await?;
        let generation = self.generate(&selection.model_id, query, max_tokens).await?;
        Ok(Answer {
            selection,
            generation,
        })
    }
}
