// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-demand model loading with single-flight deduplication.
//!
//! The manager owns the set of resident models. A model becomes resident
//! the first time a load for it succeeds and stays resident for the life of
//! the process: there is no eviction, so memory grows with the number of
//! distinct models ever selected.
//!
//! Concurrent `ensure_loaded` calls for the same id share one in-flight load
//! (a `futures::Shared` future keyed by id). Calls for different ids never
//! contend beyond a brief map lock. Loads are driven by the awaiting callers;
//! nothing is spawned in the background, so a load whose every caller gave
//! up simply stops being polled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ecoroute_core::{EcorouteError, ModelBackend};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::catalog::ModelCatalog;

/// A recoverable load failure. `Clone` so every waiter on a shared load gets it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("loading `{model_id}` timed out after {timeout:?}")]
    Timeout { model_id: String, timeout: Duration },

    #[error("loading `{model_id}` failed: {reason}")]
    Failed { model_id: String, reason: String },

    #[error("model `{model_id}` is not in the catalog")]
    UnknownModel { model_id: String },
}

impl LoadError {
    pub fn model_id(&self) -> &str {
        match self {
            LoadError::Timeout { model_id, .. }
            | LoadError::Failed { model_id, .. }
            | LoadError::UnknownModel { model_id } => model_id,
        }
    }
}

impl From<LoadError> for EcorouteError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Timeout { timeout, .. } => EcorouteError::Timeout { duration: timeout },
            LoadError::Failed { model_id, reason } => EcorouteError::Backend {
                message: format!("loading `{model_id}` failed: {reason}"),
                source: None,
            },
            LoadError::UnknownModel { model_id } => EcorouteError::ModelNotFound { model_id },
        }
    }
}

/// Handle to a model that finished loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidentModel {
    pub model_id: String,
    pub loaded_at: DateTime<Utc>,
    /// How long the successful load took.
    #[serde(with = "duration_millis")]
    pub load_time: Duration,
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }
}

type LoadFuture = Shared<BoxFuture<'static, Result<ResidentModel, LoadError>>>;

/// A load that has been started but not finished.
struct InFlight {
    load: LoadFuture,
    /// Distinguishes this attempt from a later one for the same id.
    generation: u64,
    deadline: Instant,
}

type InFlightMap = Arc<Mutex<HashMap<String, InFlight>>>;

/// Tracks resident models and loads new ones on demand.
#[derive(Clone)]
pub struct ModelLifecycleManager {
    backend: Arc<dyn ModelBackend>,
    catalog: Arc<ModelCatalog>,
    resident: Arc<DashMap<String, ResidentModel>>,
    in_flight: InFlightMap,
    generation: Arc<AtomicU64>,
}

impl ModelLifecycleManager {
    pub fn new(backend: Arc<dyn ModelBackend>, catalog: Arc<ModelCatalog>) -> Self {
        Self {
            backend,
            catalog,
            resident: Arc::new(DashMap::new()),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn backend(&self) -> &Arc<dyn ModelBackend> {
        &self.backend
    }

    /// Non-blocking residency check.
    pub fn is_resident(&self, model_id: &str) -> bool {
        self.resident.contains_key(model_id)
    }

    /// Ids of resident models, in catalog order.
    pub fn resident_models(&self) -> Vec<String> {
        self.catalog
            .iter()
            .filter(|m| self.is_resident(&m.id))
            .map(|m| m.id.clone())
            .collect()
    }

    /// Make `model_id` resident, loading it if needed.
    ///
    /// Returns immediately for resident models. Otherwise joins the in-flight
    /// load for this id or starts one that must finish within `timeout`. A
    /// joiner waits at most its own `timeout` and never extends the load's
    /// deadline. Failures are not retried here, but a later call starts a
    /// fresh attempt. An attempt whose deadline passed without anyone polling
    /// it to completion is replaced rather than joined.
    pub async fn ensure_loaded(
        &self,
        model_id: &str,
        timeout: Duration,
    ) -> Result<ResidentModel, LoadError> {
        if let Some(model) = self.resident.get(model_id) {
            return Ok(model.clone());
        }
        if !self.catalog.contains(model_id) {
            return Err(LoadError::UnknownModel {
                model_id: model_id.to_string(),
            });
        }

        let (load, leader) = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            // A load may have finished between the check above and taking the lock.
            if let Some(model) = self.resident.get(model_id) {
                return Ok(model.clone());
            }
            let now = Instant::now();
            match in_flight.get(model_id) {
                Some(entry) if entry.deadline > now => (entry.load.clone(), false),
                _ => {
                    // Roughly 30 years, as tokio does for unbounded sleeps.
                    let deadline = now
                        .checked_add(timeout)
                        .unwrap_or_else(|| now + Duration::from_secs(86400 * 365 * 30));
                    let entry = self.start_load(model_id, deadline, timeout);
                    let load = entry.load.clone();
                    in_flight.insert(model_id.to_string(), entry);
                    (load, true)
                }
            }
        };

        if leader {
            return load.await;
        }
        debug!(model_id, "joining in-flight model load");
        match tokio::time::timeout(timeout, load).await {
            Ok(outcome) => outcome,
            Err(_) => Err(LoadError::Timeout {
                model_id: model_id.to_string(),
                timeout,
            }),
        }
    }

    fn start_load(&self, model_id: &str, deadline: Instant, timeout: Duration) -> InFlight {
        let backend = Arc::clone(&self.backend);
        let resident = Arc::clone(&self.resident);
        let in_flight = Arc::clone(&self.in_flight);
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let model_id = model_id.to_string();
        debug!(model_id = %model_id, ?timeout, "starting model load");

        let load = async move {
            let started = Instant::now();
            let outcome = match tokio::time::timeout_at(deadline, backend.load(&model_id)).await {
                Ok(Ok(())) => {
                    let model = ResidentModel {
                        model_id: model_id.clone(),
                        loaded_at: Utc::now(),
                        load_time: started.elapsed(),
                    };
                    // Publish before clearing the in-flight entry so callers
                    // always observe one of the two.
                    resident.insert(model_id.clone(), model.clone());
                    info!(
                        model_id = %model_id,
                        load_ms = model.load_time.as_millis() as u64,
                        "model resident"
                    );
                    Ok(model)
                }
                Ok(Err(e)) => Err(LoadError::Failed {
                    model_id: model_id.clone(),
                    reason: e.to_string(),
                }),
                Err(_) => Err(LoadError::Timeout {
                    model_id: model_id.clone(),
                    timeout,
                }),
            };

            let label = match &outcome {
                Ok(_) => "ok",
                Err(LoadError::Timeout { .. }) => "timeout",
                Err(_) => "failed",
            };
            ecoroute_prometheus::record_model_load(&model_id, label, started.elapsed());

            let mut in_flight = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if in_flight
                .get(&model_id)
                .is_some_and(|entry| entry.generation == generation)
            {
                in_flight.remove(&model_id);
            }
            outcome
        }
        .boxed()
        .shared();

        InFlight {
            load,
            generation,
            deadline,
        }
    }
}

impl std::fmt::Debug for ModelLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLifecycleManager")
            .field("backend", &self.backend.name())
            .field("resident", &self.resident_models())
            .finish_non_exhaustive()
    }
}
