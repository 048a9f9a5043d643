// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reader that reports an operator-supplied value.
//!
//! Used by `ecoroute route --intensity` and by tests that need a known tier.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use ecoroute_core::{
    AdapterType, CarbonReader, CarbonReading, EcorouteError, HealthStatus, PluginAdapter,
    ReadingSource,
};

#[derive(Debug)]
pub struct FixedCarbonReader {
    reading: Mutex<(f64, ReadingSource)>,
    healthy: AtomicBool,
}

impl FixedCarbonReader {
    /// Reports `value` with source `mock`.
    pub fn new(value: f64) -> Self {
        Self::with_source(value, ReadingSource::Mock)
    }

    pub fn with_source(value: f64, source: ReadingSource) -> Self {
        Self {
            reading: Mutex::new((value, source)),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn set(&self, value: f64, source: ReadingSource) {
        *self.reading.lock().unwrap_or_else(PoisonError::into_inner) = (value, source);
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl PluginAdapter for FixedCarbonReader {
    fn name(&self) -> &str {
        "fixed-carbon"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CarbonReader
    }

    async fn health_check(&self) -> Result<HealthStatus, EcorouteError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy("marked unhealthy".into()))
        }
    }

    async fn shutdown(&self) -> Result<(), EcorouteError> {
        Ok(())
    }
}

#[async_trait]
impl CarbonReader for FixedCarbonReader {
    async fn get_intensity(&self, zone: Option<&str>) -> Result<CarbonReading, EcorouteError> {
        let (value, source) = *self.reading.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(CarbonReading {
            zone: zone.map(str::to_string),
            ..CarbonReading::new(value, source)
        })
    }

    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}
