// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synthetic reader following a typical daily grid pattern.

use async_trait::async_trait;
use chrono::{Local, Timelike};
use ecoroute_core::{
    AdapterType, CarbonReader, CarbonReading, EcorouteError, HealthStatus, PluginAdapter,
    ReadingSource,
};
use rand::Rng;
use tracing::debug;

const BASE_INTENSITY: i32 = 250;
const MAX_JITTER: i32 = 30;
const MIN_INTENSITY: i32 = 50;
const MAX_INTENSITY: i32 = 600;

/// Intensity for a local `hour` (0-23) plus `jitter`, clamped to `[50, 600]`.
///
/// Morning peak 07-10h adds 100, evening peak 18-22h adds 150, and the
/// night trough 00-05h subtracts 50.
pub fn pattern_intensity(hour: u32, jitter: i32) -> f64 {
    let shift = match hour {
        7..=10 => 100,
        18..=22 => 150,
        0..=5 => -50,
        _ => 0,
    };
    (BASE_INTENSITY + shift + jitter).clamp(MIN_INTENSITY, MAX_INTENSITY) as f64
}

#[derive(Debug, Clone)]
pub struct MockCarbonReader {
    zone: String,
}

impl MockCarbonReader {
    pub fn new(zone: impl Into<String>) -> Self {
        Self { zone: zone.into() }
    }
}

#[async_trait]
impl PluginAdapter for MockCarbonReader {
    fn name(&self) -> &str {
        "mock-carbon"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CarbonReader
    }

    async fn health_check(&self) -> Result<HealthStatus, EcorouteError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), EcorouteError> {
        Ok(())
    }
}

#[async_trait]
impl CarbonReader for MockCarbonReader {
    async fn get_intensity(&self, zone: Option<&str>) -> Result<CarbonReading, EcorouteError> {
        let hour = Local::now().hour();
        let jitter = rand::thread_rng().gen_range(-MAX_JITTER..=MAX_JITTER);
        let value = pattern_intensity(hour, jitter);
        debug!(hour, value, "mock carbon intensity");

        Ok(CarbonReading {
            zone: Some(zone.unwrap_or(&self.zone).to_string()),
            is_estimated: Some(true),
            ..CarbonReading::new(value, ReadingSource::Mock)
        })
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn daily_pattern() {
        assert_eq!(pattern_intensity(3, 0), 200.0);
        assert_eq!(pattern_intensity(6, 0), 250.0);
        assert_eq!(pattern_intensity(8, 0), 350.0);
        assert_eq!(pattern_intensity(14, 0), 250.0);
        assert_eq!(pattern_intensity(20, 0), 400.0);
        assert_eq!(pattern_intensity(23, 0), 250.0);
    }

    #[test]
    fn jitter_is_applied_and_clamped() {
        assert_eq!(pattern_intensity(20, 30), 430.0);
        assert_eq!(pattern_intensity(0, -30), 170.0);
        assert_eq!(pattern_intensity(20, 1000), 600.0);
        assert_eq!(pattern_intensity(0, -1000), 50.0);
    }

    #[tokio::test]
    async fn reading_is_mock_and_in_range() {
        let reader = MockCarbonReader::new("IN-NO");
        let reading = reader.get_intensity(None).await.unwrap();
        assert_eq!(reading.source, ReadingSource::Mock);
        assert_eq!(reading.zone.as_deref(), Some("IN-NO"));
        assert!((50.0..=600.0).contains(&reading.value));
        assert!(reader.is_healthy().await);
    }

    proptest! {
        #[test]
        fn pattern_stays_in_bounds(hour in 0u32..24, jitter in -30i32..=30) {
            let v = pattern_intensity(hour, jitter);
            prop_assert!((170.0..=430.0).contains(&v));
        }
    }
}
