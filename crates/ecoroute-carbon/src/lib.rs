// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carbon-intensity readers for Ecoroute.
//!
//! Implements [`CarbonReader`] for the Electricity Maps API, a synthetic
//! daily-pattern source, and a fixed operator-supplied value.

pub mod electricity_maps;
pub mod fixed;
pub mod mock;

use std::sync::Arc;

use ecoroute_config::{CarbonConfig, CarbonProvider};
use ecoroute_core::{CarbonReader, EcorouteError};
use tracing::{info, warn};

pub use electricity_maps::ElectricityMapsReader;
pub use fixed::FixedCarbonReader;
pub use mock::{MockCarbonReader, pattern_intensity};

/// Build the reader selected by `config.provider`.
///
/// Electricity Maps without an API key falls back to the mock reader.
pub fn build_reader(config: &CarbonConfig) -> Result<Arc<dyn CarbonReader>, EcorouteError> {
    info!(provider = ?config.provider, zone = %config.zone, "initializing carbon reader");
    let has_key = config.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
    let reader: Arc<dyn CarbonReader> = match config.provider {
        CarbonProvider::ElectricityMaps if has_key => {
            Arc::new(ElectricityMapsReader::new(config)?)
        }
        CarbonProvider::ElectricityMaps => {
            warn!("no Electricity Maps API key configured, using mock carbon data");
            Arc::new(MockCarbonReader::new(config.zone.clone()))
        }
        CarbonProvider::Mock => Arc::new(MockCarbonReader::new(config.zone.clone())),
    };
    Ok(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoroute_core::{PluginAdapter, ReadingSource};

    #[tokio::test]
    async fn mock_provider_builds_mock_reader() {
        let config = CarbonConfig {
            provider: CarbonProvider::Mock,
            ..CarbonConfig::default()
        };
        let reader = build_reader(&config).unwrap();
        assert_eq!(reader.name(), "mock-carbon");
        let reading = reader.get_intensity(None).await.unwrap();
        assert_eq!(reading.source, ReadingSource::Mock);
    }

    #[test]
    fn electricity_maps_with_key_builds_live_reader() {
        let config = CarbonConfig {
            api_key: Some("token".to_string()),
            ..CarbonConfig::default()
        };
        let reader = build_reader(&config).unwrap();
        assert_eq!(reader.name(), "electricity-maps");
    }

    #[tokio::test]
    async fn missing_api_key_falls_back_to_mock_data() {
        for api_key in [None, Some("  ".to_string())] {
            let config = CarbonConfig {
                api_key,
                ..CarbonConfig::default()
            };
            let reader = build_reader(&config).unwrap();
            assert_eq!(reader.name(), "mock-carbon");
            assert!(reader.is_healthy().await);

            let reading = reader.get_intensity(None).await.unwrap();
            assert_eq!(reading.source, ReadingSource::Mock);
            assert!((50.0..=600.0).contains(&reading.value));
        }
    }
}
