// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Electricity Maps carbon-intensity reader.
//!
//! Fetches `GET {base}/carbon-intensity/latest?zone=<zone>` with the
//! `auth-token` header. Readings are cached per zone:
//!
//! - a cached value younger than `cache_secs` is served as `cached` without
//!   a request;
//! - when a fetch fails, a cached value younger than `stale_secs` is served
//!   as `cached` with the error text attached;
//! - otherwise the configured default intensity is served with source
//!   `error`.
//!
//! `get_intensity` therefore never returns `Err`; upstream trouble shows up
//! in the reading's source and in [`ElectricityMapsReader::is_healthy`].

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecoroute_config::CarbonConfig;
use ecoroute_core::{
    AdapterType, CarbonReader, CarbonReading, EcorouteError, HealthStatus, PluginAdapter,
    ReadingSource,
};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Body of `/carbon-intensity/latest`. Only the fields we read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestIntensity {
    #[serde(default)]
    zone: Option<String>,
    carbon_intensity: f64,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    is_estimated: Option<bool>,
}

#[derive(Debug, Clone)]
struct CachedReading {
    value: f64,
    as_of: DateTime<Utc>,
    fetched_at: Instant,
    zone: Option<String>,
    is_estimated: Option<bool>,
}

#[derive(Debug, Default)]
struct ReaderState {
    by_zone: HashMap<String, CachedReading>,
    last_success: Option<Instant>,
    consecutive_errors: u32,
}

#[derive(Debug)]
pub struct ElectricityMapsReader {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    zone: String,
    cache_ttl: Duration,
    stale_after: Duration,
    default_intensity: f64,
    max_errors: u32,
    state: Mutex<ReaderState>,
}

impl ElectricityMapsReader {
    pub fn new(config: &CarbonConfig) -> Result<Self, EcorouteError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|e| {
                EcorouteError::Config(format!("invalid Electricity Maps API key header value: {e}"))
            })?;
            headers.insert("auth-token", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| EcorouteError::Carbon {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        if config.api_key.is_none() {
            warn!("no Electricity Maps API key configured, readings will use the default intensity");
        }

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            zone: config.zone.clone(),
            cache_ttl: Duration::from_secs(config.cache_secs),
            stale_after: Duration::from_secs(config.stale_secs),
            default_intensity: config.default_intensity,
            max_errors: config.max_errors,
            state: Mutex::new(ReaderState::default()),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Zone used when callers do not name one.
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Consecutive failed fetches since the last success.
    pub fn error_count(&self) -> u32 {
        self.lock().consecutive_errors
    }

    /// When a fetch last succeeded, as an age.
    pub fn last_success_age(&self) -> Option<Duration> {
        self.lock().last_success.map(|t| t.elapsed())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn healthy_now(&self) -> bool {
        let state = self.lock();
        let recent = state
            .last_success
            .is_none_or(|t| t.elapsed() < self.stale_after);
        self.api_key.is_some() && state.consecutive_errors < self.max_errors && recent
    }

    fn cached(&self, zone: &str, max_age: Duration) -> Option<CachedReading> {
        self.lock()
            .by_zone
            .get(zone)
            .filter(|c| c.fetched_at.elapsed() < max_age)
            .cloned()
    }

    async fn fetch(&self, zone: &str) -> Result<LatestIntensity, EcorouteError> {
        if self.api_key.is_none() {
            return Err(EcorouteError::carbon("no Electricity Maps API key configured"));
        }

        let url = reqwest::Url::parse_with_params(
            &format!("{}/carbon-intensity/latest", self.base_url),
            &[("zone", zone)],
        )
        .map_err(|e| EcorouteError::Carbon {
            message: format!("invalid Electricity Maps URL: {e}"),
            source: Some(Box::new(e)),
        })?;

        info!(zone, "fetching carbon intensity");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EcorouteError::Carbon {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "carbon intensity response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EcorouteError::carbon(format!(
                "API returned {status}: {body}"
            )));
        }

        response
            .json::<LatestIntensity>()
            .await
            .map_err(|e| EcorouteError::Carbon {
                message: format!("invalid API response format: {e}"),
                source: Some(Box::new(e)),
            })
    }

    fn store(&self, zone: &str, latest: &LatestIntensity) -> CarbonReading {
        let now = Instant::now();
        let as_of = latest.updated_at.unwrap_or_else(Utc::now);
        let zone_name = latest.zone.clone().or_else(|| Some(zone.to_string()));

        let mut state = self.lock();
        state.consecutive_errors = 0;
        state.last_success = Some(now);
        state.by_zone.insert(
            zone.to_string(),
            CachedReading {
                value: latest.carbon_intensity,
                as_of,
                fetched_at: now,
                zone: zone_name.clone(),
                is_estimated: latest.is_estimated,
            },
        );

        CarbonReading {
            value: latest.carbon_intensity,
            as_of,
            source: ReadingSource::Live,
            zone: zone_name,
            is_estimated: latest.is_estimated,
            error: None,
        }
    }

    fn fall_back(&self, zone: &str, err: &EcorouteError) -> CarbonReading {
        let message = format!("failed to fetch carbon intensity: {err}");
        let errors = {
            let mut state = self.lock();
            state.consecutive_errors = state.consecutive_errors.saturating_add(1);
            state.consecutive_errors
        };
        warn!(zone, errors, error = %err, "carbon intensity fetch failed");

        match self.cached(zone, self.stale_after) {
            Some(cached) => CarbonReading {
                error: Some(message),
                ..cached_reading(cached)
            },
            None => CarbonReading {
                value: self.default_intensity,
                as_of: Utc::now(),
                source: ReadingSource::Error,
                zone: Some(zone.to_string()),
                is_estimated: None,
                error: Some(message),
            },
        }
    }
}

fn cached_reading(cached: CachedReading) -> CarbonReading {
    CarbonReading {
        value: cached.value,
        as_of: cached.as_of,
        source: ReadingSource::Cached,
        zone: cached.zone,
        is_estimated: cached.is_estimated,
        error: None,
    }
}

#[async_trait]
impl PluginAdapter for ElectricityMapsReader {
    fn name(&self) -> &str {
        "electricity-maps"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CarbonReader
    }

    async fn health_check(&self) -> Result<HealthStatus, EcorouteError> {
        if self.api_key.is_none() {
            return Ok(HealthStatus::Unhealthy("no API key configured".into()));
        }
        if self.healthy_now() {
            return Ok(HealthStatus::Healthy);
        }
        Ok(HealthStatus::Degraded(format!(
            "{} consecutive fetch errors",
            self.error_count()
        )))
    }

    async fn shutdown(&self) -> Result<(), EcorouteError> {
        Ok(())
    }
}

#[async_trait]
impl CarbonReader for ElectricityMapsReader {
    async fn get_intensity(&self, zone: Option<&str>) -> Result<CarbonReading, EcorouteError> {
        let zone = zone.unwrap_or(&self.zone);

        if let Some(cached) = self.cached(zone, self.cache_ttl) {
            debug!(zone, value = cached.value, "serving cached carbon intensity");
            return Ok(cached_reading(cached));
        }

        match self.fetch(zone).await {
            Ok(latest) => {
                let reading = self.store(zone, &latest);
                info!(
                    zone,
                    value = reading.value,
                    estimated = ?reading.is_estimated,
                    "carbon intensity updated"
                );
                Ok(reading)
            }
            Err(e) => Ok(self.fall_back(zone, &e)),
        }
    }

    async fn is_healthy(&self) -> bool {
        self.healthy_now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> CarbonConfig {
        CarbonConfig {
            api_key: Some("test-token".into()),
            ..CarbonConfig::default()
        }
    }

    fn reader(server: &MockServer, config: CarbonConfig) -> ElectricityMapsReader {
        ElectricityMapsReader::new(&config)
            .unwrap()
            .with_base_url(server.uri())
    }

    fn latest_body(value: f64) -> serde_json::Value {
        serde_json::json!({
            "zone": "IN-NO",
            "carbonIntensity": value,
            "datetime": "2026-01-01T10:00:00.000Z",
            "updatedAt": "2026-01-01T10:05:00.000Z",
            "isEstimated": true,
            "estimationMethod": "TIME_SLICER_AVERAGE"
        })
    }

    async fn mount_ok(server: &MockServer, value: f64) {
        Mock::given(method("GET"))
            .and(path("/carbon-intensity/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(latest_body(value)))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn live_reading_parses_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/carbon-intensity/latest"))
            .and(query_param("zone", "IN-NO"))
            .and(header("auth-token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(latest_body(512.0)))
            .expect(1)
            .mount(&server)
            .await;

        let reader = reader(&server, config());
        let reading = reader.get_intensity(None).await.unwrap();

        assert_eq!(reading.value, 512.0);
        assert_eq!(reading.source, ReadingSource::Live);
        assert_eq!(reading.zone.as_deref(), Some("IN-NO"));
        assert_eq!(reading.is_estimated, Some(true));
        assert_eq!(reading.as_of.to_rfc3339(), "2026-01-01T10:05:00+00:00");
        assert!(reader.is_healthy().await);
    }

    #[tokio::test]
    async fn second_read_within_cache_window_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/carbon-intensity/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(latest_body(200.0)))
            .expect(1)
            .mount(&server)
            .await;

        let reader = reader(&server, config());
        reader.get_intensity(None).await.unwrap();
        let second = reader.get_intensity(None).await.unwrap();

        assert_eq!(second.source, ReadingSource::Cached);
        assert_eq!(second.value, 200.0);
        assert!(second.error.is_none());
    }

    #[tokio::test]
    async fn expired_cache_refetches() {
        let server = MockServer::start().await;
        mount_ok(&server, 150.0).await;

        let reader = reader(
            &server,
            CarbonConfig {
                cache_secs: 0,
                ..config()
            },
        );
        reader.get_intensity(None).await.unwrap();
        let second = reader.get_intensity(None).await.unwrap();
        assert_eq!(second.source, ReadingSource::Live);
    }

    #[tokio::test]
    async fn failure_serves_recent_cache_with_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/carbon-intensity/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(latest_body(180.0)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/carbon-intensity/latest"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let reader = reader(
            &server,
            CarbonConfig {
                cache_secs: 0,
                ..config()
            },
        );
        reader.get_intensity(None).await.unwrap();
        let reading = reader.get_intensity(None).await.unwrap();

        assert_eq!(reading.source, ReadingSource::Cached);
        assert_eq!(reading.value, 180.0);
        let error = reading.error.unwrap();
        assert!(error.contains("503"), "got: {error}");
        assert_eq!(reader.error_count(), 1);
    }

    #[tokio::test]
    async fn failure_without_usable_cache_serves_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/carbon-intensity/latest"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let reader = reader(&server, config());
        let reading = reader.get_intensity(None).await.unwrap();

        assert_eq!(reading.source, ReadingSource::Error);
        assert_eq!(reading.value, 300.0);
        assert!(reading.error.is_some());
    }

    #[tokio::test]
    async fn stale_cache_is_not_used_after_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/carbon-intensity/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(latest_body(90.0)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/carbon-intensity/latest"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let reader = reader(
            &server,
            CarbonConfig {
                cache_secs: 0,
                stale_secs: 0,
                default_intensity: 333.0,
                ..config()
            },
        );
        reader.get_intensity(None).await.unwrap();
        let reading = reader.get_intensity(None).await.unwrap();
        assert_eq!(reading.source, ReadingSource::Error);
        assert_eq!(reading.value, 333.0);
    }

    #[tokio::test]
    async fn malformed_payload_counts_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/carbon-intensity/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"zone": "IN-NO"})))
            .mount(&server)
            .await;

        let reader = reader(&server, config());
        let reading = reader.get_intensity(None).await.unwrap();
        assert_eq!(reading.source, ReadingSource::Error);
        assert!(reading.error.unwrap().contains("invalid API response format"));
    }

    #[tokio::test]
    async fn repeated_failures_make_reader_unhealthy_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/carbon-intensity/latest"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(3)
            .mount(&server)
            .await;
        mount_ok(&server, 120.0).await;

        let reader = reader(&server, config());
        for _ in 0..2 {
            reader.get_intensity(None).await.unwrap();
        }
        assert!(reader.is_healthy().await);
        reader.get_intensity(None).await.unwrap();
        assert!(!reader.is_healthy().await);
        assert!(matches!(
            reader.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));

        let reading = reader.get_intensity(None).await.unwrap();
        assert_eq!(reading.source, ReadingSource::Live);
        assert_eq!(reader.error_count(), 0);
        assert!(reader.is_healthy().await);
    }

    #[tokio::test]
    async fn missing_api_key_never_calls_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(latest_body(1.0)))
            .expect(0)
            .mount(&server)
            .await;

        let reader = reader(&server, CarbonConfig::default());
        let reading = reader.get_intensity(None).await.unwrap();
        assert_eq!(reading.source, ReadingSource::Error);
        assert!(!reader.is_healthy().await);
        assert!(matches!(
            reader.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn zones_are_cached_independently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("zone", "DE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "zone": "DE",
                "carbonIntensity": 420.0
            })))
            .mount(&server)
            .await;
        mount_ok(&server, 100.0).await;

        let reader = reader(&server, config());
        let de = reader.get_intensity(Some("DE")).await.unwrap();
        let default_zone = reader.get_intensity(None).await.unwrap();

        assert_eq!(de.value, 420.0);
        assert_eq!(de.zone.as_deref(), Some("DE"));
        assert_eq!(default_zone.value, 100.0);
        assert_eq!(default_zone.source, ReadingSource::Live);
    }
}
