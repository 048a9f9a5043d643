// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carbon-intensity reader trait.

use async_trait::async_trait;

use crate::error::EcorouteError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CarbonReading;

/// Source of grid carbon-intensity readings.
///
/// Implementations own caching and fallback. A reading whose source is
/// [`ReadingSource::Error`](crate::types::ReadingSource::Error) still carries
/// a usable value.
#[async_trait]
pub trait CarbonReader: PluginAdapter {
    /// Returns the current intensity for `zone`, or the configured zone when `None`.
    async fn get_intensity(&self, zone: Option<&str>) -> Result<CarbonReading, EcorouteError>;

    /// Whether the reader considers its upstream healthy.
    async fn is_healthy(&self) -> bool;
}
