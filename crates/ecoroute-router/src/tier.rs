// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carbon-intensity tiering.

use ecoroute_core::CarbonTier;

/// Maps a carbon-intensity reading (gCO2eq/kWh) onto a [`CarbonTier`].
///
/// Total over all floats: no validation happens here, negative values are
/// `Low` and NaN is `High`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarbonTierClassifier {
    low_threshold: f64,
    medium_threshold: f64,
}

impl Default for CarbonTierClassifier {
    fn default() -> Self {
        Self::new(100.0, 300.0)
    }
}

impl CarbonTierClassifier {
    /// `low_threshold` and `medium_threshold` are exclusive upper bounds of
    /// the low and medium tiers.
    pub fn new(low_threshold: f64, medium_threshold: f64) -> Self {
        Self {
            low_threshold,
            medium_threshold,
        }
    }

    pub fn classify(&self, intensity: f64) -> CarbonTier {
        if intensity < self.low_threshold {
            CarbonTier::Low
        } else if intensity < self.medium_threshold {
            CarbonTier::Medium
        } else {
            CarbonTier::High
        }
    }
}
