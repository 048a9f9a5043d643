// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model-compression strategy advisor.
//!
//! Each strategy trades a fraction of a model's carbon cost for a fixed drop
//! in performance score. The advisor picks the strategy with the best
//! weighted score among those that keep performance at or above a threshold.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Weight of absolute carbon reduction in a strategy's score.
const CARBON_WEIGHT: f64 = 0.7;
/// Weight of performance headroom above the threshold.
const PERFORMANCE_WEIGHT: f64 = 0.3;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Quantization,
    Pruning,
    KnowledgeDistillation,
}

/// A compression strategy and its expected effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub kind: StrategyKind,
    /// Human-readable name.
    pub name: String,
    /// Fraction of carbon cost removed, in `[0, 1]`.
    pub carbon_reduction: f64,
    /// Additive change to the performance score (negative is worse).
    pub performance_impact: f64,
    /// Relative engineering effort, in `[0, 1]`.
    pub implementation_complexity: f64,
}

/// The advisor's pick for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub strategy: StrategyKind,
    pub name: String,
    /// Absolute carbon removed: `base_carbon * strategy.carbon_reduction`.
    pub carbon_reduction: f64,
    pub new_performance: f64,
    pub implementation_complexity: f64,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct OptimizationAdvisor {
    strategies: Vec<Strategy>,
}

impl Default for OptimizationAdvisor {
    fn default() -> Self {
        Self::new(vec![
            Strategy {
                kind: StrategyKind::Quantization,
                name: "Model Quantization".to_string(),
                carbon_reduction: 0.4,
                performance_impact: -0.1,
                implementation_complexity: 0.7,
            },
            Strategy {
                kind: StrategyKind::Pruning,
                name: "Model Pruning".to_string(),
                carbon_reduction: 0.3,
                performance_impact: -0.15,
                implementation_complexity: 0.6,
            },
            Strategy {
                kind: StrategyKind::KnowledgeDistillation,
                name: "Knowledge Distillation".to_string(),
                carbon_reduction: 0.5,
                performance_impact: -0.05,
                implementation_complexity: 0.8,
            },
        ])
    }
}

impl OptimizationAdvisor {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn strategy(&self, kind: StrategyKind) -> Option<&Strategy> {
        self.strategies.iter().find(|s| s.kind == kind)
    }

    /// Best strategy for a model, or `None` if every strategy would push
    /// performance below `threshold`. Ties keep the earlier strategy.
    pub fn recommend(
        &self,
        base_carbon: f64,
        base_performance: f64,
        threshold: f64,
    ) -> Option<Recommendation> {
        let mut best: Option<Recommendation> = None;

        for strategy in &self.strategies {
            let carbon_reduction = base_carbon * strategy.carbon_reduction;
            let new_performance = base_performance + strategy.performance_impact;
            if new_performance < threshold {
                continue;
            }
            let score =
                carbon_reduction * CARBON_WEIGHT + (new_performance - threshold) * PERFORMANCE_WEIGHT;

            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(Recommendation {
                    strategy: strategy.kind,
                    name: strategy.name.clone(),
                    carbon_reduction,
                    new_performance,
                    implementation_complexity: strategy.implementation_complexity,
                    score,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distillation_wins_with_headroom() {
        let advisor = OptimizationAdvisor::default();
        let rec = advisor.recommend(10.0, 0.9, 0.7).unwrap();
        assert_eq!(rec.strategy, StrategyKind::KnowledgeDistillation);
        assert!((rec.carbon_reduction - 5.0).abs() < 1e-12);
        assert!((rec.new_performance - 0.85).abs() < 1e-12);
    }

    #[test]
    fn strategies_below_threshold_are_excluded() {
        let advisor = OptimizationAdvisor::default();
        // 0.78: quantization -> 0.68 and pruning -> 0.63 fall under 0.7.
        let rec = advisor.recommend(1.0, 0.78, 0.7).unwrap();
        assert_eq!(rec.strategy, StrategyKind::KnowledgeDistillation);

        let only_pruning = OptimizationAdvisor::new(vec![advisor
            .strategy(StrategyKind::Pruning)
            .unwrap()
            .clone()]);
        assert!(only_pruning.recommend(1.0, 0.78, 0.7).is_none());
    }

    #[test]
    fn nothing_qualifies_under_high_threshold() {
        let advisor = OptimizationAdvisor::default();
        assert!(advisor.recommend(10.0, 0.75, 0.75).is_none());
    }

    #[test]
    fn zero_carbon_prefers_smallest_performance_drop() {
        let advisor = OptimizationAdvisor::default();
        let rec = advisor.recommend(0.0, 1.0, 0.5).unwrap();
        assert_eq!(rec.strategy, StrategyKind::KnowledgeDistillation);
        assert!((rec.score - 0.45 * 0.3).abs() < 1e-12);
    }

    #[test]
    fn strategy_kind_names_are_snake_case() {
        assert_eq!(
            StrategyKind::KnowledgeDistillation.to_string(),
            "knowledge_distillation"
        );
    }
}
