use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{BuyerType, Lead, LeadRating, Timeline};

/// Rubric configuration for lead scoring. Weights and factor tables are data,
/// not policy baked into the engine, so operators can tune them without a
/// code change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub budget_weight: f64,
    pub timeline_weight: f64,
    pub buyer_type_weight: f64,
    /// Budget at or above this maps to a full budget factor of 100.
    pub budget_ceiling: u64,
    pub timeline_points: BTreeMap<Timeline, u8>,
    pub buyer_type_points: BTreeMap<BuyerType, u8>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let timeline_points = BTreeMap::from([
            (Timeline::Immediate, 100),
            (Timeline::Within1Month, 80),
            (Timeline::Within3Months, 60),
            (Timeline::Within6Months, 40),
            (Timeline::Within1Year, 20),
            (Timeline::Exploring, 0),
        ]);
        let buyer_type_points = BTreeMap::from([
            (BuyerType::Investor, 100),
            (BuyerType::Commercial, 100),
            (BuyerType::Upgrade, 70),
            (BuyerType::Relocation, 70),
            (BuyerType::FirstTimeBuyer, 50),
            (BuyerType::Downsize, 50),
        ]);

        Self {
            budget_weight: 0.4,
            timeline_weight: 0.3,
            buyer_type_weight: 0.3,
            budget_ceiling: 2_000_000,
            timeline_points,
            buyer_type_points,
        }
    }
}

/// Discrete contribution to a score, kept for audit trails.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreFactor {
    pub name: &'static str,
    pub raw: f64,
    pub weight: f64,
}

/// Score plus its qualitative bucket and factor breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadScore {
    pub value: u8,
    pub rating: LeadRating,
    pub factors: Vec<ScoreFactor>,
}

/// Stateless scorer applying the rubric configuration to lead attributes.
/// Pure: the same inputs always produce the same score.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, lead: &Lead) -> LeadScore {
        let budget = lead.budget_max.or(lead.budget_min).unwrap_or(0);
        self.score_inputs(budget, lead.timeline, lead.buyer_type)
    }

    /// Score from the raw rubric inputs. Exposed so callers can preview a
    /// score before a lead record exists.
    pub fn score_inputs(&self, budget: u64, timeline: Timeline, buyer_type: BuyerType) -> LeadScore {
        let budget_factor = if self.config.budget_ceiling == 0 {
            100.0
        } else {
            (budget as f64 / self.config.budget_ceiling as f64 * 100.0).min(100.0)
        };
        let timeline_factor =
            f64::from(self.config.timeline_points.get(&timeline).copied().unwrap_or(0));
        let buyer_factor = f64::from(
            self.config
                .buyer_type_points
                .get(&buyer_type)
                .copied()
                .unwrap_or(0),
        );

        let weighted = budget_factor * self.config.budget_weight
            + timeline_factor * self.config.timeline_weight
            + buyer_factor * self.config.buyer_type_weight;
        let value = weighted.round().clamp(0.0, 100.0) as u8;

        LeadScore {
            value,
            rating: rating_for(value),
            factors: vec![
                ScoreFactor {
                    name: "budget",
                    raw: budget_factor,
                    weight: self.config.budget_weight,
                },
                ScoreFactor {
                    name: "timeline",
                    raw: timeline_factor,
                    weight: self.config.timeline_weight,
                },
                ScoreFactor {
                    name: "buyer_type",
                    raw: buyer_factor,
                    weight: self.config.buyer_type_weight,
                },
            ],
        }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

pub const fn rating_for(score: u8) -> LeadRating {
    if score >= 80 {
        LeadRating::High
    } else if score >= 60 {
        LeadRating::Medium
    } else {
        LeadRating::Low
    }
}
