use super::common::*;
use crate::leads::domain::{BuyerType, LeadRating, LeadStatus, Timeline};
use crate::leads::scoring::{rating_for, ScoringConfig, ScoringEngine};

#[test]
fn full_marks_for_ceiling_budget_immediate_investor() {
    let engine = scoring_engine();
    let score = engine.score_inputs(2_000_000, Timeline::Immediate, BuyerType::Investor);
    assert_eq!(score.value, 100);
    assert_eq!(score.rating, LeadRating::High);
}

#[test]
fn budget_above_ceiling_caps_at_full_factor() {
    let engine = scoring_engine();
    let at_ceiling = engine.score_inputs(2_000_000, Timeline::Exploring, BuyerType::FirstTimeBuyer);
    let above = engine.score_inputs(9_000_000, Timeline::Exploring, BuyerType::FirstTimeBuyer);
    assert_eq!(at_ceiling.value, above.value);
}

#[test]
fn midrange_inputs_interpolate_linearly() {
    let engine = scoring_engine();
    // 0.4*50 + 0.3*60 + 0.3*70 = 59
    let score = engine.score_inputs(1_000_000, Timeline::Within3Months, BuyerType::Upgrade);
    assert_eq!(score.value, 59);
    assert_eq!(score.rating, LeadRating::Low);
}

#[test]
fn scoring_is_pure_and_bounded() {
    let engine = scoring_engine();
    let budgets = [0u64, 1, 350_000, 1_999_999, 2_000_001, u64::MAX / 2];
    let timelines = [
        Timeline::Immediate,
        Timeline::Within1Month,
        Timeline::Within3Months,
        Timeline::Within6Months,
        Timeline::Within1Year,
        Timeline::Exploring,
    ];
    let buyers = [
        BuyerType::FirstTimeBuyer,
        BuyerType::Investor,
        BuyerType::Upgrade,
        BuyerType::Downsize,
        BuyerType::Relocation,
        BuyerType::Commercial,
    ];

    for &budget in &budgets {
        for &timeline in &timelines {
            for &buyer in &buyers {
                let first = engine.score_inputs(budget, timeline, buyer);
                let second = engine.score_inputs(budget, timeline, buyer);
                assert_eq!(first.value, second.value, "score must be deterministic");
                assert!(first.value <= 100);
            }
        }
    }
}

#[test]
fn budget_max_falls_back_to_budget_min() {
    let engine = scoring_engine();
    let mut lead = lead_fixture("fallback", LeadStatus::New);
    lead.budget_max = None;
    lead.budget_min = Some(2_000_000);
    let from_min = engine.score(&lead);

    lead.budget_max = Some(2_000_000);
    lead.budget_min = None;
    let from_max = engine.score(&lead);

    assert_eq!(from_min.value, from_max.value);
}

#[test]
fn missing_budget_scores_zero_budget_factor() {
    let engine = scoring_engine();
    let mut lead = lead_fixture("no-budget", LeadStatus::New);
    lead.budget_min = None;
    lead.budget_max = None;
    lead.timeline = Timeline::Exploring;
    lead.buyer_type = BuyerType::FirstTimeBuyer;

    // 0.4*0 + 0.3*0 + 0.3*50 = 15
    assert_eq!(engine.score(&lead).value, 15);
}

#[test]
fn rating_buckets_split_at_sixty_and_eighty() {
    assert_eq!(rating_for(100), LeadRating::High);
    assert_eq!(rating_for(80), LeadRating::High);
    assert_eq!(rating_for(79), LeadRating::Medium);
    assert_eq!(rating_for(60), LeadRating::Medium);
    assert_eq!(rating_for(59), LeadRating::Low);
    assert_eq!(rating_for(0), LeadRating::Low);
}

#[test]
fn rating_labels_map_to_temperature_buckets() {
    assert_eq!(LeadRating::High.label(), "Hot");
    assert_eq!(LeadRating::Medium.label(), "Warm");
    assert_eq!(LeadRating::Low.label(), "Cold");
}

#[test]
fn tuned_config_changes_the_score() {
    let mut config = ScoringConfig::default();
    config.budget_ceiling = 500_000;
    let engine = ScoringEngine::new(config);

    // Half a million hits the lowered ceiling, so the budget factor is full.
    let score = engine.score_inputs(500_000, Timeline::Immediate, BuyerType::Investor);
    assert_eq!(score.value, 100);
}

#[test]
fn factors_report_their_weights() {
    let engine = scoring_engine();
    let score = engine.score_inputs(1_000_000, Timeline::Immediate, BuyerType::Commercial);
    let total: f64 = score.factors.iter().map(|f| f.weight).sum();
    assert!((total - 1.0).abs() < f64::EPSILON);
    assert!(score.factors.iter().any(|f| f.name == "budget" && f.raw == 50.0));
}
