use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Lead, LeadStatus, PipelineStage, ACTIVE_STATUSES};

/// Funnel aggregates over one lead snapshot. Derived on demand; the lead set
/// stays the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStats {
    pub total: usize,
    pub status_counts: BTreeMap<LeadStatus, usize>,
    pub conversion_rate: f64,
    pub average_score: f64,
    pub total_value: u64,
    pub average_value: f64,
    /// Active board columns in fixed display order. Converted and Lost are
    /// excluded here but counted in the totals and rates above.
    pub stages: Vec<PipelineStage>,
}

pub fn aggregate_pipeline(leads: &[Lead]) -> PipelineStats {
    let total = leads.len();
    let mut status_counts = BTreeMap::new();
    let mut score_sum: u64 = 0;
    let mut total_value: u64 = 0;

    for lead in leads {
        *status_counts.entry(lead.status).or_insert(0) += 1;
        score_sum += u64::from(lead.score);
        total_value += lead.pipeline_value();
    }

    let converted = status_counts
        .get(&LeadStatus::Converted)
        .copied()
        .unwrap_or(0);
    let conversion_rate = if total == 0 {
        0.0
    } else {
        converted as f64 / total as f64
    };
    let average_score = if total == 0 {
        0.0
    } else {
        score_sum as f64 / total as f64
    };
    let average_value = if total == 0 {
        0.0
    } else {
        total_value as f64 / total as f64
    };

    let stages = ACTIVE_STATUSES
        .iter()
        .map(|&status| {
            let stage_leads: Vec<Lead> = leads
                .iter()
                .filter(|lead| lead.status == status)
                .cloned()
                .collect();
            let stage_value = stage_leads.iter().map(Lead::pipeline_value).sum();
            PipelineStage {
                status,
                title: status.title(),
                color: status.color(),
                count: stage_leads.len(),
                total_value: stage_value,
                leads: stage_leads,
            }
        })
        .collect();

    PipelineStats {
        total,
        status_counts,
        conversion_rate,
        average_score,
        total_value,
        average_value,
        stages,
    }
}

/// Historical conversion aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionAnalytics {
    /// Converted over all leads in the snapshot, the same denominator the
    /// pipeline aggregator reports.
    pub conversion_rate: f64,
    /// Mean seconds from creation to conversion. Omitted when nothing has
    /// converted yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_time_to_convert_secs: Option<i64>,
    pub top_sources: Vec<SourceConversions>,
    pub revenue_from_conversions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceConversions {
    pub source: String,
    pub conversions: usize,
}

pub fn analyze_conversions(leads: &[Lead]) -> ConversionAnalytics {
    let total = leads.len();
    let converted: Vec<&Lead> = leads
        .iter()
        .filter(|lead| lead.status == LeadStatus::Converted)
        .collect();

    let conversion_rate = if total == 0 {
        0.0
    } else {
        converted.len() as f64 / total as f64
    };

    let mut elapsed_sum: i64 = 0;
    let mut elapsed_count: i64 = 0;
    for lead in &converted {
        if let Some(converted_on) = lead.conversion_date {
            elapsed_sum += (converted_on - lead.created_at).num_seconds();
            elapsed_count += 1;
        }
    }
    let average_time_to_convert_secs = if elapsed_count == 0 {
        None
    } else {
        Some(elapsed_sum / elapsed_count)
    };

    // Per source: conversion count plus earliest conversion for tie-breaks.
    let mut by_source: BTreeMap<&str, (usize, Option<DateTime<Utc>>)> = BTreeMap::new();
    for lead in &converted {
        let entry = by_source.entry(lead.source.as_str()).or_insert((0, None));
        entry.0 += 1;
        if let Some(date) = lead.conversion_date {
            entry.1 = Some(entry.1.map_or(date, |first| first.min(date)));
        }
    }
    let mut ranked: Vec<(&str, usize, Option<DateTime<Utc>>)> = by_source
        .into_iter()
        .map(|(source, (count, first))| (source, count, first))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| a.2.cmp(&b.2))
            .then_with(|| a.0.cmp(b.0))
    });
    let top_sources = ranked
        .into_iter()
        .map(|(source, conversions, _)| SourceConversions {
            source: source.to_string(),
            conversions,
        })
        .collect();

    let revenue_from_conversions = converted.iter().map(|lead| lead.pipeline_value()).sum();

    ConversionAnalytics {
        conversion_rate,
        average_time_to_convert_secs,
        top_sources,
        revenue_from_conversions,
    }
}

/// Externally supplied property inventory aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub total: u64,
    pub available: u64,
    pub reserved: u64,
    pub sold: u64,
}

/// Externally supplied reservation aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationSnapshot {
    pub active: u64,
    pub completed: u64,
    pub cancelled: u64,
}

/// Externally supplied financial aggregates in the reporting currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub total_revenue: u64,
    pub outstanding_balance: u64,
}

/// One immutable dashboard payload: pipeline aggregates merged with the
/// external collaborator snapshots, stamped at composition time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub pipeline: PipelineStats,
    pub properties: PropertySnapshot,
    pub reservations: ReservationSnapshot,
    pub financials: FinancialSnapshot,
    pub currency: String,
    pub generated_at: DateTime<Utc>,
}

/// Pure merge plus timestamp; no computation of its own.
pub fn compose_dashboard(
    pipeline: PipelineStats,
    properties: PropertySnapshot,
    reservations: ReservationSnapshot,
    financials: FinancialSnapshot,
    currency: String,
    now: DateTime<Utc>,
) -> DashboardSummary {
    DashboardSummary {
        pipeline,
        properties,
        reservations,
        financials,
        currency,
        generated_at: now,
    }
}
