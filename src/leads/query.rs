use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::domain::{BuyerType, Lead, LeadStatus, Timeline};

/// Filter, sort, and page parameters applied to a lead snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadQuery {
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<String>,
    pub buyer_type: Option<BuyerType>,
    pub timeline: Option<Timeline>,
    pub assigned_to: Option<String>,
    pub min_score: Option<u8>,
    pub max_score: Option<u8>,
    pub min_budget: Option<u64>,
    pub max_budget: Option<u64>,
    pub sort_by: Option<SortField>,
    pub sort_dir: Option<SortDirection>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Score,
    Budget,
    LastName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Run the query against a snapshot. The sort is total (ties broken by id)
/// so limit/offset paging is stable across repeated calls.
pub fn run(mut leads: Vec<Lead>, query: &LeadQuery) -> Vec<Lead> {
    leads.retain(|lead| matches(lead, query));

    let field = query.sort_by.unwrap_or(SortField::CreatedAt);
    let direction = query.sort_dir.unwrap_or(SortDirection::Desc);
    leads.sort_by(|a, b| {
        let by_field = compare(a, b, field);
        let by_field = match direction {
            SortDirection::Asc => by_field,
            SortDirection::Desc => by_field.reverse(),
        };
        by_field.then_with(|| a.id.cmp(&b.id))
    });

    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(usize::MAX);
    leads.into_iter().skip(offset).take(limit).collect()
}

fn matches(lead: &Lead, query: &LeadQuery) -> bool {
    if let Some(term) = &query.search {
        let term = term.to_lowercase();
        let haystacks = [
            lead.first_name.to_lowercase(),
            lead.last_name.to_lowercase(),
            lead.email.to_lowercase(),
            lead.company.as_deref().unwrap_or("").to_lowercase(),
        ];
        if !haystacks.iter().any(|field| field.contains(&term)) {
            return false;
        }
    }
    if let Some(status) = query.status {
        if lead.status != status {
            return false;
        }
    }
    if let Some(source) = &query.source {
        if !lead.source.eq_ignore_ascii_case(source) {
            return false;
        }
    }
    if let Some(buyer_type) = query.buyer_type {
        if lead.buyer_type != buyer_type {
            return false;
        }
    }
    if let Some(timeline) = query.timeline {
        if lead.timeline != timeline {
            return false;
        }
    }
    if let Some(assignee) = &query.assigned_to {
        if lead.assigned_to.as_deref() != Some(assignee.as_str()) {
            return false;
        }
    }
    if let Some(min) = query.min_score {
        if lead.score < min {
            return false;
        }
    }
    if let Some(max) = query.max_score {
        if lead.score > max {
            return false;
        }
    }
    if let Some(min) = query.min_budget {
        if lead.pipeline_value() < min {
            return false;
        }
    }
    if let Some(max) = query.max_budget {
        if lead.pipeline_value() > max {
            return false;
        }
    }
    true
}

fn compare(a: &Lead, b: &Lead, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Score => a.score.cmp(&b.score),
        SortField::Budget => a.pipeline_value().cmp(&b.pipeline_value()),
        SortField::LastName => a
            .last_name
            .to_lowercase()
            .cmp(&b.last_name.to_lowercase()),
    }
}
