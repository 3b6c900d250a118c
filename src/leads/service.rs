use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::analytics::{self, ConversionAnalytics, PipelineStats};
use super::domain::{
    ActivityKind, BuyerType, ConversionDetails, CustomerRecord, Lead, LeadActivity, LeadId,
    LeadStatus, Timeline,
};
use super::pipeline::{self, TransitionError};
use super::query::{self, LeadQuery};
use super::scoring::ScoringEngine;
use super::store::{Clock, LeadStore, StoreError};

/// Intake payload for a new lead.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub budget_min: Option<u64>,
    #[serde(default)]
    pub budget_max: Option<u64>,
    pub timeline: Timeline,
    pub buyer_type: BuyerType,
    pub source: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub next_follow_up_date: Option<DateTime<Utc>>,
}

/// Partial update; absent fields are left untouched. Field edits remain
/// allowed on terminal leads, only status moves are locked down.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LeadPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub budget_min: Option<u64>,
    pub budget_max: Option<u64>,
    pub timeline: Option<Timeline>,
    pub buyer_type: Option<BuyerType>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub next_follow_up_date: Option<DateTime<Utc>>,
}

impl LeadPatch {
    fn touches_scoring(&self) -> bool {
        self.budget_min.is_some()
            || self.budget_max.is_some()
            || self.timeline.is_some()
            || self.buyer_type.is_some()
    }
}

/// Rejected intake or update input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("budget_max {max} is below budget_min {min}")]
    BudgetOrder { min: u64, max: u64 },
}

/// Error raised by the lead service.
#[derive(Debug, thiserror::Error)]
pub enum LeadServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

static LEAD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_lead_id() -> LeadId {
    let id = LEAD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LeadId(format!("lead-{id:06}"))
}

/// Service composing the scoring engine, the state machine, and the store
/// port. Stateless between calls; every read works on a fresh snapshot.
pub struct LeadService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    scoring: ScoringEngine,
}

impl<S> LeadService<S>
where
    S: LeadStore + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, scoring: ScoringEngine) -> Self {
        Self {
            store,
            clock,
            scoring,
        }
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    /// Create a lead with a freshly computed score and status New.
    pub fn create(&self, new_lead: NewLead) -> Result<Lead, LeadServiceError> {
        validate_new(&new_lead)?;

        let now = self.clock.now();
        let id = next_lead_id();
        let mut lead = Lead {
            id: id.clone(),
            first_name: new_lead.first_name,
            last_name: new_lead.last_name,
            email: new_lead.email,
            phone: new_lead.phone,
            company: new_lead.company,
            country: new_lead.country,
            budget_min: new_lead.budget_min,
            budget_max: new_lead.budget_max,
            timeline: new_lead.timeline,
            buyer_type: new_lead.buyer_type,
            source: new_lead.source,
            status: LeadStatus::New,
            score: 0,
            assigned_to: new_lead.assigned_to,
            notes: new_lead.notes,
            last_contact_date: None,
            next_follow_up_date: new_lead.next_follow_up_date,
            conversion_date: None,
            created_at: now,
            updated_at: now,
            version: 0,
            activities: vec![LeadActivity {
                kind: ActivityKind::Created,
                actor: "system".to_string(),
                at: now,
                notes: None,
            }],
        };
        lead.score = self.scoring.score(&lead).value;

        let stored = self.store.insert(lead)?;
        debug!(lead = %id, score = stored.score, "lead created");
        Ok(stored)
    }

    /// Apply a partial update, re-scoring when a rubric input changed.
    pub fn update(&self, id: &LeadId, patch: LeadPatch) -> Result<Lead, LeadServiceError> {
        let rescore = patch.touches_scoring();
        let (lead, _) = self.mutate(id, |lead, now| {
            apply_patch(lead, &patch)?;
            if rescore {
                lead.score = self.scoring.score(lead).value;
            }
            lead.updated_at = now;
            lead.activities.push(LeadActivity {
                kind: ActivityKind::FieldsUpdated,
                actor: "system".to_string(),
                at: now,
                notes: None,
            });
            Ok(())
        })?;
        Ok(lead)
    }

    /// Move a lead along the pipeline, recording the transition.
    pub fn transition_status(
        &self,
        id: &LeadId,
        new_status: LeadStatus,
        actor: &str,
        notes: Option<String>,
    ) -> Result<Lead, LeadServiceError> {
        let (lead, _) = self.mutate(id, |lead, now| {
            pipeline::transition(lead, new_status, actor, notes.clone(), now)?;
            Ok(())
        })?;
        debug!(lead = %id, status = lead.status.label(), "lead transitioned");
        Ok(lead)
    }

    /// Convert an active lead, returning the updated lead and the customer
    /// record stub for the external customer collaborator.
    pub fn convert(
        &self,
        id: &LeadId,
        details: ConversionDetails,
        actor: &str,
    ) -> Result<(Lead, CustomerRecord), LeadServiceError> {
        let result = self.mutate(id, |lead, now| {
            let record = pipeline::convert(lead, details.clone(), actor, now)?;
            Ok(record)
        })?;
        debug!(lead = %id, "lead converted");
        Ok(result)
    }

    /// Reassign a lead to another agent.
    pub fn assign(
        &self,
        id: &LeadId,
        assignee: &str,
        actor: &str,
    ) -> Result<Lead, LeadServiceError> {
        let (lead, _) = self.mutate(id, |lead, now| {
            lead.assigned_to = Some(assignee.to_string());
            lead.updated_at = now;
            lead.activities.push(LeadActivity {
                kind: ActivityKind::Assigned {
                    assignee: assignee.to_string(),
                },
                actor: actor.to_string(),
                at: now,
                notes: None,
            });
            Ok(())
        })?;
        Ok(lead)
    }

    pub fn get(&self, id: &LeadId) -> Result<Lead, LeadServiceError> {
        self.store
            .fetch(id)?
            .ok_or(LeadServiceError::Store(StoreError::NotFound))
    }

    pub fn delete(&self, id: &LeadId) -> Result<(), LeadServiceError> {
        self.store.delete(id)?;
        Ok(())
    }

    /// Ordered, immutable activity log for one lead.
    pub fn activities(&self, id: &LeadId) -> Result<Vec<LeadActivity>, LeadServiceError> {
        Ok(self.get(id)?.activities)
    }

    pub fn leads_by_status(&self, status: LeadStatus) -> Result<Vec<Lead>, LeadServiceError> {
        let query = LeadQuery {
            status: Some(status),
            ..LeadQuery::default()
        };
        self.query(&query)
    }

    /// Filtered, deterministically sorted, paged snapshot.
    pub fn query(&self, query: &LeadQuery) -> Result<Vec<Lead>, LeadServiceError> {
        let snapshot = self.store.list()?;
        Ok(query::run(snapshot, query))
    }

    pub fn pipeline_stats(&self) -> Result<PipelineStats, LeadServiceError> {
        let snapshot = self.store.list()?;
        Ok(analytics::aggregate_pipeline(&snapshot))
    }

    pub fn conversion_analytics(&self) -> Result<ConversionAnalytics, LeadServiceError> {
        let snapshot = self.store.list()?;
        Ok(analytics::analyze_conversions(&snapshot))
    }

    /// Read-modify-write with a single retry when the store reports a lost
    /// race. The retry re-reads and re-applies against the fresh record.
    fn mutate<T, F>(&self, id: &LeadId, apply: F) -> Result<(Lead, T), LeadServiceError>
    where
        F: Fn(&mut Lead, DateTime<Utc>) -> Result<T, LeadServiceError>,
    {
        match self.try_mutate(id, &apply) {
            Err(LeadServiceError::Store(StoreError::Conflict)) => {
                debug!(lead = %id, "store conflict, retrying once");
                self.try_mutate(id, &apply)
            }
            other => other,
        }
    }

    fn try_mutate<T, F>(&self, id: &LeadId, apply: &F) -> Result<(Lead, T), LeadServiceError>
    where
        F: Fn(&mut Lead, DateTime<Utc>) -> Result<T, LeadServiceError>,
    {
        let mut lead = self
            .store
            .fetch(id)?
            .ok_or(LeadServiceError::Store(StoreError::NotFound))?;
        let outcome = apply(&mut lead, self.clock.now())?;
        let stored = self.store.update(lead)?;
        Ok((stored, outcome))
    }
}

fn validate_new(new_lead: &NewLead) -> Result<(), ValidationError> {
    if new_lead.first_name.trim().is_empty() {
        return Err(ValidationError::MissingField("first_name"));
    }
    if new_lead.last_name.trim().is_empty() {
        return Err(ValidationError::MissingField("last_name"));
    }
    if new_lead.source.trim().is_empty() {
        return Err(ValidationError::MissingField("source"));
    }
    validate_email(&new_lead.email)?;
    validate_budget(new_lead.budget_min, new_lead.budget_max)
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

fn validate_budget(min: Option<u64>, max: Option<u64>) -> Result<(), ValidationError> {
    if let (Some(min), Some(max)) = (min, max) {
        if max < min {
            return Err(ValidationError::BudgetOrder { min, max });
        }
    }
    Ok(())
}

fn apply_patch(lead: &mut Lead, patch: &LeadPatch) -> Result<(), ValidationError> {
    let budget_min = patch.budget_min.or(lead.budget_min);
    let budget_max = patch.budget_max.or(lead.budget_max);
    validate_budget(budget_min, budget_max)?;
    if let Some(email) = &patch.email {
        validate_email(email)?;
    }

    if let Some(value) = &patch.first_name {
        lead.first_name = value.clone();
    }
    if let Some(value) = &patch.last_name {
        lead.last_name = value.clone();
    }
    if let Some(value) = &patch.email {
        lead.email = value.clone();
    }
    if let Some(value) = &patch.phone {
        lead.phone = Some(value.clone());
    }
    if let Some(value) = &patch.company {
        lead.company = Some(value.clone());
    }
    if let Some(value) = &patch.country {
        lead.country = Some(value.clone());
    }
    if patch.budget_min.is_some() {
        lead.budget_min = patch.budget_min;
    }
    if patch.budget_max.is_some() {
        lead.budget_max = patch.budget_max;
    }
    if let Some(value) = patch.timeline {
        lead.timeline = value;
    }
    if let Some(value) = patch.buyer_type {
        lead.buyer_type = value;
    }
    if let Some(value) = &patch.source {
        lead.source = value.clone();
    }
    if let Some(value) = &patch.notes {
        lead.notes = Some(value.clone());
    }
    if let Some(value) = patch.last_contact_date {
        lead.last_contact_date = Some(value);
    }
    if let Some(value) = patch.next_follow_up_date {
        lead.next_follow_up_date = Some(value);
    }
    Ok(())
}
