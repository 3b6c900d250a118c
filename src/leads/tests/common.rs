use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::leads::domain::{
    ActivityKind, BuyerType, Lead, LeadActivity, LeadId, LeadStatus, Timeline,
};
use crate::leads::scoring::{ScoringConfig, ScoringEngine};
use crate::leads::service::{LeadService, NewLead};
use crate::leads::store::{Clock, LeadStore, MemoryLeadStore, StoreError};

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).single().expect("valid base time")
}

/// Deterministic clock that can be advanced between calls.
pub(super) struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub(super) fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub(super) fn scoring_engine() -> ScoringEngine {
    ScoringEngine::new(ScoringConfig::default())
}

pub(super) fn build_service() -> (
    Arc<LeadService<MemoryLeadStore>>,
    Arc<MemoryLeadStore>,
    Arc<FixedClock>,
) {
    let store = Arc::new(MemoryLeadStore::new());
    let clock = Arc::new(FixedClock::at(base_time()));
    let service = Arc::new(LeadService::new(
        store.clone(),
        clock.clone(),
        scoring_engine(),
    ));
    (service, store, clock)
}

pub(super) fn new_lead(first: &str, last: &str) -> NewLead {
    NewLead {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        phone: Some("+971-50-555-0101".to_string()),
        company: None,
        country: Some("AE".to_string()),
        budget_min: Some(400_000),
        budget_max: Some(750_000),
        timeline: Timeline::Within3Months,
        buyer_type: BuyerType::FirstTimeBuyer,
        source: "Website".to_string(),
        assigned_to: None,
        notes: None,
        next_follow_up_date: None,
    }
}

/// Standalone lead record for aggregator and query tests.
pub(super) fn lead_fixture(id: &str, status: LeadStatus) -> Lead {
    let created_at = base_time();
    Lead {
        id: LeadId(id.to_string()),
        first_name: "Test".to_string(),
        last_name: id.to_string(),
        email: format!("{id}@example.com"),
        phone: None,
        company: None,
        country: None,
        budget_min: None,
        budget_max: Some(500_000),
        timeline: Timeline::Within3Months,
        buyer_type: BuyerType::FirstTimeBuyer,
        source: "Website".to_string(),
        status,
        score: 50,
        assigned_to: None,
        notes: None,
        last_contact_date: None,
        next_follow_up_date: None,
        conversion_date: None,
        created_at,
        updated_at: created_at,
        version: 0,
        activities: vec![LeadActivity {
            kind: ActivityKind::Created,
            actor: "system".to_string(),
            at: created_at,
            notes: None,
        }],
    }
}

pub(super) fn converted_fixture(id: &str, source: &str, days_to_convert: i64) -> Lead {
    let mut lead = lead_fixture(id, LeadStatus::Converted);
    lead.source = source.to_string();
    lead.conversion_date = Some(lead.created_at + Duration::days(days_to_convert));
    lead
}

/// Store that loses the first update race, exercising the retry path.
pub(super) struct ConflictOnceStore {
    inner: MemoryLeadStore,
    tripped: AtomicBool,
}

impl ConflictOnceStore {
    pub(super) fn new() -> Self {
        Self {
            inner: MemoryLeadStore::new(),
            tripped: AtomicBool::new(false),
        }
    }
}

impl LeadStore for ConflictOnceStore {
    fn insert(&self, lead: Lead) -> Result<Lead, StoreError> {
        self.inner.insert(lead)
    }

    fn update(&self, lead: Lead) -> Result<Lead, StoreError> {
        if !self.tripped.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Conflict);
        }
        self.inner.update(lead)
    }

    fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, StoreError> {
        self.inner.fetch(id)
    }

    fn delete(&self, id: &LeadId) -> Result<(), StoreError> {
        self.inner.delete(id)
    }

    fn list(&self) -> Result<Vec<Lead>, StoreError> {
        self.inner.list()
    }
}

/// Store where every update loses the race; the single retry must surface
/// the conflict.
pub(super) struct AlwaysConflictStore {
    inner: MemoryLeadStore,
}

impl AlwaysConflictStore {
    pub(super) fn new() -> Self {
        Self {
            inner: MemoryLeadStore::new(),
        }
    }
}

impl LeadStore for AlwaysConflictStore {
    fn insert(&self, lead: Lead) -> Result<Lead, StoreError> {
        self.inner.insert(lead)
    }

    fn update(&self, _lead: Lead) -> Result<Lead, StoreError> {
        Err(StoreError::Conflict)
    }

    fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, StoreError> {
        self.inner.fetch(id)
    }

    fn delete(&self, id: &LeadId) -> Result<(), StoreError> {
        self.inner.delete(id)
    }

    fn list(&self) -> Result<Vec<Lead>, StoreError> {
        self.inner.list()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
