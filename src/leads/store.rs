use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::domain::{Lead, LeadId};

/// Time source seam so conversion timestamps are deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used by the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("lead not found")]
    NotFound,
    #[error("concurrent modification detected")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence port. Implementations must serialize concurrent mutations to
/// the same lead id and report a lost race as [`StoreError::Conflict`].
pub trait LeadStore: Send + Sync {
    fn insert(&self, lead: Lead) -> Result<Lead, StoreError>;
    fn update(&self, lead: Lead) -> Result<Lead, StoreError>;
    fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, StoreError>;
    fn delete(&self, id: &LeadId) -> Result<(), StoreError>;
    /// Point-in-time snapshot of every lead, unordered.
    fn list(&self) -> Result<Vec<Lead>, StoreError>;
}

/// In-process store backing the binary and the test suites. The map mutex
/// serializes access and the per-record version stamp turns a lost
/// read-modify-write race into [`StoreError::Conflict`].
#[derive(Debug, Default)]
pub struct MemoryLeadStore {
    records: Mutex<BTreeMap<LeadId, Lead>>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<LeadId, Lead>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("lead store mutex poisoned".to_string()))
    }
}

impl LeadStore for MemoryLeadStore {
    fn insert(&self, lead: Lead) -> Result<Lead, StoreError> {
        let mut guard = self.guard()?;
        if guard.contains_key(&lead.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(lead.id.clone(), lead.clone());
        Ok(lead)
    }

    fn update(&self, mut lead: Lead) -> Result<Lead, StoreError> {
        let mut guard = self.guard()?;
        let current = guard.get(&lead.id).ok_or(StoreError::NotFound)?;
        // Optimistic check: a write carrying a stale version lost the race.
        if current.version != lead.version {
            return Err(StoreError::Conflict);
        }
        lead.version += 1;
        guard.insert(lead.id.clone(), lead.clone());
        Ok(lead)
    }

    fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, StoreError> {
        Ok(self.guard()?.get(id).cloned())
    }

    fn delete(&self, id: &LeadId) -> Result<(), StoreError> {
        self.guard()?.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn list(&self) -> Result<Vec<Lead>, StoreError> {
        Ok(self.guard()?.values().cloned().collect())
    }
}
