use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::warn;

use super::domain::{LeadId, LeadStatus};
use super::service::LeadService;
use super::store::LeadStore;

/// Change applied uniformly to every lead in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BulkOperation {
    Transition { status: LeadStatus, actor: String },
    Assign { assignee: String, actor: String },
}

/// Per-item outcome of a bulk request. Complete: every distinct id was
/// attempted exactly once before this was built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkResult {
    pub succeeded: Vec<LeadId>,
    pub failed: Vec<(LeadId, String)>,
}

impl BulkResult {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Fans one operation out across many lead ids as independent tasks and
/// joins them all before reporting. A failure on one id never blocks the
/// rest; per-item errors become reason strings, the batch itself never
/// raises. Same-id write serialization is the store's contract.
pub struct BulkOperationCoordinator<S> {
    service: Arc<LeadService<S>>,
}

impl<S> BulkOperationCoordinator<S>
where
    S: LeadStore + Send + Sync + 'static,
{
    pub fn new(service: Arc<LeadService<S>>) -> Self {
        Self { service }
    }

    pub async fn apply(&self, ids: Vec<LeadId>, operation: BulkOperation) -> BulkResult {
        // Duplicate ids collapse to a single attempt.
        let distinct: BTreeSet<LeadId> = ids.into_iter().collect();

        let mut tasks = JoinSet::new();
        for id in distinct {
            let service = Arc::clone(&self.service);
            let operation = operation.clone();
            tasks.spawn(async move {
                let outcome = match &operation {
                    BulkOperation::Transition { status, actor } => service
                        .transition_status(&id, *status, actor, None)
                        .map(|_| ()),
                    BulkOperation::Assign { assignee, actor } => {
                        service.assign(&id, assignee, actor).map(|_| ())
                    }
                };
                (id, outcome.map_err(|err| err.to_string()))
            });
        }

        let mut result = BulkResult::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, Ok(()))) => result.succeeded.push(id),
                Ok((id, Err(reason))) => result.failed.push((id, reason)),
                Err(err) => warn!(error = %err, "bulk task aborted before reporting"),
            }
        }

        // Join order is completion order; sort for a stable response.
        result.succeeded.sort();
        result.failed.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}
