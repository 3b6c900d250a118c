//! Lead lifecycle engine: intake scoring, pipeline state machine, bulk
//! operations, and the funnel/conversion aggregates behind the dashboards.

pub mod analytics;
pub mod bulk;
pub mod domain;
pub mod pipeline;
pub mod query;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use analytics::{
    aggregate_pipeline, analyze_conversions, compose_dashboard, ConversionAnalytics,
    DashboardSummary, FinancialSnapshot, PipelineStats, PropertySnapshot, ReservationSnapshot,
    SourceConversions,
};
pub use bulk::{BulkOperation, BulkOperationCoordinator, BulkResult};
pub use domain::{
    ActivityKind, BuyerType, ConversionDetails, CustomerRecord, Lead, LeadActivity, LeadId,
    LeadRating, LeadStatus, PipelineStage, RiskLevel, Timeline, ACTIVE_STATUSES, LEAD_SOURCES,
};
pub use pipeline::TransitionError;
pub use query::{LeadQuery, SortDirection, SortField};
pub use router::{lead_router, lead_router_with_clock};
pub use scoring::{rating_for, LeadScore, ScoreFactor, ScoringConfig, ScoringEngine};
pub use service::{LeadPatch, LeadService, LeadServiceError, NewLead, ValidationError};
pub use store::{Clock, LeadStore, MemoryLeadStore, StoreError, SystemClock};
