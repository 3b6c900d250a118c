use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::analytics::{
    self, FinancialSnapshot, PropertySnapshot, ReservationSnapshot,
};
use super::bulk::{BulkOperation, BulkOperationCoordinator};
use super::domain::{ConversionDetails, LeadId, LeadStatus, LEAD_SOURCES};
use super::query::LeadQuery;
use super::service::{LeadPatch, LeadService, LeadServiceError, NewLead};
use super::store::{Clock, LeadStore, StoreError, SystemClock};

/// Router builder exposing the lead lifecycle API.
pub fn lead_router<S>(service: Arc<LeadService<S>>) -> Router
where
    S: LeadStore + Send + Sync + 'static,
{
    lead_router_with_clock(service, Arc::new(SystemClock))
}

pub fn lead_router_with_clock<S>(service: Arc<LeadService<S>>, clock: Arc<dyn Clock>) -> Router
where
    S: LeadStore + Send + Sync + 'static,
{
    let state = RouterState { service, clock };
    Router::new()
        .route("/api/v1/leads", post(create_handler::<S>).get(query_handler::<S>))
        .route("/api/v1/leads/sources", get(sources_handler))
        .route(
            "/api/v1/leads/:lead_id",
            get(get_handler::<S>).patch(update_handler::<S>),
        )
        .route(
            "/api/v1/leads/:lead_id/activities",
            get(activities_handler::<S>),
        )
        .route(
            "/api/v1/leads/:lead_id/transition",
            post(transition_handler::<S>),
        )
        .route("/api/v1/leads/:lead_id/convert", post(convert_handler::<S>))
        .route("/api/v1/leads/bulk/transition", post(bulk_transition_handler::<S>))
        .route("/api/v1/leads/bulk/assign", post(bulk_assign_handler::<S>))
        .route("/api/v1/pipeline/stats", get(pipeline_stats_handler::<S>))
        .route(
            "/api/v1/analytics/conversion",
            get(conversion_analytics_handler::<S>),
        )
        .route("/api/v1/dashboard/summary", post(dashboard_handler::<S>))
        .with_state(state)
}

struct RouterState<S> {
    service: Arc<LeadService<S>>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for RouterState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            clock: Arc::clone(&self.clock),
        }
    }
}

fn error_response(error: LeadServiceError) -> Response {
    let status = match &error {
        LeadServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LeadServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        LeadServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        LeadServiceError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        LeadServiceError::Transition(_) => StatusCode::CONFLICT,
    };
    let body = Json(json!({ "error": error.to_string() }));
    (status, body).into_response()
}

/// Canonical source options for intake forms.
async fn sources_handler() -> Json<&'static [&'static str]> {
    Json(LEAD_SOURCES)
}

async fn create_handler<S>(
    State(state): State<RouterState<S>>,
    Json(new_lead): Json<NewLead>,
) -> Response
where
    S: LeadStore + Send + Sync + 'static,
{
    match state.service.create(new_lead) {
        Ok(lead) => (StatusCode::CREATED, Json(lead)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn query_handler<S>(
    State(state): State<RouterState<S>>,
    Query(query): Query<LeadQuery>,
) -> Response
where
    S: LeadStore + Send + Sync + 'static,
{
    match state.service.query(&query) {
        Ok(leads) => (StatusCode::OK, Json(leads)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_handler<S>(
    State(state): State<RouterState<S>>,
    Path(lead_id): Path<String>,
) -> Response
where
    S: LeadStore + Send + Sync + 'static,
{
    match state.service.get(&LeadId(lead_id)) {
        Ok(lead) => (StatusCode::OK, Json(lead)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn update_handler<S>(
    State(state): State<RouterState<S>>,
    Path(lead_id): Path<String>,
    Json(body): Json<LeadPatch>,
) -> Response
where
    S: LeadStore + Send + Sync + 'static,
{
    match state.service.update(&LeadId(lead_id), body) {
        Ok(lead) => (StatusCode::OK, Json(lead)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn activities_handler<S>(
    State(state): State<RouterState<S>>,
    Path(lead_id): Path<String>,
) -> Response
where
    S: LeadStore + Send + Sync + 'static,
{
    match state.service.activities(&LeadId(lead_id)) {
        Ok(log) => (StatusCode::OK, Json(log)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct TransitionRequest {
    status: LeadStatus,
    #[serde(default = "default_actor")]
    actor: String,
    #[serde(default)]
    notes: Option<String>,
}

fn default_actor() -> String {
    "system".to_string()
}

async fn transition_handler<S>(
    State(state): State<RouterState<S>>,
    Path(lead_id): Path<String>,
    Json(body): Json<TransitionRequest>,
) -> Response
where
    S: LeadStore + Send + Sync + 'static,
{
    match state
        .service
        .transition_status(&LeadId(lead_id), body.status, &body.actor, body.notes)
    {
        Ok(lead) => (StatusCode::OK, Json(lead)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct ConvertRequest {
    #[serde(default)]
    details: ConversionDetails,
    #[serde(default = "default_actor")]
    actor: String,
}

async fn convert_handler<S>(
    State(state): State<RouterState<S>>,
    Path(lead_id): Path<String>,
    Json(body): Json<ConvertRequest>,
) -> Response
where
    S: LeadStore + Send + Sync + 'static,
{
    match state
        .service
        .convert(&LeadId(lead_id), body.details, &body.actor)
    {
        Ok((lead, customer)) => (
            StatusCode::OK,
            Json(json!({ "lead": lead, "customer": customer })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct BulkTransitionRequest {
    ids: Vec<String>,
    status: LeadStatus,
    #[serde(default = "default_actor")]
    actor: String,
}

async fn bulk_transition_handler<S>(
    State(state): State<RouterState<S>>,
    Json(body): Json<BulkTransitionRequest>,
) -> Response
where
    S: LeadStore + Send + Sync + 'static,
{
    let coordinator = BulkOperationCoordinator::new(Arc::clone(&state.service));
    let ids = body.ids.into_iter().map(LeadId).collect();
    let result = coordinator
        .apply(
            ids,
            BulkOperation::Transition {
                status: body.status,
                actor: body.actor,
            },
        )
        .await;
    (StatusCode::OK, Json(result)).into_response()
}

#[derive(Debug, Deserialize)]
struct BulkAssignRequest {
    ids: Vec<String>,
    assignee: String,
    #[serde(default = "default_actor")]
    actor: String,
}

async fn bulk_assign_handler<S>(
    State(state): State<RouterState<S>>,
    Json(body): Json<BulkAssignRequest>,
) -> Response
where
    S: LeadStore + Send + Sync + 'static,
{
    let coordinator = BulkOperationCoordinator::new(Arc::clone(&state.service));
    let ids = body.ids.into_iter().map(LeadId).collect();
    let result = coordinator
        .apply(
            ids,
            BulkOperation::Assign {
                assignee: body.assignee,
                actor: body.actor,
            },
        )
        .await;
    (StatusCode::OK, Json(result)).into_response()
}

async fn pipeline_stats_handler<S>(State(state): State<RouterState<S>>) -> Response
where
    S: LeadStore + Send + Sync + 'static,
{
    match state.service.pipeline_stats() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn conversion_analytics_handler<S>(State(state): State<RouterState<S>>) -> Response
where
    S: LeadStore + Send + Sync + 'static,
{
    match state.service.conversion_analytics() {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct DashboardRequest {
    #[serde(default)]
    properties: PropertySnapshot,
    #[serde(default)]
    reservations: ReservationSnapshot,
    #[serde(default)]
    financials: FinancialSnapshot,
    currency: String,
}

async fn dashboard_handler<S>(
    State(state): State<RouterState<S>>,
    Json(body): Json<DashboardRequest>,
) -> Response
where
    S: LeadStore + Send + Sync + 'static,
{
    match state.service.pipeline_stats() {
        Ok(pipeline) => {
            let summary = analytics::compose_dashboard(
                pipeline,
                body.properties,
                body.reservations,
                body.financials,
                body.currency,
                state.clock.now(),
            );
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(error) => error_response(error),
    }
}
