use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use lead_pipeline::config::AppConfig;
use lead_pipeline::error::AppError;
use lead_pipeline::leads::{
    lead_router, BuyerType, LeadService, MemoryLeadStore, ScoringEngine, SystemClock, Timeline,
};
use lead_pipeline::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Lead Pipeline",
    about = "Run the lead lifecycle engine from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a hypothetical lead against the current rubric
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Maximum declared budget
    #[arg(long)]
    budget_max: Option<u64>,
    /// Minimum declared budget (used when no maximum is given)
    #[arg(long)]
    budget_min: Option<u64>,
    /// Purchase timeline (immediate, within_1_month, within_3_months,
    /// within_6_months, within_1_year, exploring)
    #[arg(long, value_parser = parse_timeline)]
    timeline: Timeline,
    /// Buyer type (first_time_buyer, investor, upgrade, downsize,
    /// relocation, commercial)
    #[arg(long, value_parser = parse_buyer_type)]
    buyer_type: BuyerType,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Score(args) => run_score(args),
    }
}

fn parse_timeline(raw: &str) -> Result<Timeline, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "immediate" => Ok(Timeline::Immediate),
        "within_1_month" => Ok(Timeline::Within1Month),
        "within_3_months" => Ok(Timeline::Within3Months),
        "within_6_months" => Ok(Timeline::Within6Months),
        "within_1_year" => Ok(Timeline::Within1Year),
        "exploring" => Ok(Timeline::Exploring),
        other => Err(format!("unknown timeline '{other}'")),
    }
}

fn parse_buyer_type(raw: &str) -> Result<BuyerType, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "first_time_buyer" => Ok(BuyerType::FirstTimeBuyer),
        "investor" => Ok(BuyerType::Investor),
        "upgrade" => Ok(BuyerType::Upgrade),
        "downsize" => Ok(BuyerType::Downsize),
        "relocation" => Ok(BuyerType::Relocation),
        "commercial" => Ok(BuyerType::Commercial),
        other => Err(format!("unknown buyer type '{other}'")),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let store = Arc::new(MemoryLeadStore::new());
    let service = Arc::new(LeadService::new(
        store,
        Arc::new(SystemClock),
        ScoringEngine::new(config.scoring.clone()),
    ));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(lead_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lead pipeline service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let engine = ScoringEngine::new(config.scoring);

    let budget = args.budget_max.or(args.budget_min).unwrap_or(0);
    let score = engine.score_inputs(budget, args.timeline, args.buyer_type);

    println!("Lead scoring preview");
    println!(
        "Inputs: budget {}, timeline {}, buyer type {}",
        budget,
        args.timeline.label(),
        args.buyer_type.label()
    );
    println!("\nFactors");
    for factor in &score.factors {
        println!(
            "- {}: {:.0} x {:.2} = {:.1}",
            factor.name,
            factor.raw,
            factor.weight,
            factor.raw * factor.weight
        );
    }
    println!("\nScore: {} ({})", score.value, score.rating.label());

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
