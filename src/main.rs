use anyhow::Result;
use axum::{extract::State, http::HeaderMap, response::Json, routing::get, Router};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::fmt::format::FmtSpan;

mod auth;
mod home_activities;
mod telemetry;
mod types;

use crate::{
    auth::resolve_caller_id,
    home_activities::HomeActivities,
    telemetry::{NoopSink, TraceSink, TracingSink},
    types::*,
};

#[derive(Parser)]
#[command(name = "home-activities-feed")]
#[command(about = "Mock home activity feed service")]
struct Args {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "PORT", default_value = "4567")]
    port: u16,

    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Discard spans instead of reporting them through `tracing`
    #[arg(long, env = "DISABLE_TRACING")]
    disable_tracing: bool,
}

#[derive(Clone)]
struct AppState {
    home_activities: Arc<HomeActivities>,
    jwt_secret: Option<Arc<str>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "home_activities_feed=info,tower_http=info".into()),
        )
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let args = Args::parse();

    if args.jwt_secret.is_none() {
        warn!("JWT_SECRET not set, bearer token signatures will not be verified");
    }

    let sink: Arc<dyn TraceSink> = if args.disable_tracing {
        Arc::new(NoopSink)
    } else {
        Arc::new(TracingSink)
    };

    let app_state = AppState {
        home_activities: Arc::new(HomeActivities::new(sink)),
        jwt_secret: args.jwt_secret.map(Arc::from),
    };

    let listener = TcpListener::bind(format!("{}:{}", args.host, args.port)).await?;
    info!("Home activities feed listening on {}:{}", args.host, args.port);

    axum::serve(listener, app(app_state)).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health-check", get(health_check))
        .route("/api/activities/home", get(home_feed))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "Home Activities Feed"
}

async fn health_check() -> Json<HealthCheck> {
    Json(HealthCheck {
        success: true,
        ver: 1,
    })
}

async fn home_feed(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Json<Vec<ActivityRecord>> {
    let caller_id = resolve_caller_id(&headers, state.jwt_secret.as_deref());

    let results = state.home_activities.get_snapshot(caller_id.as_deref());
    info!(
        "Served home feed with {} activities (authenticated: {})",
        results.len(),
        caller_id.is_some()
    );

    Json(results)
}
