use axum::{
    extract::{Query, State, FromRequestParts},
    response::{Html, Json},
    routing::get,
    Router,
    http::request::Parts,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc, time::Instant};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing::info;

use icp_lookup::{
    domain::{host_from_url, normalize_host},
    errors::IcpError,
    metrics,
    render,
    Config,
    LookupPipeline,
    LookupResponse,
};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<LookupPipeline>,
    config: Arc<Config>,
}

// Host validation extractor for /icp/:host
#[derive(Debug, Clone)]
pub struct ValidatedHost(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ValidatedHost
where
    S: Send + Sync,
{
    type Rejection = IcpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let host = parts
            .uri
            .path()
            .strip_prefix("/icp/")
            .and_then(|rest| rest.split('/').next())
            .filter(|host| !host.is_empty())
            .ok_or_else(|| IcpError::InvalidHost("Host not found in path".to_string()))?;

        normalize_host(host).map(ValidatedHost).map_err(|e| {
            metrics::increment_errors(e.kind());
            e
        })
    }
}

#[derive(Deserialize)]
struct IcpQuery {
    /// Page URL, as read from the browser's address bar
    url: Option<String>,
    /// Bare hostname, used when no URL is given
    host: Option<String>,
    #[serde(default)]
    /// Skip the cache read if true
    fresh: bool,
}

impl IcpQuery {
    fn resolve_host(&self) -> Result<String, IcpError> {
        match (&self.url, &self.host) {
            (Some(url), _) => host_from_url(url),
            (None, Some(host)) => normalize_host(host),
            (None, None) => Err(IcpError::InvalidHost("Either url or host is required".to_string())),
        }
    }
}

#[derive(Deserialize)]
struct PopupQuery {
    url: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "icp_lookup=info,tower_http=debug".into()),
        )
        .init();

    // Load configuration
    let config = Arc::new(Config::load()?);
    info!("Configuration loaded successfully");

    // Unknown provider identifiers fail here
    let pipeline = Arc::new(LookupPipeline::from_config(&config)?);

    metrics::init_metrics();

    let app_state = AppState {
        pipeline,
        config: config.clone(),
    };

    let app = Router::new()
        .route("/icp", get(icp_lookup).post(icp_lookup_post))
        .route("/icp/:host", get(icp_lookup_path))
        .route("/popup", get(popup))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!("ICP lookup service listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("Metrics: http://{}/metrics", addr);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install CTRL+C signal handler: {}", e);
            return;
        }
        info!("Received shutdown signal, gracefully shutting down...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

async fn icp_lookup(
    Query(params): Query<IcpQuery>,
    State(state): State<AppState>,
) -> Result<Json<LookupResponse>, IcpError> {
    let host = params.resolve_host().map_err(|e| {
        metrics::increment_errors(e.kind());
        e
    })?;

    Ok(Json(run_lookup(&state, &host, params.fresh).await))
}

async fn icp_lookup_post(
    State(state): State<AppState>,
    Json(payload): Json<IcpQuery>,
) -> Result<Json<LookupResponse>, IcpError> {
    icp_lookup(Query(payload), State(state)).await
}

async fn icp_lookup_path(
    validated_host: ValidatedHost,
    State(state): State<AppState>,
) -> Json<LookupResponse> {
    Json(run_lookup(&state, &validated_host.0, false).await)
}

// Rendered popup view; a missing or bad page URL shows the error notice instead of a blank page
async fn popup(
    Query(params): Query<PopupQuery>,
    State(state): State<AppState>,
) -> Html<String> {
    let start_time = Instant::now();
    let view = render::popup_view(&state.pipeline, params.url.as_deref()).await;

    match &view.outcome {
        Ok(outcome) => metrics::record_lookup(outcome.source, start_time.elapsed().as_millis() as u64),
        Err(e) => metrics::increment_errors(e.kind()),
    }

    Html(render::render_page(&view.html))
}

async fn run_lookup(state: &AppState, host: &str, fresh: bool) -> LookupResponse {
    let start_time = Instant::now();

    let outcome = if fresh {
        state.pipeline.lookup_fresh(host).await
    } else {
        state.pipeline.lookup_detailed(host).await
    };

    let query_time = start_time.elapsed().as_millis() as u64;
    metrics::record_lookup(outcome.source, query_time);

    LookupResponse::from_outcome(outcome, query_time)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.config.start_time.elapsed().as_secs(),
    })
}
