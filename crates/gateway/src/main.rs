//! LinkRank HTTP Gateway
//!
//! The single entry point for clients. Handles:
//! - Graph upload and retrieval
//! - PageRank computation against the stored graph
//! - Crawl job control and status polling
//! - Observability (logging, metrics, request ids)

mod extract;
mod handlers;
mod middleware;

use axum::{
    extract::Request,
    middleware::Next,
    routing::{get, post},
    Router,
};
use linkrank_common::{
    config::{AppConfig, ObservabilityConfig},
    errors::AppError,
    metrics::{self, LATENCY_BUCKETS},
};
use linkrank_engine::GraphStore;
use linkrank_orchestrator::{CrawlCommand, CrawlOrchestrator};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<GraphStore>,
    pub orchestrator: CrawlOrchestrator,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(GraphStore::new());
        let orchestrator = CrawlOrchestrator::new(
            CrawlCommand::from_config(&config.crawl),
            Arc::clone(&store),
            config.graph.artifact_path.clone(),
            config.crawl_timeout(),
        );

        Self {
            config: Arc::new(config),
            store,
            orchestrator,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(AppError::from)?;
    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        "Starting LinkRank gateway v{}",
        linkrank_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                LATENCY_BUCKETS,
            )?
            .install()?;
        info!("Metrics exported on {}", metrics_addr);
    }
    metrics::register_metrics();

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(config);

    // Build the router
    let app = create_router(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logging {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let request_timeout = state.config.request_timeout();
    let rate_limit = state.config.rate_limit.clone();

    let router = Router::new()
        // Health endpoints
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))

        // Graph endpoints
        .route("/default-graph", get(handlers::graph::default_graph))
        .route("/upload-graph", post(handlers::graph::upload_graph))
        .route("/graph", get(handlers::graph::get_graph))

        // Ranking endpoints
        .route("/run-pagerank", post(handlers::pagerank::run_pagerank))
        .route("/result", get(handlers::pagerank::get_result))

        // Crawl endpoints
        .route("/start-crawl", post(handlers::crawl::start_crawl))
        .route("/crawl-status", get(handlers::crawl::crawl_status))
        .with_state(state);

    let router = if rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            rate_limit.requests_per_second,
            rate_limit.burst,
        );
        router.layer(axum::middleware::from_fn(move |request: Request, next: Next| {
            middleware::rate_limit::rate_limit_middleware(
                request,
                next,
                limiter.clone(),
                rate_limit.requests_per_second,
            )
        }))
    } else {
        router
    };

    let router = router.layer(axum::middleware::from_fn(middleware::metrics::track_requests));

    middleware::timeout::with_deadline(router, request_timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
