//! Engram server — composition root for the multi-tenant bitemporal memory
//! graph API. Wires the schema registry, tenant router, memory service,
//! auth gate, rate limiter, and their collaborator adapters into the
//! `/v1/memory/*` HTTP surface (C9).
//!
//! This binary reads `ENGRAM_*` environment variables (the only place in
//! the workspace that touches `std::env`, per §6.4) and hands parsed
//! values down through [`config::Config`].

use engram_server::collaborators::graph_sqlite::SqliteGraphBackend;
use engram_server::collaborators::token_store::InMemoryTokenStore;
use engram_server::collaborators::vector_http::HttpVectorSearchClient;
use engram_server::collaborators::{
    audit::TracingAuditSink, GraphBackend, TokenMethod, TokenRecord, TokenStore,
};
use engram_server::config::{Config, LogFormat};
use engram_server::memory::MemoryService;
use engram_server::ratelimit::RateLimiter;
use engram_server::tenant::TenantRouter;
use engram_server::{collaborators, http};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use engram_server::worker::WorkerPool;

/// Per-request deadline (§5, "Cancellation and timeouts"): any request that
/// doesn't finish within `ENGRAM_REQUEST_TIMEOUT_MS` gets a generic 500
/// `TIMEOUT` response rather than hanging indefinitely.
async fn handle_timeout_error(err: tower::BoxError) -> engram_server::error::ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        engram_server::error::ApiError::timeout()
    } else {
        engram_server::error::ApiError::internal(err.to_string())
    }
}

/// Seeds a single development API key so a fresh checkout has something to
/// authenticate with. Production deployments back [`TokenStore`] with the
/// relational store (§1) and never exercise this path.
const DEV_API_KEY: &str = "engram_test_00000000000000000000000000000000";

fn seed_dev_token(store: &InMemoryTokenStore) {
    store.insert_api_key(
        DEV_API_KEY,
        TokenRecord {
            id: "tok_dev".to_string(),
            prefix: DEV_API_KEY[..20].to_string(),
            method: TokenMethod::ApiKey,
            token_type: "api_key".to_string(),
            user_id: None,
            org_id: "org_dev".to_string(),
            org_slug: "dev".to_string(),
            scopes: vec![
                "memory:read".to_string(),
                "memory:write".to_string(),
                "query:read".to_string(),
            ],
            rate_limit: 60,
            grant_type: None,
            client_id: None,
            is_active: true,
            revoked_at: None,
            expires_at: None,
        },
    );
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt().with_env_filter(filter).json().init();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    init_logging(config.log_format);

    info!(
        host = %config.host,
        port = config.port,
        vector_search_url = %config.vector_search_url,
        "engram-server starting"
    );

    let schema = Arc::new(
        engram_core::schema::catalogue::build().expect("built-in §3.3 catalogue must be valid"),
    );

    let graph_backend: Arc<dyn GraphBackend> =
        Arc::new(SqliteGraphBackend::new(config.graph_data_dir.clone()));
    let router = Arc::new(TenantRouter::new(graph_backend));

    let vector = Arc::new(HttpVectorSearchClient::new(
        config.vector_search_url.clone(),
        Duration::from_millis(config.request_timeout_ms),
    ));

    let workers = Arc::new(WorkerPool::spawn(1024, 8));

    let memory = Arc::new(MemoryService::new(
        schema.clone(),
        router.clone(),
        vector.clone(),
        workers.clone(),
    ));

    let token_store = Arc::new(InMemoryTokenStore::new());
    seed_dev_token(&token_store);
    let token_store: Arc<dyn TokenStore> = token_store;

    let audit: Arc<dyn collaborators::AuditSink> = Arc::new(TracingAuditSink);

    let state = http::AppState {
        memory,
        token_store,
        audit,
        rate_limiter: Arc::new(RateLimiter::new()),
        rate_limit_default: config.rate_limit_default,
    };

    let app = http::router(state).layer(
        tower::ServiceBuilder::new()
            .layer(tower_http::trace::TraceLayer::new_for_http())
            .layer(tower_http::cors::CorsLayer::permissive())
            .layer(axum::error_handling::HandleErrorLayer::new(handle_timeout_error))
            .layer(tower::timeout::TimeoutLayer::new(Duration::from_millis(
                config.request_timeout_ms,
            ))),
    );

    let addr = format!("{}:{}", config.host, config.port);
    info!(%addr, "binding listener");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
