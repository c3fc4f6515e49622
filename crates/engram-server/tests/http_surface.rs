//! Black-box coverage of the `/v1/memory/*` HTTP surface (§8.6 scenarios),
//! driven with `tower`'s `oneshot` rather than a real socket.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use engram_server::collaborators::graph_sqlite::SqliteGraphBackend;
use engram_server::collaborators::token_store::InMemoryTokenStore;
use engram_server::collaborators::{
    CollaboratorError, GraphBackend, IndexMemoryRequest, Result as CResult, TokenMethod,
    TokenRecord, TokenStore, VectorHit, VectorSearchClient, VectorSearchRequest,
};
use engram_server::http::{self, AppState};
use engram_server::memory::MemoryService;
use engram_server::ratelimit::RateLimiter;
use engram_server::tenant::TenantRouter;
use engram_server::worker::WorkerPool;
use std::sync::Arc;
use tower::ServiceExt;

struct FailingVector;

#[async_trait::async_trait]
impl VectorSearchClient for FailingVector {
    async fn search(&self, _request: VectorSearchRequest) -> CResult<Vec<VectorHit>> {
        Err(CollaboratorError::VectorSearch("no vector backend in tests".to_string()))
    }
    async fn index_memory(&self, _request: IndexMemoryRequest) -> CResult<()> {
        Ok(())
    }
}

fn token_record(id: &str, org_id: &str, org_slug: &str, rate_limit: u32) -> TokenRecord {
    TokenRecord {
        id: id.to_string(),
        prefix: "engram_live_deadbeef0000".to_string(),
        method: TokenMethod::ApiKey,
        token_type: "api_key".to_string(),
        user_id: Some("user_1".to_string()),
        org_id: org_id.to_string(),
        org_slug: org_slug.to_string(),
        scopes: vec![
            "memory:read".to_string(),
            "memory:write".to_string(),
            "query:read".to_string(),
        ],
        rate_limit,
        grant_type: None,
        client_id: None,
        is_active: true,
        revoked_at: None,
        expires_at: None,
    }
}

const ACME_TOKEN: &str = "engram_live_00000000000000000000000000000001";
const GLOBEX_TOKEN: &str = "engram_live_00000000000000000000000000000002";

fn build_state(dir: &std::path::Path, rate_limit: u32) -> AppState {
    let backend: Arc<dyn GraphBackend> = Arc::new(SqliteGraphBackend::new(dir.to_path_buf()));
    let router = Arc::new(TenantRouter::new(backend));
    let schema = Arc::new(engram_core::schema::catalogue::build().unwrap());
    let workers = Arc::new(WorkerPool::spawn(64, 2));
    let memory = Arc::new(MemoryService::new(
        schema,
        router,
        Arc::new(FailingVector),
        workers,
    ));

    let tokens = InMemoryTokenStore::new();
    tokens.insert_api_key(ACME_TOKEN, token_record("tok_acme", "org_acme", "acme", rate_limit));
    tokens.insert_api_key(
        GLOBEX_TOKEN,
        token_record("tok_globex", "org_globex", "globex", rate_limit),
    );
    let token_store: Arc<dyn TokenStore> = Arc::new(tokens);

    AppState {
        memory,
        token_store,
        audit: Arc::new(engram_server::collaborators::audit::TracingAuditSink),
        rate_limiter: Arc::new(RateLimiter::new()),
        rate_limit_default: rate_limit,
    }
}

fn post(path: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// S1 — store then recall.
#[tokio::test]
async fn store_then_recall() {
    let dir = tempfile::tempdir().unwrap();
    let app = http::router(build_state(dir.path(), 1000));

    let remember = app
        .clone()
        .oneshot(post(
            "/v1/memory/remember",
            ACME_TOKEN,
            serde_json::json!({"content": "Chose Postgres over MySQL", "type": "decision"}),
        ))
        .await
        .unwrap();
    assert_eq!(remember.status(), StatusCode::CREATED);
    let body = json_body(remember).await;
    assert_eq!(body["data"]["stored"], true);
    assert_eq!(body["data"]["duplicate"], false);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let recall = app
        .clone()
        .oneshot(post(
            "/v1/memory/recall",
            ACME_TOKEN,
            serde_json::json!({"query": "Postgres", "limit": 5}),
        ))
        .await
        .unwrap();
    assert_eq!(recall.status(), StatusCode::OK);
    let body = json_body(recall).await;
    let memories = body["data"]["memories"].as_array().unwrap();
    assert!(memories.iter().any(|m| m["id"] == id && m["invalidated"] == false));
}

/// S2 — dedup.
#[tokio::test]
async fn remember_twice_dedups() {
    let dir = tempfile::tempdir().unwrap();
    let app = http::router(build_state(dir.path(), 1000));
    let payload = serde_json::json!({"content": "Chose Postgres over MySQL", "type": "decision"});

    let first = json_body(
        app.clone()
            .oneshot(post("/v1/memory/remember", ACME_TOKEN, payload.clone()))
            .await
            .unwrap(),
    )
    .await;
    let second = json_body(
        app.clone()
            .oneshot(post("/v1/memory/remember", ACME_TOKEN, payload))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(second["data"]["stored"], false);
    assert_eq!(second["data"]["duplicate"], true);
    assert_eq!(first["data"]["id"], second["data"]["id"]);
}

/// S3 — tenant isolation.
#[tokio::test]
async fn tenant_isolation() {
    let dir = tempfile::tempdir().unwrap();
    let app = http::router(build_state(dir.path(), 1000));

    app.clone()
        .oneshot(post(
            "/v1/memory/remember",
            ACME_TOKEN,
            serde_json::json!({"content": "Chose Postgres over MySQL", "type": "decision"}),
        ))
        .await
        .unwrap();

    let recall = app
        .clone()
        .oneshot(post(
            "/v1/memory/recall",
            GLOBEX_TOKEN,
            serde_json::json!({"query": "Postgres", "limit": 5}),
        ))
        .await
        .unwrap();
    let body = json_body(recall).await;
    assert_eq!(body["data"]["memories"].as_array().unwrap().len(), 0);
}

/// S4 — free-form write attempt.
#[tokio::test]
async fn query_rejects_write_keyword() {
    let dir = tempfile::tempdir().unwrap();
    let app = http::router(build_state(dir.path(), 1000));

    let response = app
        .oneshot(post(
            "/v1/memory/query",
            ACME_TOKEN,
            serde_json::json!({"cypher": "CREATE (m:Memory {content:'x'}) RETURN m"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("CREATE"));
}

/// S6 — rate limit.
#[tokio::test]
async fn rate_limit_returns_429_with_retry_after() {
    let dir = tempfile::tempdir().unwrap();
    let app = http::router(build_state(dir.path(), 2));
    let payload = serde_json::json!({"content": "x", "type": "context"});

    let first = app
        .clone()
        .oneshot(post("/v1/memory/remember", ACME_TOKEN, payload.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .clone()
        .oneshot(post(
            "/v1/memory/remember",
            ACME_TOKEN,
            serde_json::json!({"content": "y", "type": "context"}),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CREATED);

    let third = app
        .oneshot(post(
            "/v1/memory/remember",
            ACME_TOKEN,
            serde_json::json!({"content": "z", "type": "context"}),
        ))
        .await
        .unwrap();
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: i64 = third
        .headers()
        .get("retry-after")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after <= 60);
}

/// Missing bearer token never surfaces as a 500 (§8.4 property 11).
#[tokio::test]
async fn missing_auth_header_is_401_not_500() {
    let dir = tempfile::tempdir().unwrap();
    let app = http::router(build_state(dir.path(), 1000));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/memory/recall")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&serde_json::json!({"query": "x"})).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
