//! Traits for the four external collaborators named in §6.3. Production
//! deployments implement these against a real graph engine, vector search
//! service, relational token store, and metrics/audit pipeline; this
//! workspace carries exactly one reference adapter per trait (see the
//! sibling modules), each clearly a development/test stand-in.

pub mod audit;
pub mod graph_sqlite;
pub mod token_store;
pub mod vector_http;

use async_trait::async_trait;
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// A single result row: column name to JSON-ish value. Deliberately loose —
/// the graph backend's actual row shape depends on what a path expression
/// asked for.
pub type Row = BTreeMap<String, Json>;

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("graph backend error: {0}")]
    Graph(String),
    #[error("vector search error: {0}")]
    VectorSearch(String),
    #[error("token store error: {0}")]
    TokenStore(String),
}

pub type Result<T> = std::result::Result<T, CollaboratorError>;

/// Opaque handle on one tenant's physical graph namespace.
#[derive(Debug, Clone)]
pub struct NamespaceHandle {
    pub name: String,
}

/// A new node row, ready to insert. Carries its own bitemporal interval —
/// callers decide `vt`/`tt` up front (§3.1 invariant 5: an update produces a
/// new row, never an in-place mutation of the prior one).
#[derive(Debug, Clone)]
pub struct NodeWrite {
    pub label: String,
    pub id: String,
    pub org_id: String,
    pub vt_start: i64,
    pub vt_end: i64,
    pub tt_start: i64,
    pub tt_end: i64,
    pub fields: Json,
}

/// A new edge row, ready to insert.
#[derive(Debug, Clone)]
pub struct EdgeWrite {
    pub edge_type: String,
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub org_id: String,
    pub vt_start: i64,
    pub vt_end: i64,
    pub tt_start: i64,
    pub tt_end: i64,
    pub properties: Json,
}

/// The graph engine: parameterized expression execution plus lazy
/// per-tenant namespace provisioning (§4.5, §6.3).
///
/// §6.3 describes writes as going "through the same expression channel" as
/// reads; this workspace keeps that channel conceptually single (everything
/// still flows through one tenant-scoped backend) but gives writes their own
/// narrow, structured methods rather than overloading `query` with a second,
/// write-capable expression dialect — C3's builder is explicitly read-only
/// (§4.3), so there is no read-only-safe way to *build* a write expression
/// in the first place. Recorded as a resolved open question in DESIGN.md.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Executes a rendered read-only path expression with its bound
    /// parameters against `namespace`, returning every matched row.
    async fn query(
        &self,
        namespace: &NamespaceHandle,
        expression: &str,
        params: &[engram_core::Value],
    ) -> Result<Vec<Row>>;

    /// Idempotently provisions (or returns the existing) namespace named
    /// `name`.
    async fn ensure_namespace(&self, name: &str) -> Result<NamespaceHandle>;

    /// Inserts one new node row.
    async fn insert_node(&self, namespace: &NamespaceHandle, write: NodeWrite) -> Result<()>;

    /// Inserts one new edge row.
    async fn insert_edge(&self, namespace: &NamespaceHandle, write: EdgeWrite) -> Result<()>;

    /// Closes the *valid-time* interval of `label`'s currently-valid row for
    /// `id` at `at` (soft-delete, §3.1 invariant 4). Leaves transaction time
    /// untouched — the row is still the current record, just no longer
    /// currently valid.
    async fn close_valid_time(
        &self,
        namespace: &NamespaceHandle,
        label: &str,
        id: &str,
        at: i64,
    ) -> Result<()>;

    /// Closes the *transaction-time* interval of `label`'s currently-recorded
    /// row for `id` at `at` — used when a new version supersedes it
    /// (§3.1 invariant 5).
    async fn close_transaction_time(
        &self,
        namespace: &NamespaceHandle,
        label: &str,
        id: &str,
        at: i64,
    ) -> Result<()>;

    /// In-place bookkeeping update on a `Memory` row's `last_accessed` and
    /// `access_count` fields (§4.6.2 step 9). This does not version the row —
    /// access metadata is not a fact under bitemporal control, it is
    /// operational bookkeeping on the current row.
    async fn record_memory_access(
        &self,
        namespace: &NamespaceHandle,
        id: &str,
        now: i64,
    ) -> Result<()>;

    /// Reads `{decay_score, pinned}` for each of `ids` that currently exists,
    /// keyed by id. Ids with no current `Memory` row are simply absent from
    /// the result — the memory service treats that as "default to 1.0"
    /// (§4.6.2 step 5).
    async fn read_decay(
        &self,
        namespace: &NamespaceHandle,
        ids: &[String],
    ) -> Result<BTreeMap<String, (f64, bool)>>;

    /// Follows `(new:Memory) -[:REPLACES]-> (old:Memory)` for `old_id`,
    /// returning the replacing id if one exists (§4.6.2 step 6).
    async fn find_replacement(
        &self,
        namespace: &NamespaceHandle,
        old_id: &str,
    ) -> Result<Option<String>>;
}

/// One hit from the vector search service.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub node_id: String,
    pub content: String,
    pub memory_type: String,
    pub tags: Vec<String>,
    pub timestamp: i64,
    pub vt_end: i64,
    pub score: f64,
}

/// Filters forwarded to the vector search service for a single `recall`
/// call (§4.6.2 step 1).
#[derive(Debug, Clone, Default)]
pub struct VectorFilters {
    pub project: Option<String>,
    pub org_id: String,
    pub vt_end_after: i64,
    pub time_range: Option<(i64, i64)>,
}

/// Rerank tier requested alongside a vector search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerankTier {
    Fast,
    Accurate,
    Code,
    Llm,
}

impl RerankTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RerankTier::Fast => "fast",
            RerankTier::Accurate => "accurate",
            RerankTier::Code => "code",
            RerankTier::Llm => "llm",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VectorSearchRequest {
    pub text: String,
    pub limit: u32,
    pub threshold: f64,
    pub strategy: &'static str,
    pub rerank: bool,
    pub rerank_tier: RerankTier,
    pub collection: &'static str,
    pub filters: VectorFilters,
}

#[derive(Debug, Clone)]
pub struct IndexMemoryRequest {
    pub id: String,
    pub content: String,
    pub memory_type: String,
    pub tags: Vec<String>,
    pub project: Option<String>,
    pub org_id: String,
}

/// The remote vector search/embedding service (§6.3).
#[async_trait]
pub trait VectorSearchClient: Send + Sync {
    async fn search(&self, request: VectorSearchRequest) -> Result<Vec<VectorHit>>;
    async fn index_memory(&self, request: IndexMemoryRequest) -> Result<()>;
}

/// A bearer token record as resolved by the token store (§4.7).
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub id: String,
    pub prefix: String,
    pub method: TokenMethod,
    pub token_type: String,
    pub user_id: Option<String>,
    pub org_id: String,
    pub org_slug: String,
    pub scopes: Vec<String>,
    pub rate_limit: u32,
    pub grant_type: Option<String>,
    pub client_id: Option<String>,
    pub is_active: bool,
    pub revoked_at: Option<i64>,
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMethod {
    ApiKey,
    OAuth,
    ClientCredentials,
}

/// The relational store backing tokens, organizations, and usage counters
/// (§6.3). Only the token-facing surface is modeled here; organizations and
/// OpenTofu state stay external per §1.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn validate_api_key(&self, plaintext: &str) -> Result<Option<TokenRecord>>;
    async fn validate_oauth_token(&self, plaintext: &str) -> Result<Option<TokenRecord>>;
    async fn record_last_used(&self, id: &str) -> Result<()>;
}

/// A cross-tenant admin read, logged unconditionally (§4.5 invariant, §9).
#[derive(Debug, Clone)]
pub struct CrossTenantRead {
    pub user_id: Option<String>,
    pub user_org_id: String,
    pub target_org_id: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// The audit/metrics sink (§6.3).
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log_cross_tenant_read(&self, event: CrossTenantRead);
}
