//! Memory service (C6) — the hard subsystem. Operates on a single tenant
//! context per call: dedup-aware writes, hybrid recall, the read-only
//! free-form query path, and context assembly for an agent task.

mod recall;
mod row;
mod types;

pub use types::{
    ContextDepth, ContextItem, MemoryItem, RecallFilters, RecallParams, RememberInput,
    RememberOutcome, RerankOptions,
};

use crate::collaborators::{IndexMemoryRequest, NodeWrite, Row, VectorSearchClient};
use crate::error::ApiError;
use crate::tenant::{TenantContext, TenantRouter};
use crate::worker::WorkerPool;
use engram_core::query::CompareOp;
use engram_core::{SchemaRegistry, Value, MAX_DATE, QB};
use std::sync::Arc;
use tracing::warn;
use ulid::Ulid;

/// The memory service: dedup, insert, merged hybrid recall, access
/// tracking, context assembly, invalidation-aware ranking (§4.6).
pub struct MemoryService {
    schema: Arc<SchemaRegistry>,
    router: Arc<TenantRouter>,
    vector: Arc<dyn VectorSearchClient>,
    workers: Arc<WorkerPool>,
}

impl MemoryService {
    pub fn new(
        schema: Arc<SchemaRegistry>,
        router: Arc<TenantRouter>,
        vector: Arc<dyn VectorSearchClient>,
        workers: Arc<WorkerPool>,
    ) -> Self {
        Self {
            schema,
            router,
            vector,
            workers,
        }
    }

    /// `remember(input, ctx)`, §4.6.1.
    pub async fn remember(
        &self,
        input: RememberInput,
        ctx: &TenantContext,
    ) -> Result<RememberOutcome, ApiError> {
        let now = engram_core::now();
        let content_hash = row::sha256_hex(&input.content);

        // Step 2: currentness-scoped dedup lookup.
        let dedup = QB::new("Memory")
            .where_eq("content_hash", content_hash.clone())
            .where_cmp("vt_end", CompareOp::Gt, Value::Timestamp(now))
            .where_current()
            .first();
        let rows = self
            .router
            .query(ctx, &dedup.render(), dedup.params.values())
            .await?;
        if let Some(existing) = rows.into_iter().next() {
            let id = row::row_get_str(&existing, "id").unwrap_or_default();
            return Ok(RememberOutcome {
                id,
                stored: false,
                duplicate: true,
            });
        }

        // Step 3: allocate and write.
        let id = Ulid::new().to_string();
        let memory_type = input.memory_type.clone().unwrap_or_else(|| "context".to_string());
        let tags = input.tags.clone().unwrap_or_default();
        let created_at = chrono::Utc::now().to_rfc3339();

        let fields = serde_json::json!({
            "content": input.content,
            "content_hash": content_hash,
            "memory_type": memory_type,
            "tags": tags,
            "project": input.project,
            "created_at": created_at,
            "access_count": 0,
            "decay_score": 1.0,
            "pinned": false,
        });

        let write = NodeWrite {
            label: "Memory".to_string(),
            id: id.clone(),
            org_id: ctx.org_id.clone(),
            vt_start: now,
            vt_end: MAX_DATE,
            tt_start: now,
            tt_end: MAX_DATE,
            fields,
        };
        self.router.insert_node(ctx, write).await?;

        // Step 4: fire-and-forget vector indexing; failures are logged, not surfaced.
        let vector = self.vector.clone();
        let index_request = IndexMemoryRequest {
            id: id.clone(),
            content: input.content,
            memory_type,
            tags,
            project: input.project,
            org_id: ctx.org_id.clone(),
        };
        self.workers.enqueue("index_memory", async move {
            if let Err(e) = vector.index_memory(index_request).await {
                warn!(error = %e, "vector indexing failed after remember, continuing without it");
            }
        });

        Ok(RememberOutcome {
            id,
            stored: true,
            duplicate: false,
        })
    }

    /// `recall(query, limit, filters, rerankOpts, ctx)`, §4.6.2.
    pub async fn recall(
        &self,
        params: RecallParams,
        ctx: &TenantContext,
    ) -> Result<Vec<MemoryItem>, ApiError> {
        recall::run(self, params, ctx).await
    }

    /// `query(expression, params?, ctx)` — read-only free-form, §4.6.3.
    pub async fn query(
        &self,
        expression: &str,
        params: Vec<Value>,
        ctx: &TenantContext,
    ) -> Result<Vec<Row>, ApiError> {
        engram_core::validate_read_only(expression, &self.schema)?;
        let rows = self.router.query(ctx, expression, &params).await?;
        Ok(rows)
    }

    /// `getContext(task, files?, depth, ctx)`, §4.6.4.
    pub async fn get_context(
        &self,
        task: &str,
        _files: Option<Vec<String>>,
        depth: ContextDepth,
        ctx: &TenantContext,
    ) -> Result<Vec<ContextItem>, ApiError> {
        let depth_n = depth.as_u32();
        let decision_limit = ((depth_n as f64) / 2.0).ceil() as u32;

        let main = self
            .recall(
                RecallParams {
                    query: task.to_string(),
                    limit: depth_n,
                    filters: RecallFilters::default(),
                    rerank: RerankOptions::default(),
                },
                ctx,
            )
            .await?;
        let decisions = self
            .recall(
                RecallParams {
                    query: format!("decisions about {task}"),
                    limit: decision_limit.max(1),
                    filters: RecallFilters {
                        memory_type: Some("decision".to_string()),
                        ..RecallFilters::default()
                    },
                    rerank: RerankOptions::default(),
                },
                ctx,
            )
            .await?;

        let mut items: Vec<ContextItem> = Vec::with_capacity(main.len() + decisions.len());
        items.extend(main.into_iter().map(|m| ContextItem {
            item_type: m.memory_type,
            content: m.content,
            relevance: m.weighted_score,
            source: "recall",
        }));
        items.extend(decisions.into_iter().map(|m| ContextItem {
            item_type: m.memory_type,
            content: m.content,
            relevance: m.weighted_score,
            source: "decisions",
        }));

        items.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        items.truncate((2 * depth_n) as usize);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::graph_sqlite::SqliteGraphBackend;
    use crate::collaborators::{CollaboratorError as CErr, IndexMemoryRequest as IMR, Result as CResult, VectorHit, VectorSearchRequest};
    use async_trait::async_trait;

    struct NoopVector;

    #[async_trait]
    impl VectorSearchClient for NoopVector {
        async fn search(&self, _request: VectorSearchRequest) -> CResult<Vec<VectorHit>> {
            Err(CErr::VectorSearch("no vector backend in this test".to_string()))
        }
        async fn index_memory(&self, _request: IMR) -> CResult<()> {
            Ok(())
        }
    }

    fn ctx() -> TenantContext {
        TenantContext {
            org_id: "org_acme".to_string(),
            org_slug: "acme".to_string(),
            user_id: Some("user_1".to_string()),
            scopes: vec!["memory:write".to_string(), "memory:read".to_string()],
        }
    }

    async fn service(dir: &tempfile::TempDir) -> MemoryService {
        let backend = Arc::new(SqliteGraphBackend::new(dir.path().to_path_buf()));
        let router = Arc::new(TenantRouter::new(backend));
        let schema = Arc::new(engram_core::schema::catalogue::build().unwrap());
        let workers = Arc::new(WorkerPool::spawn(64, 2));
        MemoryService::new(schema, router, Arc::new(NoopVector), workers)
    }

    #[tokio::test]
    async fn remember_then_remember_again_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir).await;
        let ctx = ctx();
        let input = RememberInput {
            content: "Chose Postgres over MySQL".to_string(),
            memory_type: Some("decision".to_string()),
            tags: None,
            project: None,
        };
        let first = svc.remember(input.clone(), &ctx).await.unwrap();
        assert!(first.stored);
        assert!(!first.duplicate);

        let second = svc.remember(input, &ctx).await.unwrap();
        assert!(!second.stored);
        assert!(second.duplicate);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn recall_falls_back_to_keyword_search_on_vector_failure() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir).await;
        let ctx = ctx();
        svc.remember(
            RememberInput {
                content: "Chose Postgres over MySQL".to_string(),
                memory_type: Some("decision".to_string()),
                tags: None,
                project: None,
            },
            &ctx,
        )
        .await
        .unwrap();

        let results = svc
            .recall(
                RecallParams {
                    query: "Postgres".to_string(),
                    limit: 5,
                    filters: RecallFilters::default(),
                    rerank: RerankOptions::default(),
                },
                &ctx,
            )
            .await
            .unwrap();
        assert!(results.iter().any(|m| m.content.contains("Postgres")));
    }

    #[tokio::test]
    async fn query_rejects_write_keyword() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir).await;
        let ctx = ctx();
        let err = svc
            .query("CREATE (m:Memory {content:'x'}) RETURN m", vec![], &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code.as_str(), "VALIDATION_ERROR");
    }

    /// S5 — invalidation chain: write `A`, supersede with `B` via a
    /// `REPLACES` edge, close `A`'s valid time. Recall must report `A` as
    /// invalidated with `replacedBy == B` (§8.5 property 17, §8.6 S5).
    #[tokio::test]
    async fn recall_reports_invalidated_memory_with_replacement() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir).await;
        let ctx = ctx();

        let a = svc
            .remember(
                RememberInput {
                    content: "Use REST for the public API".to_string(),
                    memory_type: Some("decision".to_string()),
                    tags: None,
                    project: None,
                },
                &ctx,
            )
            .await
            .unwrap();
        assert!(a.stored);

        let b = svc
            .remember(
                RememberInput {
                    content: "Use GraphQL for the public API instead".to_string(),
                    memory_type: Some("decision".to_string()),
                    tags: None,
                    project: None,
                },
                &ctx,
            )
            .await
            .unwrap();
        assert!(b.stored);
        assert_ne!(a.id, b.id);

        let now = engram_core::now();
        svc.router
            .insert_edge(
                &ctx,
                crate::collaborators::EdgeWrite {
                    edge_type: "REPLACES".to_string(),
                    id: ulid::Ulid::new().to_string(),
                    from_id: b.id.clone(),
                    to_id: a.id.clone(),
                    org_id: ctx.org_id.clone(),
                    vt_start: now,
                    vt_end: MAX_DATE,
                    tt_start: now,
                    tt_end: MAX_DATE,
                    properties: serde_json::json!({}),
                },
            )
            .await
            .unwrap();
        svc.router
            .close_valid_time(&ctx, "Memory", &a.id, now)
            .await
            .unwrap();

        // Pin vt_end_after to before A's closing instant: by default recall
        // only surfaces rows still valid after `now`, so an invalidated
        // memory needs an explicit, earlier floor to remain visible here.
        let results = svc
            .recall(
                RecallParams {
                    query: "REST".to_string(),
                    limit: 5,
                    filters: RecallFilters {
                        vt_end_after: Some(0),
                        ..RecallFilters::default()
                    },
                    rerank: RerankOptions::default(),
                },
                &ctx,
            )
            .await
            .unwrap();

        let found = results.iter().find(|m| m.id == a.id);
        assert!(found.is_some(), "invalidated memory A should still be returned");
        let found = found.unwrap();
        assert!(found.invalidated);
        assert_eq!(found.replaced_by.as_deref(), Some(b.id.as_str()));
    }
}
