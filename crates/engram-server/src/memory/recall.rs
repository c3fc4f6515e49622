//! Hybrid recall pipeline, §4.6.2. Kept out of `mod.rs` because the merge,
//! decay, and replacement steps each want their own small helper and the
//! combination reads better as one focused file.

use super::row;
use super::types::{MemoryItem, RecallFilters, RecallParams};
use super::MemoryService;
use crate::collaborators::{VectorFilters, VectorHit, VectorSearchRequest};
use crate::error::ApiError;
use crate::tenant::TenantContext;
use engram_core::query::{CompareOp, Order};
use engram_core::{now, QB};
use tracing::warn;

/// One candidate before decay weighting and ranking are applied.
struct Candidate {
    id: String,
    content: String,
    memory_type: String,
    tags: Vec<String>,
    base_score: f64,
    created_at: String,
    invalidated: bool,
}

pub async fn run(
    svc: &MemoryService,
    params: RecallParams,
    ctx: &TenantContext,
) -> Result<Vec<MemoryItem>, ApiError> {
    let limit = params.limit.clamp(1, 20);
    let now_ms = now();

    let vt_end_after = params.filters.vt_end_after.unwrap_or(now_ms);

    let vector_hits = match fetch_vector_hits(svc, &params, ctx, vt_end_after, 2 * limit).await {
        Ok(hits) => Some(hits),
        Err(e) => {
            warn!(error = %e, "vector search failed, falling back to keyword-only recall");
            None
        }
    };

    let oversample = if vector_hits.is_some() { limit } else { 2 * limit };
    let lexical_candidates =
        fetch_lexical_candidates(svc, &params, ctx, vt_end_after, oversample).await?;

    let vector_candidates = vector_hits
        .unwrap_or_default()
        .into_iter()
        .map(|hit| Candidate {
            id: hit.node_id,
            content: hit.content,
            memory_type: hit.memory_type,
            tags: hit.tags,
            base_score: hit.score,
            created_at: row::format_timestamp_ms(hit.timestamp),
            invalidated: hit.vt_end < now_ms,
        })
        .collect::<Vec<_>>();

    let merged = merge(vector_candidates, lexical_candidates);

    let ids: Vec<String> = merged.iter().map(|c| c.id.clone()).collect();
    let decay = svc_read_decay(svc, ctx, &ids).await?;

    let mut items: Vec<MemoryItem> = Vec::with_capacity(merged.len());
    for candidate in merged {
        let (decay_score, pinned) = decay.get(&candidate.id).copied().unwrap_or((1.0, false));
        let effective_decay = if pinned { 1.0 } else { decay_score };
        let weighted_score = candidate.base_score * effective_decay;

        let replaced_by = if candidate.invalidated {
            svc.router_find_replacement(ctx, &candidate.id).await?
        } else {
            None
        };

        items.push(MemoryItem {
            id: candidate.id,
            content: candidate.content,
            memory_type: candidate.memory_type,
            tags: candidate.tags,
            score: candidate.base_score,
            decay_score: effective_decay,
            weighted_score,
            created_at: candidate.created_at,
            invalidated: candidate.invalidated,
            invalidated_at: if candidate.invalidated { Some(now_ms) } else { None },
            replaced_by,
        });
    }

    // Post-filter (step 7): the vector store does not key on memory type.
    if let Some(wanted) = &params.filters.memory_type {
        items.retain(|m| &m.memory_type == wanted);
    }

    // Stable sort preserves merge/insertion order as the tie-break (step 8).
    items.sort_by(|a, b| {
        b.weighted_score
            .partial_cmp(&a.weighted_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    items.truncate(limit as usize);

    svc.track_access(ctx, &items);

    Ok(items)
}

async fn fetch_vector_hits(
    svc: &MemoryService,
    params: &RecallParams,
    ctx: &TenantContext,
    vt_end_after: i64,
    oversampled_limit: u32,
) -> Result<Vec<VectorHit>, crate::collaborators::CollaboratorError> {
    let time_range = match (params.filters.after, params.filters.before) {
        (Some(a), Some(b)) => Some((a, b)),
        _ => None,
    };
    let request = VectorSearchRequest {
        text: params.query.clone(),
        limit: oversampled_limit,
        threshold: 0.5,
        strategy: "hybrid",
        rerank: params.rerank.rerank,
        rerank_tier: params.rerank.tier,
        collection: "memory",
        filters: VectorFilters {
            project: params.filters.project.clone(),
            org_id: ctx.org_id.clone(),
            vt_end_after,
            time_range,
        },
    };
    svc.vector.search(request).await
}

async fn fetch_lexical_candidates(
    svc: &MemoryService,
    params: &RecallParams,
    ctx: &TenantContext,
    vt_end_after: i64,
    limit: u32,
) -> Result<Vec<Candidate>, ApiError> {
    let mut builder = QB::new("Memory")
        .where_contains("content", params.query.clone())
        .where_cmp(
            "vt_end",
            CompareOp::Gt,
            engram_core::Value::Timestamp(vt_end_after),
        );
    if let Some(project) = &params.filters.project {
        builder = builder.where_eq("project", project.clone());
    }
    if let Some(memory_type) = &params.filters.memory_type {
        builder = builder.where_eq("memory_type", memory_type.clone());
    }
    if let Some(after) = params.filters.after {
        builder = builder.where_cmp(
            "created_at_ms",
            CompareOp::Gte,
            engram_core::Value::Timestamp(after),
        );
    }
    if let Some(before) = params.filters.before {
        builder = builder.where_cmp(
            "created_at_ms",
            CompareOp::Lte,
            engram_core::Value::Timestamp(before),
        );
    }
    let built = builder.order_by("vt_start", Order::Desc).limit(limit).execute();

    let rows = svc.router.query(ctx, &built.render(), built.params.values()).await?;
    let mut out = Vec::with_capacity(rows.len());
    for r in rows {
        let id = row::row_get_str(&r, "id").unwrap_or_default();
        let props = row::props(&r);
        let (content, memory_type, tags, created_at) = match &props {
            Some(p) => (
                row::prop_str(p, "content").unwrap_or_default(),
                row::prop_str(p, "memory_type").unwrap_or_else(|| "context".to_string()),
                row::prop_string_array(p, "tags"),
                row::prop_str(p, "created_at").unwrap_or_default(),
            ),
            None => (String::new(), "context".to_string(), Vec::new(), String::new()),
        };
        out.push(Candidate {
            id,
            content,
            memory_type,
            tags,
            base_score: 0.5,
            created_at,
            invalidated: false,
        });
    }
    Ok(out)
}

/// Vector hits win on id collisions; lexical fills remaining slots,
/// preserving the order each source produced its rows in (step 4).
fn merge(vector: Vec<Candidate>, lexical: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: std::collections::HashSet<String> =
        vector.iter().map(|c| c.id.clone()).collect();
    let mut merged = vector;
    for candidate in lexical {
        if seen.insert(candidate.id.clone()) {
            merged.push(candidate);
        }
    }
    merged
}

async fn svc_read_decay(
    svc: &MemoryService,
    ctx: &TenantContext,
    ids: &[String],
) -> Result<std::collections::BTreeMap<String, (f64, bool)>, ApiError> {
    if ids.is_empty() {
        return Ok(std::collections::BTreeMap::new());
    }
    Ok(svc.router.read_decay(ctx, ids).await?)
}

impl MemoryService {
    async fn router_find_replacement(
        &self,
        ctx: &TenantContext,
        old_id: &str,
    ) -> Result<Option<String>, ApiError> {
        Ok(self.router.find_replacement(ctx, old_id).await?)
    }

    /// Fire-and-forget path-expression bookkeeping (step 9): never blocks
    /// the response and never surfaces a failure to the caller.
    fn track_access(&self, ctx: &TenantContext, items: &[MemoryItem]) {
        let now_ms = now();
        for item in items {
            let router = self.router.clone();
            let ctx = ctx.clone();
            let id = item.id.clone();
            self.workers.enqueue("record_memory_access", async move {
                if let Err(e) = router.record_memory_access(&ctx, &id, now_ms).await {
                    warn!(error = %e, memory_id = %id, "access tracking failed");
                }
            });
        }
    }
}
