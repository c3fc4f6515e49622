//! The four `/v1/memory/*` handlers (§6.2). Each validates its body
//! against a declarative shape before entering the memory service, then
//! renders the service's result as the `{success:true, data}` envelope
//! (§4.9).

use super::{AppState, RequestContext};
use crate::error::{ApiError, Result as ApiResult};
use crate::memory::{
    ContextDepth, MemoryItem, RecallFilters, RecallParams, RememberInput, RerankOptions,
};
use axum::extract::{Extension, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use engram_core::Value as QueryValue;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json_;

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    data: T,
}

fn ok<T: Serialize>(data: T) -> Response {
    (axum::http::StatusCode::OK, Json(Envelope { success: true, data })).into_response()
}

fn created<T: Serialize>(data: T) -> Response {
    (
        axum::http::StatusCode::CREATED,
        Json(Envelope { success: true, data }),
    )
        .into_response()
}

fn bounded_len(field: &str, value: &str, min: usize, max: usize) -> ApiResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiError::validation(format!(
            "{field} must be between {min} and {max} characters"
        ))
        .with_details(serde_json::json!({"field": field, "min": min, "max": max, "actual": len})));
    }
    Ok(())
}

/// Parses an ISO-8601 timestamp into epoch milliseconds, as the HTTP layer
/// promises the memory service it will (§4.6's `RecallFilters` doc comment).
fn parse_iso(field: &str, value: &str) -> ApiResult<i64> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| {
            ApiError::validation(format!("{field} must be an ISO-8601 timestamp: {e}"))
        })
}

// ---------------------------------------------------------------- remember

#[derive(Deserialize)]
pub struct RememberRequest {
    content: String,
    #[serde(rename = "type")]
    memory_type: Option<String>,
    tags: Option<Vec<String>>,
    project: Option<String>,
}

const REMEMBER_TYPES: &[&str] = &["decision", "context", "insight", "preference", "fact"];

#[derive(Serialize)]
struct RememberResponse {
    id: String,
    stored: bool,
    duplicate: bool,
}

pub async fn remember(
    State(state): State<AppState>,
    Extension(req_ctx): Extension<RequestContext>,
    Json(body): Json<RememberRequest>,
) -> Response {
    match remember_inner(state, req_ctx, body).await {
        Ok(resp) => created(resp),
        Err(err) => err.into_response(),
    }
}

async fn remember_inner(
    state: AppState,
    req_ctx: RequestContext,
    body: RememberRequest,
) -> ApiResult<RememberResponse> {
    req_ctx.auth.require_scopes(&["memory:write"])?;
    bounded_len("content", &body.content, 1, 50_000)?;
    if let Some(t) = &body.memory_type {
        if !REMEMBER_TYPES.contains(&t.as_str()) {
            return Err(ApiError::validation(format!("unknown memory type: {t}")).with_details(
                serde_json::json!({"field": "type", "allowed": REMEMBER_TYPES}),
            ));
        }
    }

    let tenant = req_ctx.auth.tenant_context();
    let outcome = state
        .memory
        .remember(
            RememberInput {
                content: body.content,
                memory_type: body.memory_type,
                tags: body.tags,
                project: body.project,
            },
            &tenant,
        )
        .await?;

    Ok(RememberResponse {
        id: outcome.id,
        stored: outcome.stored,
        duplicate: outcome.duplicate,
    })
}

// ------------------------------------------------------------------ recall

#[derive(Deserialize, Default)]
pub struct RecallFiltersBody {
    #[serde(rename = "type")]
    memory_type: Option<String>,
    project: Option<String>,
    after: Option<String>,
    before: Option<String>,
    #[serde(rename = "vtEndAfter")]
    vt_end_after: Option<i64>,
}

fn default_limit() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_tier() -> String {
    "fast".to_string()
}

#[derive(Deserialize)]
pub struct RecallRequest {
    query: String,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    filters: RecallFiltersBody,
    #[serde(default = "default_true")]
    rerank: bool,
    #[serde(default = "default_tier", rename = "rerank_tier")]
    rerank_tier: String,
}

#[derive(Serialize)]
struct RecallMemoryResponse {
    id: String,
    content: String,
    #[serde(rename = "type")]
    memory_type: String,
    tags: Vec<String>,
    score: f64,
    #[serde(rename = "decayScore")]
    decay_score: f64,
    #[serde(rename = "weightedScore")]
    weighted_score: f64,
    #[serde(rename = "createdAt")]
    created_at: String,
    invalidated: bool,
    #[serde(rename = "invalidatedAt", skip_serializing_if = "Option::is_none")]
    invalidated_at: Option<i64>,
    #[serde(rename = "replacedBy", skip_serializing_if = "Option::is_none")]
    replaced_by: Option<String>,
}

impl From<MemoryItem> for RecallMemoryResponse {
    fn from(m: MemoryItem) -> Self {
        Self {
            id: m.id,
            content: m.content,
            memory_type: m.memory_type,
            tags: m.tags,
            score: m.score,
            decay_score: m.decay_score,
            weighted_score: m.weighted_score,
            created_at: m.created_at,
            invalidated: m.invalidated,
            invalidated_at: m.invalidated_at,
            replaced_by: m.replaced_by,
        }
    }
}

#[derive(Serialize)]
struct RecallResponse {
    memories: Vec<RecallMemoryResponse>,
}

fn parse_rerank_tier(tier: &str) -> ApiResult<crate::collaborators::RerankTier> {
    use crate::collaborators::RerankTier;
    match tier {
        "fast" => Ok(RerankTier::Fast),
        "accurate" => Ok(RerankTier::Accurate),
        "code" => Ok(RerankTier::Code),
        "llm" => Ok(RerankTier::Llm),
        other => Err(ApiError::validation(format!("unknown rerank_tier: {other}"))
            .with_details(serde_json::json!({"field": "rerank_tier"}))),
    }
}

pub async fn recall(
    State(state): State<AppState>,
    Extension(req_ctx): Extension<RequestContext>,
    Json(body): Json<RecallRequest>,
) -> Response {
    match recall_inner(state, req_ctx, body).await {
        Ok(resp) => ok(resp),
        Err(err) => err.into_response(),
    }
}

async fn recall_inner(
    state: AppState,
    req_ctx: RequestContext,
    body: RecallRequest,
) -> ApiResult<RecallResponse> {
    req_ctx.auth.require_scopes(&["memory:read"])?;
    bounded_len("query", &body.query, 1, 1000)?;
    if body.limit < 1 || body.limit > 20 {
        return Err(ApiError::validation("limit must be between 1 and 20")
            .with_details(serde_json::json!({"field": "limit", "min": 1, "max": 20})));
    }
    let tier = parse_rerank_tier(&body.rerank_tier)?;

    let after = body
        .filters
        .after
        .as_deref()
        .map(|s| parse_iso("filters.after", s))
        .transpose()?;
    let before = body
        .filters
        .before
        .as_deref()
        .map(|s| parse_iso("filters.before", s))
        .transpose()?;

    let tenant = req_ctx.auth.tenant_context();
    let items = state
        .memory
        .recall(
            RecallParams {
                query: body.query,
                limit: body.limit,
                filters: RecallFilters {
                    memory_type: body.filters.memory_type,
                    project: body.filters.project,
                    after,
                    before,
                    vt_end_after: body.filters.vt_end_after,
                },
                rerank: RerankOptions {
                    rerank: body.rerank,
                    tier,
                },
            },
            &tenant,
        )
        .await?;

    Ok(RecallResponse {
        memories: items.into_iter().map(RecallMemoryResponse::from).collect(),
    })
}

// ------------------------------------------------------------------- query

#[derive(Deserialize)]
pub struct QueryRequest {
    cypher: String,
    #[serde(default)]
    params: Option<serde_json::Map<String, Json_>>,
}

#[derive(Serialize)]
struct QueryResponse {
    results: Vec<crate::collaborators::Row>,
}

fn json_to_query_value(field: &str, value: &Json_) -> ApiResult<QueryValue> {
    match value {
        Json_::String(s) => Ok(QueryValue::String(s.clone())),
        Json_::Bool(b) => Ok(QueryValue::Bool(*b)),
        Json_::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(QueryValue::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(QueryValue::Float(f))
            } else {
                Err(ApiError::validation(format!("params.{field} is not a representable number")))
            }
        }
        Json_::Array(items) => {
            let strings: ApiResult<Vec<String>> = items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ApiError::validation(format!("params.{field} must be an array of strings")))
                })
                .collect();
            Ok(QueryValue::StringArray(strings?))
        }
        other => Err(ApiError::validation(format!(
            "params.{field} has an unsupported shape: {other}"
        ))),
    }
}

pub async fn query(
    State(state): State<AppState>,
    Extension(req_ctx): Extension<RequestContext>,
    Json(body): Json<QueryRequest>,
) -> Response {
    match query_inner(state, req_ctx, body).await {
        Ok(resp) => ok(resp),
        Err(err) => err.into_response(),
    }
}

async fn query_inner(
    state: AppState,
    req_ctx: RequestContext,
    body: QueryRequest,
) -> ApiResult<QueryResponse> {
    req_ctx.auth.require_scopes(&["query:read"])?;
    bounded_len("cypher", &body.cypher, 1, 5000)?;

    let mut params = Vec::new();
    if let Some(map) = body.params {
        for (key, value) in map {
            params.push(json_to_query_value(&key, &value)?);
        }
    }

    let tenant = req_ctx.auth.tenant_context();
    let rows = state.memory.query(&body.cypher, params, &tenant).await?;
    Ok(QueryResponse { results: rows })
}

// ----------------------------------------------------------------- context

#[derive(Deserialize)]
pub struct ContextRequest {
    task: String,
    files: Option<Vec<String>>,
    #[serde(default)]
    depth: Option<String>,
}

#[derive(Serialize)]
struct ContextItemResponse {
    #[serde(rename = "type")]
    item_type: String,
    content: String,
    relevance: f64,
    source: &'static str,
}

#[derive(Serialize)]
struct ContextResponse {
    context: Vec<ContextItemResponse>,
}

fn parse_depth(depth: Option<&str>) -> ApiResult<ContextDepth> {
    match depth {
        None => Ok(ContextDepth::default()),
        Some("shallow") => Ok(ContextDepth::Shallow),
        Some("medium") => Ok(ContextDepth::Medium),
        Some("deep") => Ok(ContextDepth::Deep),
        Some(other) => Err(ApiError::validation(format!("unknown depth: {other}"))
            .with_details(serde_json::json!({"field": "depth", "allowed": ["shallow", "medium", "deep"]}))),
    }
}

pub async fn context(
    State(state): State<AppState>,
    Extension(req_ctx): Extension<RequestContext>,
    Json(body): Json<ContextRequest>,
) -> Response {
    match context_inner(state, req_ctx, body).await {
        Ok(resp) => ok(resp),
        Err(err) => err.into_response(),
    }
}

async fn context_inner(
    state: AppState,
    req_ctx: RequestContext,
    body: ContextRequest,
) -> ApiResult<ContextResponse> {
    req_ctx.auth.require_scopes(&["memory:read"])?;
    bounded_len("task", &body.task, 1, 2000)?;
    let depth = parse_depth(body.depth.as_deref())?;

    let tenant = req_ctx.auth.tenant_context();
    let items = state
        .memory
        .get_context(&body.task, body.files, depth, &tenant)
        .await?;

    Ok(ContextResponse {
        context: items
            .into_iter()
            .map(|c| ContextItemResponse {
                item_type: c.item_type,
                content: c.content,
                relevance: c.relevance,
                source: c.source,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_len_rejects_empty_and_oversized() {
        assert!(bounded_len("content", "", 1, 10).is_err());
        assert!(bounded_len("content", &"x".repeat(11), 1, 10).is_err());
        assert!(bounded_len("content", "ok", 1, 10).is_ok());
    }

    #[test]
    fn parse_depth_defaults_to_medium() {
        assert_eq!(parse_depth(None).unwrap(), ContextDepth::Medium);
        assert!(parse_depth(Some("bogus")).is_err());
    }
}
