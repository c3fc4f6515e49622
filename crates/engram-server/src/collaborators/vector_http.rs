//! Reference `VectorSearchClient` adapter over `reqwest`, implementing the
//! `search`/`indexMemory` contract of §6.3 against an HTTP vector search
//! service. A development/test stand-in — the embedding and reranker
//! models themselves stay external per §1.

use super::{
    CollaboratorError, IndexMemoryRequest, Result, VectorHit, VectorSearchClient,
    VectorSearchRequest,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub struct HttpVectorSearchClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpVectorSearchClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct SearchResponsePayload {
    results: Vec<SearchHitPayload>,
    #[allow(dead_code)]
    took_ms: u64,
}

#[derive(Deserialize)]
struct SearchHitPayload {
    payload: HitFields,
    score: f64,
    #[allow(dead_code)]
    reranker_score: Option<f64>,
}

#[derive(Deserialize)]
struct HitFields {
    node_id: String,
    content: String,
    #[serde(rename = "type")]
    memory_type: String,
    #[serde(default)]
    tags: Vec<String>,
    timestamp: i64,
    vt_end: i64,
}

#[async_trait]
impl VectorSearchClient for HttpVectorSearchClient {
    async fn search(&self, request: VectorSearchRequest) -> Result<Vec<VectorHit>> {
        let body = serde_json::json!({
            "text": request.text,
            "limit": request.limit,
            "threshold": request.threshold,
            "strategy": request.strategy,
            "rerank": request.rerank,
            "rerank_tier": request.rerank_tier.as_str(),
            "collection": request.collection,
            "filters": {
                "project": request.filters.project,
                "org_id": request.filters.org_id,
                "vt_end_after": request.filters.vt_end_after,
                "time_range": request.filters.time_range.map(|(start, end)| {
                    serde_json::json!({"start": start, "end": end})
                }),
            },
        });

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| CollaboratorError::VectorSearch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CollaboratorError::VectorSearch(format!(
                "search returned status {}",
                response.status()
            )));
        }

        let parsed: SearchResponsePayload = response
            .json()
            .await
            .map_err(|e| CollaboratorError::VectorSearch(format!("decode response: {e}")))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|hit| VectorHit {
                node_id: hit.payload.node_id,
                content: hit.payload.content,
                memory_type: hit.payload.memory_type,
                tags: hit.payload.tags,
                timestamp: hit.payload.timestamp,
                vt_end: hit.payload.vt_end,
                score: hit.score,
            })
            .collect())
    }

    async fn index_memory(&self, request: IndexMemoryRequest) -> Result<()> {
        let body = serde_json::json!({
            "id": request.id,
            "content": request.content,
            "type": request.memory_type,
            "tags": request.tags,
            "project": request.project,
            "orgId": request.org_id,
        });

        let response = self
            .client
            .post(format!("{}/index", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| CollaboratorError::VectorSearch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CollaboratorError::VectorSearch(format!(
                "indexMemory returned status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
