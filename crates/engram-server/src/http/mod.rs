//! Core HTTP surface (C9): `/v1/memory/*`, request validation, the
//! `{success, data|error}` envelope, and the auth + rate-limit middleware
//! chain that fronts every route.

mod handlers;
mod middleware;

use crate::auth::AuthContext;
use crate::collaborators::{AuditSink, TokenStore};
use crate::memory::MemoryService;
use crate::ratelimit::RateLimiter;
use axum::routing::post;
use axum::Router;
use std::sync::Arc;

/// Everything a handler needs, shared across every request.
#[derive(Clone)]
pub struct AppState {
    pub memory: Arc<MemoryService>,
    pub token_store: Arc<dyn TokenStore>,
    pub audit: Arc<dyn AuditSink>,
    pub rate_limiter: Arc<RateLimiter>,
    pub rate_limit_default: u32,
}

/// Request-scoped identity attached by the auth middleware (§4.7 step 6).
#[derive(Clone)]
pub struct RequestContext {
    pub auth: AuthContext,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/memory/remember", post(handlers::remember))
        .route("/v1/memory/recall", post(handlers::recall))
        .route("/v1/memory/query", post(handlers::query))
        .route("/v1/memory/context", post(handlers::context))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_and_rate_limit,
        ))
        .with_state(state)
}
