//! Auth (C7) + rate-limit (C8) middleware, run in that order for every
//! request to `/v1/memory/*` (§2 control flow: handler → C7 → C8 → C6).

use super::{AppState, RequestContext};
use crate::auth;
use crate::error::ApiError;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

/// Runs auth first; a failure here has no observable side effect, per §7 —
/// in particular the rate limiter is never touched. On success, checks the
/// sliding window for `auth.id` and stamps the §4.8 headers onto whatever
/// response the handler chain produces.
pub async fn auth_and_rate_limit(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let route = req.uri().path().to_string();
    let request_id = uuid::Uuid::new_v4().to_string();

    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth_ctx = match auth::authenticate(header, &state.token_store).await {
        Ok(ctx) => ctx,
        Err(err) => return err.into_response(),
    };

    let span = tracing::info_span!(
        "request",
        org_id = %auth_ctx.org_id,
        request_id = %request_id,
        route = %route,
    );

    async move {
        let limit = if auth_ctx.rate_limit > 0 {
            auth_ctx.rate_limit
        } else {
            state.rate_limit_default
        };
        let key = format!("ratelimit:{}", auth_ctx.id);
        let decision = state.rate_limiter.check(&key, limit);

        if !decision.allowed {
            let retry_after = decision.retry_after.unwrap_or(60);
            let err = ApiError::rate_limited("rate limit exceeded").with_details(serde_json::json!({
                "limit": decision.limit,
                "reset": decision.reset,
                "retryAfter": retry_after,
            }));
            let mut response = err.into_response();
            apply_rate_limit_headers(response.headers_mut(), &decision);
            return response;
        }

        req.extensions_mut().insert(RequestContext { auth: auth_ctx });

        let mut response = next.run(req).await;
        apply_rate_limit_headers(response.headers_mut(), &decision);
        response
    }
    .instrument(span)
    .await
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &crate::ratelimit::RateLimitDecision) {
    headers.insert(
        "x-ratelimit-limit",
        HeaderValue::from_str(&decision.limit.to_string()).unwrap(),
    );
    headers.insert(
        "x-ratelimit-remaining",
        HeaderValue::from_str(&decision.remaining.to_string()).unwrap(),
    );
    headers.insert(
        "x-ratelimit-reset",
        HeaderValue::from_str(&decision.reset.to_string()).unwrap(),
    );
    if let Some(retry_after) = decision.retry_after {
        headers.insert(
            "retry-after",
            HeaderValue::from_str(&retry_after.to_string()).unwrap(),
        );
    }
}
