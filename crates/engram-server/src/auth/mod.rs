//! Auth + scope gate (C7): bearer token validation, `AuthContext`
//! derivation, and scope enforcement.

use crate::collaborators::{TokenMethod, TokenRecord, TokenStore};
use crate::error::ApiError;
use crate::tenant::TenantContext;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static API_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^engram_(live|test)_[0-9a-f]{32}$").unwrap());
static OAUTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^egm_oauth_[A-Za-z0-9]{32}_[A-Za-z0-9]{6}$").unwrap());
static CLIENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^egm_client_[A-Za-z0-9]{32}_[A-Za-z0-9]{6}$").unwrap());

/// Recognized token shape, per §6.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenShape {
    ApiKey,
    OAuthUser,
    ClientCredentials,
}

fn classify(token: &str) -> Option<TokenShape> {
    if API_KEY_RE.is_match(token) {
        Some(TokenShape::ApiKey)
    } else if OAUTH_RE.is_match(token) {
        Some(TokenShape::OAuthUser)
    } else if CLIENT_RE.is_match(token) {
        Some(TokenShape::ClientCredentials)
    } else {
        None
    }
}

/// Derived per-request identity, attached alongside a [`TenantContext`]
/// (§4.7 step 6).
#[derive(Debug, Clone)]
pub struct AuthContext {
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
}

impl From<TokenRecord> for AuthContext {
    fn from(record: TokenRecord) -> Self {
        Self {
            id: record.id,
            prefix: record.prefix,
            method: record.method,
            token_type: record.token_type,
            user_id: record.user_id,
            org_id: record.org_id,
            org_slug: record.org_slug,
            scopes: record.scopes,
            rate_limit: record.rate_limit,
            grant_type: record.grant_type,
            client_id: record.client_id,
        }
    }
}

impl AuthContext {
    pub fn tenant_context(&self) -> TenantContext {
        TenantContext {
            org_id: self.org_id.clone(),
            org_slug: self.org_slug.clone(),
            user_id: self.user_id.clone(),
            scopes: self.scopes.clone(),
        }
    }

    /// AND semantics: every scope in `required` must be granted.
    pub fn require_scopes(&self, required: &[&str]) -> Result<(), ApiError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|s| !self.scopes.iter().any(|g| g == *s))
            .map(|s| s.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::forbidden("missing required scope(s)").with_details(serde_json::json!({
                "required": required,
                "missing": missing,
                "granted": self.scopes,
            })))
        }
    }

    /// OR semantics: at least one scope in `set` must be granted. Does not
    /// emit `missing` on failure (§4.7 step 7).
    pub fn require_any_scope(&self, set: &[&str]) -> Result<(), ApiError> {
        if set.iter().any(|s| self.scopes.iter().any(|g| g == s)) {
            Ok(())
        } else {
            Err(ApiError::forbidden("none of the required scopes are granted")
                .with_details(serde_json::json!({"required_any": set, "granted": self.scopes})))
        }
    }
}

fn is_expired_or_disqualified(record: &TokenRecord) -> bool {
    if !record.is_active || record.revoked_at.is_some() {
        return true;
    }
    match record.expires_at {
        Some(expires_at) => expires_at < engram_core::now(),
        None => false,
    }
}

/// Runs the full §4.7 algorithm against a raw `Authorization` header value
/// (or its absence). Fires-and-forgets `record_last_used` on success.
pub async fn authenticate(
    authorization_header: Option<&str>,
    token_store: &Arc<dyn TokenStore>,
) -> Result<AuthContext, ApiError> {
    let header = authorization_header
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            ApiError::unauthorized("Invalid Authorization header format, expected 'Bearer <token>'")
        })?;

    let shape = classify(token)
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired Authorization token"))?;

    let record = match shape {
        TokenShape::ApiKey => token_store
            .validate_api_key(token)
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?,
        TokenShape::OAuthUser | TokenShape::ClientCredentials => token_store
            .validate_oauth_token(token)
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?,
    };

    let record = record.ok_or_else(|| ApiError::unauthorized("Invalid or expired Authorization token"))?;

    if is_expired_or_disqualified(&record) {
        return Err(ApiError::unauthorized("Invalid or expired Authorization token"));
    }

    let token_store = token_store.clone();
    let record_id = record.id.clone();
    tokio::spawn(async move {
        let _ = token_store.record_last_used(&record_id).await;
    });

    Ok(AuthContext::from(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::token_store::InMemoryTokenStore;

    fn record(org_id: &str, scopes: Vec<&str>) -> TokenRecord {
        TokenRecord {
            id: "tok_1".to_string(),
            prefix: "engram_live_deadbeef0000".to_string(),
            method: TokenMethod::ApiKey,
            token_type: "api_key".to_string(),
            user_id: None,
            org_id: org_id.to_string(),
            org_slug: "acme".to_string(),
            scopes: scopes.into_iter().map(String::from).collect(),
            rate_limit: 60,
            grant_type: None,
            client_id: None,
            is_active: true,
            revoked_at: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized_not_500() {
        let store: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
        let err = authenticate(None, &store).await.unwrap_err();
        assert_eq!(err.code.as_str(), "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn non_bearer_prefix_is_unauthorized() {
        let store: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
        let err = authenticate(Some("Token abc"), &store).await.unwrap_err();
        assert_eq!(err.code.as_str(), "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn valid_api_key_resolves_auth_context() {
        let store = InMemoryTokenStore::new();
        let plaintext = "engram_live_deadbeefdeadbeefdeadbeefdeadbeef";
        store.insert_api_key(plaintext, record("org_acme", vec!["memory:read"]));
        let store: Arc<dyn TokenStore> = Arc::new(store);
        let ctx = authenticate(Some(&format!("Bearer {plaintext}")), &store)
            .await
            .unwrap();
        assert_eq!(ctx.org_id, "org_acme");
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let store = InMemoryTokenStore::new();
        let plaintext = "engram_live_deadbeefdeadbeefdeadbeefdeadbeef";
        let mut rec = record("org_acme", vec!["memory:read"]);
        rec.revoked_at = Some(1);
        store.insert_api_key(plaintext, rec);
        let store: Arc<dyn TokenStore> = Arc::new(store);
        let err = authenticate(Some(&format!("Bearer {plaintext}")), &store)
            .await
            .unwrap_err();
        assert_eq!(err.code.as_str(), "UNAUTHORIZED");
    }

    #[test]
    fn require_scopes_and_semantics() {
        let ctx = AuthContext::from(record("org_acme", vec!["memory:read"]));
        assert!(ctx.require_scopes(&["memory:read"]).is_ok());
        let err = ctx.require_scopes(&["memory:read", "memory:write"]).unwrap_err();
        assert_eq!(err.code.as_str(), "FORBIDDEN");
    }

    #[test]
    fn require_any_scope_or_semantics_has_no_missing_field() {
        let ctx = AuthContext::from(record("org_acme", vec!["memory:read"]));
        assert!(ctx.require_any_scope(&["memory:read", "memory:write"]).is_ok());
        let err = ctx.require_any_scope(&["admin:read"]).unwrap_err();
        let details = err.details.unwrap();
        assert!(details.get("missing").is_none());
    }
}
