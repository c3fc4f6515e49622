//! Reference `TokenStore` adapter: a process-wide `dashmap` keyed by
//! SHA-256 token hash. Production deployments back this trait with the
//! relational store §1 names as external; this adapter exists so the auth
//! gate (C7) and its tests have something to validate against.

use super::{Result, TokenMethod, TokenRecord, TokenStore};
use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};

fn hash_token(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

/// Minimal hex encoding so this adapter doesn't need an extra crate purely
/// for `bytes -> hex`.
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[derive(Default)]
pub struct InMemoryTokenStore {
    api_keys: DashMap<String, TokenRecord>,
    oauth_tokens: DashMap<String, TokenRecord>,
    last_used: DashMap<String, i64>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plaintext API key against the record it should resolve
    /// to. Used by the composition root (seeding) and by tests.
    pub fn insert_api_key(&self, plaintext: &str, record: TokenRecord) {
        self.api_keys.insert(hash_token(plaintext), record);
    }

    pub fn insert_oauth_token(&self, plaintext: &str, record: TokenRecord) {
        self.oauth_tokens.insert(hash_token(plaintext), record);
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn validate_api_key(&self, plaintext: &str) -> Result<Option<TokenRecord>> {
        let hash = hash_token(plaintext);
        Ok(self.api_keys.get(&hash).map(|r| {
            let mut record = r.clone();
            record.method = TokenMethod::ApiKey;
            record
        }))
    }

    async fn validate_oauth_token(&self, plaintext: &str) -> Result<Option<TokenRecord>> {
        let hash = hash_token(plaintext);
        Ok(self.oauth_tokens.get(&hash).map(|r| r.clone()))
    }

    async fn record_last_used(&self, id: &str) -> Result<()> {
        self.last_used.insert(id.to_string(), engram_core::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> TokenRecord {
        TokenRecord {
            id: "tok_1".to_string(),
            prefix: "engram_live_deadbeef0000".to_string(),
            method: TokenMethod::ApiKey,
            token_type: "api_key".to_string(),
            user_id: None,
            org_id: "org_acme".to_string(),
            org_slug: "acme".to_string(),
            scopes: vec!["memory:read".to_string(), "memory:write".to_string()],
            rate_limit: 60,
            grant_type: None,
            client_id: None,
            is_active: true,
            revoked_at: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn stores_and_resolves_by_plaintext() {
        let store = InMemoryTokenStore::new();
        store.insert_api_key("engram_live_deadbeefdeadbeefdeadbeefdeadbeef", sample_record());
        let resolved = store
            .validate_api_key("engram_live_deadbeefdeadbeefdeadbeefdeadbeef")
            .await
            .unwrap();
        assert!(resolved.is_some());
        assert_eq!(resolved.unwrap().org_id, "org_acme");
    }

    #[tokio::test]
    async fn unknown_token_resolves_to_none() {
        let store = InMemoryTokenStore::new();
        assert!(store.validate_api_key("not_a_real_token").await.unwrap().is_none());
    }
}
