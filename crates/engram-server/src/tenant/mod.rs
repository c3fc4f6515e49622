//! Tenant router (C5): resolves a request's tenant context into a physical
//! graph namespace, lazily provisioning it on first use.

use crate::collaborators::{CollaboratorError, EdgeWrite, GraphBackend, NamespaceHandle, NodeWrite};
use engram_core::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// `(org_id, org_slug, user_id?, scopes)` — identifies the tenant a
/// request acts on behalf of.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub org_id: String,
    pub org_slug: String,
    pub user_id: Option<String>,
    pub scopes: Vec<String>,
}

impl TenantContext {
    /// The physical namespace name every tenant's graph lives under.
    pub fn namespace_name(&self) -> String {
        format!("engram_{}_{}", self.org_slug, self.org_id)
    }
}

/// Single-flight namespace provisioning: concurrent callers for the same
/// key share one in-flight `ensure_namespace` call; losers await the
/// winner (§4.5).
struct Slot {
    cell: OnceCell<NamespaceHandle>,
}

pub struct TenantRouter {
    backend: Arc<dyn GraphBackend>,
    slots: Mutex<HashMap<String, Arc<Slot>>>,
}

impl TenantRouter {
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self {
            backend,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a handle on `ctx`'s physical graph namespace, provisioning
    /// it if this is the first access. At most one `ensure_namespace` call
    /// reaches the backend per namespace name even under concurrent
    /// callers.
    pub async fn graph_for(
        &self,
        ctx: &TenantContext,
    ) -> Result<NamespaceHandle, CollaboratorError> {
        let name = ctx.namespace_name();
        let slot = {
            let mut slots = self.slots.lock().await;
            slots
                .entry(name.clone())
                .or_insert_with(|| {
                    Arc::new(Slot {
                        cell: OnceCell::new(),
                    })
                })
                .clone()
        };
        slot.cell
            .get_or_try_init(|| async { self.backend.ensure_namespace(&name).await })
            .await
            .map(|handle| handle.clone())
    }

    /// Runs a pre-built expression against the tenant graph.
    pub async fn query(
        &self,
        ctx: &TenantContext,
        expression: &str,
        params: &[Value],
    ) -> Result<Vec<crate::collaborators::Row>, CollaboratorError> {
        let handle = self.graph_for(ctx).await?;
        self.backend.query(&handle, expression, params).await
    }

    /// Used only by explicit admin operations that opt out of tenant
    /// scoping. No operation in the memory service (C6) may call this —
    /// every such use must pass through the audit sink.
    pub fn default_graph(&self) -> NamespaceHandle {
        NamespaceHandle {
            name: "engram_default".to_string(),
        }
    }

    /// Inserts one new node row into `ctx`'s namespace (§3.1 invariant 5:
    /// every write is a new row, never an in-place mutation).
    pub async fn insert_node(
        &self,
        ctx: &TenantContext,
        write: NodeWrite,
    ) -> Result<(), CollaboratorError> {
        let handle = self.graph_for(ctx).await?;
        self.backend.insert_node(&handle, write).await
    }

    /// Inserts one new edge row into `ctx`'s namespace.
    pub async fn insert_edge(
        &self,
        ctx: &TenantContext,
        write: EdgeWrite,
    ) -> Result<(), CollaboratorError> {
        let handle = self.graph_for(ctx).await?;
        self.backend.insert_edge(&handle, write).await
    }

    /// Closes the valid-time interval of `label`'s currently-valid row for
    /// `id` at `at` (soft-delete, §3.1 invariant 4).
    pub async fn close_valid_time(
        &self,
        ctx: &TenantContext,
        label: &str,
        id: &str,
        at: i64,
    ) -> Result<(), CollaboratorError> {
        let handle = self.graph_for(ctx).await?;
        self.backend.close_valid_time(&handle, label, id, at).await
    }

    /// Closes the transaction-time interval of `label`'s currently-recorded
    /// row for `id` at `at` (§3.1 invariant 5, versioning).
    pub async fn close_transaction_time(
        &self,
        ctx: &TenantContext,
        label: &str,
        id: &str,
        at: i64,
    ) -> Result<(), CollaboratorError> {
        let handle = self.graph_for(ctx).await?;
        self.backend
            .close_transaction_time(&handle, label, id, at)
            .await
    }

    /// Fire-and-forget access-tracking bookkeeping (§4.6.2 step 9).
    pub async fn record_memory_access(
        &self,
        ctx: &TenantContext,
        id: &str,
        now: i64,
    ) -> Result<(), CollaboratorError> {
        let handle = self.graph_for(ctx).await?;
        self.backend.record_memory_access(&handle, id, now).await
    }

    /// Reads `{decay_score, pinned}` for the given ids (§4.6.2 step 5).
    pub async fn read_decay(
        &self,
        ctx: &TenantContext,
        ids: &[String],
    ) -> Result<BTreeMap<String, (f64, bool)>, CollaboratorError> {
        let handle = self.graph_for(ctx).await?;
        self.backend.read_decay(&handle, ids).await
    }

    /// Follows the `REPLACES` chain for an invalidated memory (§4.6.2 step 6).
    pub async fn find_replacement(
        &self,
        ctx: &TenantContext,
        old_id: &str,
    ) -> Result<Option<String>, CollaboratorError> {
        let handle = self.graph_for(ctx).await?;
        self.backend.find_replacement(&handle, old_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Row;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GraphBackend for CountingBackend {
        async fn query(
            &self,
            _namespace: &NamespaceHandle,
            _expression: &str,
            _params: &[Value],
        ) -> Result<Vec<Row>, CollaboratorError> {
            Ok(vec![])
        }

        async fn ensure_namespace(&self, name: &str) -> Result<NamespaceHandle, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(NamespaceHandle {
                name: name.to_string(),
            })
        }

        async fn insert_node(
            &self,
            _namespace: &NamespaceHandle,
            _write: crate::collaborators::NodeWrite,
        ) -> Result<(), CollaboratorError> {
            Ok(())
        }

        async fn insert_edge(
            &self,
            _namespace: &NamespaceHandle,
            _write: crate::collaborators::EdgeWrite,
        ) -> Result<(), CollaboratorError> {
            Ok(())
        }

        async fn close_valid_time(
            &self,
            _namespace: &NamespaceHandle,
            _label: &str,
            _id: &str,
            _at: i64,
        ) -> Result<(), CollaboratorError> {
            Ok(())
        }

        async fn close_transaction_time(
            &self,
            _namespace: &NamespaceHandle,
            _label: &str,
            _id: &str,
            _at: i64,
        ) -> Result<(), CollaboratorError> {
            Ok(())
        }

        async fn record_memory_access(
            &self,
            _namespace: &NamespaceHandle,
            _id: &str,
            _now: i64,
        ) -> Result<(), CollaboratorError> {
            Ok(())
        }

        async fn read_decay(
            &self,
            _namespace: &NamespaceHandle,
            _ids: &[String],
        ) -> Result<BTreeMap<String, (f64, bool)>, CollaboratorError> {
            Ok(BTreeMap::new())
        }

        async fn find_replacement(
            &self,
            _namespace: &NamespaceHandle,
            _old_id: &str,
        ) -> Result<Option<String>, CollaboratorError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn concurrent_callers_provision_exactly_once() {
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
        });
        let router = Arc::new(TenantRouter::new(backend.clone()));
        let ctx = TenantContext {
            org_id: "1".to_string(),
            org_slug: "acme".to_string(),
            user_id: None,
            scopes: vec![],
        };

        let mut handles = Vec::new();
        for _ in 0..8 {
            let router = router.clone();
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move { router.graph_for(&ctx).await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn namespace_name_follows_convention() {
        let ctx = TenantContext {
            org_id: "42".to_string(),
            org_slug: "acme".to_string(),
            user_id: None,
            scopes: vec![],
        };
        assert_eq!(ctx.namespace_name(), "engram_acme_42");
    }
}
