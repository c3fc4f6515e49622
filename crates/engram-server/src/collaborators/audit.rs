//! Reference `AuditSink` adapter: emits a structured `warn!`-level event
//! per cross-tenant admin read. The admin surface itself stays out of
//! scope (§9 open question), but every such read — including from the
//! `defaultGraph()` escape hatch — is still logged.

use super::{AuditSink, CrossTenantRead};
use async_trait::async_trait;
use tracing::warn;

pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn log_cross_tenant_read(&self, event: CrossTenantRead) {
        warn!(
            user_id = event.user_id.as_deref().unwrap_or("unknown"),
            user_org_id = %event.user_org_id,
            target_org_id = %event.target_org_id,
            resource_type = %event.resource_type,
            resource_id = event.resource_id.as_deref().unwrap_or(""),
            ip_address = event.ip_address.as_deref().unwrap_or(""),
            user_agent = event.user_agent.as_deref().unwrap_or(""),
            "cross-tenant read"
        );
    }
}
