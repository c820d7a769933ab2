//! Review audit sink that writes events to tracing output.

use async_trait::async_trait;
use recert_application::{ReviewAuditEvent, ReviewAuditSink};
use recert_core::AppResult;
use tracing::info;

/// Audit sink emitting one structured `info` event per review action.
#[derive(Debug, Clone, Default)]
pub struct TracingReviewAuditSink;

impl TracingReviewAuditSink {
    /// Creates a new tracing audit sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReviewAuditSink for TracingReviewAuditSink {
    async fn append_event(&self, event: ReviewAuditEvent) -> AppResult<()> {
        info!(
            tenant_id = %event.tenant_id,
            actor = %event.subject,
            action = event.action.as_str(),
            resource_type = %event.resource_type,
            resource_id = %event.resource_id,
            occurred_at = %event.occurred_at.to_rfc3339(),
            detail = event.detail.as_deref().unwrap_or_default(),
            "review audit event"
        );

        Ok(())
    }
}
