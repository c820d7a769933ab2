use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recert_core::{AppResult, TenantId};
use recert_domain::{Campaign, CampaignId, ReviewAuditAction, ReviewSession, SessionId};

/// Port for persisting review sessions.
///
/// Implementations must reject a save whose `expected_version` does not match
/// the stored session with [`recert_core::AppError::Conflict`].
#[async_trait]
pub trait ReviewSessionRepository: Send + Sync {
    /// Stores a newly materialized session.
    async fn insert_session(&self, tenant_id: TenantId, session: ReviewSession) -> AppResult<()>;

    /// Finds one session.
    async fn find_session(
        &self,
        tenant_id: TenantId,
        session_id: &SessionId,
    ) -> AppResult<Option<ReviewSession>>;

    /// Lists sessions of a campaign ordered by session id.
    async fn list_sessions_for_campaign(
        &self,
        tenant_id: TenantId,
        campaign_id: &CampaignId,
    ) -> AppResult<Vec<ReviewSession>>;

    /// Replaces a session if the stored version still matches.
    async fn save_session(
        &self,
        tenant_id: TenantId,
        session: ReviewSession,
        expected_version: u64,
    ) -> AppResult<()>;
}

/// Port for persisting campaigns.
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Stores a new campaign.
    async fn insert_campaign(&self, tenant_id: TenantId, campaign: Campaign) -> AppResult<()>;

    /// Finds one campaign.
    async fn find_campaign(
        &self,
        tenant_id: TenantId,
        campaign_id: &CampaignId,
    ) -> AppResult<Option<Campaign>>;

    /// Replaces a stored campaign.
    async fn save_campaign(&self, tenant_id: TenantId, campaign: Campaign) -> AppResult<()>;
}

/// Immutable review audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewAuditEvent {
    /// Tenant scope for the event.
    pub tenant_id: TenantId,
    /// Subject that performed the action.
    pub subject: String,
    /// Stable audit action identifier.
    pub action: ReviewAuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional audit detail payload.
    pub detail: Option<String>,
    /// Time the action took effect.
    pub occurred_at: DateTime<Utc>,
}

/// Port for append-only review history.
#[async_trait]
pub trait ReviewAuditSink: Send + Sync {
    /// Appends one audit event.
    async fn append_event(&self, event: ReviewAuditEvent) -> AppResult<()>;
}

