use std::collections::HashMap;

use async_trait::async_trait;
use recert_application::ReviewSessionRepository;
use recert_core::{AppError, AppResult, TenantId};
use recert_domain::{CampaignId, ReviewSession, SessionId};
use tokio::sync::RwLock;

/// In-memory session repository with optimistic version checks.
#[derive(Debug, Default)]
pub struct InMemoryReviewSessionRepository {
    sessions: RwLock<HashMap<(TenantId, SessionId), ReviewSession>>,
}

impl InMemoryReviewSessionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewSessionRepository for InMemoryReviewSessionRepository {
    async fn insert_session(&self, tenant_id: TenantId, session: ReviewSession) -> AppResult<()> {
        let key = (tenant_id, session.session_id().clone());
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "review session '{}' already exists for tenant '{}'",
                key.1, key.0
            )));
        }

        sessions.insert(key, session);
        Ok(())
    }

    async fn find_session(
        &self,
        tenant_id: TenantId,
        session_id: &SessionId,
    ) -> AppResult<Option<ReviewSession>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&(tenant_id, session_id.clone()))
            .cloned())
    }

    async fn list_sessions_for_campaign(
        &self,
        tenant_id: TenantId,
        campaign_id: &CampaignId,
    ) -> AppResult<Vec<ReviewSession>> {
        let sessions = self.sessions.read().await;

        let mut values: Vec<ReviewSession> = sessions
            .iter()
            .filter_map(|((stored_tenant_id, _), session)| {
                (stored_tenant_id == &tenant_id && session.campaign_id() == campaign_id)
                    .then_some(session.clone())
            })
            .collect();
        values.sort_by(|left, right| left.session_id().cmp(right.session_id()));

        Ok(values)
    }

    async fn save_session(
        &self,
        tenant_id: TenantId,
        session: ReviewSession,
        expected_version: u64,
    ) -> AppResult<()> {
        let key = (tenant_id, session.session_id().clone());
        let mut sessions = self.sessions.write().await;

        let stored_version = sessions
            .get(&key)
            .map(ReviewSession::version)
            .ok_or_else(|| AppError::NotFound(format!("review session '{}' not found", key.1)))?;

        if stored_version != expected_version {
            return Err(AppError::Conflict(format!(
                "review session '{}' changed concurrently (expected version {expected_version}, found {stored_version})",
                key.1
            )));
        }

        sessions.insert(key, session);
        Ok(())
    }
}
