use std::collections::HashMap;

use async_trait::async_trait;
use recert_application::CampaignRepository;
use recert_core::{AppError, AppResult, TenantId};
use recert_domain::{Campaign, CampaignId};
use tokio::sync::RwLock;

/// In-memory campaign repository.
#[derive(Debug, Default)]
pub struct InMemoryCampaignRepository {
    campaigns: RwLock<HashMap<(TenantId, CampaignId), Campaign>>,
}

impl InMemoryCampaignRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignRepository for InMemoryCampaignRepository {
    async fn insert_campaign(&self, tenant_id: TenantId, campaign: Campaign) -> AppResult<()> {
        let key = (tenant_id, campaign.campaign_id().clone());
        let mut campaigns = self.campaigns.write().await;

        if campaigns.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "campaign '{}' already exists for tenant '{}'",
                key.1, key.0
            )));
        }

        campaigns.insert(key, campaign);
        Ok(())
    }

    async fn find_campaign(
        &self,
        tenant_id: TenantId,
        campaign_id: &CampaignId,
    ) -> AppResult<Option<Campaign>> {
        Ok(self
            .campaigns
            .read()
            .await
            .get(&(tenant_id, campaign_id.clone()))
            .cloned())
    }

    async fn save_campaign(&self, tenant_id: TenantId, campaign: Campaign) -> AppResult<()> {
        let key = (tenant_id, campaign.campaign_id().clone());
        let mut campaigns = self.campaigns.write().await;

        let Some(stored) = campaigns.get_mut(&key) else {
            return Err(AppError::NotFound(format!(
                "campaign '{}' not found",
                key.1
            )));
        };

        *stored = campaign;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use recert_application::CampaignRepository;
    use recert_core::{AppError, TenantId};
    use recert_domain::{Campaign, CampaignId};

    use super::InMemoryCampaignRepository;

    fn campaign() -> Campaign {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .unwrap_or_default();
        Campaign::new(
            CampaignId::new("C1").unwrap_or_else(|_| unreachable!()),
            "Quarterly access review",
            now + Duration::days(14),
            true,
            now,
        )
        .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn save_requires_existing_campaign() {
        let repository = InMemoryCampaignRepository::new();
        let tenant_id = TenantId::new();

        let missing = repository.save_campaign(tenant_id, campaign()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        assert!(repository.insert_campaign(tenant_id, campaign()).await.is_ok());
        assert!(repository.save_campaign(tenant_id, campaign()).await.is_ok());
    }

    #[tokio::test]
    async fn campaigns_do_not_leak_across_tenants() {
        let repository = InMemoryCampaignRepository::new();
        let left_tenant = TenantId::new();

        assert!(repository.insert_campaign(left_tenant, campaign()).await.is_ok());
        let found = repository
            .find_campaign(
                TenantId::new(),
                &CampaignId::new("C1").unwrap_or_else(|_| unreachable!()),
            )
            .await;

        assert!(matches!(found, Ok(None)));
    }
}
