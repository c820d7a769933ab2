//! Review campaign orchestration.
//!
//! The service owns session materialization and every mutation of a session.
//! Writes to one session are serialized through a per-session lock and the
//! repository rejects stale versions, so concurrent callers cannot interleave
//! into a corrupted decision map.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use recert_core::{AppError, AppResult, ReviewerIdentity, TenantId};
use recert_domain::{
    AccessItem, Campaign, CampaignId, Decision, DecisionOutcome, DecisionRequest, Identity, ItemId,
    ReviewAuditAction, ReviewProgress, ReviewSession, ReviewSessionInput, ReviewSessionSnapshot,
    ReviewerId, SessionId,
};

use crate::{
    AccessAssessor, CampaignAggregator, CampaignHealth, CampaignOverview, CampaignRepository,
    PeerUsage, PolicyStore, ReviewAuditEvent, ReviewAuditSink, ReviewEngineConfig,
    ReviewSessionRepository, SubjectAssessment,
};

mod session_locks;

use session_locks::SessionLocks;

/// Input for creating a draft campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCampaignInput {
    /// Campaign identifier.
    pub campaign_id: CampaignId,
    /// Display name.
    pub name: String,
    /// Due date.
    pub due_at: DateTime<Utc>,
    /// Whether critical conflicts gate session submit.
    pub policy_gate_enabled: bool,
}

/// Input for materializing one subject's session.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializeSessionInput {
    /// Draft campaign receiving the session.
    pub campaign_id: CampaignId,
    /// New session identifier.
    pub session_id: SessionId,
    /// Reviewer who owns the session.
    pub reviewer_id: ReviewerId,
    /// Subject under review.
    pub identity: Identity,
    /// Subject's current access.
    pub items: Vec<AccessItem>,
    /// Peer usage ratios per entitlement.
    pub peer_usage: PeerUsage,
}

/// UI bulk shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkShortcut {
    /// Keep every undecided low-risk item.
    KeepLowRisk,
    /// Revoke every undecided never-used item.
    RevokeUnused,
}

/// Session added to a campaign with the assessment it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedSession {
    /// Stored session.
    pub session: ReviewSession,
    /// Findings, scored items and lines behind the session.
    pub assessment: SubjectAssessment,
}

/// Application service for review campaigns and sessions.
#[derive(Clone)]
pub struct ReviewService {
    policy: Arc<PolicyStore>,
    assessor: AccessAssessor,
    aggregator: CampaignAggregator,
    session_repository: Arc<dyn ReviewSessionRepository>,
    campaign_repository: Arc<dyn CampaignRepository>,
    audit_sink: Arc<dyn ReviewAuditSink>,
    session_locks: Arc<SessionLocks>,
}

impl ReviewService {
    /// Creates a new service from required dependencies.
    pub fn new(
        policy: Arc<PolicyStore>,
        config: ReviewEngineConfig,
        session_repository: Arc<dyn ReviewSessionRepository>,
        campaign_repository: Arc<dyn CampaignRepository>,
        audit_sink: Arc<dyn ReviewAuditSink>,
    ) -> AppResult<Self> {
        Ok(Self {
            assessor: AccessAssessor::new(policy.clone(), config)?,
            aggregator: CampaignAggregator::new(config.health),
            policy,
            session_repository,
            campaign_repository,
            audit_sink,
            session_locks: Arc::new(SessionLocks::default()),
        })
    }

    /// Returns the assessor used for materialization.
    #[must_use]
    pub fn assessor(&self) -> &AccessAssessor {
        &self.assessor
    }

    /// Creates a draft campaign and emits an audit event.
    pub async fn create_campaign(
        &self,
        actor: &ReviewerIdentity,
        input: CreateCampaignInput,
        now: DateTime<Utc>,
    ) -> AppResult<Campaign> {
        let campaign = Campaign::new(
            input.campaign_id,
            input.name,
            input.due_at,
            input.policy_gate_enabled,
            now,
        )?;

        self.campaign_repository
            .insert_campaign(actor.tenant_id(), campaign.clone())
            .await?;

        self.audit(
            actor,
            ReviewAuditAction::CampaignCreated,
            "review_campaign",
            campaign.campaign_id().as_str(),
            Some(format!(
                "created campaign '{}' due {}",
                campaign.name(),
                campaign.due_at().to_rfc3339()
            )),
            now,
        )
        .await?;

        Ok(campaign)
    }

    /// Assesses a subject and adds its session to a draft campaign.
    pub async fn materialize_session(
        &self,
        actor: &ReviewerIdentity,
        input: MaterializeSessionInput,
        now: DateTime<Utc>,
    ) -> AppResult<MaterializedSession> {
        let tenant_id = actor.tenant_id();
        let mut campaign = self.load_campaign(tenant_id, &input.campaign_id).await?;
        campaign.add_session(
            input.session_id.clone(),
            input.identity.subject_id().clone(),
        )?;

        let assessment =
            self.assessor
                .assess(&input.identity, input.items.as_slice(), &input.peer_usage, now)?;

        let session = ReviewSession::new(ReviewSessionInput {
            session_id: input.session_id,
            campaign_id: input.campaign_id,
            subject_id: assessment.subject_id.clone(),
            reviewer_id: input.reviewer_id,
            lines: assessment.lines.clone(),
            policy_gate_enabled: campaign.policy_gate_enabled(),
            policy_fingerprint: self.policy.fingerprint().to_owned(),
            created_at: now,
        })?;

        self.session_repository
            .insert_session(tenant_id, session.clone())
            .await?;
        self.campaign_repository
            .save_campaign(tenant_id, campaign)
            .await?;

        self.audit(
            actor,
            ReviewAuditAction::SessionMaterialized,
            "review_session",
            session.session_id().as_str(),
            Some(format!(
                "materialized {} items for subject '{}' with {} critical",
                session.lines().len(),
                session.subject_id(),
                session
                    .lines()
                    .iter()
                    .filter(|line| line.critical_conflict)
                    .count()
            )),
            now,
        )
        .await?;

        Ok(MaterializedSession {
            session,
            assessment,
        })
    }

    /// Launches a draft campaign.
    pub async fn launch_campaign(
        &self,
        actor: &ReviewerIdentity,
        campaign_id: &CampaignId,
        now: DateTime<Utc>,
    ) -> AppResult<Campaign> {
        let mut campaign = self.load_campaign(actor.tenant_id(), campaign_id).await?;
        campaign.launch(now)?;

        self.campaign_repository
            .save_campaign(actor.tenant_id(), campaign.clone())
            .await?;

        self.audit(
            actor,
            ReviewAuditAction::CampaignLaunched,
            "review_campaign",
            campaign.campaign_id().as_str(),
            Some(format!(
                "launched with {} sessions",
                campaign.session_ids().len()
            )),
            now,
        )
        .await?;

        Ok(campaign)
    }

    /// Records or overwrites one decision.
    pub async fn record_decision(
        &self,
        actor: &ReviewerIdentity,
        session_id: &SessionId,
        item_id: &ItemId,
        request: DecisionRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Decision> {
        let decision = self
            .mutate_session(actor, session_id, |session, reviewer_id| {
                session
                    .record_decision(item_id, request, reviewer_id, now)
                    .cloned()
            })
            .await?;

        self.audit(
            actor,
            ReviewAuditAction::DecisionRecorded,
            "review_decision",
            &format!("{session_id}:{item_id}"),
            Some(decision_detail(&decision)),
            now,
        )
        .await?;

        Ok(decision)
    }

    /// Applies one request to many items, all or nothing.
    pub async fn bulk_apply(
        &self,
        actor: &ReviewerIdentity,
        session_id: &SessionId,
        item_ids: &[ItemId],
        request: DecisionRequest,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        let outcome = request.outcome;
        let applied = self
            .mutate_session(actor, session_id, |session, reviewer_id| {
                session.bulk_apply(item_ids, &request, reviewer_id, now)
            })
            .await?;

        self.audit_bulk(actor, session_id, outcome, item_ids, now)
            .await?;

        Ok(applied)
    }

    /// Runs a UI shortcut over the currently matching undecided items.
    ///
    /// Matching items are selected under the session lock, so decisions
    /// recorded concurrently are never overwritten. Returns zero without
    /// writing when nothing matches.
    pub async fn apply_shortcut(
        &self,
        actor: &ReviewerIdentity,
        session_id: &SessionId,
        shortcut: BulkShortcut,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        let outcome = match shortcut {
            BulkShortcut::KeepLowRisk => DecisionOutcome::Keep,
            BulkShortcut::RevokeUnused => DecisionOutcome::Revoke,
        };

        let item_ids = self
            .mutate_session(actor, session_id, |session, reviewer_id| {
                let item_ids = match shortcut {
                    BulkShortcut::KeepLowRisk => session.low_risk_items(),
                    BulkShortcut::RevokeUnused => session.unused_items(),
                };
                if !item_ids.is_empty() {
                    session.bulk_apply(
                        item_ids.as_slice(),
                        &DecisionRequest::new(outcome),
                        reviewer_id,
                        now,
                    )?;
                }
                Ok(item_ids)
            })
            .await?;

        if item_ids.is_empty() {
            return Ok(0);
        }

        self.audit_bulk(actor, session_id, outcome, item_ids.as_slice(), now)
            .await?;

        Ok(item_ids.len())
    }

    /// Submits a session; a policy gate refusal is audited and returned.
    pub async fn submit_session(
        &self,
        actor: &ReviewerIdentity,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> AppResult<ReviewSessionSnapshot> {
        let submitted = self
            .mutate_session(actor, session_id, |session, _| {
                session.submit(now)?;
                Ok(session.snapshot())
            })
            .await;

        match submitted {
            Ok(snapshot) => {
                self.audit(
                    actor,
                    ReviewAuditAction::SessionSubmitted,
                    "review_session",
                    session_id.as_str(),
                    Some(format!(
                        "submitted with {}/{} items decided",
                        snapshot.progress.decided, snapshot.progress.total
                    )),
                    now,
                )
                .await?;
                Ok(snapshot)
            }
            Err(AppError::PolicyGate(message)) => {
                self.audit(
                    actor,
                    ReviewAuditAction::SubmitBlocked,
                    "review_session",
                    session_id.as_str(),
                    Some(message.clone()),
                    now,
                )
                .await?;
                Err(AppError::PolicyGate(message))
            }
            Err(error) => Err(error),
        }
    }

    /// Returns the host-facing snapshot of a session.
    pub async fn session_snapshot(
        &self,
        actor: &ReviewerIdentity,
        session_id: &SessionId,
    ) -> AppResult<ReviewSessionSnapshot> {
        let session = self.load_session(actor.tenant_id(), session_id).await?;
        Ok(session.snapshot())
    }

    /// Returns campaign-wide progress.
    pub async fn campaign_progress(
        &self,
        actor: &ReviewerIdentity,
        campaign_id: &CampaignId,
    ) -> AppResult<ReviewProgress> {
        let (campaign, sessions) = self.load_campaign_sessions(actor, campaign_id).await?;
        Ok(self.aggregator.progress(&campaign, &sessions))
    }

    /// Returns campaign attention counters.
    pub async fn campaign_health(
        &self,
        actor: &ReviewerIdentity,
        campaign_id: &CampaignId,
        now: DateTime<Utc>,
    ) -> AppResult<CampaignHealth> {
        let (campaign, sessions) = self.load_campaign_sessions(actor, campaign_id).await?;
        Ok(self.aggregator.health(&campaign, &sessions, now))
    }

    /// Returns status, progress and health of a campaign.
    pub async fn campaign_overview(
        &self,
        actor: &ReviewerIdentity,
        campaign_id: &CampaignId,
        now: DateTime<Utc>,
    ) -> AppResult<CampaignOverview> {
        let (campaign, sessions) = self.load_campaign_sessions(actor, campaign_id).await?;
        Ok(self.aggregator.overview(&campaign, &sessions, now))
    }

    async fn mutate_session<T, F>(
        &self,
        actor: &ReviewerIdentity,
        session_id: &SessionId,
        mutation: F,
    ) -> AppResult<T>
    where
        F: FnOnce(&mut ReviewSession, &ReviewerId) -> AppResult<T> + Send,
        T: Send,
    {
        let tenant_id = actor.tenant_id();
        let guard = self.session_locks.acquire(tenant_id, session_id).await;
        let output = self
            .mutate_locked(actor, session_id, mutation)
            .await;
        self.session_locks.release(tenant_id, session_id, guard).await;

        output
    }

    async fn mutate_locked<T, F>(
        &self,
        actor: &ReviewerIdentity,
        session_id: &SessionId,
        mutation: F,
    ) -> AppResult<T>
    where
        F: FnOnce(&mut ReviewSession, &ReviewerId) -> AppResult<T> + Send,
        T: Send,
    {
        let tenant_id = actor.tenant_id();
        let mut session = self.load_session(tenant_id, session_id).await?;
        let reviewer_id = ReviewerId::new(actor.subject())?;
        if session.reviewer_id() != &reviewer_id {
            return Err(AppError::Forbidden(format!(
                "session '{session_id}' is assigned to reviewer '{}'",
                session.reviewer_id()
            )));
        }

        let campaign = self
            .load_campaign(tenant_id, session.campaign_id())
            .await?;
        if !campaign.is_launched() {
            return Err(AppError::State(format!(
                "campaign '{}' has not been launched",
                campaign.campaign_id()
            )));
        }

        let expected_version = session.version();
        let output = mutation(&mut session, &reviewer_id)?;
        if session.version() != expected_version {
            self.session_repository
                .save_session(tenant_id, session, expected_version)
                .await?;
        }

        Ok(output)
    }

    async fn load_session(
        &self,
        tenant_id: TenantId,
        session_id: &SessionId,
    ) -> AppResult<ReviewSession> {
        self.session_repository
            .find_session(tenant_id, session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("review session '{session_id}' not found")))
    }

    async fn load_campaign(
        &self,
        tenant_id: TenantId,
        campaign_id: &CampaignId,
    ) -> AppResult<Campaign> {
        self.campaign_repository
            .find_campaign(tenant_id, campaign_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("campaign '{campaign_id}' not found")))
    }

    async fn load_campaign_sessions(
        &self,
        actor: &ReviewerIdentity,
        campaign_id: &CampaignId,
    ) -> AppResult<(Campaign, Vec<ReviewSession>)> {
        let campaign = self.load_campaign(actor.tenant_id(), campaign_id).await?;
        let sessions = self
            .session_repository
            .list_sessions_for_campaign(actor.tenant_id(), campaign_id)
            .await?;

        Ok((campaign, sessions))
    }

    async fn audit_bulk(
        &self,
        actor: &ReviewerIdentity,
        session_id: &SessionId,
        outcome: DecisionOutcome,
        item_ids: &[ItemId],
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        self.audit(
            actor,
            ReviewAuditAction::BulkDecisionsApplied,
            "review_session",
            session_id.as_str(),
            Some(format!(
                "{} applied to {}",
                outcome.as_str(),
                item_ids
                    .iter()
                    .map(ItemId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            now,
        )
        .await
    }

    async fn audit(
        &self,
        actor: &ReviewerIdentity,
        action: ReviewAuditAction,
        resource_type: &str,
        resource_id: &str,
        detail: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.audit_sink
            .append_event(ReviewAuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.subject().to_owned(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id: resource_id.to_owned(),
                detail,
                occurred_at,
            })
            .await
    }
}

fn decision_detail(decision: &Decision) -> String {
    let mut detail = decision.outcome().as_str().to_owned();
    if let Some(expires_at) = decision.expires_at() {
        detail.push_str(&format!(" until {}", expires_at.to_rfc3339()));
    }
    if let Some(delegate_to) = decision.delegate_to() {
        detail.push_str(&format!(" to '{delegate_to}'"));
    }
    detail
}
