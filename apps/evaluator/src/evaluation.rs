use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use recert_application::{
    AccessDelta, CreateCampaignInput, MaterializeSessionInput, MaterializedSession, PolicyStore,
    ReviewService,
};
use recert_core::{AppResult, ReviewerIdentity, TenantId};
use recert_domain::{CampaignId, ReviewerId, SessionId};
use recert_infrastructure::{
    AccessSnapshot, InMemoryCampaignRepository, InMemoryReviewSessionRepository,
    TracingReviewAuditSink,
};
use tracing::info;

use crate::evaluator_config::EvaluatorConfig;
use crate::report::{
    CampaignOverviewResponse, ConflictFindingResponse, EvaluationReport, ItemAssessmentResponse,
    SimulateFixResponse, SubjectReport,
};

const GOVERNANCE_REVIEWER: &str = "access-governance";

/// Runs detection, scoring and recommendation for every subject in the
/// snapshot and materializes a dry-run campaign over the results.
pub async fn evaluate(
    config: &EvaluatorConfig,
    policy: Arc<PolicyStore>,
    snapshot: &AccessSnapshot,
    now: DateTime<Utc>,
) -> AppResult<EvaluationReport> {
    let service = ReviewService::new(
        policy.clone(),
        config.engine,
        Arc::new(InMemoryReviewSessionRepository::new()),
        Arc::new(InMemoryCampaignRepository::new()),
        Arc::new(TracingReviewAuditSink::new()),
    )?;
    let actor = ReviewerIdentity::new(GOVERNANCE_REVIEWER, "Access Governance", TenantId::new());

    let campaign_id = CampaignId::new(format!("dry-run-{}", now.format("%Y%m%d")))?;
    service
        .create_campaign(
            &actor,
            CreateCampaignInput {
                campaign_id: campaign_id.clone(),
                name: config.campaign_name.clone(),
                due_at: now + Duration::days(i64::from(config.campaign_due_days)),
                policy_gate_enabled: config.policy_gate_enabled,
            },
            now,
        )
        .await?;

    let mut subjects = Vec::new();
    let mut skipped_subjects = Vec::new();
    for subject in snapshot.subjects() {
        let subject_id = subject.identity.subject_id().clone();
        if subject.items.is_empty() {
            info!(subject_id = %subject_id, "skipping subject without access items");
            skipped_subjects.push(subject_id.to_string());
            continue;
        }

        let reviewer_id = match subject.identity.manager_id() {
            Some(manager_id) => ReviewerId::new(manager_id.as_str())?,
            None => ReviewerId::new(GOVERNANCE_REVIEWER)?,
        };
        let MaterializedSession { assessment, .. } = service
            .materialize_session(
                &actor,
                MaterializeSessionInput {
                    campaign_id: campaign_id.clone(),
                    session_id: SessionId::new(format!("session-{subject_id}"))?,
                    reviewer_id,
                    identity: subject.identity.clone(),
                    items: subject.items,
                    peer_usage: snapshot.peer_usage.clone(),
                },
                now,
            )
            .await?;

        let revoked_items = assessment.revoke_candidates();
        let outcome = service.assessor().detector().simulate(
            assessment.items.as_slice(),
            &AccessDelta::revoke(revoked_items.clone()),
        )?;

        subjects.push(SubjectReport {
            subject_id: subject_id.to_string(),
            display_name: subject.identity.display_name().as_str().to_owned(),
            department: subject.identity.department().map(ToOwned::to_owned),
            findings: assessment
                .findings
                .iter()
                .map(ConflictFindingResponse::from)
                .collect(),
            items: assessment
                .lines
                .iter()
                .map(ItemAssessmentResponse::from)
                .collect(),
            simulate_fix: SimulateFixResponse::from_outcome(revoked_items.as_slice(), &outcome),
        });
    }

    let campaign = if subjects.is_empty() {
        info!(campaign_id = %campaign_id, "no reviewable subjects, campaign left unlaunched");
        None
    } else {
        service.launch_campaign(&actor, &campaign_id, now).await?;
        let overview = service
            .campaign_overview(&actor, &campaign_id, now)
            .await?;
        Some(CampaignOverviewResponse::from(overview))
    };

    info!(
        subjects = subjects.len(),
        skipped = skipped_subjects.len(),
        fingerprint = policy.fingerprint(),
        "evaluation finished"
    );

    Ok(EvaluationReport {
        generated_at: now.to_rfc3339(),
        policy_fingerprint: policy.fingerprint().to_owned(),
        subjects,
        skipped_subjects,
        campaign,
    })
}
