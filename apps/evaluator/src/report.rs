use recert_application::{CampaignOverview, SimulationOutcome};
use recert_domain::{ConflictFinding, ItemId, RecommendedAction, ReviewLine};
use serde::Serialize;
use ts_rs::TS;

/// Complete result of one evaluation run.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/review-types/src/generated/evaluation-report.ts"
)]
pub struct EvaluationReport {
    pub generated_at: String,
    pub policy_fingerprint: String,
    pub subjects: Vec<SubjectReport>,
    pub skipped_subjects: Vec<String>,
    pub campaign: Option<CampaignOverviewResponse>,
}

/// Per-subject conflicts, item scoring and fix simulation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/review-types/src/generated/subject-report.ts"
)]
pub struct SubjectReport {
    pub subject_id: String,
    pub display_name: String,
    pub department: Option<String>,
    pub findings: Vec<ConflictFindingResponse>,
    pub items: Vec<ItemAssessmentResponse>,
    pub simulate_fix: SimulateFixResponse,
}

/// API representation of a conflict finding.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/review-types/src/generated/conflict-finding-response.ts"
)]
pub struct ConflictFindingResponse {
    pub rule_id: String,
    pub severity: String,
    pub item_ids: Vec<String>,
}

/// API representation of one scored and recommended item.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/review-types/src/generated/item-assessment-response.ts"
)]
pub struct ItemAssessmentResponse {
    pub item_id: String,
    pub entitlement_id: String,
    pub risk_score: u8,
    pub risk_band: String,
    pub critical_conflict: bool,
    pub never_used: bool,
    pub recommendation: String,
    pub confidence: u8,
    pub reason: String,
    pub expires_at: Option<String>,
}

/// Outcome of revoking every revoke-recommended item.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/review-types/src/generated/simulate-fix-response.ts"
)]
pub struct SimulateFixResponse {
    pub revoked_items: Vec<String>,
    pub resolved_rules: Vec<String>,
    pub introduced_rules: Vec<String>,
    pub remaining_findings: Vec<ConflictFindingResponse>,
}

/// API representation of a campaign overview.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/review-types/src/generated/campaign-overview-response.ts"
)]
pub struct CampaignOverviewResponse {
    pub campaign_id: String,
    pub name: String,
    pub status: String,
    pub due_at: String,
    pub session_count: u32,
    pub submitted_sessions: u32,
    pub decided: u32,
    pub total: u32,
    pub pct: u8,
    pub blocked: u32,
    pub reminders: u32,
    pub escalations: u32,
}

impl From<&ConflictFinding> for ConflictFindingResponse {
    fn from(finding: &ConflictFinding) -> Self {
        Self {
            rule_id: finding.rule_id.to_string(),
            severity: finding.severity.as_str().to_owned(),
            item_ids: finding.item_ids.iter().map(ToString::to_string).collect(),
        }
    }
}

impl From<&ReviewLine> for ItemAssessmentResponse {
    fn from(line: &ReviewLine) -> Self {
        let expires_at = match line.recommendation.action {
            RecommendedAction::TimeBound { expires_at } => Some(expires_at.to_rfc3339()),
            _ => None,
        };

        Self {
            item_id: line.item_id.to_string(),
            entitlement_id: line.entitlement_id.to_string(),
            risk_score: line.risk_score.value(),
            risk_band: line.risk_score.band().as_str().to_owned(),
            critical_conflict: line.critical_conflict,
            never_used: line.never_used,
            recommendation: line.recommendation.action.action_type().to_owned(),
            confidence: line.recommendation.confidence.value(),
            reason: line.recommendation.reason.as_str().to_owned(),
            expires_at,
        }
    }
}

impl SimulateFixResponse {
    /// Builds the response for revoking `revoked_items`.
    pub fn from_outcome(revoked_items: &[ItemId], outcome: &SimulationOutcome) -> Self {
        Self {
            revoked_items: revoked_items.iter().map(ToString::to_string).collect(),
            resolved_rules: outcome.resolved_rules.iter().map(ToString::to_string).collect(),
            introduced_rules: outcome
                .introduced_rules
                .iter()
                .map(ToString::to_string)
                .collect(),
            remaining_findings: outcome
                .after
                .iter()
                .map(ConflictFindingResponse::from)
                .collect(),
        }
    }
}

impl From<CampaignOverview> for CampaignOverviewResponse {
    fn from(overview: CampaignOverview) -> Self {
        Self {
            campaign_id: overview.campaign_id.to_string(),
            name: overview.name,
            status: overview.status.as_str().to_owned(),
            due_at: overview.due_at.to_rfc3339(),
            session_count: count(overview.session_count),
            submitted_sessions: count(overview.submitted_sessions),
            decided: count(overview.progress.decided),
            total: count(overview.progress.total),
            pct: overview.progress.pct,
            blocked: count(overview.health.blocked),
            reminders: count(overview.health.reminders),
            escalations: count(overview.health.escalations),
        }
    }
}

fn count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
