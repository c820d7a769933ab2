use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by review use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAuditAction {
    /// Emitted when a campaign is created.
    CampaignCreated,
    /// Emitted when a campaign is launched.
    CampaignLaunched,
    /// Emitted when a subject's session is materialized.
    SessionMaterialized,
    /// Emitted for every recorded decision.
    DecisionRecorded,
    /// Emitted when a bulk shortcut decides several items.
    BulkDecisionsApplied,
    /// Emitted when a session is submitted.
    SessionSubmitted,
    /// Emitted when submit is refused by the policy gate.
    SubmitBlocked,
}

impl ReviewAuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CampaignCreated => "review.campaign.created",
            Self::CampaignLaunched => "review.campaign.launched",
            Self::SessionMaterialized => "review.session.materialized",
            Self::DecisionRecorded => "review.decision.recorded",
            Self::BulkDecisionsApplied => "review.decision.bulk_applied",
            Self::SessionSubmitted => "review.session.submitted",
            Self::SubmitBlocked => "review.session.submit_blocked",
        }
    }
}
