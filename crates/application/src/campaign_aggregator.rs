//! Read-side aggregation over a campaign's review sessions.
//!
//! Everything here is recomputed from the sessions on every call; nothing is
//! cached or written back.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use recert_domain::{
    Campaign, CampaignId, CampaignStatus, ReviewProgress, ReviewSession, ReviewerId,
};
use serde::{Deserialize, Serialize};

use crate::CampaignHealthPolicy;

/// Attention counters for a campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignHealth {
    /// Reviewers whose open session is blocked by the policy gate.
    pub blocked: usize,
    /// Open sessions within the reminder window.
    pub reminders: usize,
    /// Open sessions past the escalation grace period.
    pub escalations: usize,
}

/// Campaign summary for dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignOverview {
    /// Campaign identifier.
    pub campaign_id: CampaignId,
    /// Campaign display name.
    pub name: String,
    /// Due date.
    pub due_at: DateTime<Utc>,
    /// Derived status.
    pub status: CampaignStatus,
    /// Decided versus total items.
    pub progress: ReviewProgress,
    /// Attention counters.
    pub health: CampaignHealth,
    /// Number of sessions in the campaign.
    pub session_count: usize,
    /// Number of submitted sessions.
    pub submitted_sessions: usize,
}

/// Pure aggregation over sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CampaignAggregator {
    policy: CampaignHealthPolicy,
}

impl CampaignAggregator {
    /// Creates an aggregator with the given health windows.
    #[must_use]
    pub fn new(policy: CampaignHealthPolicy) -> Self {
        Self { policy }
    }

    /// Sums progress across the campaign's sessions.
    #[must_use]
    pub fn progress(&self, campaign: &Campaign, sessions: &[ReviewSession]) -> ReviewProgress {
        member_sessions(campaign, sessions)
            .map(ReviewSession::progress)
            .fold(ReviewProgress::default(), ReviewProgress::merge)
    }

    /// Counts blocked reviewers, due reminders and escalations.
    #[must_use]
    pub fn health(
        &self,
        campaign: &Campaign,
        sessions: &[ReviewSession],
        now: DateTime<Utc>,
    ) -> CampaignHealth {
        let open = member_sessions(campaign, sessions)
            .filter(|session| !session.is_submitted())
            .collect::<Vec<_>>();

        let blocked = open
            .iter()
            .filter(|session| !session.blocking_items().is_empty())
            .map(|session| session.reviewer_id())
            .collect::<BTreeSet<&ReviewerId>>()
            .len();

        if !campaign.is_launched() {
            return CampaignHealth {
                blocked,
                ..CampaignHealth::default()
            };
        }

        let reminder_from =
            campaign.due_at() - Duration::days(i64::from(self.policy.reminder_lead_days));
        let escalate_after =
            campaign.due_at() + Duration::days(i64::from(self.policy.escalation_grace_days));

        CampaignHealth {
            blocked,
            reminders: if now >= reminder_from { open.len() } else { 0 },
            escalations: if now > escalate_after { open.len() } else { 0 },
        }
    }

    /// Derives the campaign status from its sessions.
    #[must_use]
    pub fn status(
        &self,
        campaign: &Campaign,
        sessions: &[ReviewSession],
        now: DateTime<Utc>,
    ) -> CampaignStatus {
        campaign.status(now, all_submitted(campaign, sessions))
    }

    /// Bundles status, progress and health.
    #[must_use]
    pub fn overview(
        &self,
        campaign: &Campaign,
        sessions: &[ReviewSession],
        now: DateTime<Utc>,
    ) -> CampaignOverview {
        CampaignOverview {
            campaign_id: campaign.campaign_id().clone(),
            name: campaign.name().to_string(),
            due_at: campaign.due_at(),
            status: self.status(campaign, sessions, now),
            progress: self.progress(campaign, sessions),
            health: self.health(campaign, sessions, now),
            session_count: campaign.session_ids().len(),
            submitted_sessions: member_sessions(campaign, sessions)
                .filter(|session| session.is_submitted())
                .count(),
        }
    }
}

fn member_sessions<'a>(
    campaign: &'a Campaign,
    sessions: &'a [ReviewSession],
) -> impl Iterator<Item = &'a ReviewSession> {
    sessions.iter().filter(move |session| {
        session.campaign_id() == campaign.campaign_id()
            && campaign.session_ids().contains(session.session_id())
    })
}

fn all_submitted(campaign: &Campaign, sessions: &[ReviewSession]) -> bool {
    let submitted = member_sessions(campaign, sessions)
        .filter(|session| session.is_submitted())
        .map(ReviewSession::session_id)
        .collect::<BTreeSet<_>>();

    !campaign.session_ids().is_empty()
        && campaign
            .session_ids()
            .iter()
            .all(|session_id| submitted.contains(session_id))
}

#[cfg(test)]
mod tests;
