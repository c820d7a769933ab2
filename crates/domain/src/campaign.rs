use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use recert_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{CampaignId, SessionId, SubjectId};

/// Campaign status derived on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Sessions are being assembled; not yet launched.
    Draft,
    /// Launched and within its due date.
    Active,
    /// Every session is submitted.
    Completed,
    /// Due date passed with sessions still open.
    Overdue,
}

impl CampaignStatus {
    /// Returns stable status value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
        }
    }

    /// Derives the status from launch state, clock and session completion.
    #[must_use]
    pub fn derive(
        launched: bool,
        now: DateTime<Utc>,
        due_at: DateTime<Utc>,
        all_sessions_submitted: bool,
    ) -> Self {
        if !launched {
            return Self::Draft;
        }

        if all_sessions_submitted {
            return Self::Completed;
        }

        if now > due_at {
            return Self::Overdue;
        }

        Self::Active
    }
}

/// Time-boxed access recertification exercise.
///
/// Constructed only through [`Campaign::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Campaign {
    campaign_id: CampaignId,
    name: NonEmptyString,
    due_at: DateTime<Utc>,
    policy_gate_enabled: bool,
    session_ids: Vec<SessionId>,
    subject_ids: BTreeSet<SubjectId>,
    created_at: DateTime<Utc>,
    launched_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Creates a draft campaign.
    pub fn new(
        campaign_id: CampaignId,
        name: impl Into<String>,
        due_at: DateTime<Utc>,
        policy_gate_enabled: bool,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        if due_at <= created_at {
            return Err(AppError::Validation(format!(
                "campaign '{campaign_id}' due date must be after its creation"
            )));
        }

        Ok(Self {
            campaign_id,
            name: NonEmptyString::new(name)?,
            due_at,
            policy_gate_enabled,
            session_ids: Vec::new(),
            subject_ids: BTreeSet::new(),
            created_at,
            launched_at: None,
        })
    }

    /// Returns the campaign identifier.
    #[must_use]
    pub fn campaign_id(&self) -> &CampaignId {
        &self.campaign_id
    }

    /// Returns the campaign name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the due date.
    #[must_use]
    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    /// Returns whether submit is gated on critical conflicts.
    #[must_use]
    pub fn policy_gate_enabled(&self) -> bool {
        self.policy_gate_enabled
    }

    /// Returns member sessions in insertion order.
    #[must_use]
    pub fn session_ids(&self) -> &[SessionId] {
        self.session_ids.as_slice()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the launch timestamp.
    #[must_use]
    pub fn launched_at(&self) -> Option<DateTime<Utc>> {
        self.launched_at
    }

    /// Returns whether the campaign was launched.
    #[must_use]
    pub fn is_launched(&self) -> bool {
        self.launched_at.is_some()
    }

    /// Adds a subject's session while the campaign is still a draft.
    ///
    /// A subject is reviewed at most once per campaign.
    pub fn add_session(&mut self, session_id: SessionId, subject_id: SubjectId) -> AppResult<()> {
        if self.is_launched() {
            return Err(AppError::State(format!(
                "campaign '{}' is launched; sessions can no longer be added",
                self.campaign_id
            )));
        }

        if self.session_ids.contains(&session_id) {
            return Err(AppError::Conflict(format!(
                "session '{session_id}' already belongs to campaign '{}'",
                self.campaign_id
            )));
        }

        if self.subject_ids.contains(&subject_id) {
            return Err(AppError::Conflict(format!(
                "subject '{subject_id}' already has a session in campaign '{}'",
                self.campaign_id
            )));
        }

        self.session_ids.push(session_id);
        self.subject_ids.insert(subject_id);
        Ok(())
    }

    /// Launches a draft campaign.
    pub fn launch(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        if self.is_launched() {
            return Err(AppError::State(format!(
                "campaign '{}' is already launched",
                self.campaign_id
            )));
        }

        if self.session_ids.is_empty() {
            return Err(AppError::Validation(format!(
                "campaign '{}' needs at least one session before launch",
                self.campaign_id
            )));
        }

        self.launched_at = Some(now);
        Ok(())
    }

    /// Derives the status for the given clock and session completion.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>, all_sessions_submitted: bool) -> CampaignStatus {
        CampaignStatus::derive(self.is_launched(), now, self.due_at, all_sessions_submitted)
    }
}
