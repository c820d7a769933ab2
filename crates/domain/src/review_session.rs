//! Review session aggregate and its decision state machine.
//!
//! A session moves from `Open` to `Submitted` exactly once. Every mutation is
//! validated before any state changes, so a rejected call leaves the session
//! untouched.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use recert_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{
    CampaignId, Decision, DecisionRequest, EntitlementId, ItemId, Recommendation, ReviewerId,
    RiskLevel, RiskScore, SessionId, SubjectId,
};

/// Lifecycle state of a review session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Decisions are being recorded.
    Open,
    /// Terminal, read-only.
    Submitted,
}

impl SessionState {
    /// Returns stable state value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Submitted => "submitted",
        }
    }
}

/// Decided versus total items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewProgress {
    /// Items carrying a decision.
    pub decided: usize,
    /// Items in scope.
    pub total: usize,
    /// Whole percentage, rounded down; zero for an empty scope.
    pub pct: u8,
}

impl ReviewProgress {
    /// Builds progress from counts.
    #[must_use]
    pub fn new(decided: usize, total: usize) -> Self {
        let decided = decided.min(total);
        let pct = if total == 0 {
            0
        } else {
            u8::try_from(decided.saturating_mul(100) / total).unwrap_or(100)
        };

        Self {
            decided,
            total,
            pct,
        }
    }

    /// Sums two progress values.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self::new(
            self.decided.saturating_add(other.decided),
            self.total.saturating_add(other.total),
        )
    }

    /// Returns whether every item in scope is decided.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.decided == self.total
    }
}

/// One access item in a session scope with its engine outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewLine {
    /// Access item under review.
    pub item_id: ItemId,
    /// Entitlement the item grants.
    pub entitlement_id: EntitlementId,
    /// Risk score at materialization.
    pub risk_score: RiskScore,
    /// Engine recommendation at materialization.
    pub recommendation: Recommendation,
    /// Whether a critical conflict finding touches the item.
    pub critical_conflict: bool,
    /// Whether the item was never used.
    pub never_used: bool,
}

/// Input payload used to construct a review session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSessionInput {
    /// Session identifier.
    pub session_id: SessionId,
    /// Owning campaign.
    pub campaign_id: CampaignId,
    /// Subject under review.
    pub subject_id: SubjectId,
    /// Reviewer owning the session.
    pub reviewer_id: ReviewerId,
    /// Ordered scope.
    pub lines: Vec<ReviewLine>,
    /// Whether submit is gated on critical conflicts.
    pub policy_gate_enabled: bool,
    /// Fingerprint of the policy used to materialize the session.
    pub policy_fingerprint: String,
    /// Materialization timestamp.
    pub created_at: DateTime<Utc>,
}

/// Per-item decision view in a session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotItem {
    /// Item in scope.
    pub item_id: ItemId,
    /// Active decision, `None` when undecided.
    pub decision: Option<Decision>,
}

/// Read-only session view handed to hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSessionSnapshot {
    /// Session identifier.
    pub session_id: SessionId,
    /// Subject under review.
    pub subject_id: SubjectId,
    /// Lifecycle state.
    pub state: SessionState,
    /// Items in scope order.
    pub items: Vec<SnapshotItem>,
    /// Decision progress.
    pub progress: ReviewProgress,
}

/// One subject's review scope within one campaign.
///
/// Constructed only through [`ReviewSession::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSession {
    session_id: SessionId,
    campaign_id: CampaignId,
    subject_id: SubjectId,
    reviewer_id: ReviewerId,
    lines: Vec<ReviewLine>,
    decisions: BTreeMap<ItemId, Decision>,
    policy_gate_enabled: bool,
    policy_fingerprint: String,
    state: SessionState,
    version: u64,
    created_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
}

impl ReviewSession {
    /// Creates an open session with an ordered, duplicate-free scope.
    pub fn new(input: ReviewSessionInput) -> AppResult<Self> {
        let ReviewSessionInput {
            session_id,
            campaign_id,
            subject_id,
            reviewer_id,
            lines,
            policy_gate_enabled,
            policy_fingerprint,
            created_at,
        } = input;

        if lines.is_empty() {
            return Err(AppError::Validation(format!(
                "session '{session_id}' must contain at least one access item"
            )));
        }

        let mut seen = BTreeSet::new();
        for line in &lines {
            if !seen.insert(&line.item_id) {
                return Err(AppError::Validation(format!(
                    "item '{}' appears more than once in session '{session_id}'",
                    line.item_id
                )));
            }
        }

        Ok(Self {
            session_id,
            campaign_id,
            subject_id,
            reviewer_id,
            lines,
            decisions: BTreeMap::new(),
            policy_gate_enabled,
            policy_fingerprint,
            state: SessionState::Open,
            version: 0,
            created_at,
            submitted_at: None,
        })
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Returns the owning campaign.
    #[must_use]
    pub fn campaign_id(&self) -> &CampaignId {
        &self.campaign_id
    }

    /// Returns the subject under review.
    #[must_use]
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    /// Returns the reviewer owning the session.
    #[must_use]
    pub fn reviewer_id(&self) -> &ReviewerId {
        &self.reviewer_id
    }

    /// Returns the scope lines in order.
    #[must_use]
    pub fn lines(&self) -> &[ReviewLine] {
        self.lines.as_slice()
    }

    /// Returns one scope line.
    #[must_use]
    pub fn line(&self, item_id: &ItemId) -> Option<&ReviewLine> {
        self.lines.iter().find(|line| &line.item_id == item_id)
    }

    /// Returns the active decision for an item.
    #[must_use]
    pub fn decision(&self, item_id: &ItemId) -> Option<&Decision> {
        self.decisions.get(item_id)
    }

    /// Returns whether submit is gated on critical conflicts.
    #[must_use]
    pub fn policy_gate_enabled(&self) -> bool {
        self.policy_gate_enabled
    }

    /// Returns the policy fingerprint recorded at materialization.
    #[must_use]
    pub fn policy_fingerprint(&self) -> &str {
        self.policy_fingerprint.as_str()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns whether the session is submitted.
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.state == SessionState::Submitted
    }

    /// Returns the optimistic concurrency version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the materialization timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the submission timestamp.
    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Records or overwrites the decision for one item.
    pub fn record_decision(
        &mut self,
        item_id: &ItemId,
        request: DecisionRequest,
        decided_by: &ReviewerId,
        now: DateTime<Utc>,
    ) -> AppResult<&Decision> {
        self.ensure_open()?;

        if self.line(item_id).is_none() {
            return Err(AppError::Validation(format!(
                "item '{item_id}' is not in scope of session '{}'",
                self.session_id
            )));
        }

        let decision = Decision::new(item_id.clone(), request, decided_by.clone(), now)?;
        self.version = self.version.saturating_add(1);

        let slot = match self.decisions.entry(item_id.clone()) {
            Entry::Occupied(mut entry) => {
                entry.insert(decision);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(decision),
        };

        Ok(slot)
    }

    /// Applies the same request to many items, all or nothing.
    ///
    /// Each item goes through [`Self::record_decision`]; the first failure
    /// discards the whole batch.
    pub fn bulk_apply(
        &mut self,
        item_ids: &[ItemId],
        request: &DecisionRequest,
        decided_by: &ReviewerId,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        self.ensure_open()?;

        if item_ids.is_empty() {
            return Err(AppError::Validation(
                "bulk decision requires at least one item".to_owned(),
            ));
        }

        let mut working = self.clone();
        for item_id in item_ids {
            working.record_decision(item_id, request.clone(), decided_by, now)?;
        }

        *self = working;
        Ok(item_ids.len())
    }

    /// Returns undecided items that block submission under the policy gate.
    #[must_use]
    pub fn blocking_items(&self) -> Vec<ItemId> {
        if !self.policy_gate_enabled {
            return Vec::new();
        }

        self.lines
            .iter()
            .filter(|line| line.critical_conflict && !self.decisions.contains_key(&line.item_id))
            .map(|line| line.item_id.clone())
            .collect()
    }

    /// Submits the session, making it read-only.
    pub fn submit(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure_open()?;

        let blocking_items = self.blocking_items();
        if !blocking_items.is_empty() {
            let listed = blocking_items
                .iter()
                .map(ItemId::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AppError::PolicyGate(format!(
                "session '{}' has undecided items with critical conflicts: {listed}",
                self.session_id
            )));
        }

        self.state = SessionState::Submitted;
        self.submitted_at = Some(now);
        self.version = self.version.saturating_add(1);
        Ok(())
    }

    /// Returns decided versus total items.
    #[must_use]
    pub fn progress(&self) -> ReviewProgress {
        let decided = self
            .lines
            .iter()
            .filter(|line| self.decisions.contains_key(&line.item_id))
            .count();
        ReviewProgress::new(decided, self.lines.len())
    }

    /// Returns undecided items in the low risk band.
    #[must_use]
    pub fn low_risk_items(&self) -> Vec<ItemId> {
        self.undecided_lines()
            .filter(|line| line.risk_score.band() == RiskLevel::Low)
            .map(|line| line.item_id.clone())
            .collect()
    }

    /// Returns undecided items that were never used.
    #[must_use]
    pub fn unused_items(&self) -> Vec<ItemId> {
        self.undecided_lines()
            .filter(|line| line.never_used)
            .map(|line| line.item_id.clone())
            .collect()
    }

    /// Returns the host-facing snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ReviewSessionSnapshot {
        ReviewSessionSnapshot {
            session_id: self.session_id.clone(),
            subject_id: self.subject_id.clone(),
            state: self.state,
            items: self
                .lines
                .iter()
                .map(|line| SnapshotItem {
                    item_id: line.item_id.clone(),
                    decision: self.decisions.get(&line.item_id).cloned(),
                })
                .collect(),
            progress: self.progress(),
        }
    }

    fn undecided_lines(&self) -> impl Iterator<Item = &ReviewLine> {
        self.lines
            .iter()
            .filter(|line| !self.decisions.contains_key(&line.item_id))
    }

    fn ensure_open(&self) -> AppResult<()> {
        if self.state == SessionState::Submitted {
            return Err(AppError::State(format!(
                "session '{}' is submitted and read-only",
                self.session_id
            )));
        }

        Ok(())
    }
}
