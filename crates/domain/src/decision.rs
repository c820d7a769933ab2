use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use recert_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{ItemId, ReviewerId};

/// Reviewer outcome for one access item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// Certify the access.
    Keep,
    /// Remove the access.
    Revoke,
    /// Hand the item to another reviewer.
    Delegate,
    /// Certify the access until an expiry.
    TimeBound,
}

impl DecisionOutcome {
    /// Returns a stable storage value for this outcome.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Revoke => "revoke",
            Self::Delegate => "delegate",
            Self::TimeBound => "time_bound",
        }
    }
}

impl Display for DecisionOutcome {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Reviewer request for one item, validated into a [`Decision`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    /// Selected outcome.
    pub outcome: DecisionOutcome,
    /// Expiry, required iff the outcome is time-bound.
    pub expires_at: Option<DateTime<Utc>>,
    /// Delegate reviewer, required iff the outcome is delegate.
    pub delegate_to: Option<ReviewerId>,
    /// Optional reviewer comment.
    pub comment: Option<String>,
}

impl DecisionRequest {
    /// Creates a request with no expiry, delegate or comment.
    #[must_use]
    pub fn new(outcome: DecisionOutcome) -> Self {
        Self {
            outcome,
            expires_at: None,
            delegate_to: None,
            comment: None,
        }
    }

    /// Creates a time-bound request.
    #[must_use]
    pub fn time_bound(expires_at: DateTime<Utc>) -> Self {
        Self {
            expires_at: Some(expires_at),
            ..Self::new(DecisionOutcome::TimeBound)
        }
    }

    /// Creates a delegation request.
    #[must_use]
    pub fn delegate(delegate_to: ReviewerId) -> Self {
        Self {
            delegate_to: Some(delegate_to),
            ..Self::new(DecisionOutcome::Delegate)
        }
    }

    /// Attaches a reviewer comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// One reviewer action on one item within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    item_id: ItemId,
    outcome: DecisionOutcome,
    expires_at: Option<DateTime<Utc>>,
    delegate_to: Option<ReviewerId>,
    comment: Option<String>,
    decided_by: ReviewerId,
    decided_at: DateTime<Utc>,
}

impl Decision {
    /// Validates a request into a decision stamped at `now`.
    pub fn new(
        item_id: ItemId,
        request: DecisionRequest,
        decided_by: ReviewerId,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let DecisionRequest {
            outcome,
            expires_at,
            delegate_to,
            comment,
        } = request;

        match (outcome, expires_at) {
            (DecisionOutcome::TimeBound, None) => {
                return Err(AppError::Validation(format!(
                    "time-bound decision for item '{item_id}' requires an expiry"
                )));
            }
            (DecisionOutcome::TimeBound, Some(expires_at)) if expires_at <= now => {
                return Err(AppError::Validation(format!(
                    "expiry for item '{item_id}' must be in the future"
                )));
            }
            (DecisionOutcome::TimeBound, Some(_)) => {}
            (_, Some(_)) => {
                return Err(AppError::Validation(format!(
                    "only time-bound decisions may carry an expiry (item '{item_id}')"
                )));
            }
            (_, None) => {}
        }

        match (outcome, delegate_to.as_ref()) {
            (DecisionOutcome::Delegate, None) => {
                return Err(AppError::Validation(format!(
                    "delegation of item '{item_id}' requires a delegate reviewer"
                )));
            }
            (DecisionOutcome::Delegate, Some(delegate)) if *delegate == decided_by => {
                return Err(AppError::Validation(format!(
                    "item '{item_id}' cannot be delegated to the deciding reviewer"
                )));
            }
            (DecisionOutcome::Delegate, Some(_)) => {}
            (_, Some(_)) => {
                return Err(AppError::Validation(format!(
                    "only delegate decisions may name a delegate (item '{item_id}')"
                )));
            }
            (_, None) => {}
        }

        Ok(Self {
            item_id,
            outcome,
            expires_at,
            delegate_to,
            comment: comment.filter(|value| !value.trim().is_empty()),
            decided_by,
            decided_at: now,
        })
    }

    /// Returns the decided item.
    #[must_use]
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    /// Returns the outcome.
    #[must_use]
    pub fn outcome(&self) -> DecisionOutcome {
        self.outcome
    }

    /// Returns the expiry of a time-bound decision.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns the delegate of a delegate decision.
    #[must_use]
    pub fn delegate_to(&self) -> Option<&ReviewerId> {
        self.delegate_to.as_ref()
    }

    /// Returns the reviewer comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the deciding reviewer.
    #[must_use]
    pub fn decided_by(&self) -> &ReviewerId {
        &self.decided_by
    }

    /// Returns the decision timestamp.
    #[must_use]
    pub fn decided_at(&self) -> DateTime<Utc> {
        self.decided_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{Decision, DecisionOutcome, DecisionRequest};
    use crate::{ItemId, ReviewerId};

    fn ids() -> (ItemId, ReviewerId) {
        (
            ItemId::new("i-1").unwrap_or_else(|_| unreachable!()),
            ReviewerId::new("rev-1").unwrap_or_else(|_| unreachable!()),
        )
    }

    #[test]
    fn time_bound_requires_future_expiry() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).single().unwrap_or_default();
        let (item_id, reviewer) = ids();

        let missing = Decision::new(
            item_id.clone(),
            DecisionRequest::new(DecisionOutcome::TimeBound),
            reviewer.clone(),
            now,
        );
        assert!(missing.is_err());

        let past = Decision::new(
            item_id.clone(),
            DecisionRequest::time_bound(now - Duration::days(1)),
            reviewer.clone(),
            now,
        );
        assert!(past.is_err());

        let future = Decision::new(
            item_id,
            DecisionRequest::time_bound(now + Duration::days(30)),
            reviewer,
            now,
        );
        assert!(future.is_ok());
    }

    #[test]
    fn expiry_is_rejected_on_other_outcomes() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).single().unwrap_or_default();
        let (item_id, reviewer) = ids();
        let mut request = DecisionRequest::new(DecisionOutcome::Keep);
        request.expires_at = Some(now + Duration::days(5));

        assert!(Decision::new(item_id, request, reviewer, now).is_err());
    }

    #[test]
    fn delegation_requires_another_reviewer() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).single().unwrap_or_default();
        let (item_id, reviewer) = ids();

        let to_self = Decision::new(
            item_id.clone(),
            DecisionRequest::delegate(reviewer.clone()),
            reviewer.clone(),
            now,
        );
        assert!(to_self.is_err());

        let other = ReviewerId::new("rev-2").unwrap_or_else(|_| unreachable!());
        let delegated = Decision::new(item_id, DecisionRequest::delegate(other), reviewer, now);
        assert!(delegated.is_ok());
    }
}
