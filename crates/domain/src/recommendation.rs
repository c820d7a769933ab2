use chrono::{DateTime, Utc};
use recert_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::ItemId;

/// Integer confidence in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    /// Creates a validated confidence value.
    pub fn new(value: u8) -> AppResult<Self> {
        if value > 100 {
            return Err(AppError::Validation(format!(
                "confidence must be between 0 and 100, got {value}"
            )));
        }

        Ok(Self(value))
    }

    /// Creates a confidence value, saturating at 100.
    #[must_use]
    pub fn saturating(value: u8) -> Self {
        Self(value.min(100))
    }

    /// Returns the confidence value.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Confidence {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for u8 {
    fn from(value: Confidence) -> Self {
        value.0
    }
}

/// Suggested reviewer action for one access item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecommendedAction {
    /// Keep the access as is.
    Keep,
    /// Remove the access.
    Revoke,
    /// Keep the access until the suggested expiry.
    TimeBound {
        /// Suggested expiry timestamp.
        expires_at: DateTime<Utc>,
    },
    /// Route to manual review; the engine lacks a signal to decide.
    Flag,
}

impl RecommendedAction {
    /// Returns stable action type value.
    #[must_use]
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Revoke => "revoke",
            Self::TimeBound { .. } => "time_bound",
            Self::Flag => "flag",
        }
    }
}

/// Decision-table branch that produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
    /// A critical conflict touches the item.
    CriticalConflict,
    /// Never used and high or critical risk.
    DormantHighRisk,
    /// Low peer usage on medium-risk access.
    LowPeerUsage,
    /// Usage relative to peers supports keeping the access.
    PeerUsage,
    /// No peer usage signal was available.
    MissingUsageSignal,
}

impl RecommendationReason {
    /// Returns stable reason value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CriticalConflict => "critical_conflict",
            Self::DormantHighRisk => "dormant_high_risk",
            Self::LowPeerUsage => "low_peer_usage",
            Self::PeerUsage => "peer_usage",
            Self::MissingUsageSignal => "missing_usage_signal",
        }
    }
}

/// Engine recommendation for one access item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recommendation {
    /// Suggested action.
    pub action: RecommendedAction,
    /// Confidence in the suggestion.
    pub confidence: Confidence,
    /// Branch that fired.
    pub reason: RecommendationReason,
}

/// Recommendation bound to its item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRecommendation {
    /// Recommended item.
    pub item_id: ItemId,
    /// Recommendation payload.
    pub recommendation: Recommendation,
}
