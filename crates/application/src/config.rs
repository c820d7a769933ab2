//! Tunable weights and thresholds of the review engine.
//!
//! Defaults are placeholders until policy owners supply the real business
//! rules; every value can be overridden by the host.

use recert_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Weights used by the risk scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    /// Score every item starts from.
    pub base_score: u8,
    /// Points added per privilege tier ordinal.
    pub per_tier_weight: u8,
    /// Staleness bonus for never-used or fully dormant items.
    pub max_staleness_bonus: u8,
    /// Days of non-use after which the full staleness bonus applies.
    pub dormancy_window_days: u16,
    /// Penalty for the first triggered rule.
    pub first_conflict_penalty: u8,
    /// Penalty for each additional triggered rule.
    pub additional_conflict_penalty: u8,
    /// Saturation point of the conflict penalty.
    pub max_conflict_penalty: u8,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            base_score: 10,
            per_tier_weight: 12,
            max_staleness_bonus: 30,
            dormancy_window_days: 90,
            first_conflict_penalty: 20,
            additional_conflict_penalty: 10,
            max_conflict_penalty: 40,
        }
    }
}

impl RiskWeights {
    /// Validates weight consistency.
    pub fn validate(&self) -> AppResult<()> {
        if self.dormancy_window_days == 0 {
            return Err(AppError::Validation(
                "dormancy_window_days must be greater than zero".to_owned(),
            ));
        }

        if self.first_conflict_penalty > self.max_conflict_penalty {
            return Err(AppError::Validation(
                "first_conflict_penalty must not exceed max_conflict_penalty".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Thresholds used by the recommendation engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationPolicy {
    /// Peer usage ratio below which usage counts as low.
    pub low_usage_threshold: f64,
    /// Default expiry window for time-bound suggestions.
    pub time_bound_window_days: u16,
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            low_usage_threshold: 0.25,
            time_bound_window_days: 30,
        }
    }
}

impl RecommendationPolicy {
    /// Validates threshold ranges.
    pub fn validate(&self) -> AppResult<()> {
        if !(self.low_usage_threshold > 0.0 && self.low_usage_threshold < 1.0) {
            return Err(AppError::Validation(format!(
                "low_usage_threshold must be within (0, 1), got {}",
                self.low_usage_threshold
            )));
        }

        if self.time_bound_window_days == 0 {
            return Err(AppError::Validation(
                "time_bound_window_days must be greater than zero".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Windows used by campaign health aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignHealthPolicy {
    /// Days before the due date at which open sessions need a reminder.
    pub reminder_lead_days: u16,
    /// Days past the due date after which open sessions escalate.
    pub escalation_grace_days: u16,
}

impl Default for CampaignHealthPolicy {
    fn default() -> Self {
        Self {
            reminder_lead_days: 3,
            escalation_grace_days: 2,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewEngineConfig {
    /// Risk scorer weights.
    pub risk_weights: RiskWeights,
    /// Recommendation thresholds.
    pub recommendation: RecommendationPolicy,
    /// Campaign health windows.
    pub health: CampaignHealthPolicy,
}

impl ReviewEngineConfig {
    /// Validates every section.
    pub fn validate(&self) -> AppResult<()> {
        self.risk_weights.validate()?;
        self.recommendation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::{RecommendationPolicy, ReviewEngineConfig, RiskWeights};

    #[test]
    fn defaults_are_valid() {
        assert!(ReviewEngineConfig::default().validate().is_ok());
    }

    #[test]
    fn threshold_outside_unit_interval_is_rejected() {
        let policy = RecommendationPolicy {
            low_usage_threshold: 1.0,
            ..RecommendationPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn zero_dormancy_window_is_rejected() {
        let weights = RiskWeights {
            dormancy_window_days: 0,
            ..RiskWeights::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let parsed = serde_json::from_str::<ReviewEngineConfig>(
            r#"{"recommendation": {"low_usage_threshold": 0.4}}"#,
        );
        assert!(parsed.is_ok());
        let parsed = parsed.unwrap_or_default();
        assert!((parsed.recommendation.low_usage_threshold - 0.4).abs() < f64::EPSILON);
        assert_eq!(parsed.recommendation.time_bound_window_days, 30);
        assert_eq!(parsed.risk_weights, RiskWeights::default());
    }
}
