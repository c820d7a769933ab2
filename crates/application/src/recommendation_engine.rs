//! Deterministic keep/revoke/time-bound suggestions per access item.
//!
//! Branches are evaluated top-down and the first match wins:
//!
//! 1. a critical finding touches the item: revoke;
//! 2. never used with a high or critical risk band: revoke;
//! 3. peer usage below the threshold with a medium band: time-bound;
//! 4. otherwise keep, scaled by peer usage.
//!
//! Items without a peer usage signal that miss branches 1 and 2 are flagged
//! for manual review instead of being kept by default.

use chrono::{DateTime, Duration, Utc};
use recert_core::{AppError, AppResult};
use recert_domain::{
    AccessItem, Confidence, ConflictFinding, Recommendation, RecommendationReason,
    RecommendedAction, RiskLevel, RiskScore,
};

use crate::RecommendationPolicy;

/// Signals feeding one recommendation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationInput {
    /// Risk score of the item.
    pub risk_score: RiskScore,
    /// Whether the item was never used.
    pub never_used: bool,
    /// Number of findings that include the item.
    pub touching_findings: usize,
    /// Whether any of those findings is critical.
    pub touches_critical: bool,
    /// Fraction of peers using equivalent access, in `[0, 1]`.
    pub peer_usage: Option<f64>,
}

impl RecommendationInput {
    /// Collects the signals for one item.
    #[must_use]
    pub fn for_item(
        item: &AccessItem,
        risk_score: RiskScore,
        findings: &[ConflictFinding],
        peer_usage: Option<f64>,
    ) -> Self {
        let touching = findings
            .iter()
            .filter(|finding| finding.touches(item.item_id()))
            .collect::<Vec<_>>();

        Self {
            risk_score,
            never_used: item.is_never_used(),
            touching_findings: touching.len(),
            touches_critical: touching.iter().any(|finding| finding.is_critical()),
            peer_usage,
        }
    }
}

/// Recommendation decision table.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationEngine {
    policy: RecommendationPolicy,
}

impl RecommendationEngine {
    /// Creates an engine with the given thresholds.
    #[must_use]
    pub fn new(policy: RecommendationPolicy) -> Self {
        Self { policy }
    }

    /// Returns the recommendation for one item.
    pub fn recommend(
        &self,
        input: &RecommendationInput,
        as_of: DateTime<Utc>,
    ) -> AppResult<Recommendation> {
        if let Some(usage) = input.peer_usage
            && !(0.0..=1.0).contains(&usage)
        {
            return Err(AppError::Validation(format!(
                "peer usage must be within [0, 1], got {usage}"
            )));
        }

        let score = input.risk_score.value();
        let band = input.risk_score.band();

        if input.touches_critical {
            let strength = u8::try_from(input.touching_findings.min(10)).unwrap_or(10);
            return Ok(recommendation(
                RecommendedAction::Revoke,
                90 + strength,
                RecommendationReason::CriticalConflict,
            ));
        }

        if input.never_used && band >= RiskLevel::High {
            let confidence = (60 + score.saturating_sub(70)).min(89);
            return Ok(recommendation(
                RecommendedAction::Revoke,
                confidence,
                RecommendationReason::DormantHighRisk,
            ));
        }

        let Some(usage) = input.peer_usage else {
            return Ok(recommendation(
                RecommendedAction::Flag,
                score,
                RecommendationReason::MissingUsageSignal,
            ));
        };

        let threshold = self.policy.low_usage_threshold;
        if usage < threshold && band == RiskLevel::Medium {
            let expires_at = as_of + Duration::days(i64::from(self.policy.time_bound_window_days));
            return Ok(recommendation(
                RecommendedAction::TimeBound { expires_at },
                50 + scaled(40.0, threshold - usage, threshold),
                RecommendationReason::LowPeerUsage,
            ));
        }

        let confidence = if usage >= threshold {
            50 + scaled(50.0, usage - threshold, 1.0 - threshold)
        } else {
            50 - scaled(20.0, threshold - usage, threshold)
        };

        Ok(recommendation(
            RecommendedAction::Keep,
            confidence,
            RecommendationReason::PeerUsage,
        ))
    }
}

fn recommendation(
    action: RecommendedAction,
    confidence: u8,
    reason: RecommendationReason,
) -> Recommendation {
    Recommendation {
        action,
        confidence: Confidence::saturating(confidence),
        reason,
    }
}

/// Rounds `weight * distance / span` into `0..=weight`.
fn scaled(weight: f64, distance: f64, span: f64) -> u8 {
    if span <= 0.0 {
        return 0;
    }

    (weight * (distance / span).clamp(0.0, 1.0)).round() as u8
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use recert_core::AppError;
    use recert_domain::{
        ConflictFinding, ItemId, RecommendationReason, RecommendedAction, RiskLevel, RiskScore,
        RuleId, SubjectId,
    };

    use crate::test_fixtures::{as_of, item};

    use super::{RecommendationEngine, RecommendationInput};

    fn input(score: u8, never_used: bool, usage: Option<f64>) -> RecommendationInput {
        RecommendationInput {
            risk_score: RiskScore::new(score),
            never_used,
            touching_findings: 0,
            touches_critical: false,
            peer_usage: usage,
        }
    }

    fn finding(rule_id: &str, items: &[&str], severity: RiskLevel) -> ConflictFinding {
        ConflictFinding {
            rule_id: RuleId::new(rule_id).unwrap_or_else(|_| unreachable!()),
            subject_id: SubjectId::new("S1").unwrap_or_else(|_| unreachable!()),
            item_ids: items
                .iter()
                .map(|id| ItemId::new(*id).unwrap_or_else(|_| unreachable!()))
                .collect(),
            severity,
        }
    }

    #[test]
    fn critical_conflict_wins_over_every_other_branch() {
        let engine = RecommendationEngine::default();
        let ap = item("i-ap", "S1", "AP_Write", Some(2));
        let findings = vec![
            finding("R1", &["i-ap", "i-pay"], RiskLevel::Critical),
            finding("R2", &["i-ap", "i-vendor"], RiskLevel::Medium),
        ];

        let signals = RecommendationInput::for_item(&ap, RiskScore::new(81), &findings, Some(0.9));
        assert_eq!(signals.touching_findings, 2);
        assert!(signals.touches_critical);

        let recommendation = engine.recommend(&signals, as_of());
        assert!(recommendation.is_ok());
        let recommendation = recommendation.unwrap_or_else(|_| unreachable!());

        assert_eq!(recommendation.action, RecommendedAction::Revoke);
        assert_eq!(recommendation.confidence.value(), 92);
        assert_eq!(recommendation.reason, RecommendationReason::CriticalConflict);
    }

    #[test]
    fn never_used_high_risk_is_revoked_with_staleness_confidence() {
        let engine = RecommendationEngine::default();
        let high = engine
            .recommend(&input(76, true, Some(0.5)), as_of())
            .unwrap_or_else(|_| unreachable!());
        let critical = engine
            .recommend(&input(100, true, None), as_of())
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(high.action, RecommendedAction::Revoke);
        assert_eq!(high.confidence.value(), 66);
        assert_eq!(critical.confidence.value(), 89);
        assert_eq!(critical.reason, RecommendationReason::DormantHighRisk);
    }

    #[test]
    fn low_usage_medium_risk_is_time_bound() {
        let engine = RecommendationEngine::default();
        let recommendation = engine
            .recommend(&input(55, false, Some(0.05)), as_of())
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            recommendation.action,
            RecommendedAction::TimeBound {
                expires_at: as_of() + Duration::days(30)
            }
        );
        assert_eq!(recommendation.confidence.value(), 82);
    }

    #[test]
    fn keep_confidence_scales_with_usage() {
        let engine = RecommendationEngine::default();
        let widely_used = engine
            .recommend(&input(20, false, Some(1.0)), as_of())
            .unwrap_or_else(|_| unreachable!());
        let at_threshold = engine
            .recommend(&input(20, false, Some(0.25)), as_of())
            .unwrap_or_else(|_| unreachable!());
        let rarely_used = engine
            .recommend(&input(20, false, Some(0.0)), as_of())
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(widely_used.action, RecommendedAction::Keep);
        assert_eq!(widely_used.confidence.value(), 100);
        assert_eq!(at_threshold.confidence.value(), 50);
        assert_eq!(rarely_used.confidence.value(), 30);
    }

    #[test]
    fn missing_usage_signal_is_flagged() {
        let engine = RecommendationEngine::default();
        let recommendation = engine
            .recommend(&input(45, false, None), as_of())
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(recommendation.action, RecommendedAction::Flag);
        assert_eq!(recommendation.confidence.value(), 45);
    }

    #[test]
    fn out_of_range_usage_is_rejected() {
        let engine = RecommendationEngine::default();
        let recommendation = engine.recommend(&input(45, false, Some(1.5)), as_of());

        assert!(matches!(recommendation, Err(AppError::Validation(_))));
    }

    #[test]
    fn critical_revoke_outranks_never_used_revoke() {
        let engine = RecommendationEngine::default();
        let mut critical = input(40, true, None);
        critical.touching_findings = 1;
        critical.touches_critical = true;

        let critical = engine
            .recommend(&critical, as_of())
            .unwrap_or_else(|_| unreachable!());

        for score in 0..=100 {
            let never_used = engine
                .recommend(&input(score, true, Some(0.0)), as_of())
                .unwrap_or_else(|_| unreachable!());
            assert!(critical.confidence >= never_used.confidence, "score {score}");
        }
    }
}
