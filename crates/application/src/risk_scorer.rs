use chrono::{DateTime, Utc};
use recert_domain::{AccessItem, PrivilegeTier, RiskScore};

use crate::RiskWeights;

/// Inputs of a single risk evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskInput {
    /// Privilege tier of the entitlement.
    pub privilege_tier: PrivilegeTier,
    /// Days since last use, `None` when never used.
    pub days_since_last_use: Option<i64>,
    /// Number of rules the subject triggers.
    pub subject_conflict_count: usize,
}

impl RiskInput {
    /// Derives the input for one item as of a point in time.
    #[must_use]
    pub fn for_item(
        item: &AccessItem,
        privilege_tier: PrivilegeTier,
        subject_conflict_count: usize,
        as_of: DateTime<Utc>,
    ) -> Self {
        Self {
            privilege_tier,
            days_since_last_use: item.days_since_last_use(as_of),
            subject_conflict_count,
        }
    }
}

/// Pure risk scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer {
    weights: RiskWeights,
}

impl RiskScorer {
    /// Creates a scorer with the given weights.
    #[must_use]
    pub fn new(weights: RiskWeights) -> Self {
        Self { weights }
    }

    /// Scores one item; the result is clamped to 0..=100.
    #[must_use]
    pub fn score(&self, input: RiskInput) -> RiskScore {
        let total = self.base(input.privilege_tier)
            + self.staleness_bonus(input.days_since_last_use)
            + self.conflict_penalty(input.subject_conflict_count);

        RiskScore::new(u8::try_from(total.min(100)).unwrap_or(100))
    }

    fn base(&self, privilege_tier: PrivilegeTier) -> u32 {
        u32::from(self.weights.base_score)
            + u32::from(privilege_tier.value()) * u32::from(self.weights.per_tier_weight)
    }

    fn staleness_bonus(&self, days_since_last_use: Option<i64>) -> u32 {
        let max_bonus = u32::from(self.weights.max_staleness_bonus);
        let Some(days) = days_since_last_use else {
            return max_bonus;
        };

        let window = u64::from(self.weights.dormancy_window_days.max(1));
        let days = u64::try_from(days.max(0)).unwrap_or(0);
        let scaled = days.saturating_mul(u64::from(max_bonus)) / window;

        u32::try_from(scaled.min(u64::from(max_bonus))).unwrap_or(max_bonus)
    }

    fn conflict_penalty(&self, conflict_count: usize) -> u32 {
        if conflict_count == 0 {
            return 0;
        }

        let additional = u32::try_from(conflict_count - 1).unwrap_or(u32::MAX);
        let penalty = u32::from(self.weights.first_conflict_penalty).saturating_add(
            additional.saturating_mul(u32::from(self.weights.additional_conflict_penalty)),
        );

        penalty.min(u32::from(self.weights.max_conflict_penalty))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use recert_domain::{PrivilegeTier, RiskLevel};

    use super::{RiskInput, RiskScorer};

    fn input(tier: u8, days: Option<i64>, conflicts: usize) -> RiskInput {
        RiskInput {
            privilege_tier: PrivilegeTier::new(tier).unwrap_or_else(|_| unreachable!()),
            days_since_last_use: days,
            subject_conflict_count: conflicts,
        }
    }

    #[test]
    fn table_of_reference_scores() {
        let scorer = RiskScorer::default();
        let cases = [
            (input(0, Some(0), 0), 10, RiskLevel::Low),
            (input(2, Some(45), 0), 49, RiskLevel::Medium),
            (input(3, None, 0), 76, RiskLevel::High),
            (input(3, Some(3), 1), 67, RiskLevel::Medium),
            (input(4, Some(10), 1), 81, RiskLevel::High),
            (input(4, None, 1), 100, RiskLevel::Critical),
            (input(1, Some(200), 5), 92, RiskLevel::Critical),
        ];

        for (case, expected_score, expected_band) in cases {
            let score = scorer.score(case);
            assert_eq!(score.value(), expected_score, "{case:?}");
            assert_eq!(score.band(), expected_band, "{case:?}");
        }
    }

    #[test]
    fn conflict_penalty_saturates() {
        let scorer = RiskScorer::default();
        let three = scorer.score(input(0, Some(0), 3)).value();
        let twenty = scorer.score(input(0, Some(0), 20)).value();

        assert_eq!(three, 50);
        assert_eq!(three, twenty);
    }

    #[test]
    fn never_used_matches_fully_dormant() {
        let scorer = RiskScorer::default();
        assert_eq!(
            scorer.score(input(2, None, 0)),
            scorer.score(input(2, Some(365), 0))
        );
    }

    proptest! {
        #[test]
        fn staleness_never_lowers_score(
            tier in 0_u8..=4,
            conflicts in 0_usize..6,
            days in 0_i64..1_000,
            extra in 0_i64..1_000,
        ) {
            let scorer = RiskScorer::default();
            let fresher = scorer.score(input(tier, Some(days), conflicts));
            let staler = scorer.score(input(tier, Some(days + extra), conflicts));
            let never = scorer.score(input(tier, None, conflicts));

            prop_assert!(staler.value() >= fresher.value());
            prop_assert!(never.value() >= staler.value());
            prop_assert!(never.value() <= 100);
        }
    }
}
