use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use recert_core::{AppError, AppResult};
use recert_domain::{
    AccessItem, ConflictFinding, EntitlementId, Identity, ItemId, RecommendedAction, ReviewLine,
    SubjectId,
};
use serde::{Deserialize, Serialize};

use crate::{
    ConflictDetector, PolicyStore, RecommendationEngine, RecommendationInput, ReviewEngineConfig,
    RiskInput, RiskScorer,
};

/// Fraction of peers using each entitlement, in `[0, 1]`.
pub type PeerUsage = BTreeMap<EntitlementId, f64>;

/// Findings, scores and recommendations for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAssessment {
    /// Assessed subject.
    pub subject_id: SubjectId,
    /// Conflict findings, most severe first.
    pub findings: Vec<ConflictFinding>,
    /// Items with their cached risk score, in input order.
    pub items: Vec<AccessItem>,
    /// Per-item review lines, in input order.
    pub lines: Vec<ReviewLine>,
}

impl SubjectAssessment {
    /// Returns items the engine recommends revoking.
    #[must_use]
    pub fn revoke_candidates(&self) -> Vec<ItemId> {
        self.lines
            .iter()
            .filter(|line| line.recommendation.action == RecommendedAction::Revoke)
            .map(|line| line.item_id.clone())
            .collect()
    }
}

/// Runs detection, scoring and recommendation over one subject's access.
#[derive(Debug, Clone)]
pub struct AccessAssessor {
    detector: ConflictDetector,
    scorer: RiskScorer,
    recommender: RecommendationEngine,
}

impl AccessAssessor {
    /// Creates an assessor from a policy and validated configuration.
    pub fn new(policy: Arc<PolicyStore>, config: ReviewEngineConfig) -> AppResult<Self> {
        config.validate()?;

        Ok(Self {
            detector: ConflictDetector::new(policy),
            scorer: RiskScorer::new(config.risk_weights),
            recommender: RecommendationEngine::new(config.recommendation),
        })
    }

    /// Returns the conflict detector.
    #[must_use]
    pub fn detector(&self) -> &ConflictDetector {
        &self.detector
    }

    /// Assesses the access held by one identity as of a point in time.
    pub fn assess(
        &self,
        identity: &Identity,
        items: &[AccessItem],
        peer_usage: &PeerUsage,
        as_of: DateTime<Utc>,
    ) -> AppResult<SubjectAssessment> {
        let mut seen = BTreeSet::new();
        for item in items {
            if item.subject_id() != identity.subject_id() {
                return Err(AppError::Validation(format!(
                    "item '{}' belongs to '{}', not to '{}'",
                    item.item_id(),
                    item.subject_id(),
                    identity.subject_id()
                )));
            }

            if !seen.insert(item.item_id()) {
                return Err(AppError::Validation(format!(
                    "item '{}' is listed more than once",
                    item.item_id()
                )));
            }
        }

        let findings = self.detector.detect(items)?;
        let policy = self.detector.policy();

        let mut scored_items = Vec::with_capacity(items.len());
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let entitlement = policy.entitlement(item.entitlement_id()).ok_or_else(|| {
                AppError::Validation(format!(
                    "item '{}' references unknown entitlement '{}'",
                    item.item_id(),
                    item.entitlement_id()
                ))
            })?;

            let risk_score = self.scorer.score(RiskInput::for_item(
                item,
                entitlement.privilege_tier(),
                findings.len(),
                as_of,
            ));
            let signals = RecommendationInput::for_item(
                item,
                risk_score,
                findings.as_slice(),
                peer_usage.get(item.entitlement_id()).copied(),
            );
            let recommendation = self.recommender.recommend(&signals, as_of)?;

            lines.push(ReviewLine {
                item_id: item.item_id().clone(),
                entitlement_id: item.entitlement_id().clone(),
                risk_score,
                recommendation,
                critical_conflict: signals.touches_critical,
                never_used: item.is_never_used(),
            });
            scored_items.push(item.clone().with_risk_score(risk_score));
        }

        Ok(SubjectAssessment {
            subject_id: identity.subject_id().clone(),
            findings,
            items: scored_items,
            lines,
        })
    }
}
