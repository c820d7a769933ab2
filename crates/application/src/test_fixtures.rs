use chrono::{DateTime, Duration, TimeZone, Utc};
use recert_domain::{
    AccessItem, CampaignId, Confidence, Entitlement, EntitlementId, EntitlementKind, ItemId,
    Recommendation, RecommendationReason, RecommendedAction, ReviewLine, ReviewSession,
    ReviewSessionInput, ReviewerId, RiskLevel, RiskScore, SessionId, SodRule, SodRuleInput,
    SubjectId,
};

use crate::PolicyStore;

pub(crate) fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(|| unreachable!())
}

pub(crate) fn entitlement(id: &str, tier: u8) -> Entitlement {
    Entitlement::new(
        id,
        id.replace('_', " "),
        "Finance",
        EntitlementKind::Entitlement,
        tier,
    )
    .unwrap_or_else(|_| unreachable!())
}

pub(crate) fn rule(id: &str, entitlement_ids: &[&str], severity: RiskLevel) -> SodRule {
    SodRule::new(SodRuleInput {
        rule_id: id.to_owned(),
        name: format!("rule {id}"),
        description: None,
        entitlement_ids: entitlement_ids.iter().map(|id| (*id).to_owned()).collect(),
        severity,
    })
    .unwrap_or_else(|_| unreachable!())
}

/// Builds an item last used `days_ago` days before [`as_of`], or never.
pub(crate) fn item(
    item_id: &str,
    subject_id: &str,
    entitlement_id: &str,
    days_ago: Option<i64>,
) -> AccessItem {
    AccessItem::new(
        item_id,
        subject_id,
        entitlement_id,
        as_of() - Duration::days(400),
        days_ago.map(|days| as_of() - Duration::days(days)),
    )
    .unwrap_or_else(|_| unreachable!())
}

/// Finance catalog with one critical and one medium rule.
pub(crate) fn finance_policy() -> PolicyStore {
    PolicyStore::load(
        vec![
            entitlement("AP_Write", 3),
            entitlement("Payment_Approval", 4),
            entitlement("Vendor_Master", 2),
            entitlement("Expense_View", 0),
        ],
        vec![
            rule("R1", &["AP_Write", "Payment_Approval"], RiskLevel::Critical),
            rule("R2", &["AP_Write", "Vendor_Master"], RiskLevel::Medium),
        ],
    )
    .unwrap_or_else(|_| unreachable!())
}

pub(crate) fn line(item_id: &str, score: u8, critical_conflict: bool) -> ReviewLine {
    ReviewLine {
        item_id: ItemId::new(item_id).unwrap_or_else(|_| unreachable!()),
        entitlement_id: EntitlementId::new(format!("ent-{item_id}"))
            .unwrap_or_else(|_| unreachable!()),
        risk_score: RiskScore::new(score),
        recommendation: Recommendation {
            action: RecommendedAction::Keep,
            confidence: Confidence::saturating(50),
            reason: RecommendationReason::PeerUsage,
        },
        critical_conflict,
        never_used: false,
    }
}

pub(crate) fn session(
    session_id: &str,
    campaign_id: &str,
    reviewer_id: &str,
    lines: Vec<ReviewLine>,
) -> ReviewSession {
    ReviewSession::new(ReviewSessionInput {
        session_id: SessionId::new(session_id).unwrap_or_else(|_| unreachable!()),
        campaign_id: CampaignId::new(campaign_id).unwrap_or_else(|_| unreachable!()),
        subject_id: SubjectId::new(format!("subject-{session_id}"))
            .unwrap_or_else(|_| unreachable!()),
        reviewer_id: ReviewerId::new(reviewer_id).unwrap_or_else(|_| unreachable!()),
        lines,
        policy_gate_enabled: true,
        policy_fingerprint: "fixture".to_owned(),
        created_at: as_of(),
    })
    .unwrap_or_else(|_| unreachable!())
}
