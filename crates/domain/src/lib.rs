//! Domain entities and invariants of the access-review core.

#![forbid(unsafe_code)]

mod access_item;
mod audit;
mod campaign;
mod conflict;
mod decision;
mod entitlement;
mod identifiers;
mod identity;
mod recommendation;
mod review_session;
mod risk;
mod sod;

pub use access_item::AccessItem;
pub use audit::ReviewAuditAction;
pub use campaign::{Campaign, CampaignStatus};
pub use conflict::{ConflictFinding, sort_findings};
pub use decision::{Decision, DecisionOutcome, DecisionRequest};
pub use entitlement::{Entitlement, EntitlementKind, MAX_PRIVILEGE_TIER, PrivilegeTier};
pub use identifiers::{CampaignId, EntitlementId, ItemId, ReviewerId, RuleId, SessionId, SubjectId};
pub use identity::{Identity, IdentityStatus};
pub use recommendation::{
    Confidence, ItemRecommendation, Recommendation, RecommendationReason, RecommendedAction,
};
pub use review_session::{
    ReviewLine, ReviewProgress, ReviewSession, ReviewSessionInput, ReviewSessionSnapshot,
    SessionState, SnapshotItem,
};
pub use risk::{RiskLevel, RiskScore};
pub use sod::{SodRule, SodRuleInput};
