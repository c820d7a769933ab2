//! Review engine components, application services and ports.

#![forbid(unsafe_code)]

mod access_assessor;
mod campaign_aggregator;
mod config;
mod conflict_detector;
mod policy_store;
mod recommendation_engine;
mod review_ports;
mod review_service;
mod risk_scorer;

#[cfg(test)]
mod test_fixtures;

pub use access_assessor::{AccessAssessor, PeerUsage, SubjectAssessment};
pub use campaign_aggregator::{CampaignAggregator, CampaignHealth, CampaignOverview};
pub use config::{CampaignHealthPolicy, RecommendationPolicy, ReviewEngineConfig, RiskWeights};
pub use conflict_detector::{AccessDelta, ConflictDetector, SimulationOutcome};
pub use policy_store::PolicyStore;
pub use recommendation_engine::{RecommendationEngine, RecommendationInput};
pub use review_ports::{
    CampaignRepository, ReviewAuditEvent, ReviewAuditSink, ReviewSessionRepository,
};
pub use review_service::{
    BulkShortcut, CreateCampaignInput, MaterializeSessionInput, MaterializedSession, ReviewService,
};
pub use risk_scorer::{RiskInput, RiskScorer};
