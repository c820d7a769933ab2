//! Infrastructure adapters for review engine ports.

#![forbid(unsafe_code)]

mod in_memory_campaign_repository;
mod in_memory_review_session_repository;
mod json_documents;
mod tracing_review_audit_sink;

pub use in_memory_campaign_repository::InMemoryCampaignRepository;
pub use in_memory_review_session_repository::InMemoryReviewSessionRepository;
pub use json_documents::{
    AccessSnapshot, PolicyDocument, SubjectAccess, load_access_snapshot, load_policy_document,
    parse_access_snapshot, parse_policy_document,
};
pub use tracing_review_audit_sink::TracingReviewAuditSink;
