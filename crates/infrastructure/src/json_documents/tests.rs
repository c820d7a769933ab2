use std::path::Path;

use recert_core::AppError;
use recert_domain::{EntitlementId, RiskLevel};

use super::{load_policy_document, parse_access_snapshot, parse_policy_document};

const POLICY: &str = r#"{
    "entitlements": [
        {"id": "AP_Write", "name": "AP Write", "application": "SAP", "kind": "entitlement", "privilege_tier": 3},
        {"id": "Payment_Approval", "name": "Payment Approval", "application": "SAP", "kind": "entitlement", "privilege_tier": 4},
        {"id": "Expense_View", "name": "Expense View", "application": "Concur", "kind": "role", "privilege_tier": 0}
    ],
    "rules": [
        {
            "rule_id": "R1",
            "name": "Invoice entry versus payment approval",
            "entitlement_ids": ["AP_Write", "Payment_Approval"],
            "severity": "critical"
        }
    ]
}"#;

const SNAPSHOT: &str = r#"{
    "identities": [
        {"subject_id": "S2", "display_name": "Riley Park", "department": "Finance"},
        {"subject_id": "S1", "display_name": "Sam Subject", "email": "sam@example.com"}
    ],
    "access_items": [
        {"item_id": "i-ap", "subject_id": "S1", "entitlement_id": "AP_Write", "granted_at": "2025-01-10T00:00:00Z", "last_used_at": "2026-02-20T00:00:00Z"},
        {"item_id": "i-pay", "subject_id": "S1", "entitlement_id": "Payment_Approval", "granted_at": "2025-01-10T00:00:00Z"},
        {"item_id": "i-exp", "subject_id": "S2", "entitlement_id": "Expense_View", "granted_at": "2025-06-01T00:00:00Z", "last_used_at": "2026-02-27T00:00:00Z"},
        {"item_id": "i-ghost", "subject_id": "S9", "entitlement_id": "Expense_View", "granted_at": "2025-06-01T00:00:00Z"}
    ],
    "peer_usage": {"Expense_View": 0.82, "AP_Write": 0.4}
}"#;

#[test]
fn policy_document_builds_indexed_store() {
    let store = parse_policy_document(POLICY);
    assert!(store.is_ok());
    let store = store.unwrap_or_else(|_| unreachable!());

    let rules = store.rules_involving(
        &EntitlementId::new("Payment_Approval").unwrap_or_else(|_| unreachable!()),
    );
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].severity(), RiskLevel::Critical);
    assert_eq!(store.entitlement_count(), 3);
}

#[test]
fn rule_with_single_entitlement_is_a_load_error() {
    let raw = POLICY.replace(r#"["AP_Write", "Payment_Approval"]"#, r#"["AP_Write"]"#);

    assert!(matches!(
        parse_policy_document(&raw),
        Err(AppError::PolicyLoad(_))
    ));
}

#[test]
fn rule_with_unknown_entitlement_is_a_load_error() {
    let raw = POLICY.replace(r#""Payment_Approval"]"#, r#""Wire_Release"]"#);

    assert!(matches!(
        parse_policy_document(&raw),
        Err(AppError::PolicyLoad(_))
    ));
}

#[test]
fn snapshot_groups_items_by_identity() {
    let snapshot = parse_access_snapshot(SNAPSHOT);
    assert!(snapshot.is_ok());
    let snapshot = snapshot.unwrap_or_default();

    let subjects = snapshot.subjects();
    assert_eq!(subjects.len(), 2);
    assert_eq!(subjects[0].identity.subject_id().as_str(), "S1");
    assert_eq!(subjects[0].items.len(), 2);
    assert!(subjects[0].items[1].is_never_used());
    assert_eq!(subjects[1].items.len(), 1);
    assert_eq!(snapshot.peer_usage.len(), 2);
}

#[test]
fn snapshot_rejects_out_of_range_peer_usage() {
    let raw = SNAPSHOT.replace("0.82", "1.2");

    assert!(matches!(
        parse_access_snapshot(&raw),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn snapshot_rejects_duplicate_items() {
    let raw = SNAPSHOT.replace(r#""item_id": "i-exp""#, r#""item_id": "i-ap""#);

    assert!(matches!(
        parse_access_snapshot(&raw),
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn missing_policy_file_is_internal_error() {
    let result = load_policy_document(Path::new("/nonexistent/recert/policy.json")).await;

    assert!(matches!(result, Err(AppError::Internal(_))));
}
