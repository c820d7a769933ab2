//! JSON file adapters for policy documents and access snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use recert_application::{PeerUsage, PolicyStore};
use recert_core::{AppError, AppResult};
use recert_domain::{AccessItem, Entitlement, Identity, SodRule, SubjectId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Entitlement catalog plus segregation-of-duties rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Entitlement catalog.
    #[serde(default)]
    pub entitlements: Vec<Entitlement>,
    /// Rules over catalog entitlements.
    #[serde(default)]
    pub rules: Vec<SodRule>,
}

impl PolicyDocument {
    /// Builds the validated policy store.
    pub fn into_store(self) -> AppResult<PolicyStore> {
        let entitlement_count = self.entitlements.len();
        let rule_count = self.rules.len();
        let store = PolicyStore::load(self.entitlements, self.rules)?;

        info!(
            entitlements = entitlement_count,
            rules = rule_count,
            fingerprint = store.fingerprint(),
            "policy loaded"
        );

        Ok(store)
    }
}

/// Point-in-time export of identities, their access and peer usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessSnapshot {
    /// Governed identities.
    #[serde(default)]
    pub identities: Vec<Identity>,
    /// Access items across all identities.
    #[serde(default)]
    pub access_items: Vec<AccessItem>,
    /// Peer usage ratio per entitlement.
    #[serde(default)]
    pub peer_usage: PeerUsage,
}

/// One identity with the items it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAccess {
    /// Governed identity.
    pub identity: Identity,
    /// Items held by the identity, in snapshot order.
    pub items: Vec<AccessItem>,
}

impl AccessSnapshot {
    /// Groups access items by identity, ordered by subject id.
    ///
    /// Items whose subject has no identity record are skipped with a warning.
    #[must_use]
    pub fn subjects(&self) -> Vec<SubjectAccess> {
        let mut grouped: BTreeMap<&SubjectId, SubjectAccess> = self
            .identities
            .iter()
            .map(|identity| {
                (
                    identity.subject_id(),
                    SubjectAccess {
                        identity: identity.clone(),
                        items: Vec::new(),
                    },
                )
            })
            .collect();

        for item in &self.access_items {
            match grouped.get_mut(item.subject_id()) {
                Some(subject) => subject.items.push(item.clone()),
                None => warn!(
                    item_id = %item.item_id(),
                    subject_id = %item.subject_id(),
                    "skipping access item without identity record"
                ),
            }
        }

        grouped.into_values().collect()
    }

    fn validate(&self) -> AppResult<()> {
        let mut subjects = BTreeSet::new();
        for identity in &self.identities {
            if !subjects.insert(identity.subject_id()) {
                return Err(AppError::Validation(format!(
                    "identity '{}' appears more than once in snapshot",
                    identity.subject_id()
                )));
            }
        }

        let mut items = BTreeSet::new();
        for item in &self.access_items {
            if !items.insert(item.item_id()) {
                return Err(AppError::Validation(format!(
                    "access item '{}' appears more than once in snapshot",
                    item.item_id()
                )));
            }
        }

        if let Some((entitlement_id, usage)) = self
            .peer_usage
            .iter()
            .find(|(_, usage)| !(0.0..=1.0).contains(*usage))
        {
            return Err(AppError::Validation(format!(
                "peer usage for '{entitlement_id}' must be within [0, 1], got {usage}"
            )));
        }

        Ok(())
    }
}

/// Parses a policy document and builds the policy store.
pub fn parse_policy_document(raw: &str) -> AppResult<PolicyStore> {
    let document: PolicyDocument = serde_json::from_str(raw)
        .map_err(|error| AppError::PolicyLoad(format!("invalid policy document: {error}")))?;

    document.into_store()
}

/// Parses and validates an access snapshot.
pub fn parse_access_snapshot(raw: &str) -> AppResult<AccessSnapshot> {
    let snapshot: AccessSnapshot = serde_json::from_str(raw)
        .map_err(|error| AppError::Validation(format!("invalid access snapshot: {error}")))?;
    snapshot.validate()?;

    info!(
        identities = snapshot.identities.len(),
        access_items = snapshot.access_items.len(),
        peer_usage_entries = snapshot.peer_usage.len(),
        "access snapshot loaded"
    );

    Ok(snapshot)
}

/// Reads and loads a policy document file.
pub async fn load_policy_document(path: &Path) -> AppResult<PolicyStore> {
    let raw = read_file(path).await?;
    parse_policy_document(raw.as_str())
}

/// Reads and loads an access snapshot file.
pub async fn load_access_snapshot(path: &Path) -> AppResult<AccessSnapshot> {
    let raw = read_file(path).await?;
    parse_access_snapshot(raw.as_str())
}

async fn read_file(path: &Path) -> AppResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|error| {
        AppError::Internal(format!("failed to read '{}': {error}", path.display()))
    })
}

#[cfg(test)]
mod tests;
