//! Read-only catalog of entitlements and segregation-of-duties rules.
//!
//! All referential checks happen in [`PolicyStore::load`]; lookups never fail
//! and never touch anything outside the store.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use recert_core::{AppError, AppResult};
use recert_domain::{Entitlement, EntitlementId, RuleId, SodRule};
use sha2::{Digest, Sha256};

/// Loaded policy with an inverted index from entitlement to rules.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    entitlements: HashMap<EntitlementId, Entitlement>,
    rules: BTreeMap<RuleId, SodRule>,
    rules_by_entitlement: HashMap<EntitlementId, BTreeSet<RuleId>>,
    fingerprint: String,
}

impl PolicyStore {
    /// Loads and cross-checks a catalog and rule set.
    ///
    /// Rejects duplicate ids and rules that reference entitlements missing
    /// from the catalog, so a partially valid policy is never served.
    pub fn load(entitlements: Vec<Entitlement>, rules: Vec<SodRule>) -> AppResult<Self> {
        let mut catalog = HashMap::with_capacity(entitlements.len());
        for entitlement in entitlements {
            let entitlement_id = entitlement.id().clone();
            if catalog.insert(entitlement_id.clone(), entitlement).is_some() {
                return Err(AppError::PolicyLoad(format!(
                    "entitlement '{entitlement_id}' is defined more than once"
                )));
            }
        }

        let mut rule_map = BTreeMap::new();
        let mut rules_by_entitlement: HashMap<EntitlementId, BTreeSet<RuleId>> = HashMap::new();
        for rule in rules {
            let unknown = rule
                .entitlement_ids()
                .iter()
                .filter(|entitlement_id| !catalog.contains_key(*entitlement_id))
                .map(EntitlementId::as_str)
                .collect::<Vec<_>>();
            if !unknown.is_empty() {
                return Err(AppError::PolicyLoad(format!(
                    "rule '{}' references unknown entitlements: {}",
                    rule.rule_id(),
                    unknown.join(", ")
                )));
            }

            for entitlement_id in rule.entitlement_ids() {
                rules_by_entitlement
                    .entry(entitlement_id.clone())
                    .or_default()
                    .insert(rule.rule_id().clone());
            }

            let rule_id = rule.rule_id().clone();
            if rule_map.insert(rule_id.clone(), rule).is_some() {
                return Err(AppError::PolicyLoad(format!(
                    "rule '{rule_id}' is defined more than once"
                )));
            }
        }

        let fingerprint = fingerprint_rules(&rule_map);

        Ok(Self {
            entitlements: catalog,
            rules: rule_map,
            rules_by_entitlement,
            fingerprint,
        })
    }

    /// Returns rules that involve the entitlement, ordered by rule id.
    #[must_use]
    pub fn rules_involving(&self, entitlement_id: &EntitlementId) -> Vec<&SodRule> {
        self.rules_by_entitlement
            .get(entitlement_id)
            .map(|rule_ids| {
                rule_ids
                    .iter()
                    .filter_map(|rule_id| self.rules.get(rule_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns every rule, ordered by rule id.
    #[must_use]
    pub fn all_rules(&self) -> Vec<&SodRule> {
        self.rules.values().collect()
    }

    /// Returns one rule.
    #[must_use]
    pub fn rule(&self, rule_id: &RuleId) -> Option<&SodRule> {
        self.rules.get(rule_id)
    }

    /// Returns one catalog entitlement.
    #[must_use]
    pub fn entitlement(&self, entitlement_id: &EntitlementId) -> Option<&Entitlement> {
        self.entitlements.get(entitlement_id)
    }

    /// Returns the number of catalog entitlements.
    #[must_use]
    pub fn entitlement_count(&self) -> usize {
        self.entitlements.len()
    }

    /// Returns the SHA-256 fingerprint of the rule set.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        self.fingerprint.as_str()
    }
}

fn fingerprint_rules(rules: &BTreeMap<RuleId, SodRule>) -> String {
    let mut hasher = Sha256::new();
    for rule in rules.values() {
        hasher.update(rule.rule_id().as_str().as_bytes());
        hasher.update([0x1f]);
        hasher.update(rule.severity().as_str().as_bytes());
        for entitlement_id in rule.entitlement_ids() {
            hasher.update([0x1f]);
            hasher.update(entitlement_id.as_str().as_bytes());
        }
        hasher.update([0x1e]);
    }

    hex::encode(hasher.finalize())
}
