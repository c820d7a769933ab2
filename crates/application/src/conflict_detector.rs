//! Segregation-of-duties conflict detection and fix simulation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use recert_core::{AppError, AppResult};
use recert_domain::{
    AccessItem, ConflictFinding, EntitlementId, ItemId, RuleId, SubjectId, sort_findings,
};
use serde::{Deserialize, Serialize};

use crate::PolicyStore;

/// Proposed change to a subject's access used by "simulate fix".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDelta {
    /// Items about to be granted.
    #[serde(default)]
    pub add: Vec<AccessItem>,
    /// Items about to be revoked.
    #[serde(default)]
    pub remove: Vec<ItemId>,
}

impl AccessDelta {
    /// Creates a delta that only revokes items.
    #[must_use]
    pub fn revoke(item_ids: Vec<ItemId>) -> Self {
        Self {
            add: Vec::new(),
            remove: item_ids,
        }
    }

    /// Returns whether the delta changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Findings before and after applying an [`AccessDelta`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Findings on the current access.
    pub before: Vec<ConflictFinding>,
    /// Findings on the access after the delta.
    pub after: Vec<ConflictFinding>,
    /// Rules no longer triggered after the delta.
    pub resolved_rules: Vec<RuleId>,
    /// Rules newly triggered by the delta.
    pub introduced_rules: Vec<RuleId>,
}

impl SimulationOutcome {
    /// Returns whether the delta leaves no conflict behind.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.after.is_empty()
    }
}

/// Stateless detector over a loaded [`PolicyStore`].
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    policy: Arc<PolicyStore>,
}

impl ConflictDetector {
    /// Creates a detector bound to a policy.
    #[must_use]
    pub fn new(policy: Arc<PolicyStore>) -> Self {
        Self { policy }
    }

    /// Returns the policy this detector reads.
    #[must_use]
    pub fn policy(&self) -> &PolicyStore {
        self.policy.as_ref()
    }

    /// Detects every rule triggered by one subject's access.
    ///
    /// Findings list all of the subject's items holding an entitlement of the
    /// rule and are sorted by severity descending, then rule id.
    pub fn detect(&self, items: &[AccessItem]) -> AppResult<Vec<ConflictFinding>> {
        let Some(subject_id) = single_subject(items)? else {
            return Ok(Vec::new());
        };

        let mut held: BTreeMap<&EntitlementId, Vec<&ItemId>> = BTreeMap::new();
        for item in items {
            held.entry(item.entitlement_id())
                .or_default()
                .push(item.item_id());
        }

        let candidate_rules = held
            .keys()
            .flat_map(|entitlement_id| self.policy.rules_involving(entitlement_id))
            .map(|rule| rule.rule_id())
            .collect::<BTreeSet<_>>();

        let mut findings = Vec::new();
        for rule_id in candidate_rules {
            let Some(rule) = self.policy.rule(rule_id) else {
                continue;
            };

            if !rule
                .entitlement_ids()
                .iter()
                .all(|entitlement_id| held.contains_key(entitlement_id))
            {
                continue;
            }

            let mut item_ids = rule
                .entitlement_ids()
                .iter()
                .filter_map(|entitlement_id| held.get(entitlement_id))
                .flatten()
                .map(|item_id| (*item_id).clone())
                .collect::<Vec<_>>();
            item_ids.sort();

            findings.push(ConflictFinding {
                rule_id: rule.rule_id().clone(),
                subject_id: subject_id.clone(),
                item_ids,
                severity: rule.severity(),
            });
        }

        sort_findings(&mut findings);
        Ok(findings)
    }

    /// Compares findings before and after a proposed access change.
    pub fn simulate(
        &self,
        items: &[AccessItem],
        delta: &AccessDelta,
    ) -> AppResult<SimulationOutcome> {
        let before = self.detect(items)?;

        let held_ids = items.iter().map(AccessItem::item_id).collect::<BTreeSet<_>>();
        if let Some(unknown) = delta.remove.iter().find(|item_id| !held_ids.contains(item_id)) {
            return Err(AppError::Validation(format!(
                "cannot remove item '{unknown}' which the subject does not hold"
            )));
        }
        if let Some(duplicate) = delta
            .add
            .iter()
            .find(|item| held_ids.contains(item.item_id()))
        {
            return Err(AppError::Validation(format!(
                "cannot add item '{}' which the subject already holds",
                duplicate.item_id()
            )));
        }

        let removed = delta.remove.iter().collect::<BTreeSet<_>>();
        let proposed = items
            .iter()
            .filter(|item| !removed.contains(item.item_id()))
            .chain(delta.add.iter())
            .cloned()
            .collect::<Vec<_>>();
        let after = self.detect(proposed.as_slice())?;

        let before_rules = rule_ids(&before);
        let after_rules = rule_ids(&after);

        Ok(SimulationOutcome {
            resolved_rules: before_rules.difference(&after_rules).cloned().collect(),
            introduced_rules: after_rules.difference(&before_rules).cloned().collect(),
            before,
            after,
        })
    }
}

fn single_subject(items: &[AccessItem]) -> AppResult<Option<&SubjectId>> {
    let Some(first) = items.first() else {
        return Ok(None);
    };

    if let Some(other) = items
        .iter()
        .find(|item| item.subject_id() != first.subject_id())
    {
        return Err(AppError::Validation(format!(
            "conflict detection runs per subject, got items for '{}' and '{}'",
            first.subject_id(),
            other.subject_id()
        )));
    }

    Ok(Some(first.subject_id()))
}

fn rule_ids(findings: &[ConflictFinding]) -> BTreeSet<RuleId> {
    findings
        .iter()
        .map(|finding| finding.rule_id.clone())
        .collect()
}
