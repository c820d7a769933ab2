use serde::{Deserialize, Serialize};

use crate::{ItemId, RiskLevel, RuleId, SubjectId};

/// Violated segregation-of-duties rule on one subject.
///
/// Findings are a derived view over access items and rules; they are
/// recomputed on demand and never treated as source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictFinding {
    /// Violated rule.
    pub rule_id: RuleId,
    /// Subject holding the conflicting access.
    pub subject_id: SubjectId,
    /// Offending items, ascending by item id.
    pub item_ids: Vec<ItemId>,
    /// Severity copied from the rule.
    pub severity: RiskLevel,
}

impl ConflictFinding {
    /// Returns whether the finding references the item.
    #[must_use]
    pub fn touches(&self, item_id: &ItemId) -> bool {
        self.item_ids.iter().any(|candidate| candidate == item_id)
    }

    /// Returns whether the finding has critical severity.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.severity == RiskLevel::Critical
    }
}

/// Sorts findings by severity descending, then rule id ascending.
pub fn sort_findings(findings: &mut [ConflictFinding]) {
    findings.sort_by(|left, right| {
        right
            .severity
            .cmp(&left.severity)
            .then_with(|| left.rule_id.cmp(&right.rule_id))
    });
}
