use std::collections::BTreeSet;

use recert_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{EntitlementId, RiskLevel, RuleId};

/// Segregation-of-duties rule: entitlements that may not co-occur on one subject.
///
/// Rules are authored outside the review core and are read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SodRuleInput", into = "SodRuleInput")]
pub struct SodRule {
    rule_id: RuleId,
    name: NonEmptyString,
    description: Option<String>,
    entitlement_ids: BTreeSet<EntitlementId>,
    severity: RiskLevel,
}

/// Input payload used to construct a validated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SodRuleInput {
    /// Stable rule identifier.
    pub rule_id: String,
    /// Human-readable rule name.
    pub name: String,
    /// Optional rule description.
    #[serde(default)]
    pub description: Option<String>,
    /// Mutually exclusive entitlement ids.
    pub entitlement_ids: Vec<String>,
    /// Severity reported for violations.
    pub severity: RiskLevel,
}

impl SodRule {
    /// Creates a validated rule.
    pub fn new(input: SodRuleInput) -> AppResult<Self> {
        let SodRuleInput {
            rule_id,
            name,
            description,
            entitlement_ids,
            severity,
        } = input;

        let rule_id = RuleId::new(rule_id)?;
        let entitlement_ids = entitlement_ids
            .into_iter()
            .map(EntitlementId::new)
            .collect::<AppResult<BTreeSet<_>>>()?;

        if entitlement_ids.len() < 2 {
            return Err(AppError::Validation(format!(
                "rule '{rule_id}' must reference at least two distinct entitlements"
            )));
        }

        Ok(Self {
            rule_id,
            name: NonEmptyString::new(name)?,
            description: description.filter(|value| !value.trim().is_empty()),
            entitlement_ids,
            severity,
        })
    }

    /// Returns the rule identifier.
    #[must_use]
    pub fn rule_id(&self) -> &RuleId {
        &self.rule_id
    }

    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the mutually exclusive entitlement ids in ascending order.
    #[must_use]
    pub fn entitlement_ids(&self) -> &BTreeSet<EntitlementId> {
        &self.entitlement_ids
    }

    /// Returns the rule severity.
    #[must_use]
    pub fn severity(&self) -> RiskLevel {
        self.severity
    }

    /// Returns whether the rule involves the entitlement.
    #[must_use]
    pub fn involves(&self, entitlement_id: &EntitlementId) -> bool {
        self.entitlement_ids.contains(entitlement_id)
    }
}

impl TryFrom<SodRuleInput> for SodRule {
    type Error = AppError;

    fn try_from(value: SodRuleInput) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SodRule> for SodRuleInput {
    fn from(value: SodRule) -> Self {
        Self {
            rule_id: value.rule_id.into(),
            name: value.name.into(),
            description: value.description,
            entitlement_ids: value.entitlement_ids.into_iter().map(String::from).collect(),
            severity: value.severity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SodRule, SodRuleInput};
    use crate::RiskLevel;

    fn input(entitlement_ids: &[&str]) -> SodRuleInput {
        SodRuleInput {
            rule_id: "R1".to_owned(),
            name: "Invoice entry vs payment approval".to_owned(),
            description: None,
            entitlement_ids: entitlement_ids.iter().map(|id| (*id).to_owned()).collect(),
            severity: RiskLevel::Critical,
        }
    }

    #[test]
    fn rule_requires_two_distinct_entitlements() {
        assert!(SodRule::new(input(&["AP_Write"])).is_err());
        assert!(SodRule::new(input(&["AP_Write", "AP_Write"])).is_err());
        assert!(SodRule::new(input(&["AP_Write", "Payment_Approval"])).is_ok());
    }

    #[test]
    fn rule_deserialization_enforces_invariants() {
        let parsed = serde_json::from_value::<SodRule>(serde_json::json!({
            "rule_id": "R9",
            "name": "Single",
            "entitlement_ids": ["only_one"],
            "severity": "high"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn blank_description_is_dropped() {
        let mut payload = input(&["A", "B"]);
        payload.description = Some("  ".to_owned());
        let rule = SodRule::new(payload);
        assert!(rule.is_ok());
        let rule = rule.unwrap_or_else(|_| unreachable!());
        assert_eq!(rule.description(), None);
    }
}
