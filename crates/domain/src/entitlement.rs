use recert_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::EntitlementId;

/// Highest supported privilege tier ordinal.
pub const MAX_PRIVILEGE_TIER: u8 = 4;

/// Kind of grantable access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementKind {
    /// A role bundling other permissions.
    Role,
    /// An atomic application entitlement.
    Entitlement,
}

/// Privilege tier ordinal, 0 (read-only) through 4 (full administrative control).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PrivilegeTier(u8);

impl PrivilegeTier {
    /// Creates a validated privilege tier.
    pub fn new(value: u8) -> AppResult<Self> {
        if value > MAX_PRIVILEGE_TIER {
            return Err(AppError::Validation(format!(
                "privilege tier must be between 0 and {MAX_PRIVILEGE_TIER}, got {value}"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the ordinal value.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PrivilegeTier {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PrivilegeTier> for u8 {
    fn from(value: PrivilegeTier) -> Self {
        value.0
    }
}

/// Atomic grantable permission issued by a source system.
///
/// Governance code only references entitlements; it never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    id: EntitlementId,
    name: NonEmptyString,
    application: NonEmptyString,
    kind: EntitlementKind,
    privilege_tier: PrivilegeTier,
}

impl Entitlement {
    /// Creates a validated entitlement.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        application: impl Into<String>,
        kind: EntitlementKind,
        privilege_tier: u8,
    ) -> AppResult<Self> {
        Ok(Self {
            id: EntitlementId::new(id)?,
            name: NonEmptyString::new(name)?,
            application: NonEmptyString::new(application)?,
            kind,
            privilege_tier: PrivilegeTier::new(privilege_tier)?,
        })
    }

    /// Returns the entitlement identifier.
    #[must_use]
    pub fn id(&self) -> &EntitlementId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the owning application name.
    #[must_use]
    pub fn application(&self) -> &NonEmptyString {
        &self.application
    }

    /// Returns the entitlement kind.
    #[must_use]
    pub fn kind(&self) -> EntitlementKind {
        self.kind
    }

    /// Returns the privilege tier.
    #[must_use]
    pub fn privilege_tier(&self) -> PrivilegeTier {
        self.privilege_tier
    }
}

#[cfg(test)]
mod tests {
    use super::{Entitlement, EntitlementKind, PrivilegeTier};

    #[test]
    fn privilege_tier_rejects_out_of_range_values() {
        assert!(PrivilegeTier::new(4).is_ok());
        assert!(PrivilegeTier::new(5).is_err());
    }

    #[test]
    fn entitlement_requires_application() {
        let entitlement = Entitlement::new("AP_Write", "AP Write", " ", EntitlementKind::Entitlement, 3);
        assert!(entitlement.is_err());
    }

    #[test]
    fn entitlement_deserializes_with_tier_validation() {
        let parsed = serde_json::from_value::<Entitlement>(serde_json::json!({
            "id": "AP_Write",
            "name": "AP Write",
            "application": "SAP",
            "kind": "entitlement",
            "privilege_tier": 9
        }));
        assert!(parsed.is_err());
    }
}
