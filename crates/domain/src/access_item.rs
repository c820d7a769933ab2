use chrono::{DateTime, Utc};
use recert_core::AppResult;
use serde::{Deserialize, Serialize};

use crate::{EntitlementId, ItemId, RiskScore, SubjectId};

/// One entitlement instance held by one subject.
///
/// The review core never creates or revokes grants; it only records
/// decisions about existing items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessItem {
    item_id: ItemId,
    subject_id: SubjectId,
    entitlement_id: EntitlementId,
    granted_at: DateTime<Utc>,
    #[serde(default)]
    last_used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    risk_score: Option<RiskScore>,
}

impl AccessItem {
    /// Creates a validated access item.
    pub fn new(
        item_id: impl Into<String>,
        subject_id: impl Into<String>,
        entitlement_id: impl Into<String>,
        granted_at: DateTime<Utc>,
        last_used_at: Option<DateTime<Utc>>,
    ) -> AppResult<Self> {
        Ok(Self {
            item_id: ItemId::new(item_id)?,
            subject_id: SubjectId::new(subject_id)?,
            entitlement_id: EntitlementId::new(entitlement_id)?,
            granted_at,
            last_used_at,
            risk_score: None,
        })
    }

    /// Returns the item identifier.
    #[must_use]
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    /// Returns the holder subject.
    #[must_use]
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    /// Returns the referenced entitlement.
    #[must_use]
    pub fn entitlement_id(&self) -> &EntitlementId {
        &self.entitlement_id
    }

    /// Returns the grant timestamp.
    #[must_use]
    pub fn granted_at(&self) -> DateTime<Utc> {
        self.granted_at
    }

    /// Returns the last-used timestamp; `None` means never used.
    #[must_use]
    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    /// Returns whether the item has never been used.
    #[must_use]
    pub fn is_never_used(&self) -> bool {
        self.last_used_at.is_none()
    }

    /// Returns whole days since last use, `None` when never used.
    ///
    /// Usage recorded after `as_of` counts as zero days.
    #[must_use]
    pub fn days_since_last_use(&self, as_of: DateTime<Utc>) -> Option<i64> {
        self.last_used_at
            .map(|last_used_at| (as_of - last_used_at).num_days().max(0))
    }

    /// Returns whether the item is dormant for the given window.
    #[must_use]
    pub fn is_dormant(&self, as_of: DateTime<Utc>, window_days: i64) -> bool {
        self.days_since_last_use(as_of)
            .is_none_or(|days| days >= window_days)
    }

    /// Returns the cached risk score, if one was computed.
    #[must_use]
    pub fn risk_score(&self) -> Option<RiskScore> {
        self.risk_score
    }

    /// Returns a copy carrying a freshly computed risk score.
    #[must_use]
    pub fn with_risk_score(mut self, risk_score: RiskScore) -> Self {
        self.risk_score = Some(risk_score);
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::AccessItem;

    #[test]
    fn never_used_item_has_no_usage_age() {
        let as_of = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single().unwrap_or_default();
        let item = AccessItem::new("i-1", "S1", "AP_Write", as_of - Duration::days(400), None);
        assert!(item.is_ok());
        let item = item.unwrap_or_else(|_| unreachable!());

        assert!(item.is_never_used());
        assert_eq!(item.days_since_last_use(as_of), None);
        assert!(item.is_dormant(as_of, 90));
    }

    #[test]
    fn future_usage_counts_as_zero_days() {
        let as_of = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single().unwrap_or_default();
        let item = AccessItem::new(
            "i-1",
            "S1",
            "AP_Write",
            as_of - Duration::days(10),
            Some(as_of + Duration::days(2)),
        );
        let item = item.unwrap_or_else(|_| unreachable!());

        assert_eq!(item.days_since_last_use(as_of), Some(0));
        assert!(!item.is_dormant(as_of, 90));
    }
}
