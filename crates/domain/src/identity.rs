use chrono::{DateTime, Utc};
use recert_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::SubjectId;

/// Lifecycle status of a governed identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    /// Identity is active in the authoritative source.
    #[default]
    Active,
    /// Identity is temporarily disabled.
    Inactive,
    /// Identity has left the organization.
    Terminated,
}

/// Governed identity whose access is under review.
///
/// Optional attributes are explicit; absent values are `None`, never guessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    subject_id: SubjectId,
    display_name: NonEmptyString,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    manager_id: Option<SubjectId>,
    #[serde(default)]
    status: IdentityStatus,
    #[serde(default)]
    last_login_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Creates an active identity with only the required attributes.
    pub fn new(subject_id: impl Into<String>, display_name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            subject_id: SubjectId::new(subject_id)?,
            display_name: NonEmptyString::new(display_name)?,
            email: None,
            department: None,
            manager_id: None,
            status: IdentityStatus::Active,
            last_login_at: None,
        })
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the department.
    #[must_use]
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Sets the manager subject.
    #[must_use]
    pub fn with_manager(mut self, manager_id: SubjectId) -> Self {
        self.manager_id = Some(manager_id);
        self
    }

    /// Sets the lifecycle status.
    #[must_use]
    pub fn with_status(mut self, status: IdentityStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the last login timestamp.
    #[must_use]
    pub fn with_last_login_at(mut self, last_login_at: DateTime<Utc>) -> Self {
        self.last_login_at = Some(last_login_at);
        self
    }

    /// Returns the subject identifier.
    #[must_use]
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the email, if known.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the department, if known.
    #[must_use]
    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    /// Returns the manager subject, if known.
    #[must_use]
    pub fn manager_id(&self) -> Option<&SubjectId> {
        self.manager_id.as_ref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> IdentityStatus {
        self.status
    }

    /// Returns the last login timestamp, if any was recorded.
    #[must_use]
    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }
}

#[cfg(test)]
mod tests {
    use super::{Identity, IdentityStatus};

    #[test]
    fn missing_optional_attributes_deserialize_as_none() {
        let identity = serde_json::from_value::<Identity>(serde_json::json!({
            "subject_id": "S1",
            "display_name": "Dana Reyes"
        }));
        assert!(identity.is_ok());
        let identity = identity.unwrap_or_else(|_| unreachable!());
        assert_eq!(identity.email(), None);
        assert_eq!(identity.manager_id(), None);
        assert_eq!(identity.status(), IdentityStatus::Active);
    }

    #[test]
    fn identity_requires_display_name() {
        assert!(Identity::new("S1", "").is_err());
    }
}
