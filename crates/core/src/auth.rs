use serde::{Deserialize, Serialize};

use crate::TenantId;

/// Authenticated reviewer as handed to the review core by the host.
///
/// Authentication itself happens outside the core; this is only the resolved
/// principal that decisions are attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerIdentity {
    subject: String,
    display_name: String,
    tenant_id: TenantId,
}

impl ReviewerIdentity {
    /// Creates a reviewer identity from authentication and tenancy data.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        tenant_id: TenantId,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            tenant_id,
        }
    }

    /// Returns the stable reviewer subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the reviewer.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the tenant the reviewer acts in.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
