//! Strongly typed identifiers for review resources.

use std::fmt::{Display, Formatter};

use recert_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a validated identifier.
            pub fn new(value: impl Into<String>) -> AppResult<Self> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(AppError::Validation(format!(
                        "{} must not be empty or whitespace",
                        $label
                    )));
                }

                Ok(Self(trimmed.to_owned()))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = AppError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                formatter.write_str(self.0.as_str())
            }
        }
    };
}

string_identifier!(
    /// Identifier of a grantable entitlement in the source system catalog.
    EntitlementId,
    "entitlement id"
);

string_identifier!(
    /// Identifier of a governed subject (person or non-human identity).
    SubjectId,
    "subject id"
);

string_identifier!(
    /// Identifier of a segregation-of-duties rule.
    RuleId,
    "rule id"
);

string_identifier!(
    /// Identifier of one access item (entitlement held by one subject).
    ItemId,
    "item id"
);

string_identifier!(
    /// Identifier of one review session.
    SessionId,
    "session id"
);

string_identifier!(
    /// Identifier of one review campaign.
    CampaignId,
    "campaign id"
);

string_identifier!(
    /// Identifier of a reviewer principal.
    ReviewerId,
    "reviewer id"
);
