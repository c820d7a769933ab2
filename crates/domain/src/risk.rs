use std::fmt::{Display, Formatter};
use std::str::FromStr;

use recert_core::AppError;
use serde::{Deserialize, Serialize};

/// Four-tier risk vocabulary shared by rule severities and risk bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Informational.
    Low,
    /// Should be addressed.
    Medium,
    /// Requires attention.
    High,
    /// Must be resolved before sign-off.
    Critical,
}

impl RiskLevel {
    /// Maps a 0..=100 score onto the four-tier band.
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::Critical,
            70..=89 => Self::High,
            40..=69 => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl Display for RiskLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(AppError::Validation(format!(
                "unknown risk level '{value}'"
            ))),
        }
    }
}

/// Numeric risk score with its derived band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RiskScore {
    value: u8,
    band: RiskLevel,
}

impl RiskScore {
    /// Creates a score, clamping to 100 and deriving the band.
    #[must_use]
    pub fn new(value: u8) -> Self {
        let value = value.min(100);
        Self {
            value,
            band: RiskLevel::from_score(value),
        }
    }

    /// Returns the score in 0..=100.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns the band derived from the score.
    #[must_use]
    pub fn band(&self) -> RiskLevel {
        self.band
    }
}
