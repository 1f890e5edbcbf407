//! Recall quality ratings and input policy

use serde::{Deserialize, Serialize};

use super::algorithm::{MAX_QUALITY, MIN_QUALITY};

/// Rejected quality rating
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QualityError {
    /// Rating outside the 0-5 scale
    #[error(
        "recall rating {0} is outside the allowed range {min}..={max}",
        min = MIN_QUALITY,
        max = MAX_QUALITY
    )]
    OutOfRange(i32),
}

/// How ratings outside `0..=5` are treated before scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityPolicy {
    /// Fail with [`QualityError::OutOfRange`]
    #[default]
    Reject,
    /// Clamp into `0..=5`
    Clamp,
    /// Pass through unchanged; the formulas extrapolate
    Accept,
}

impl QualityPolicy {
    /// Resolve a raw rating under this policy
    pub fn apply(self, quality: i32) -> Result<i32, QualityError> {
        let in_range = (MIN_QUALITY..=MAX_QUALITY).contains(&quality);
        match self {
            QualityPolicy::Reject if !in_range => Err(QualityError::OutOfRange(quality)),
            QualityPolicy::Clamp => Ok(quality.clamp(MIN_QUALITY, MAX_QUALITY)),
            _ => Ok(quality),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPolicy::Reject => "reject",
            QualityPolicy::Clamp => "clamp",
            QualityPolicy::Accept => "accept",
        }
    }
}

impl std::fmt::Display for QualityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QualityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" | "strict" => Ok(QualityPolicy::Reject),
            "clamp" => Ok(QualityPolicy::Clamp),
            "accept" | "passthrough" => Ok(QualityPolicy::Accept),
            _ => Err(format!("Unknown quality policy: {}", s)),
        }
    }
}

/// Human-readable label for a quality rating
pub fn quality_label(quality: i32) -> &'static str {
    match quality {
        0 => "blackout",
        1 => "incorrect, recognised on reveal",
        2 => "incorrect, answer felt familiar",
        3 => "correct with serious difficulty",
        4 => "correct after hesitation",
        5 => "perfect recall",
        _ => "out of range",
    }
}
