use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confirmation state of a submitted transaction as reported by the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationStatus {
    /// Not yet indexed; treated the same as `Pending`
    NotFound,
    Pending,
    Success,
    Failed,
}

impl ConfirmationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConfirmationStatus::Success | ConfirmationStatus::Failed)
    }

    /// Fold a newly observed status into the current one.
    ///
    /// Terminal states are sticky: once `Success` or `Failed` has been seen,
    /// later observations are ignored.
    pub fn advance(self, observed: ConfirmationStatus) -> ConfirmationStatus {
        if self.is_terminal() {
            self
        } else {
            observed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationStatus::NotFound => "NOT_FOUND",
            ConfirmationStatus::Pending => "PENDING",
            ConfirmationStatus::Success => "SUCCESS",
            ConfirmationStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfirmationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_FOUND" => Ok(ConfirmationStatus::NotFound),
            "PENDING" => Ok(ConfirmationStatus::Pending),
            "SUCCESS" => Ok(ConfirmationStatus::Success),
            "FAILED" => Ok(ConfirmationStatus::Failed),
            other => Err(format!("unknown confirmation status: {other}")),
        }
    }
}
