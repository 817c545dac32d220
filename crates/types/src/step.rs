use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TxHash;

/// Failure policy attached to a pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepPolicy {
    /// Failure aborts the remaining steps
    Fatal,
    /// Failure is recorded and execution continues
    BestEffort,
}

impl fmt::Display for StepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepPolicy::Fatal => f.write_str("FATAL"),
            StepPolicy::BestEffort => f.write_str("BEST_EFFORT"),
        }
    }
}

/// Audit record for one attempted step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub success: bool,
    pub tx_hash: Option<TxHash>,
    pub error: Option<String>,
    pub policy: StepPolicy,
}

impl StepResult {
    pub fn succeeded(step_name: impl Into<String>, policy: StepPolicy, tx_hash: Option<TxHash>) -> Self {
        Self {
            step_name: step_name.into(),
            success: true,
            tx_hash,
            error: None,
            policy,
        }
    }

    pub fn failed(step_name: impl Into<String>, policy: StepPolicy, error: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            success: false,
            tx_hash: None,
            error: Some(error.into()),
            policy,
        }
    }

    pub fn is_fatal_failure(&self) -> bool {
        !self.success && self.policy == StepPolicy::Fatal
    }
}
