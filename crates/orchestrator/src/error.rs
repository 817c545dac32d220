use rwa_issuance_config::ConfigError;
use rwa_issuance_ledger::{ExecutorError, NetworkError, QueryError};
use rwa_issuance_store::StoreError;
use rwa_issuance_types::{AddressError, TxHash};
use thiserror::Error;

/// Failure of a single pipeline step
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("query failed: {0}")]
    Query(#[from] QueryError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("precondition failed: {0}")]
    Precondition(String),
}

impl StepError {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Executor(e) => e.kind(),
            StepError::Query(QueryError::Decode(_)) => "decode_error",
            StepError::Query(QueryError::NotFound(_)) => "not_found",
            StepError::Query(QueryError::NetworkUnreachable(_)) => "network_unreachable",
            StepError::InvalidInput(_) => "invalid_input",
            StepError::Precondition(_) => "precondition",
        }
    }

    /// Hash of the submitted transaction, when the failure happened after submission
    pub fn tx_hash(&self) -> Option<&TxHash> {
        match self {
            StepError::Executor(e) => e.tx_hash(),
            _ => None,
        }
    }
}

impl From<AddressError> for StepError {
    fn from(err: AddressError) -> Self {
        StepError::InvalidInput(err.to_string())
    }
}

/// Errors surfaced by the deployment flow.
///
/// Network and signer failures never appear here: they end in a fallback record.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("failed to persist deployment record: {0}")]
    Store(#[from] StoreError),
}

/// Errors surfaced by the integration flow
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("lending adapter is administered by {expected}, current signer is {actual}")]
    AdminMismatch { expected: String, actual: String },

    #[error("lending adapter initialization failed: {0}")]
    InitializationFailed(StepError),

    #[error("integration step {step} failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: StepError,
    },

    #[error("precondition query failed: {0}")]
    Query(#[from] QueryError),

    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    #[error("integration of {entity} already in progress")]
    AlreadyInProgress { entity: String },
}

impl IntegrationError {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            IntegrationError::AdminMismatch { .. } => "admin_mismatch",
            IntegrationError::InitializationFailed(_) => "initialization_failed",
            IntegrationError::StepFailed { .. } => "step_failed",
            IntegrationError::Query(_) => "query_failed",
            IntegrationError::Store(_) => "store_error",
            IntegrationError::AlreadyInProgress { .. } => "already_in_progress",
        }
    }
}

/// Builder error
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid address in {field}: {source}")]
    InvalidAddress {
        field: String,
        #[source]
        source: AddressError,
    },

    #[error("invalid risk parameters: {0}")]
    InvalidRiskParameters(String),

    #[error("failed to open record store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to create network client: {0}")]
    Network(#[from] NetworkError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_error_kind_and_hash() {
        let timeout = StepError::from(ExecutorError::Timeout {
            hash: TxHash::new("abc"),
            attempts: 60,
        });
        assert_eq!(timeout.kind(), "timeout");
        assert_eq!(timeout.tx_hash().map(TxHash::as_str), Some("abc"));

        let rejected = StepError::from(ExecutorError::SignerRejected("declined".into()));
        assert_eq!(rejected.kind(), "signer_rejected");
        assert!(rejected.tx_hash().is_none());
    }

    #[test]
    fn test_admin_mismatch_message_names_both_principals() {
        let err = IntegrationError::AdminMismatch {
            expected: "GADMIN".to_string(),
            actual: "GUSER".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("GADMIN"));
        assert!(msg.contains("GUSER"));
        assert_eq!(err.kind(), "admin_mismatch");
    }
}
