use rwa_issuance_types::{DecodeError, TxHash};
use thiserror::Error;

/// Failures reported by the external signer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("signer rejected the request: {0}")]
    Rejected(String),

    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

/// Failures talking to the submission endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("network unreachable: {0}")]
    Unreachable(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Failures of a read-only contract query.
///
/// Scoped to the single query that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("contract or entry not found: {0}")]
    NotFound(String),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),
}

impl From<NetworkError> for QueryError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::Unreachable(msg) => QueryError::NetworkUnreachable(msg),
            NetworkError::InvalidResponse(msg) => QueryError::Decode(DecodeError {
                expected: "rpc result",
                found: msg,
            }),
        }
    }
}

/// Outcome classes of [`crate::TransactionExecutor::execute`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("signer rejected: {0}")]
    SignerRejected(String),

    #[error("transaction {hash} failed on-chain")]
    ExecutionFailed { hash: TxHash },

    /// Indeterminate: the transaction may still land
    #[error("transaction {hash} not confirmed after {attempts} polls")]
    Timeout { hash: TxHash, attempts: u32 },
}

impl ExecutorError {
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutorError::NetworkUnreachable(_) => "network_unreachable",
            ExecutorError::SignerRejected(_) => "signer_rejected",
            ExecutorError::ExecutionFailed { .. } => "execution_failed",
            ExecutorError::Timeout { .. } => "timeout",
        }
    }

    /// Hash of the submitted transaction, if submission got that far
    pub fn tx_hash(&self) -> Option<&TxHash> {
        match self {
            ExecutorError::ExecutionFailed { hash } | ExecutorError::Timeout { hash, .. } => {
                Some(hash)
            }
            _ => None,
        }
    }
}

impl From<SignerError> for ExecutorError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::Rejected(msg) => ExecutorError::SignerRejected(msg),
            // An unavailable wallet is indistinguishable from an unreachable network
            SignerError::Unavailable(msg) => ExecutorError::NetworkUnreachable(msg),
        }
    }
}

impl From<NetworkError> for ExecutorError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::Unreachable(msg) | NetworkError::InvalidResponse(msg) => {
                ExecutorError::NetworkUnreachable(msg)
            }
        }
    }
}
