use async_trait::async_trait;
use rwa_issuance_types::{
    Address, ConfirmationStatus, ContractQuery, NamedArg, SignedEnvelope, TxHash,
    UnsignedEnvelope,
};
use serde_json::Value;

use crate::{NetworkError, QueryError, SignerError};

/// External signer (wallet or local key).
///
/// `sign` may wait indefinitely for user approval. The only way out is a
/// rejection from the signer itself.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Principal whose signature this signer produces
    fn address(&self) -> &Address;

    async fn sign(&self, envelope: UnsignedEnvelope) -> Result<SignedEnvelope, SignerError>;
}

/// Network endpoint accepting signed transactions
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    /// Next sequence number to use for envelopes sourced from `account`
    async fn next_sequence(&self, account: &Address) -> Result<u64, NetworkError>;

    /// Submit a signed envelope and return the provisional reference
    async fn submit(&self, envelope: SignedEnvelope) -> Result<TxHash, NetworkError>;

    async fn get_status(&self, hash: &TxHash) -> Result<ConfirmationStatus, NetworkError>;
}

/// Read-only contract query endpoint
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn call(
        &self,
        contract: &Address,
        method: &str,
        args: &[NamedArg],
    ) -> Result<Value, QueryError>;
}

/// Run a typed query and decode its result
pub async fn run_query<Q>(
    client: &dyn QueryClient,
    contract: &Address,
    query: &Q,
) -> Result<Q::Output, QueryError>
where
    Q: ContractQuery + Sync,
{
    let raw = client.call(contract, query.method(), &query.args()).await?;
    Ok(query.decode(raw)?)
}
