//! Ledger access for the RWA issuance pipeline
//!
//! The [`TransactionExecutor`] drives one contract call through
//! build, sign, submit and confirmation polling. The network and the
//! signer are reached only through the [`Signer`], [`SubmissionClient`] and
//! [`QueryClient`] traits, so orchestrators can run against a live RPC
//! endpoint, a local keypair or the scriptable [`mock::MockLedger`].

pub mod client;
pub mod error;
pub mod executor;
pub mod keypair;
pub mod mock;
pub mod rpc;

pub use client::{run_query, QueryClient, Signer, SubmissionClient};
pub use error::{ExecutorError, NetworkError, QueryError, SignerError};
pub use executor::{PollConfig, TransactionExecutor, TxOutcome};
pub use keypair::KeypairSigner;
pub use rpc::{JsonRpcClient, RpcConfig};
