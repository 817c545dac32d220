use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::Address;

/// Typed argument passed to a contract method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ContractArg {
    Address(Address),
    String(String),
    U32(u32),
    U64(u64),
    I128(i128),
    Bool(bool),
    Bytes(Vec<u8>),
    Vec(Vec<ContractArg>),
}

impl From<Address> for ContractArg {
    fn from(value: Address) -> Self {
        ContractArg::Address(value)
    }
}

impl From<&Address> for ContractArg {
    fn from(value: &Address) -> Self {
        ContractArg::Address(value.clone())
    }
}

impl From<String> for ContractArg {
    fn from(value: String) -> Self {
        ContractArg::String(value)
    }
}

impl From<&str> for ContractArg {
    fn from(value: &str) -> Self {
        ContractArg::String(value.to_string())
    }
}

impl From<u32> for ContractArg {
    fn from(value: u32) -> Self {
        ContractArg::U32(value)
    }
}

impl From<u64> for ContractArg {
    fn from(value: u64) -> Self {
        ContractArg::U64(value)
    }
}

impl From<i128> for ContractArg {
    fn from(value: i128) -> Self {
        ContractArg::I128(value)
    }
}

impl From<bool> for ContractArg {
    fn from(value: bool) -> Self {
        ContractArg::Bool(value)
    }
}

impl<T: Into<ContractArg>> From<Vec<T>> for ContractArg {
    fn from(value: Vec<T>) -> Self {
        ContractArg::Vec(value.into_iter().map(Into::into).collect())
    }
}

/// Named argument, kept in call order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArg {
    pub name: String,
    pub value: ContractArg,
}

/// A single contract invocation to be built, signed and submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Target contract instance
    pub contract: Address,

    /// Method name on the contract
    pub method: String,

    /// Arguments in declaration order
    pub args: Vec<NamedArg>,
}

impl OperationRequest {
    pub fn new(contract: Address, method: impl Into<String>) -> Self {
        Self {
            contract,
            method: method.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<ContractArg>) -> Self {
        self.args.push(NamedArg {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Look up an argument by name
    pub fn get_arg(&self, name: &str) -> Option<&ContractArg> {
        self.args.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    /// Short label used in logs, e.g. `mint@CAQ4DF...MRQ6`
    pub fn label(&self) -> String {
        format!("{}@{}", self.method, self.contract.short())
    }
}

/// Transaction hash returned by the network on submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unsigned transaction envelope wrapping one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedEnvelope {
    /// Account that pays for and authorizes the transaction
    pub source: Address,

    /// Network the envelope is bound to
    pub network_passphrase: String,

    /// Replay-protection nonce
    pub nonce: u64,

    pub request: OperationRequest,

    /// Hex SHA-256 over the canonical encoding of the fields above
    pub payload_hash: String,
}

impl UnsignedEnvelope {
    pub fn new(
        source: Address,
        network_passphrase: impl Into<String>,
        nonce: u64,
        request: OperationRequest,
    ) -> Self {
        let network_passphrase = network_passphrase.into();
        let payload_hash = hex::encode(Self::compute_hash(
            &source,
            &network_passphrase,
            nonce,
            &request,
        ));

        Self {
            source,
            network_passphrase,
            nonce,
            request,
            payload_hash,
        }
    }

    fn compute_hash(
        source: &Address,
        network_passphrase: &str,
        nonce: u64,
        request: &OperationRequest,
    ) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(network_passphrase.as_bytes());
        hasher.update(source.as_str().as_bytes());
        hasher.update(nonce.to_be_bytes());
        // serde_json output for these types is deterministic (no maps)
        let body = serde_json::to_vec(request).unwrap_or_default();
        hasher.update(&body);
        hasher.finalize().into()
    }

    /// Bytes the signer must sign
    pub fn signing_payload(&self) -> [u8; 32] {
        Self::compute_hash(
            &self.source,
            &self.network_passphrase,
            self.nonce,
            &self.request,
        )
    }

    /// Verify the stored hash still matches the contents
    pub fn is_intact(&self) -> bool {
        hex::encode(self.signing_payload()) == self.payload_hash
    }
}

/// Envelope after approval by the external signer.
///
/// Submission consumes the value; once sent it cannot be reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub envelope: UnsignedEnvelope,

    /// Principal that produced the signature
    pub signer: Address,

    /// Hex-encoded signature over `envelope.signing_payload()`
    pub signature: String,
}

impl SignedEnvelope {
    pub fn payload_hash(&self) -> &str {
        &self.envelope.payload_hash
    }

    /// Wire encoding used by the JSON-RPC submission endpoint
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> Address {
        Address::parse("CAQ4DF5FLQHGAUEXYJKTVFFIVHVIUN6XNUE7NW27BJGWEPNHQKZYMRQ6").unwrap()
    }

    fn account() -> Address {
        Address::parse("GDQNY3PBOJOKYZSRMK2S7LHHGWZIUISD4QORETLMXEWXBI7KFZZMKTL3").unwrap()
    }

    #[test]
    fn test_request_builder_keeps_order() {
        let request = OperationRequest::new(contract(), "mint")
            .arg("to", account())
            .arg("amount", 1_000_000i128);

        assert_eq!(request.args.len(), 2);
        assert_eq!(request.args[0].name, "to");
        assert_eq!(request.get_arg("amount"), Some(&ContractArg::I128(1_000_000)));
        assert_eq!(request.label(), "mint@CAQ4DF...MRQ6");
    }

    #[test]
    fn test_envelope_hash_binds_contents() {
        let request = OperationRequest::new(contract(), "initialize").arg("admin", account());
        let a = UnsignedEnvelope::new(account(), "Test Network", 1, request.clone());
        let b = UnsignedEnvelope::new(account(), "Test Network", 2, request.clone());
        let c = UnsignedEnvelope::new(account(), "Public Network", 1, request);

        assert_eq!(a.payload_hash.len(), 64);
        assert!(a.is_intact());
        assert_ne!(a.payload_hash, b.payload_hash);
        assert_ne!(a.payload_hash, c.payload_hash);
    }

    #[test]
    fn test_tampered_envelope_detected() {
        let request = OperationRequest::new(contract(), "mint").arg("amount", 5i128);
        let mut envelope = UnsignedEnvelope::new(account(), "Test Network", 7, request);
        envelope.request.method = "burn".to_string();
        assert!(!envelope.is_intact());
    }

    #[test]
    fn test_vec_arg_conversion() {
        let arg: ContractArg = vec![1u32, 2u32].into();
        assert_eq!(
            arg,
            ContractArg::Vec(vec![ContractArg::U32(1), ContractArg::U32(2)])
        );
    }
}
