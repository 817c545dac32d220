use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use rwa_issuance_types::{Address, SignedEnvelope, UnsignedEnvelope};
use tracing::debug;

use crate::{Signer, SignerError};

/// Local ed25519 signer for headless operation
pub struct KeypairSigner {
    signing_key: SigningKey,
    address: Address,
}

impl KeypairSigner {
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self, SignerError> {
        let signing_key = SigningKey::from_bytes(secret);
        let address = Address::from_account_key(signing_key.verifying_key().to_bytes());
        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Parse a hex-encoded 32-byte seed
    pub fn from_hex(secret: &str) -> Result<Self, SignerError> {
        let bytes = hex::decode(secret.trim())
            .map_err(|e| SignerError::Unavailable(format!("invalid secret key hex: {}", e)))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SignerError::Unavailable("secret key must be 32 bytes".to_string()))?;
        Self::from_bytes(&seed)
    }

    pub fn generate() -> Result<Self, SignerError> {
        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        Self::from_bytes(&signing_key.to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Check a signature produced by this key
    pub fn verify(&self, signed: &SignedEnvelope) -> bool {
        let Ok(raw) = hex::decode(&signed.signature) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&raw) else {
            return false;
        };
        self.verifying_key()
            .verify(&signed.envelope.signing_payload(), &signature)
            .is_ok()
    }
}

#[async_trait]
impl Signer for KeypairSigner {
    fn address(&self) -> &Address {
        &self.address
    }

    async fn sign(&self, envelope: UnsignedEnvelope) -> Result<SignedEnvelope, SignerError> {
        if envelope.source != self.address {
            return Err(SignerError::Rejected(format!(
                "envelope source {} is not this signer",
                envelope.source.short()
            )));
        }

        if !envelope.is_intact() {
            return Err(SignerError::Rejected("payload hash mismatch".to_string()));
        }

        let signature = self.signing_key.sign(&envelope.signing_payload());
        debug!(operation = %envelope.request.label(), "Signed envelope");

        Ok(SignedEnvelope {
            envelope,
            signer: self.address.clone(),
            signature: hex::encode(signature.to_bytes()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rwa_issuance_types::OperationRequest;

    const TOKEN: &str = "CCJGETMTUTETF3QV7EKVE6EIKD45TL2JWYF4VUCCXO3EVPPRRAMPAJ4O";

    #[test]
    fn test_derived_address_is_valid_account() {
        let signer = KeypairSigner::from_bytes(&[7u8; 32]).unwrap();
        let address = signer.address().to_string();
        assert_eq!(address.len(), 56);
        assert!(address.starts_with('G'));
        assert_eq!(Address::parse(&address).as_ref(), Ok(signer.address()));

        let decoded = stellar_strkey::ed25519::PublicKey::from_string(&address).unwrap();
        assert_eq!(decoded.0, signer.verifying_key().to_bytes());
    }

    #[tokio::test]
    async fn test_sign_and_verify() {
        let signer = KeypairSigner::generate().unwrap();
        let request = OperationRequest::new(Address::parse(TOKEN).unwrap(), "mint");
        let envelope = UnsignedEnvelope::new(signer.address().clone(), "Test Network", 1, request);

        let signed = signer.sign(envelope).await.unwrap();
        assert!(signer.verify(&signed));

        let mut tampered = signed.clone();
        tampered.envelope.nonce = 2;
        assert!(!signer.verify(&tampered));
    }

    #[tokio::test]
    async fn test_rejects_foreign_source() {
        let signer = KeypairSigner::from_bytes(&[1u8; 32]).unwrap();
        let other = KeypairSigner::from_bytes(&[2u8; 32]).unwrap();
        let request = OperationRequest::new(Address::parse(TOKEN).unwrap(), "mint");
        let envelope = UnsignedEnvelope::new(other.address().clone(), "Test Network", 1, request);

        let err = signer.sign(envelope).await.unwrap_err();
        assert!(matches!(err, SignerError::Rejected(_)));
    }

    #[test]
    fn test_from_hex_validates_length() {
        assert!(KeypairSigner::from_hex("abcd").is_err());
        assert!(KeypairSigner::from_hex(&"11".repeat(32)).is_ok());
    }
}
