//! Non-network deployment records
//!
//! When the real issuance path fails, the deployment flow still has to end in
//! a displayable record. [`FallbackGenerator`] builds one from the form alone:
//! fresh identifiers, a random contract id as primary address and the fixed
//! placeholder auxiliaries shared by every fallback record.

use chrono::Utc;
use rand::distributions::Uniform;
use rand::Rng;
use rwa_issuance_store::DeploymentRepository;
use rwa_issuance_types::{
    Address, AuxiliaryAddress, AuxiliaryRole, DeploymentOrigin, DeploymentRecord,
    TokenConfigSnapshot, TokenCreationForm,
};
use tracing::info;
use uuid::Uuid;

use crate::DeploymentError;

/// Length of the opaque reference standing in for a transaction hash
pub const FALLBACK_REFERENCE_LEN: usize = 64;

const REFERENCE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Auxiliary addresses attached to every fallback record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPlaceholders {
    pub compliance: Address,
    pub identity_registry: Address,
    pub claim_topics_registry: Address,
    pub trusted_issuers_registry: Address,
}

impl FallbackPlaceholders {
    pub fn to_auxiliaries(&self) -> Vec<AuxiliaryAddress> {
        vec![
            AuxiliaryAddress::new(AuxiliaryRole::Compliance, self.compliance.as_str()),
            AuxiliaryAddress::new(
                AuxiliaryRole::IdentityRegistry,
                self.identity_registry.as_str(),
            ),
            AuxiliaryAddress::new(
                AuxiliaryRole::ClaimTopicsRegistry,
                self.claim_topics_registry.as_str(),
            ),
            AuxiliaryAddress::new(
                AuxiliaryRole::TrustedIssuersRegistry,
                self.trusted_issuers_registry.as_str(),
            ),
        ]
    }
}

/// Synthesizes and persists `FALLBACK` deployment records
#[derive(Clone)]
pub struct FallbackGenerator {
    placeholders: FallbackPlaceholders,
    repository: DeploymentRepository,
}

impl FallbackGenerator {
    pub fn new(placeholders: FallbackPlaceholders, repository: DeploymentRepository) -> Self {
        Self {
            placeholders,
            repository,
        }
    }

    pub fn placeholders(&self) -> &FallbackPlaceholders {
        &self.placeholders
    }

    /// Build a fallback record without touching the store
    pub fn synthesize(&self, form: &TokenCreationForm, initial_supply: u128) -> DeploymentRecord {
        let mut rng = rand::thread_rng();

        DeploymentRecord {
            id: Uuid::new_v4().to_string(),
            name: form.name.clone(),
            symbol: form.symbol.clone(),
            decimals: form.decimals,
            admin: form.admin.clone(),
            template: form.template,
            primary_address: Address::from_contract_id(rng.gen()).to_string(),
            tx_reference: random_string(&mut rng, REFERENCE_ALPHABET, FALLBACK_REFERENCE_LEN),
            auxiliary_addresses: self.placeholders.to_auxiliaries(),
            created_at: Utc::now(),
            origin: DeploymentOrigin::Fallback,
            config_snapshot: TokenConfigSnapshot::from_form(form, initial_supply),
        }
    }

    /// Build a fallback record and persist it
    pub async fn generate(
        &self,
        form: &TokenCreationForm,
        initial_supply: u128,
    ) -> Result<DeploymentRecord, DeploymentError> {
        let record = self.synthesize(form, initial_supply);
        self.repository.save(&record).await?;

        info!(
            id = %record.id,
            symbol = %record.symbol,
            primary_address = %record.primary_address,
            "Fallback deployment record stored"
        );

        Ok(record)
    }
}

fn random_string<R: Rng>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    let index = Uniform::from(0..alphabet.len());
    (0..len)
        .map(|_| alphabet[rng.sample(index)] as char)
        .collect()
}
