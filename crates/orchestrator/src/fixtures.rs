//! Shared test fixtures

use rwa_issuance_ledger::mock::MockLedger;
use rwa_issuance_ledger::{PollConfig, TransactionExecutor};
use rwa_issuance_store::{DeploymentRepository, IdempotencySet, InMemoryStore, RecordStore};
use rwa_issuance_types::{Address, PoolDescriptor};
use std::sync::Arc;
use std::time::Duration;

use crate::deployment::DeploymentSettings;
use crate::fallback::FallbackPlaceholders;

pub const ASSET_TOKEN: &str = "CAWBBZKM4EDKGOECO5TM5XW4QQ72MSXTM6FM74MB5PEI2TWRNZQNN7A4";
pub const COMPLIANCE_CORE: &str = "CDMM3DRN7IRDTBQUHCS5CARLFBLECC4XPPYOTMHERHCVJBSHTTUO75FA";
pub const IDENTITY_REGISTRY: &str = "CBJSAOFZWWDNWJI5QEFBHYLEIBHXOHN4B5DDI6DJBSYRQ6ROU3YXJ36E";
pub const CLAIM_TOPICS: &str = "CADQZX6IIPAVVOJ6SVZFGXK374UE5KXDFKBB6VRVVCSFPS2OLTRHS3NT";
pub const TRUSTED_ISSUERS: &str = "CDTBD2II6JGXHPDGMFWAQE2SRYXOCENGIE2Z5WHWNM6UG34BX5SQTDRN";
pub const LENDING_ADAPTER: &str = "CCUI5PWD4JRER3COUXUKKKKQ3VFNCM5DRAZVPTB2LV2AS4LHZ2PCI463";
pub const POOL: &str = "CAQ4DF5FLQHGAUEXYJKTVFFIVHVIUN6XNUE7NW27BJGWEPNHQKZYMRQ6";
pub const ORACLE: &str = "CALI2BYU2JE6WVRUFYTS6MSBNEHGJ35P4AVCZYF3B6QOE3QKOB2PLE6M";
pub const OTHER_TOKEN: &str = "CC3PYCRZ5ULYSFYI4L5FFZQL2K6VKVUDKUYXWZEPNFLEWGQ35UDN6QY3";
pub const OTHER_ACCOUNT: &str = "GBSZFESB245GQIKP4SFS6MV3OLNJTCZDA34VVBVTURUCAYQWRWTQP4NR";

pub fn addr(raw: &str) -> Address {
    Address::parse(raw).unwrap()
}

pub fn executor(ledger: &Arc<MockLedger>) -> Arc<TransactionExecutor> {
    Arc::new(
        TransactionExecutor::new(
            ledger.clone(),
            ledger.clone(),
            "Test SDF Network ; September 2015",
        )
        .with_poll_config(PollConfig::new(Duration::from_millis(1), 3)),
    )
}

pub fn store() -> Arc<dyn RecordStore> {
    Arc::new(InMemoryStore::new())
}

pub fn repository() -> DeploymentRepository {
    DeploymentRepository::new(store())
}

pub fn idempotency() -> IdempotencySet {
    IdempotencySet::new(store())
}

pub fn deployment_settings() -> DeploymentSettings {
    DeploymentSettings {
        asset_token: addr(ASSET_TOKEN),
        compliance_core: addr(COMPLIANCE_CORE),
        identity_registry: addr(IDENTITY_REGISTRY),
        claim_topics_registry: addr(CLAIM_TOPICS),
        trusted_issuers_registry: addr(TRUSTED_ISSUERS),
        initial_supply: 1_000_000_000_000,
        claim_validity: Duration::from_secs(365 * 24 * 3600),
        fallback_delay: Duration::ZERO,
    }
}

pub fn placeholders() -> FallbackPlaceholders {
    FallbackPlaceholders {
        compliance: addr(COMPLIANCE_CORE),
        identity_registry: addr(IDENTITY_REGISTRY),
        claim_topics_registry: addr(CLAIM_TOPICS),
        trusted_issuers_registry: addr(TRUSTED_ISSUERS),
    }
}

pub fn pool() -> PoolDescriptor {
    PoolDescriptor {
        address: addr(POOL),
        name: "SRWA Lending Pool".to_string(),
        oracle: addr(ORACLE),
        max_positions: 10,
    }
}
