//! Core configuration structures for the issuance and lending integration service

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network configuration
    pub network: NetworkConfig,

    /// Transaction executor configuration
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Deployed contract addresses
    pub contracts: ContractsConfig,

    /// Deployment orchestrator configuration
    #[serde(default)]
    pub deployment: DeploymentConfig,

    /// Lending integration configuration
    #[serde(default)]
    pub integration: IntegrationConfig,

    /// Local record store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Testnet)
    }
}

impl AppConfig {
    /// Built-in defaults for an environment
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            network: NetworkConfig::for_environment(environment),
            executor: ExecutorConfig::default(),
            contracts: ContractsConfig::default(),
            deployment: DeploymentConfig::default(),
            integration: IntegrationConfig::default(),
            store: match environment {
                Environment::Local => StoreConfig::default(),
                _ => StoreConfig {
                    backend: StoreBackend::Sqlite,
                    sqlite_path: Some(default_sqlite_path()),
                },
            },
        }
    }
}

/// Network environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Environment type (mainnet, testnet, local)
    pub environment: Environment,

    /// JSON-RPC endpoint
    pub rpc_url: String,

    /// Passphrase bound into every signed envelope
    pub network_passphrase: String,

    /// Per-request HTTP timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable metrics collection
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Metrics server port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

impl NetworkConfig {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            rpc_url: environment.default_rpc_url().to_string(),
            network_passphrase: environment.network_passphrase().to_string(),
            request_timeout_ms: default_request_timeout_ms(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Local)
    }
}

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    Testnet,
    Local,
}

impl Environment {
    pub fn network_passphrase(&self) -> &'static str {
        match self {
            Environment::Mainnet => "Public Global Stellar Network ; September 2015",
            Environment::Testnet => "Test SDF Network ; September 2015",
            Environment::Local => "Standalone Network ; February 2017",
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Environment::Mainnet => "https://mainnet.sorobanrpc.com",
            Environment::Testnet => "https://soroban-testnet.stellar.org",
            Environment::Local => "http://localhost:8000/soroban/rpc",
        }
    }
}

/// Confirmation polling budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Delay between status reads in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Status reads before giving up with a timeout
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

/// Addresses of the contracts the pipelines call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// Asset token instance initialized and minted by the deployment flow
    pub asset_token: String,
    pub compliance_core: String,
    pub identity_registry: String,
    pub claim_topics_registry: String,
    pub trusted_issuers_registry: String,
    /// Lending adapter holding pool registrations and token configs
    pub lending_adapter: String,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            asset_token: "CAWBBZKM4EDKGOECO5TM5XW4QQ72MSXTM6FM74MB5PEI2TWRNZQNN7A4".to_string(),
            compliance_core: "CDMM3DRN7IRDTBQUHCS5CARLFBLECC4XPPYOTMHERHCVJBSHTTUO75FA"
                .to_string(),
            identity_registry: "CBJSAOFZWWDNWJI5QEFBHYLEIBHXOHN4B5DDI6DJBSYRQ6ROU3YXJ36E"
                .to_string(),
            claim_topics_registry: "CADQZX6IIPAVVOJ6SVZFGXK374UE5KXDFKBB6VRVVCSFPS2OLTRHS3NT"
                .to_string(),
            trusted_issuers_registry: "CDTBD2II6JGXHPDGMFWAQE2SRYXOCENGIE2Z5WHWNM6UG34BX5SQTDRN"
                .to_string(),
            lending_adapter: "CCUI5PWD4JRER3COUXUKKKKQ3VFNCM5DRAZVPTB2LV2AS4LHZ2PCI463"
                .to_string(),
        }
    }
}

/// Deployment orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Pause before synthesizing a fallback record, in milliseconds
    #[serde(default = "default_fallback_delay_ms")]
    pub fallback_delay_ms: u64,

    /// Supply minted to the admin when the form leaves it unset (base units)
    #[serde(default = "default_initial_supply")]
    pub initial_supply: u64,

    /// Lifetime of the admin identity claims in seconds
    #[serde(default = "default_claim_validity_secs")]
    pub claim_validity_secs: u64,

    /// Shared auxiliary addresses written into fallback records
    #[serde(default)]
    pub placeholders: PlaceholderConfig,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            fallback_delay_ms: default_fallback_delay_ms(),
            initial_supply: default_initial_supply(),
            claim_validity_secs: default_claim_validity_secs(),
            placeholders: PlaceholderConfig::default(),
        }
    }
}

/// Fixed auxiliary addresses for synthesized records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderConfig {
    pub compliance: String,
    pub identity_registry: String,
    pub claim_topics_registry: String,
    pub trusted_issuers_registry: String,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        let contracts = ContractsConfig::default();
        Self {
            compliance: contracts.compliance_core,
            identity_registry: contracts.identity_registry,
            claim_topics_registry: contracts.claim_topics_registry,
            trusted_issuers_registry: contracts.trusted_issuers_registry,
        }
    }
}

/// Lending pool targeted by the integration flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub pool_address: String,

    #[serde(default = "default_pool_name")]
    pub pool_name: String,

    /// Price oracle registered with the pool
    pub oracle: String,

    #[serde(default = "default_max_positions")]
    pub max_positions: u32,

    /// Loan-to-value ratio in [0, 1]
    #[serde(default = "default_ltv_ratio")]
    pub ltv_ratio: Decimal,

    /// Liquidation threshold in [0, 1]
    #[serde(default = "default_liquidation_threshold")]
    pub liquidation_threshold: Decimal,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            pool_address: "CAQ4DF5FLQHGAUEXYJKTVFFIVHVIUN6XNUE7NW27BJGWEPNHQKZYMRQ6".to_string(),
            pool_name: default_pool_name(),
            oracle: "CALI2BYU2JE6WVRUFYTS6MSBNEHGJ35P4AVCZYF3B6QOE3QKOB2PLE6M".to_string(),
            max_positions: default_max_positions(),
            ltv_ratio: default_ltv_ratio(),
            liquidation_threshold: default_liquidation_threshold(),
        }
    }
}

/// Record store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,

    /// Database file, required for the sqlite backend
    #[serde(default)]
    pub sqlite_path: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            sqlite_path: None,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_request_timeout_ms() -> u64 {
    30000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_attempts() -> u32 {
    60
}

fn default_fallback_delay_ms() -> u64 {
    1000
}

fn default_initial_supply() -> u64 {
    1_000_000_000_000
}

fn default_claim_validity_secs() -> u64 {
    365 * 24 * 60 * 60
}

fn default_pool_name() -> String {
    "SRWA Lending Pool".to_string()
}

fn default_max_positions() -> u32 {
    10
}

fn default_ltv_ratio() -> Decimal {
    Decimal::new(80, 2)
}

fn default_liquidation_threshold() -> Decimal {
    Decimal::new(85, 2)
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Memory
}

fn default_sqlite_path() -> String {
    "rwa-issuance.db".to_string()
}
