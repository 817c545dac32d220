//! Wires the orchestrators from an [`AppConfig`]

use rwa_issuance_config::{validate_config, AppConfig, StoreBackend};
use rwa_issuance_ledger::{
    JsonRpcClient, PollConfig, QueryClient, RpcConfig, Signer, SubmissionClient,
    TransactionExecutor,
};
use rwa_issuance_metrics::{MetricsCollector, MetricsServer};
use rwa_issuance_store::{
    DeploymentRepository, IdempotencySet, InMemoryStore, RecordStore, SqliteStore,
};
use rwa_issuance_types::{Address, PoolDescriptor, RiskParameters};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::deployment::{DeploymentOrchestrator, DeploymentSettings};
use crate::fallback::{FallbackGenerator, FallbackPlaceholders};
use crate::integration::{IntegrationOrchestrator, IntegrationSettings};
use crate::status::StatusAggregator;
use crate::BuilderError;

/// Everything a front end needs, sharing one store and one executor
pub struct IssuanceServices {
    pub deployment: Arc<DeploymentOrchestrator>,
    pub integration: Arc<IntegrationOrchestrator>,
    pub status: Arc<StatusAggregator>,
    pub repository: DeploymentRepository,
    pub idempotency: IdempotencySet,
    pub metrics: Option<Arc<MetricsCollector>>,
    /// Scrape endpoint on `network.metrics_port`, present when metrics are enabled
    pub metrics_server: Option<MetricsServer>,
}

/// Builder for [`IssuanceServices`]
pub struct ServiceBuilder {
    config: AppConfig,
    signer: Option<Arc<dyn Signer>>,
    network: Option<Arc<dyn SubmissionClient>>,
    query: Option<Arc<dyn QueryClient>>,
    store: Option<Arc<dyn RecordStore>>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl ServiceBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            signer: None,
            network: None,
            query: None,
            store: None,
            metrics: None,
        }
    }

    /// Set the signer (required)
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Override the submission endpoint built from `network.rpc_url`
    pub fn with_network(mut self, network: Arc<dyn SubmissionClient>) -> Self {
        self.network = Some(network);
        self
    }

    /// Override the query endpoint built from `network.rpc_url`
    pub fn with_query_client(mut self, query: Arc<dyn QueryClient>) -> Self {
        self.query = Some(query);
        self
    }

    /// Use one object for all three ledger roles
    pub fn with_ledger<L>(self, ledger: Arc<L>) -> Self
    where
        L: Signer + SubmissionClient + QueryClient + 'static,
    {
        self.with_signer(ledger.clone())
            .with_network(ledger.clone())
            .with_query_client(ledger)
    }

    /// Override the store selected by `store.backend`
    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn build(self) -> Result<IssuanceServices, BuilderError> {
        let config = self.config;
        validate_config(&config)?;

        let signer = self.signer.ok_or_else(|| BuilderError::MissingField {
            field: "signer".to_string(),
        })?;

        let mut rpc: Option<Arc<JsonRpcClient>> = None;
        let network: Arc<dyn SubmissionClient> = match self.network {
            Some(network) => network,
            None => rpc_client(&config, &mut rpc)?,
        };
        let query: Arc<dyn QueryClient> = match self.query {
            Some(query) => query,
            None => rpc_client(&config, &mut rpc)?,
        };

        let store: Arc<dyn RecordStore> = match self.store {
            Some(store) => store,
            None => match config.store.backend {
                StoreBackend::Memory => Arc::new(InMemoryStore::new()),
                StoreBackend::Sqlite => {
                    let path = config.store.sqlite_path.as_deref().ok_or_else(|| {
                        BuilderError::MissingField {
                            field: "store.sqlite_path".to_string(),
                        }
                    })?;
                    Arc::new(SqliteStore::new(path).await?)
                }
            },
        };

        let metrics = match self.metrics {
            Some(metrics) => Some(metrics),
            None if config.network.metrics_enabled => Some(Arc::new(MetricsCollector::new())),
            None => None,
        };

        let mut executor = TransactionExecutor::new(
            signer,
            network,
            config.network.network_passphrase.clone(),
        )
        .with_poll_config(PollConfig::new(
            Duration::from_millis(config.executor.poll_interval_ms),
            config.executor.max_poll_attempts,
        ));
        if let Some(metrics) = &metrics {
            executor = executor.with_metrics(metrics.clone());
        }
        let executor = Arc::new(executor);

        let repository = DeploymentRepository::new(store.clone());
        let idempotency = IdempotencySet::new(store);

        // Deployment
        let contracts = &config.contracts;
        let placeholders = &config.deployment.placeholders;
        let fallback = FallbackGenerator::new(
            FallbackPlaceholders {
                compliance: parse_address("deployment.placeholders.compliance", &placeholders.compliance)?,
                identity_registry: parse_address(
                    "deployment.placeholders.identity_registry",
                    &placeholders.identity_registry,
                )?,
                claim_topics_registry: parse_address(
                    "deployment.placeholders.claim_topics_registry",
                    &placeholders.claim_topics_registry,
                )?,
                trusted_issuers_registry: parse_address(
                    "deployment.placeholders.trusted_issuers_registry",
                    &placeholders.trusted_issuers_registry,
                )?,
            },
            repository.clone(),
        );
        let settings = DeploymentSettings {
            asset_token: parse_address("contracts.asset_token", &contracts.asset_token)?,
            compliance_core: parse_address("contracts.compliance_core", &contracts.compliance_core)?,
            identity_registry: parse_address(
                "contracts.identity_registry",
                &contracts.identity_registry,
            )?,
            claim_topics_registry: parse_address(
                "contracts.claim_topics_registry",
                &contracts.claim_topics_registry,
            )?,
            trusted_issuers_registry: parse_address(
                "contracts.trusted_issuers_registry",
                &contracts.trusted_issuers_registry,
            )?,
            initial_supply: u128::from(config.deployment.initial_supply),
            claim_validity: Duration::from_secs(config.deployment.claim_validity_secs),
            fallback_delay: Duration::from_millis(config.deployment.fallback_delay_ms),
        };
        let mut deployment = DeploymentOrchestrator::new(
            executor.clone(),
            query.clone(),
            repository.clone(),
            fallback,
            settings,
        );

        // Integration and status
        let adapter = parse_address("contracts.lending_adapter", &contracts.lending_adapter)?;
        let pool = PoolDescriptor {
            address: parse_address("integration.pool_address", &config.integration.pool_address)?,
            name: config.integration.pool_name.clone(),
            oracle: parse_address("integration.oracle", &config.integration.oracle)?,
            max_positions: config.integration.max_positions,
        };
        let risk = RiskParameters::new(
            config.integration.ltv_ratio,
            config.integration.liquidation_threshold,
        );
        let mut integration = IntegrationOrchestrator::new(
            executor,
            query.clone(),
            IntegrationSettings::new(adapter.clone(), pool.clone(), risk)?,
            idempotency.clone(),
            repository.clone(),
        );
        let mut status = StatusAggregator::new(query, adapter, pool);

        if let Some(metrics) = &metrics {
            deployment = deployment.with_metrics(metrics.clone());
            integration = integration.with_metrics(metrics.clone());
            status = status.with_metrics(metrics.clone());
        }

        let metrics_server = metrics
            .as_ref()
            .filter(|_| config.network.metrics_enabled)
            .map(|m| MetricsServer::on_port(m.clone(), config.network.metrics_port));

        info!(
            environment = ?config.network.environment,
            rpc_url = %config.network.rpc_url,
            store = ?config.store.backend,
            metrics = metrics.is_some(),
            metrics_addr = ?metrics_server.as_ref().map(MetricsServer::addr),
            "Issuance services ready"
        );

        Ok(IssuanceServices {
            deployment: Arc::new(deployment),
            integration: Arc::new(integration),
            status: Arc::new(status),
            repository,
            idempotency,
            metrics,
            metrics_server,
        })
    }
}

fn parse_address(field: &str, raw: &str) -> Result<Address, BuilderError> {
    Address::parse(raw).map_err(|source| BuilderError::InvalidAddress {
        field: field.to_string(),
        source,
    })
}

/// JSON-RPC client for `network.rpc_url`, created once and shared by both roles
fn rpc_client(
    config: &AppConfig,
    cached: &mut Option<Arc<JsonRpcClient>>,
) -> Result<Arc<JsonRpcClient>, BuilderError> {
    if let Some(client) = cached {
        return Ok(client.clone());
    }

    let client = Arc::new(JsonRpcClient::new(
        RpcConfig::new(config.network.rpc_url.clone())
            .with_timeout(Duration::from_millis(config.network.request_timeout_ms)),
    )?);
    *cached = Some(client.clone());
    Ok(client)
}
