//! Tokenized asset issuance and lending-protocol integration
//!
//! Facade over the workspace crates. Most callers need only
//! [`ServiceBuilder`] and the data types it hands back.
//!
//! ```no_run
//! use rwa_issuance::metrics::{init_tracing_with_filter, MetricsCollector};
//! use rwa_issuance::{
//!     AppConfig, Environment, KeypairSigner, ServiceBuilder, Signer, TokenCreationForm,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::for_environment(Environment::Testnet);
//! let metrics = Arc::new(MetricsCollector::new());
//! init_tracing_with_filter(metrics.clone(), &config.network.log_level)?;
//!
//! let signer = Arc::new(KeypairSigner::generate()?);
//! let admin = signer.address().to_string();
//! let mut services = ServiceBuilder::new(config)
//!     .with_signer(signer)
//!     .with_metrics(metrics)
//!     .build()
//!     .await?;
//! if let Some(server) = services.metrics_server.take() {
//!     server.spawn();
//! }
//!
//! let outcome = services
//!     .deployment
//!     .deploy(TokenCreationForm::new("Acme T-Bill", "ACME", 7, admin))
//!     .await?;
//! println!("{} deployed as {}", outcome.record().symbol, outcome.origin());
//! # Ok(())
//! # }
//! ```

pub use rwa_issuance_config as config;
pub use rwa_issuance_ledger as ledger;
pub use rwa_issuance_metrics as metrics;
pub use rwa_issuance_orchestrator as orchestrator;
pub use rwa_issuance_store as store;
pub use rwa_issuance_types as types;

pub use rwa_issuance_config::{AppConfig, ConfigLoader, Environment};
pub use rwa_issuance_ledger::{KeypairSigner, Signer, TransactionExecutor};
pub use rwa_issuance_orchestrator::{
    DeploymentOrchestrator, IntegrationOrchestrator, IntegrationOutcome, IssuanceServices,
    ServiceBuilder, StatusAggregator,
};
pub use rwa_issuance_types::{
    AssetEntity, DeploymentOrigin, DeploymentOutcome, DeploymentRecord, IntegrationStatus,
    StepResult, TokenCreationForm,
};
