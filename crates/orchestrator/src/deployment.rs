//! Token issuance flow
//!
//! ```text
//! create_asset (FATAL) ──► configure_compliance (BEST_EFFORT) ──► register_admin_claims (BEST_EFFORT)
//!        │
//!        └── failure ──► delay ──► FallbackGenerator
//! ```
//!
//! The flow always ends in a stored record. Callers tell a real deployment
//! from a synthesized one by the [`DeploymentOutcome`] variant.

use async_trait::async_trait;
use chrono::Utc;
use rwa_issuance_ledger::{run_query, QueryClient, TransactionExecutor};
use rwa_issuance_metrics::{FlowSpan, MetricsCollector};
use rwa_issuance_store::DeploymentRepository;
use rwa_issuance_types::{
    Address, AuxiliaryAddress, AuxiliaryRole, DeploymentOrigin, DeploymentOutcome,
    DeploymentRecord, GetAdmin, OperationRequest, StepPolicy, TokenConfigSnapshot,
    TokenCreationForm, TxHash,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::fallback::FallbackGenerator;
use crate::pipeline::{PipelineStep, StepPipeline};
use crate::{DeploymentError, StepError};

/// Contracts and amounts used by the issuance flow
#[derive(Debug, Clone)]
pub struct DeploymentSettings {
    pub asset_token: Address,
    pub compliance_core: Address,
    pub identity_registry: Address,
    pub claim_topics_registry: Address,
    pub trusted_issuers_registry: Address,

    /// Minted to the admin unless the form overrides it (base units)
    pub initial_supply: u128,

    /// How long admin identity claims stay valid
    pub claim_validity: Duration,

    /// Pause before the fallback record is produced
    pub fallback_delay: Duration,
}

/// State threaded through the issuance steps
#[derive(Debug, Clone)]
pub struct DeploymentContext {
    pub form: TokenCreationForm,
    pub initial_supply: u128,
    /// Parsed admin, set by the create step
    pub admin: Option<Address>,
    /// Hash of the asset initialization transaction
    pub creation_tx: Option<TxHash>,
}

impl DeploymentContext {
    pub fn new(form: TokenCreationForm, initial_supply: u128) -> Self {
        Self {
            form,
            initial_supply,
            admin: None,
            creation_tx: None,
        }
    }

    fn require_admin(&self) -> Result<&Address, StepError> {
        self.admin
            .as_ref()
            .ok_or_else(|| StepError::Precondition("asset admin not established".to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// STEPS
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the asset contract for the form and mint the initial supply
struct CreateAssetStep {
    executor: Arc<TransactionExecutor>,
    query: Arc<dyn QueryClient>,
    token: Address,
    compliance: Address,
}

#[async_trait]
impl PipelineStep<DeploymentContext> for CreateAssetStep {
    fn name(&self) -> &'static str {
        "create_asset"
    }

    fn policy(&self) -> StepPolicy {
        StepPolicy::Fatal
    }

    async fn run(&self, ctx: &mut DeploymentContext) -> Result<Option<TxHash>, StepError> {
        let admin = Address::parse(&ctx.form.admin)?;
        let amount = i128::try_from(ctx.initial_supply).map_err(|_| {
            StepError::InvalidInput(format!("initial supply {} out of range", ctx.initial_supply))
        })?;

        // An unreadable admin is not proof of an initialized contract
        match run_query(self.query.as_ref(), &self.token, &GetAdmin).await {
            Ok(Some(existing)) => {
                return Err(StepError::Precondition(format!(
                    "asset contract {} already initialized by {}",
                    self.token.short(),
                    existing.short()
                )));
            }
            Ok(None) => {}
            Err(e) => {
                debug!(token = %self.token, error = %e, "Admin precheck unavailable, proceeding");
            }
        }

        let init = OperationRequest::new(self.token.clone(), "initialize")
            .arg("admin", &admin)
            .arg("name", ctx.form.name.as_str())
            .arg("symbol", ctx.form.symbol.as_str())
            .arg("decimals", ctx.form.decimals)
            .arg("compliance_contract", &self.compliance);
        let initialized = self.executor.execute(init).await?;
        ctx.creation_tx = Some(initialized.hash);
        ctx.admin = Some(admin.clone());

        let mint = OperationRequest::new(self.token.clone(), "mint")
            .arg("to", &admin)
            .arg("amount", amount);
        let minted = self.executor.execute(mint).await?;

        Ok(Some(minted.hash))
    }
}

struct ConfigureComplianceStep {
    executor: Arc<TransactionExecutor>,
    compliance: Address,
    token: Address,
}

#[async_trait]
impl PipelineStep<DeploymentContext> for ConfigureComplianceStep {
    fn name(&self) -> &'static str {
        "configure_compliance"
    }

    fn policy(&self) -> StepPolicy {
        StepPolicy::BestEffort
    }

    async fn run(&self, ctx: &mut DeploymentContext) -> Result<Option<TxHash>, StepError> {
        ctx.require_admin()?;
        let form = &ctx.form;

        // 0 means no holder cap
        let request = OperationRequest::new(self.compliance.clone(), "set_ruleset")
            .arg("token", &self.token)
            .arg("claim_topics", form.claim_topics.clone())
            .arg("max_holders", form.max_holders.unwrap_or(0))
            .arg("allowed_jurisdictions", form.allowed_jurisdictions.clone())
            .arg("denied_jurisdictions", form.denied_jurisdictions.clone());

        let outcome = self.executor.execute(request).await?;
        Ok(Some(outcome.hash))
    }
}

/// One identity claim per required topic, self-issued by the admin
struct RegisterAdminClaimsStep {
    executor: Arc<TransactionExecutor>,
    identity_registry: Address,
    validity: Duration,
}

#[async_trait]
impl PipelineStep<DeploymentContext> for RegisterAdminClaimsStep {
    fn name(&self) -> &'static str {
        "register_admin_claims"
    }

    fn policy(&self) -> StepPolicy {
        StepPolicy::BestEffort
    }

    async fn run(&self, ctx: &mut DeploymentContext) -> Result<Option<TxHash>, StepError> {
        let admin = ctx.require_admin()?.clone();
        let valid_until = Utc::now().timestamp().max(0) as u64 + self.validity.as_secs();

        let mut last = None;
        for topic in &ctx.form.claim_topics {
            let request = OperationRequest::new(self.identity_registry.clone(), "add_claim")
                .arg("subject", &admin)
                .arg("issuer", &admin)
                .arg("topic_id", *topic)
                .arg("data", format!("admin:{}", ctx.form.symbol))
                .arg("valid_until", valid_until);

            let outcome = self.executor.execute(request).await?;
            debug!(topic, tx_hash = %outcome.hash, "Admin claim registered");
            last = Some(outcome.hash);
        }

        Ok(last)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ORCHESTRATOR
// ═══════════════════════════════════════════════════════════════════════════

/// Runs the issuance pipeline and persists its record
pub struct DeploymentOrchestrator {
    pipeline: StepPipeline<DeploymentContext>,
    repository: DeploymentRepository,
    fallback: FallbackGenerator,
    settings: DeploymentSettings,
    metrics: Option<Arc<MetricsCollector>>,
}

impl DeploymentOrchestrator {
    pub fn new(
        executor: Arc<TransactionExecutor>,
        query: Arc<dyn QueryClient>,
        repository: DeploymentRepository,
        fallback: FallbackGenerator,
        settings: DeploymentSettings,
    ) -> Self {
        let pipeline = StepPipeline::new("deployment")
            .step(CreateAssetStep {
                executor: executor.clone(),
                query,
                token: settings.asset_token.clone(),
                compliance: settings.compliance_core.clone(),
            })
            .step(ConfigureComplianceStep {
                executor: executor.clone(),
                compliance: settings.compliance_core.clone(),
                token: settings.asset_token.clone(),
            })
            .step(RegisterAdminClaimsStep {
                executor,
                identity_registry: settings.identity_registry.clone(),
                validity: settings.claim_validity,
            });

        Self {
            pipeline,
            repository,
            fallback,
            settings,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.pipeline = self.pipeline.with_metrics(Some(metrics.clone()));
        self.metrics = Some(metrics);
        self
    }

    pub fn settings(&self) -> &DeploymentSettings {
        &self.settings
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.pipeline.step_names()
    }

    /// Run the issuance flow for `form`.
    ///
    /// Network and signer failures in the fatal step never surface here; they
    /// end in [`DeploymentOutcome::DeployedFallback`]. Only a failure to
    /// persist the resulting record is returned as an error.
    pub async fn deploy(
        &self,
        form: TokenCreationForm,
    ) -> Result<DeploymentOutcome, DeploymentError> {
        let flow = FlowSpan::deployment(form.symbol.clone());
        self.deploy_inner(form).instrument(flow.span()).await
    }

    async fn deploy_inner(
        &self,
        form: TokenCreationForm,
    ) -> Result<DeploymentOutcome, DeploymentError> {
        let started = Instant::now();
        let initial_supply = form.initial_supply.unwrap_or(self.settings.initial_supply);
        info!(
            name = %form.name,
            symbol = %form.symbol,
            decimals = form.decimals,
            template = form.template.as_str(),
            "Starting deployment"
        );

        let mut ctx = DeploymentContext::new(form, initial_supply);
        let (steps, fatal_error) = self.pipeline.run(&mut ctx).await.into_parts();

        let outcome = match fatal_error {
            None => {
                let record = self.real_record(&ctx);
                self.repository.save(&record).await?;
                DeploymentOutcome::DeployedReal { record, steps }
            }
            Some(err) => {
                warn!(
                    error = %err,
                    error_type = err.kind(),
                    delay_ms = self.settings.fallback_delay.as_millis() as u64,
                    "Deployment failed, substituting fallback record"
                );
                tokio::time::sleep(self.settings.fallback_delay).await;

                let record = self.fallback.generate(&ctx.form, ctx.initial_supply).await?;
                DeploymentOutcome::DeployedFallback {
                    record,
                    steps,
                    cause: err.to_string(),
                }
            }
        };

        let record = outcome.record();
        info!(
            id = %record.id,
            origin = %record.origin,
            primary_address = %record.primary_address,
            "Deployment complete"
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_deployment(outcome.origin(), started.elapsed());
        }

        Ok(outcome)
    }

    fn real_record(&self, ctx: &DeploymentContext) -> DeploymentRecord {
        let settings = &self.settings;
        DeploymentRecord {
            id: Uuid::new_v4().to_string(),
            name: ctx.form.name.clone(),
            symbol: ctx.form.symbol.clone(),
            decimals: ctx.form.decimals,
            admin: ctx.form.admin.clone(),
            template: ctx.form.template,
            primary_address: settings.asset_token.to_string(),
            tx_reference: ctx
                .creation_tx
                .as_ref()
                .map(|h| h.to_string())
                .unwrap_or_default(),
            auxiliary_addresses: vec![
                AuxiliaryAddress::new(AuxiliaryRole::Compliance, settings.compliance_core.as_str()),
                AuxiliaryAddress::new(
                    AuxiliaryRole::IdentityRegistry,
                    settings.identity_registry.as_str(),
                ),
                AuxiliaryAddress::new(
                    AuxiliaryRole::ClaimTopicsRegistry,
                    settings.claim_topics_registry.as_str(),
                ),
                AuxiliaryAddress::new(
                    AuxiliaryRole::TrustedIssuersRegistry,
                    settings.trusted_issuers_registry.as_str(),
                ),
            ],
            created_at: Utc::now(),
            origin: DeploymentOrigin::Real,
            config_snapshot: TokenConfigSnapshot::from_form(&ctx.form, ctx.initial_supply),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use rwa_issuance_ledger::mock::{MockLedger, MOCK_SIGNER};
    use rwa_issuance_types::{ConfirmationStatus, ContractArg};

    fn orchestrator(ledger: &Arc<MockLedger>) -> (DeploymentOrchestrator, DeploymentRepository) {
        orchestrator_with(ledger, deployment_settings())
    }

    fn orchestrator_with(
        ledger: &Arc<MockLedger>,
        settings: DeploymentSettings,
    ) -> (DeploymentOrchestrator, DeploymentRepository) {
        let repository = repository();
        let orchestrator = DeploymentOrchestrator::new(
            executor(ledger),
            ledger.clone(),
            repository.clone(),
            FallbackGenerator::new(placeholders(), repository.clone()),
            settings,
        );
        (orchestrator, repository)
    }

    fn signer_form() -> TokenCreationForm {
        TokenCreationForm::new("Acme T-Bill", "ACME", 7, MOCK_SIGNER)
    }

    #[tokio::test]
    async fn test_real_deployment_runs_all_steps() {
        let ledger = Arc::new(MockLedger::new());
        let (orchestrator, repository) = orchestrator(&ledger);

        let outcome = orchestrator.deploy(signer_form()).await.unwrap();

        assert_eq!(outcome.origin(), DeploymentOrigin::Real);
        assert_eq!(outcome.steps().len(), 3);
        assert!(outcome.steps().iter().all(|s| s.success));
        assert_eq!(
            ledger.submitted_methods(),
            vec!["initialize", "mint", "set_ruleset", "add_claim", "add_claim"]
        );

        let record = outcome.record();
        assert_eq!(record.primary_address, ASSET_TOKEN);
        assert!(!record.tx_reference.is_empty());
        assert_eq!(record.auxiliary(AuxiliaryRole::Compliance), Some(COMPLIANCE_CORE));
        assert_eq!(repository.list().await.unwrap(), vec![record.clone()]);
    }

    #[tokio::test]
    async fn test_mint_amount_and_claim_arguments() {
        let ledger = Arc::new(MockLedger::new());
        let (orchestrator, _) = orchestrator(&ledger);

        orchestrator
            .deploy(signer_form().with_initial_supply(5_000).with_claim_topics(vec![7]))
            .await
            .unwrap();

        let submissions = ledger.submissions();
        let mint = submissions.iter().find(|r| r.method == "mint").unwrap();
        assert_eq!(mint.get_arg("amount"), Some(&ContractArg::I128(5_000)));

        let claims: Vec<_> = submissions.iter().filter(|r| r.method == "add_claim").collect();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].get_arg("topic_id"), Some(&ContractArg::U32(7)));
        assert_eq!(claims[0].get_arg("subject"), claims[0].get_arg("issuer"));
    }

    #[tokio::test]
    async fn test_best_effort_failure_keeps_real_origin() {
        let ledger = Arc::new(MockLedger::new());
        ledger.fail_method("set_ruleset");
        let (orchestrator, _) = orchestrator(&ledger);

        let outcome = orchestrator.deploy(signer_form()).await.unwrap();

        assert_eq!(outcome.origin(), DeploymentOrigin::Real);
        let steps = outcome.steps();
        assert_eq!(steps.len(), 3);
        assert!(!steps[1].success);
        assert!(steps[1].tx_hash.is_some());
        assert!(steps[2].success);
    }

    #[tokio::test]
    async fn test_signer_rejection_falls_back() {
        let ledger = Arc::new(MockLedger::new());
        ledger.reject_signatures(true);
        let (orchestrator, repository) = orchestrator(&ledger);

        let outcome = orchestrator.deploy(signer_form()).await.unwrap();

        match &outcome {
            DeploymentOutcome::DeployedFallback { steps, cause, .. } => {
                assert_eq!(steps.len(), 1);
                assert!(cause.contains("signer rejected"));
            }
            other => panic!("expected fallback, got {:?}", other),
        }
        assert!(ledger.submissions().is_empty());
        assert_eq!(
            repository.list_by_origin(DeploymentOrigin::Fallback).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_malformed_admin_falls_back_without_network() {
        let ledger = Arc::new(MockLedger::new());
        let (orchestrator, _) = orchestrator(&ledger);

        let outcome = orchestrator
            .deploy(TokenCreationForm::new("Acme T-Bill", "ACME", 7, "ADDR1"))
            .await
            .unwrap();

        assert_eq!(outcome.origin(), DeploymentOrigin::Fallback);
        assert!(ledger.submissions().is_empty());
        assert!(ledger.queries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_delay_applies_only_to_fallback() {
        let delay = Duration::from_secs(60);
        let ledger = Arc::new(MockLedger::new());
        let (orchestrator, _) = orchestrator_with(
            &ledger,
            DeploymentSettings {
                fallback_delay: delay,
                ..deployment_settings()
            },
        );

        let started = tokio::time::Instant::now();
        let outcome = orchestrator
            .deploy(TokenCreationForm::new("Acme T-Bill", "ACME", 7, "ADDR1"))
            .await
            .unwrap();
        assert_eq!(outcome.origin(), DeploymentOrigin::Fallback);
        assert!(started.elapsed() >= delay);

        let started = tokio::time::Instant::now();
        let outcome = orchestrator.deploy(signer_form()).await.unwrap();
        assert_eq!(outcome.origin(), DeploymentOrigin::Real);
        assert!(started.elapsed() < delay);
    }

    #[tokio::test]
    async fn test_initialized_asset_is_not_reinitialized() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_admin(&addr(ASSET_TOKEN), &addr(MOCK_SIGNER));
        let (orchestrator, _) = orchestrator(&ledger);

        let outcome = orchestrator.deploy(signer_form()).await.unwrap();

        assert_eq!(outcome.origin(), DeploymentOrigin::Fallback);
        assert!(ledger.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_confirmation_timeout_falls_back_with_hash() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_default_status(ConfirmationStatus::Pending);
        let (orchestrator, _) = orchestrator(&ledger);

        let outcome = orchestrator.deploy(signer_form()).await.unwrap();

        assert_eq!(outcome.origin(), DeploymentOrigin::Fallback);
        let create = &outcome.steps()[0];
        assert!(!create.success);
        assert!(create.tx_hash.is_some());
        assert_eq!(ledger.submitted_methods(), vec!["initialize"]);
    }

    #[test]
    fn test_step_order() {
        let ledger = Arc::new(MockLedger::new());
        let (orchestrator, _) = orchestrator(&ledger);
        assert_eq!(
            orchestrator.step_names(),
            vec!["create_asset", "configure_compliance", "register_admin_claims"]
        );
    }
}
