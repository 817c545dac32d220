//! Lending-protocol integration flow
//!
//! Attaches an issued asset to the lending adapter's pool. Unlike deployment,
//! every failure here is surfaced: a half-configured integration is never
//! reported as success.
//!
//! ```text
//! in-flight guard ─► idempotency check ─► adapter admin precheck
//!                                             │ unset: initialize(admin = signer)
//!                                             │ other principal: AdminMismatch
//!                                             ▼
//!            ensure_pool ─► attach_to_pool ─► setup_reserve   (all FATAL)
//! ```

use async_trait::async_trait;
use rwa_issuance_ledger::{run_query, QueryClient, TransactionExecutor};
use rwa_issuance_metrics::{FlowSpan, MetricsCollector};
use rwa_issuance_store::{DeploymentRepository, IdempotencySet};
use rwa_issuance_types::{
    Address, AssetEntity, DeploymentOrigin, GetAdmin, GetReserveInfo, GetTokenConfig,
    IntegrationStatus, OperationRequest, PoolDescriptor, PoolExists, RiskParameters, StepPolicy,
    StepResult, TxHash,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn, Instrument};

use crate::pipeline::{PipelineStep, StepPipeline};
use crate::{BuilderError, IntegrationError, StepError};

/// Lending adapter, target pool and the risk parameters sent with each asset
#[derive(Debug, Clone)]
pub struct IntegrationSettings {
    pub adapter: Address,
    pub pool: PoolDescriptor,
    pub risk: RiskParameters,
    ltv_bps: u32,
    liq_threshold_bps: u32,
}

impl IntegrationSettings {
    pub fn new(
        adapter: Address,
        pool: PoolDescriptor,
        risk: RiskParameters,
    ) -> Result<Self, BuilderError> {
        if !risk.is_valid() {
            return Err(BuilderError::InvalidRiskParameters(format!(
                "ltv_ratio {} must be positive and below liquidation_threshold {} <= 1",
                risk.ltv_ratio, risk.liquidation_threshold
            )));
        }

        let (Some(ltv_bps), Some(liq_threshold_bps)) =
            (risk.ltv_bps(), risk.liquidation_threshold_bps())
        else {
            return Err(BuilderError::InvalidRiskParameters(
                "ratios do not convert to basis points".to_string(),
            ));
        };

        Ok(Self {
            adapter,
            pool,
            risk,
            ltv_bps,
            liq_threshold_bps,
        })
    }

    pub fn ltv_bps(&self) -> u32 {
        self.ltv_bps
    }

    pub fn liq_threshold_bps(&self) -> u32 {
        self.liq_threshold_bps
    }
}

/// Result of a successful `integrate` call
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationOutcome {
    /// The pipeline ran to completion in this call
    Integrated {
        status: IntegrationStatus,
        steps: Vec<StepResult>,
    },
    /// The entity was already in the idempotency set; nothing was submitted
    AlreadyIntegrated,
}

impl IntegrationOutcome {
    /// Whether this call did any work
    pub fn ran_pipeline(&self) -> bool {
        matches!(self, IntegrationOutcome::Integrated { .. })
    }

    pub fn steps(&self) -> &[StepResult] {
        match self {
            IntegrationOutcome::Integrated { steps, .. } => steps,
            IntegrationOutcome::AlreadyIntegrated => &[],
        }
    }
}

/// State threaded through the integration steps
#[derive(Debug, Clone)]
pub struct IntegrationContext {
    pub entity: AssetEntity,
    /// Adapter admin; always the current signer once prechecks pass
    pub admin: Address,
}

// ═══════════════════════════════════════════════════════════════════════════
// STEPS
// ═══════════════════════════════════════════════════════════════════════════

/// Shared handles for the adapter steps
#[derive(Clone)]
struct AdapterHandle {
    executor: Arc<TransactionExecutor>,
    query: Arc<dyn QueryClient>,
    settings: Arc<IntegrationSettings>,
}

impl AdapterHandle {
    fn adapter(&self) -> &Address {
        &self.settings.adapter
    }

    fn pool(&self) -> &PoolDescriptor {
        &self.settings.pool
    }

    async fn submit(&self, request: OperationRequest) -> Result<Option<TxHash>, StepError> {
        let outcome = self.executor.execute(request).await?;
        Ok(Some(outcome.hash))
    }
}

struct InitializeAdapterStep(AdapterHandle);

#[async_trait]
impl PipelineStep<IntegrationContext> for InitializeAdapterStep {
    fn name(&self) -> &'static str {
        "initialize_adapter"
    }

    fn policy(&self) -> StepPolicy {
        StepPolicy::Fatal
    }

    async fn run(&self, ctx: &mut IntegrationContext) -> Result<Option<TxHash>, StepError> {
        let request =
            OperationRequest::new(self.0.adapter().clone(), "initialize").arg("admin", &ctx.admin);
        self.0.submit(request).await
    }
}

struct EnsurePoolStep(AdapterHandle);

#[async_trait]
impl PipelineStep<IntegrationContext> for EnsurePoolStep {
    fn name(&self) -> &'static str {
        "ensure_pool"
    }

    fn policy(&self) -> StepPolicy {
        StepPolicy::Fatal
    }

    async fn run(&self, ctx: &mut IntegrationContext) -> Result<Option<TxHash>, StepError> {
        let pool = self.0.pool();
        let exists = run_query(
            self.0.query.as_ref(),
            self.0.adapter(),
            &PoolExists {
                pool: pool.address.clone(),
            },
        )
        .await?;

        if exists {
            debug!(pool = %pool.address, "Pool already registered");
            return Ok(None);
        }

        let request = OperationRequest::new(self.0.adapter().clone(), "register_pool")
            .arg("admin", &ctx.admin)
            .arg("pool_address", &pool.address)
            .arg("name", pool.name.as_str())
            .arg("oracle", &pool.oracle)
            .arg("max_positions", pool.max_positions);
        self.0.submit(request).await
    }
}

struct AttachToPoolStep(AdapterHandle);

#[async_trait]
impl PipelineStep<IntegrationContext> for AttachToPoolStep {
    fn name(&self) -> &'static str {
        "attach_to_pool"
    }

    fn policy(&self) -> StepPolicy {
        StepPolicy::Fatal
    }

    async fn run(&self, ctx: &mut IntegrationContext) -> Result<Option<TxHash>, StepError> {
        let token = &ctx.entity.contract_address;
        let config = run_query(
            self.0.query.as_ref(),
            self.0.adapter(),
            &GetTokenConfig {
                token: token.clone(),
            },
        )
        .await?;

        if config.is_some_and(|c| c.is_attached_to(&self.0.pool().address)) {
            debug!(token = %token, "Token already attached to pool");
            return Ok(None);
        }

        let settings = &self.0.settings;
        let request = OperationRequest::new(self.0.adapter().clone(), "add_token_to_pool")
            .arg("admin", &ctx.admin)
            .arg("pool_address", &self.0.pool().address)
            .arg("token", token)
            .arg("ltv_ratio", settings.ltv_bps())
            .arg("liq_threshold", settings.liq_threshold_bps());
        self.0.submit(request).await
    }
}

struct SetupReserveStep(AdapterHandle);

#[async_trait]
impl PipelineStep<IntegrationContext> for SetupReserveStep {
    fn name(&self) -> &'static str {
        "setup_reserve"
    }

    fn policy(&self) -> StepPolicy {
        StepPolicy::Fatal
    }

    async fn run(&self, ctx: &mut IntegrationContext) -> Result<Option<TxHash>, StepError> {
        let asset = &ctx.entity.contract_address;
        let reserve = run_query(
            self.0.query.as_ref(),
            self.0.adapter(),
            &GetReserveInfo {
                pool: self.0.pool().address.clone(),
                asset: asset.clone(),
            },
        )
        .await?;

        if reserve.is_some_and(|r| r.enabled) {
            debug!(asset = %asset, "Reserve already set up");
            return Ok(None);
        }

        let request = OperationRequest::new(self.0.adapter().clone(), "setup_pool_reserve")
            .arg("admin", &ctx.admin)
            .arg("pool_address", &self.0.pool().address)
            .arg("asset", asset);
        self.0.submit(request).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-FLIGHT GUARD
// ═══════════════════════════════════════════════════════════════════════════

/// Holds an entity id in the in-flight set until dropped
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    id: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(in_flight: &'a Mutex<HashSet<String>>, id: &str) -> Option<Self> {
        let mut set = in_flight.lock().unwrap_or_else(|p| p.into_inner());
        if !set.insert(id.to_string()) {
            return None;
        }
        Some(Self {
            in_flight,
            id: id.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.id);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ORCHESTRATOR
// ═══════════════════════════════════════════════════════════════════════════

/// Runs the lending attach pipeline with admin prechecks and idempotency
pub struct IntegrationOrchestrator {
    handle: AdapterHandle,
    initialization: StepPipeline<IntegrationContext>,
    pipeline: StepPipeline<IntegrationContext>,
    idempotency: IdempotencySet,
    repository: DeploymentRepository,
    status_cache: RwLock<HashMap<String, IntegrationStatus>>,
    in_flight: Mutex<HashSet<String>>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl IntegrationOrchestrator {
    pub fn new(
        executor: Arc<TransactionExecutor>,
        query: Arc<dyn QueryClient>,
        settings: IntegrationSettings,
        idempotency: IdempotencySet,
        repository: DeploymentRepository,
    ) -> Self {
        let handle = AdapterHandle {
            executor,
            query,
            settings: Arc::new(settings),
        };

        let initialization =
            StepPipeline::new("adapter_initialization").step(InitializeAdapterStep(handle.clone()));
        let pipeline = StepPipeline::new("integration")
            .step(EnsurePoolStep(handle.clone()))
            .step(AttachToPoolStep(handle.clone()))
            .step(SetupReserveStep(handle.clone()));

        Self {
            handle,
            initialization,
            pipeline,
            idempotency,
            repository,
            status_cache: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.initialization = self.initialization.with_metrics(Some(metrics.clone()));
        self.pipeline = self.pipeline.with_metrics(Some(metrics.clone()));
        self.metrics = Some(metrics);
        self
    }

    pub fn settings(&self) -> &IntegrationSettings {
        &self.handle.settings
    }

    /// Principal the adapter must be administered by
    pub fn signer_address(&self) -> &Address {
        self.handle.executor.signer().address()
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.pipeline.step_names()
    }

    /// Attach `entity` to the configured lending pool.
    ///
    /// Repeated calls for an integrated entity are no-ops. Every failure is
    /// returned to the caller.
    pub async fn integrate(
        &self,
        entity: &AssetEntity,
    ) -> Result<IntegrationOutcome, IntegrationError> {
        let flow = FlowSpan::integration(entity.id());
        self.integrate_guarded(entity).instrument(flow.span()).await
    }

    async fn integrate_guarded(
        &self,
        entity: &AssetEntity,
    ) -> Result<IntegrationOutcome, IntegrationError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, entity.id()) else {
            warn!(entity = %entity.id(), "Integration already in progress");
            self.record_skipped("already_in_progress");
            return Err(IntegrationError::AlreadyInProgress {
                entity: entity.id().to_string(),
            });
        };

        if self.idempotency.contains(entity.id()).await? {
            info!(entity = %entity.id(), "Entity already integrated, skipping");
            self.record_skipped("already_integrated");
            return Ok(IntegrationOutcome::AlreadyIntegrated);
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_integration_started();
        }

        let result = self.integrate_inner(entity).await;

        match &result {
            Ok(outcome) => {
                if let Some(metrics) = &self.metrics {
                    let label = if outcome.ran_pipeline() {
                        "success"
                    } else {
                        "already_integrated"
                    };
                    metrics.record_integration_finished(label);
                }
            }
            Err(e) => {
                error!(entity = %entity.id(), error = %e, error_type = e.kind(), "Integration failed");
                if let Some(metrics) = &self.metrics {
                    metrics.record_integration_finished(e.kind());
                    metrics.record_error(e.kind());
                }
            }
        }

        result
    }

    async fn integrate_inner(
        &self,
        entity: &AssetEntity,
    ) -> Result<IntegrationOutcome, IntegrationError> {
        let signer = self.signer_address().clone();
        let mut ctx = IntegrationContext {
            entity: entity.clone(),
            admin: signer.clone(),
        };
        let mut steps = Vec::new();

        // Adapter admin, read before any mutation
        match run_query(self.handle.query.as_ref(), self.handle.adapter(), &GetAdmin).await? {
            None => {
                info!(adapter = %self.handle.adapter(), admin = %signer, "Initializing lending adapter");
                let (init_steps, fatal) = self.initialization.run(&mut ctx).await.into_parts();
                steps.extend(init_steps);
                if let Some(err) = fatal {
                    return Err(IntegrationError::InitializationFailed(err));
                }
            }
            Some(admin) if admin != signer => {
                return Err(IntegrationError::AdminMismatch {
                    expected: admin.to_string(),
                    actual: signer.to_string(),
                });
            }
            Some(_) => {}
        }

        // Another trigger may have finished while the precheck ran
        if self.idempotency.contains(entity.id()).await? {
            info!(entity = %entity.id(), "Entity integrated concurrently, skipping");
            return Ok(IntegrationOutcome::AlreadyIntegrated);
        }

        let (pipeline_steps, fatal) = self.pipeline.run(&mut ctx).await.into_parts();
        steps.extend(pipeline_steps);
        if let Some(source) = fatal {
            let step = steps
                .iter()
                .find(|s| s.is_fatal_failure())
                .map(|s| s.step_name.clone())
                .unwrap_or_default();
            return Err(IntegrationError::StepFailed { step, source });
        }

        self.idempotency.insert(entity.id()).await?;

        let status = IntegrationStatus::from_checks(&self.handle.pool().address, true, true, true);
        self.status_cache
            .write()
            .await
            .insert(entity.id().to_string(), status.clone());

        info!(
            entity = %entity.id(),
            symbol = %entity.symbol,
            pool = %self.handle.pool().address,
            "Entity integrated with lending pool"
        );

        Ok(IntegrationOutcome::Integrated { status, steps })
    }

    /// Status recorded by the last successful integration of `entity`
    pub async fn cached_status(&self, entity: &AssetEntity) -> Option<IntegrationStatus> {
        self.status_cache.read().await.get(entity.id()).cloned()
    }

    pub async fn is_integrated(&self, entity: &AssetEntity) -> Result<bool, IntegrationError> {
        Ok(self.idempotency.contains(entity.id()).await?)
    }

    /// Real deployments administered by the current signer that are not yet integrated
    pub async fn pending_integrations(&self) -> Result<Vec<AssetEntity>, IntegrationError> {
        let signer = self.signer_address().clone();
        let records = self.repository.list_by_origin(DeploymentOrigin::Real).await?;

        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for record in records {
            if record.admin != signer.as_str() || !seen.insert(record.primary_address.clone()) {
                continue;
            }

            let contract = match Address::parse(&record.primary_address) {
                Ok(contract) => contract,
                Err(e) => {
                    debug!(id = %record.id, error = %e, "Skipping record with malformed address");
                    continue;
                }
            };

            if self.idempotency.contains(contract.as_str()).await? {
                continue;
            }
            pending.push(AssetEntity::new(contract, record.symbol, signer.clone()));
        }

        Ok(pending)
    }

    fn record_skipped(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_integration_skipped(outcome);
        }
    }
}
