//! Portfolio-wide lending status
//!
//! Queries run concurrently and are settled together. A failing entity gets
//! an error-flagged entry; it never hides or aborts the others.

use futures::future::join_all;
use rwa_issuance_ledger::{run_query, QueryClient, QueryError};
use rwa_issuance_metrics::{FlowKind, FlowSpan, MetricsCollector};
use rwa_issuance_types::{
    Address, AssetEntity, GetReserveInfo, GetTokenConfig, IntegrationStatus, PoolDescriptor,
    PoolExists,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// Read-only status queries against the lending adapter
pub struct StatusAggregator {
    query: Arc<dyn QueryClient>,
    adapter: Address,
    pool: PoolDescriptor,
    metrics: Option<Arc<MetricsCollector>>,
}

impl StatusAggregator {
    pub fn new(query: Arc<dyn QueryClient>, adapter: Address, pool: PoolDescriptor) -> Self {
        Self {
            query,
            adapter,
            pool,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Current status of one entity
    pub async fn status_of(&self, entity: &AssetEntity) -> Result<IntegrationStatus, QueryError> {
        let token_config = run_query(
            self.query.as_ref(),
            &self.adapter,
            &GetTokenConfig {
                token: entity.contract_address.clone(),
            },
        )
        .await?;
        let pool_exists = run_query(
            self.query.as_ref(),
            &self.adapter,
            &PoolExists {
                pool: self.pool.address.clone(),
            },
        )
        .await?;

        let reserve = run_query(
            self.query.as_ref(),
            &self.adapter,
            &GetReserveInfo {
                pool: self.pool.address.clone(),
                asset: entity.contract_address.clone(),
            },
        )
        .await?;

        let attached = token_config.is_some_and(|c| c.is_attached_to(&self.pool.address));
        let reserve_enabled = reserve.is_some_and(|r| r.enabled);
        Ok(IntegrationStatus::from_checks(
            &self.pool.address,
            pool_exists,
            attached,
            reserve_enabled,
        ))
    }

    /// Status of every entity, keyed by entity id.
    ///
    /// Each distinct id appears exactly once; failed queries yield an
    /// error-flagged status.
    pub async fn refresh_all(&self, entities: &[AssetEntity]) -> HashMap<String, IntegrationStatus> {
        let flow = FlowSpan::new(FlowKind::StatusRefresh, format!("{} entities", entities.len()));
        self.refresh_inner(entities).instrument(flow.span()).await
    }

    async fn refresh_inner(&self, entities: &[AssetEntity]) -> HashMap<String, IntegrationStatus> {
        let started = Instant::now();

        let settled = join_all(entities.iter().map(|entity| async move {
            let result = self.status_of(entity).await;
            if let Some(metrics) = &self.metrics {
                metrics.record_status_query(result.is_ok());
            }
            (entity.id().to_string(), result)
        }))
        .await;

        let mut statuses = HashMap::with_capacity(settled.len());
        for (id, result) in settled {
            let status = match result {
                Ok(status) => {
                    debug!(entity = %id, integrated = status.is_integrated(), "Status refreshed");
                    status
                }
                Err(e) => {
                    warn!(entity = %id, error = %e, "Status query failed");
                    IntegrationStatus::errored(format!("Failed to check status: {e}"))
                }
            };
            statuses.insert(id, status);
        }

        let integrated = statuses.values().filter(|s| s.is_integrated()).count();
        let errors = statuses.values().filter(|s| s.is_error()).count();
        info!(
            entities = statuses.len(),
            integrated,
            errors,
            "Status refresh complete"
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_status_refresh(integrated, started.elapsed());
        }

        statuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use rwa_issuance_ledger::mock::{MockLedger, MOCK_SIGNER};
    use serde_json::json;

    fn aggregator(ledger: &Arc<MockLedger>) -> StatusAggregator {
        StatusAggregator::new(ledger.clone(), addr(LENDING_ADAPTER), pool())
    }

    fn entity(token: &str) -> AssetEntity {
        AssetEntity::new(addr(token), "TKN", addr(MOCK_SIGNER))
    }

    #[tokio::test]
    async fn test_status_of_integrated_entity() {
        let ledger = Arc::new(MockLedger::new());
        ledger.add_pool(&addr(POOL));
        ledger.attach_token(&addr(POOL), &addr(ASSET_TOKEN));
        ledger.enable_reserve(&addr(POOL), &addr(ASSET_TOKEN));

        let status = aggregator(&ledger)
            .status_of(&entity(ASSET_TOKEN))
            .await
            .unwrap();

        assert!(status.is_integrated());
        assert_eq!(status.pool_address.as_deref(), Some(POOL));
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_configured() {
        let ledger = Arc::new(MockLedger::new());
        ledger.add_pool(&addr(POOL));

        let status = aggregator(&ledger)
            .status_of(&entity(ASSET_TOKEN))
            .await
            .unwrap();

        assert!(status.registered);
        assert!(!status.configured);
        assert!(!status.can_lend);
        assert!(!status.is_error());
    }

    #[tokio::test]
    async fn test_adapter_token_config_shape() {
        let ledger = Arc::new(MockLedger::new());
        ledger.add_pool(&addr(POOL));
        ledger.enable_reserve(&addr(POOL), &addr(ASSET_TOKEN));
        ledger.respond(
            "get_token_config",
            Ok(json!({
                "is_authorized": true,
                "liq_threshold": 8500,
                "ltv_ratio": 8000,
                "pool_address": POOL,
                "token_address": ASSET_TOKEN,
            })),
        );

        let status = aggregator(&ledger)
            .status_of(&entity(ASSET_TOKEN))
            .await
            .unwrap();

        assert!(status.is_integrated());
        assert!(status.can_lend);
    }

    #[tokio::test]
    async fn test_missing_reserve_is_not_lendable() {
        let ledger = Arc::new(MockLedger::new());
        ledger.add_pool(&addr(POOL));
        ledger.attach_token(&addr(POOL), &addr(ASSET_TOKEN));

        let status = aggregator(&ledger)
            .status_of(&entity(ASSET_TOKEN))
            .await
            .unwrap();

        assert!(status.registered);
        assert!(status.configured);
        assert!(!status.has_reserve);
        assert!(!status.can_lend);
        assert!(!status.is_integrated());
    }

    #[tokio::test]
    async fn test_token_in_another_pool_is_not_configured() {
        let ledger = Arc::new(MockLedger::new());
        ledger.add_pool(&addr(POOL));
        ledger.attach_token(&addr(ORACLE), &addr(ASSET_TOKEN));

        let status = aggregator(&ledger)
            .status_of(&entity(ASSET_TOKEN))
            .await
            .unwrap();

        assert!(!status.configured);
        assert!(!status.can_lend);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let ledger = Arc::new(MockLedger::new());
        ledger.add_pool(&addr(POOL));
        ledger.attach_token(&addr(POOL), &addr(ASSET_TOKEN));
        ledger.enable_reserve(&addr(POOL), &addr(ASSET_TOKEN));
        ledger.respond_for("get_token_config", &addr(OTHER_TOKEN), Ok(json!("garbage")));

        let statuses = aggregator(&ledger)
            .refresh_all(&[entity(ASSET_TOKEN), entity(OTHER_TOKEN)])
            .await;

        assert_eq!(statuses.len(), 2);
        assert!(statuses[ASSET_TOKEN].is_integrated());
        let failed = &statuses[OTHER_TOKEN];
        assert!(failed
            .error
            .as_deref()
            .unwrap()
            .starts_with("Failed to check status"));
    }

    #[tokio::test]
    async fn test_duplicate_entities_collapse() {
        let ledger = Arc::new(MockLedger::new());

        let statuses = aggregator(&ledger)
            .refresh_all(&[entity(ASSET_TOKEN), entity(ASSET_TOKEN)])
            .await;

        assert_eq!(statuses.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_portfolio() {
        let ledger = Arc::new(MockLedger::new());
        assert!(aggregator(&ledger).refresh_all(&[]).await.is_empty());
        assert!(ledger.queries().is_empty());
    }
}
