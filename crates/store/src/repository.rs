use chrono::{DateTime, Utc};
use rwa_issuance_types::{DeploymentOrigin, DeploymentRecord, TokenTemplate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::{RecordStore, StoreError, DEPLOYMENTS_COLLECTION};

/// Summary over all persisted deployment records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentStats {
    pub total: usize,
    pub real: usize,
    pub fallback: usize,
    pub by_template: HashMap<TokenTemplate, usize>,
    pub last_created: Option<DateTime<Utc>>,
}

/// Typed, append-only view over the deployment records collection
#[derive(Clone)]
pub struct DeploymentRepository {
    store: Arc<dyn RecordStore>,
}

impl DeploymentRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Persist a new record. Ids are unique; an existing id is never overwritten.
    pub async fn save(&self, record: &DeploymentRecord) -> Result<(), StoreError> {
        let value = serde_json::to_value(record)?;
        self.store
            .insert(DEPLOYMENTS_COLLECTION, &record.id, value)
            .await?;
        debug!(id = %record.id, symbol = %record.symbol, origin = %record.origin, "Saved deployment record");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<DeploymentRecord>, StoreError> {
        match self.store.get(DEPLOYMENTS_COLLECTION, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// All records, newest first
    pub async fn list(&self) -> Result<Vec<DeploymentRecord>, StoreError> {
        let mut records = self
            .store
            .list(DEPLOYMENTS_COLLECTION)
            .await?
            .into_iter()
            .map(|(_, value)| serde_json::from_value::<DeploymentRecord>(value))
            .collect::<Result<Vec<_>, _>>()?;

        // Insertion order breaks ties between equal timestamps
        records.reverse();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    pub async fn list_by_origin(
        &self,
        origin: DeploymentOrigin,
    ) -> Result<Vec<DeploymentRecord>, StoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.origin == origin)
            .collect())
    }

    pub async fn list_by_template(
        &self,
        template: TokenTemplate,
    ) -> Result<Vec<DeploymentRecord>, StoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.template == template)
            .collect())
    }

    /// Most recent record whose asset lives at `address`
    pub async fn find_by_address(
        &self,
        address: &str,
    ) -> Result<Option<DeploymentRecord>, StoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|r| r.primary_address == address))
    }

    pub async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        self.store.remove(DEPLOYMENTS_COLLECTION, id).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear(DEPLOYMENTS_COLLECTION).await
    }

    pub async fn stats(&self) -> Result<DeploymentStats, StoreError> {
        let records = self.list().await?;
        let mut stats = DeploymentStats {
            total: records.len(),
            last_created: records.first().map(|r| r.created_at),
            ..DeploymentStats::default()
        };

        for record in &records {
            match record.origin {
                DeploymentOrigin::Real => stats.real += 1,
                DeploymentOrigin::Fallback => stats.fallback += 1,
            }
            *stats.by_template.entry(record.template).or_insert(0) += 1;
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStore;
    use chrono::Duration;
    use rwa_issuance_types::{TokenConfigSnapshot, TokenCreationForm};

    fn record(id: &str, origin: DeploymentOrigin, template: TokenTemplate, age_secs: i64) -> DeploymentRecord {
        let form = TokenCreationForm::new("Acme T-Bill", "ACME", 7, "ADDR1").with_template(template);
        DeploymentRecord {
            id: id.to_string(),
            name: form.name.clone(),
            symbol: form.symbol.clone(),
            decimals: form.decimals,
            admin: form.admin.clone(),
            template,
            primary_address: format!("C-{}", id),
            tx_reference: "ref".to_string(),
            auxiliary_addresses: Vec::new(),
            created_at: Utc::now() - Duration::seconds(age_secs),
            origin,
            config_snapshot: TokenConfigSnapshot::from_form(&form, 1_000),
        }
    }

    fn repository() -> DeploymentRepository {
        DeploymentRepository::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_save_is_append_only() {
        let repo = repository();
        let first = record("id-1", DeploymentOrigin::Real, TokenTemplate::RwaDebt, 0);
        repo.save(&first).await.unwrap();

        let mut clash = first.clone();
        clash.symbol = "OTHER".to_string();
        assert!(matches!(
            repo.save(&clash).await,
            Err(StoreError::DuplicateId(_))
        ));
        assert_eq!(repo.get("id-1").await.unwrap().unwrap().symbol, "ACME");
    }

    #[tokio::test]
    async fn test_list_newest_first_and_filters() {
        let repo = repository();
        repo.save(&record("old", DeploymentOrigin::Real, TokenTemplate::RwaDebt, 60))
            .await
            .unwrap();
        repo.save(&record("new", DeploymentOrigin::Fallback, TokenTemplate::FundShare, 0))
            .await
            .unwrap();

        let ids: Vec<_> = repo.list().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["new", "old"]);

        let fallback = repo.list_by_origin(DeploymentOrigin::Fallback).await.unwrap();
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback[0].id, "new");

        let debt = repo.list_by_template(TokenTemplate::RwaDebt).await.unwrap();
        assert_eq!(debt[0].id, "old");

        assert_eq!(repo.find_by_address("C-old").await.unwrap().unwrap().id, "old");
    }

    #[tokio::test]
    async fn test_stats() {
        let repo = repository();
        repo.save(&record("a", DeploymentOrigin::Real, TokenTemplate::RwaDebt, 30))
            .await
            .unwrap();
        repo.save(&record("b", DeploymentOrigin::Fallback, TokenTemplate::RwaDebt, 10))
            .await
            .unwrap();
        repo.save(&record("c", DeploymentOrigin::Fallback, TokenTemplate::Custom, 20))
            .await
            .unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.real, 1);
        assert_eq!(stats.fallback, 2);
        assert_eq!(stats.by_template.get(&TokenTemplate::RwaDebt), Some(&2));
        assert!(stats.last_created.is_some());
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let repo = repository();
        repo.save(&record("a", DeploymentOrigin::Real, TokenTemplate::Custom, 0))
            .await
            .unwrap();
        repo.save(&record("b", DeploymentOrigin::Real, TokenTemplate::Custom, 0))
            .await
            .unwrap();

        assert!(repo.remove("a").await.unwrap());
        assert_eq!(repo.list().await.unwrap().len(), 1);

        repo.clear().await.unwrap();
        assert_eq!(repo.stats().await.unwrap(), DeploymentStats::default());
    }
}
