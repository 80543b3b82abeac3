//! # Servant Query Module
//!
//! Read-only lookups over the persisted dataset. Every call reloads the file,
//! so a query always sees the latest completed scrape and never needs a lock:
//! the store replaces the file atomically.
//!
//! A missing, corrupt or empty file all read as "no data"; callers only see
//! [`QueryError`], never storage errors.

use thiserror::Error;
use tracing::{debug, instrument};

use crate::crawler::DatasetStore;
use crate::error::Error as CrateError;
use crate::servant::{Dataset, ServantRecord};

/// "No such resource" outcomes of a query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// There is no servant data at all
    #[error("No servant data available")]
    NoData,

    /// No servant has the requested id
    #[error("Servant {0} not found")]
    NotFound(u32),
}

impl From<QueryError> for CrateError {
    fn from(err: QueryError) -> Self {
        CrateError::NotFound(err.to_string())
    }
}

/// Optional criteria for listing servants
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServantFilter {
    /// Class name, matched case-insensitively
    pub class: Option<String>,
    pub rarity: Option<u8>,
}

impl ServantFilter {
    pub fn matches(&self, record: &ServantRecord) -> bool {
        let class_ok = self.class.as_ref().is_none_or(|wanted| {
            record
                .class
                .as_ref()
                .is_some_and(|class| class.eq_ignore_ascii_case(wanted))
        });
        let rarity_ok = self.rarity.is_none_or(|wanted| record.rarity == Some(wanted));
        class_ok && rarity_ok
    }

    pub fn is_empty(&self) -> bool {
        self.class.is_none() && self.rarity.is_none()
    }
}

/// Lookups over the stored servant dataset
#[derive(Debug, Clone, Default)]
pub struct QueryService {
    store: DatasetStore,
}

impl QueryService {
    pub fn new(store: DatasetStore) -> Self {
        Self { store }
    }

    /// The whole dataset in stored order
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Dataset, QueryError> {
        let dataset = self.store.load().await;
        if dataset.is_empty() {
            return Err(QueryError::NoData);
        }
        debug!("Listing {} servants", dataset.len());
        Ok(dataset)
    }

    /// The servant with the given id
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: u32) -> Result<ServantRecord, QueryError> {
        let dataset = self.store.load().await;
        dataset
            .into_records()
            .into_iter()
            .find(|record| record.id == id)
            .ok_or(QueryError::NotFound(id))
    }

    /// Servants matching `filter`, in stored order
    ///
    /// An empty result is not an error as long as some data exists.
    pub async fn filter(&self, filter: &ServantFilter) -> Result<Vec<ServantRecord>, QueryError> {
        let dataset = self.list_all().await?;
        Ok(dataset
            .into_records()
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    async fn service_with(records: Vec<ServantRecord>) -> (TempDir, QueryService) {
        let dir = tempdir().unwrap();
        let store = DatasetStore::at(dir.path().join("servants.json"));
        store.save(&Dataset::from_records(records)).await.unwrap();
        (dir, QueryService::new(store))
    }

    fn catalog() -> Vec<ServantRecord> {
        vec![
            ServantRecord::new(1, "Mash Kyrielight")
                .with_class("Shielder")
                .with_rarity(4),
            ServantRecord::new(2, "Altria Pendragon")
                .with_class("Saber")
                .with_rarity(5),
            ServantRecord::new(8, "Gilles de Rais")
                .with_class("Saber")
                .with_rarity(3),
        ]
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let (_dir, service) = service_with(catalog()).await;

        let servant = service.get_by_id(2).await.unwrap();
        assert_eq!(servant.name, "Altria Pendragon");
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let (_dir, service) = service_with(catalog()).await;

        assert_eq!(service.get_by_id(9999).await, Err(QueryError::NotFound(9999)));
    }

    #[tokio::test]
    async fn test_list_all_preserves_order() {
        let (_dir, service) = service_with(catalog()).await;

        let ids: Vec<u32> = service.list_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 8]);
    }

    #[tokio::test]
    async fn test_missing_and_empty_collapse_to_no_data() {
        let dir = tempdir().unwrap();
        let missing = QueryService::new(DatasetStore::at(dir.path().join("absent.json")));
        assert_eq!(missing.list_all().await, Err(QueryError::NoData));
        assert_eq!(missing.get_by_id(1).await, Err(QueryError::NotFound(1)));

        let (_dir, empty) = service_with(Vec::new()).await;
        assert_eq!(empty.list_all().await, Err(QueryError::NoData));
    }

    #[tokio::test]
    async fn test_filter_by_class_and_rarity() {
        let (_dir, service) = service_with(catalog()).await;

        let sabers = service
            .filter(&ServantFilter {
                class: Some("saber".to_string()),
                rarity: None,
            })
            .await
            .unwrap();
        assert_eq!(sabers.len(), 2);

        let five_star_sabers = service
            .filter(&ServantFilter {
                class: Some("Saber".to_string()),
                rarity: Some(5),
            })
            .await
            .unwrap();
        assert_eq!(five_star_sabers.len(), 1);
        assert_eq!(five_star_sabers[0].id, 2);
    }

    #[test]
    fn test_filter_on_minimal_records() {
        let filter = ServantFilter {
            class: Some("Saber".to_string()),
            rarity: None,
        };
        assert!(!filter.matches(&ServantRecord::new(2, "Altria Pendragon")));
        assert!(ServantFilter::default().matches(&ServantRecord::new(2, "Altria Pendragon")));
    }
}
