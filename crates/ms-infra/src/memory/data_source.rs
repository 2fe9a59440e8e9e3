use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ms_core::ids::RecordId;
use ms_core::ports::{BackendError, DataSourcePort, RecordQuery};
use ms_core::record::RecordRef;
use tracing::debug;

use super::store::InMemoryStore;
use super::{constraint, lock};

/// [`DataSourcePort`] over an [`InMemoryStore`].
///
/// Counts every query it serves and can be switched into a failing mode to
/// simulate a backend outage.
pub struct InMemoryDataSource {
    store: Arc<InMemoryStore>,
    queries: AtomicUsize,
    failure: Mutex<Option<BackendError>>,
}

impl InMemoryDataSource {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self {
            store,
            queries: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    /// Number of requests received so far, failed ones and record reads included.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Reject every query with `failure` until cleared with `None`.
    pub fn fail_with(&self, failure: Option<BackendError>) {
        *lock(&self.failure) = failure;
    }

    fn run(&self, query: &RecordQuery) -> Result<Vec<RecordRef>, BackendError> {
        match query {
            RecordQuery::Constraint {
                entity,
                constraint,
                anchor,
            } => {
                let predicates = constraint::parse(constraint, anchor.as_ref())?;
                Ok(self
                    .store
                    .records_of(entity)
                    .into_iter()
                    .filter(|record| constraint::matches_all(&predicates, record))
                    .collect())
            }
            RecordQuery::Procedure {
                entity,
                procedure,
                input_parameter_entity,
                anchor,
            } => {
                let body = self.store.procedure(&procedure.name).ok_or_else(|| {
                    BackendError::Rejected(format!("procedure not found: {}", procedure.name))
                })?;
                if let (Some(expected), Some(anchor)) = (input_parameter_entity, anchor) {
                    if anchor.entity() != expected {
                        return Err(BackendError::Rejected(format!(
                            "procedure {} expects {expected}, got {}",
                            procedure.name,
                            anchor.entity()
                        )));
                    }
                }
                let records = self.store.records_of(entity);
                Ok(body(records.as_slice(), anchor.as_ref()))
            }
        }
    }
}

#[async_trait]
impl DataSourcePort for InMemoryDataSource {
    async fn query_records(&self, query: RecordQuery) -> Result<Vec<RecordRef>, BackendError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = lock(&self.failure).clone() {
            return Err(failure);
        }

        let records = self.run(&query)?;
        debug!(entity = %query.entity(), count = records.len(), "In-memory query served");
        Ok(records)
    }

    async fn get_record(&self, id: &RecordId) -> Result<Option<RecordRef>, BackendError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = lock(&self.failure).clone() {
            return Err(failure);
        }
        Ok(self.store.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryChangeNotifier;
    use ms_core::location::ProcedureRef;
    use ms_core::record::Record;

    fn seeded() -> (Arc<InMemoryStore>, InMemoryDataSource) {
        let store = Arc::new(InMemoryStore::new(Arc::new(InMemoryChangeNotifier::new())));
        store.insert(Record::new("s1", "Shop").with_attribute("Owner", "o1"));
        store.insert(Record::new("s2", "Shop").with_attribute("Owner", "o2"));
        store.insert(Record::new("s3", "Shop").with_attribute("Owner", "o1"));
        (store.clone(), InMemoryDataSource::new(store))
    }

    fn ids(records: &[RecordRef]) -> Vec<&str> {
        records.iter().map(|record| record.id().as_ref()).collect()
    }

    #[tokio::test]
    async fn test_constraint_query_filters_by_anchor() {
        let (_, source) = seeded();
        let anchor = Record::new("o1", "Owner").into_ref();

        let records = source
            .query_records(RecordQuery::Constraint {
                entity: "Shop".to_string(),
                constraint: "[Owner = '[%CurrentObject%]']".to_string(),
                anchor: Some(anchor),
            })
            .await
            .unwrap();

        assert_eq!(ids(&records), vec!["s1", "s3"]);
        assert_eq!(source.query_count(), 1);
    }

    #[tokio::test]
    async fn test_procedure_query_runs_registered_body() {
        let (store, source) = seeded();
        store.register_procedure("Shops.Reversed", |records, _| {
            records.iter().rev().cloned().collect()
        });

        let records = source
            .query_records(RecordQuery::Procedure {
                entity: "Shop".to_string(),
                procedure: ProcedureRef::server("Shops.Reversed"),
                input_parameter_entity: None,
                anchor: None,
            })
            .await
            .unwrap();

        assert_eq!(ids(&records), vec!["s3", "s2", "s1"]);
    }

    #[tokio::test]
    async fn test_unknown_procedure_is_rejected() {
        let (_, source) = seeded();

        let result = source
            .query_records(RecordQuery::Procedure {
                entity: "Shop".to_string(),
                procedure: ProcedureRef::server("Missing"),
                input_parameter_entity: None,
                anchor: None,
            })
            .await;

        assert_eq!(
            result,
            Err(BackendError::Rejected("procedure not found: Missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_procedure_input_entity_mismatch_is_rejected() {
        let (store, source) = seeded();
        store.register_procedure("Shops.ForOwner", |records, _| records.to_vec());

        let result = source
            .query_records(RecordQuery::Procedure {
                entity: "Shop".to_string(),
                procedure: ProcedureRef::server("Shops.ForOwner"),
                input_parameter_entity: Some("Owner".to_string()),
                anchor: Some(Record::new("x", "Region").into_ref()),
            })
            .await;

        assert!(matches!(result, Err(BackendError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_get_record_reads_latest_stored_state() {
        let (store, source) = seeded();
        let id = RecordId::from("s1");
        let before = source.get_record(&id).await.unwrap().unwrap();

        store.update(&id, "Owner", "o2");
        let after = source.get_record(&id).await.unwrap().unwrap();

        assert_eq!(before.text("Owner"), Some("o1"));
        assert_eq!(after.text("Owner"), Some("o2"));
        assert_eq!(source.get_record(&RecordId::from("gone")).await.unwrap(), None);
        assert_eq!(source.query_count(), 3);
    }

    #[tokio::test]
    async fn test_failure_mode_rejects_until_cleared() {
        let (_, source) = seeded();
        let query = RecordQuery::Constraint {
            entity: "Shop".to_string(),
            constraint: String::new(),
            anchor: None,
        };

        source.fail_with(Some(BackendError::Unavailable("down".to_string())));
        assert!(source.query_records(query.clone()).await.is_err());
        assert!(source.get_record(&RecordId::from("s1")).await.is_err());

        source.fail_with(None);
        assert_eq!(source.query_records(query).await.unwrap().len(), 3);
        assert_eq!(source.query_count(), 3);
    }
}
