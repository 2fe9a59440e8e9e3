use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ms_core::ids::RecordId;
use ms_core::ports::SubscriptionTarget;
use ms_core::record::{AttributeValue, RecordRef};
use tracing::debug;

use super::lock;
use super::notifier::InMemoryChangeNotifier;

/// Body of a registered procedure: receives the records of the requested
/// entity and the anchor, returns the procedure's result.
pub type ProcedureFn = Arc<dyn Fn(&[RecordRef], Option<&RecordRef>) -> Vec<RecordRef> + Send + Sync>;

/// In-memory record store (内存记录存储).
///
/// Records keep insertion order. Every mutation notifies the attached
/// [`InMemoryChangeNotifier`]:
///
/// | mutation | targets fired |
/// |----------|---------------|
/// | insert   | entity |
/// | update   | object, attribute, entity |
/// | remove   | object, entity |
pub struct InMemoryStore {
    records: Mutex<Vec<RecordRef>>,
    procedures: Mutex<HashMap<String, ProcedureFn>>,
    notifier: Arc<InMemoryChangeNotifier>,
}

impl InMemoryStore {
    pub fn new(notifier: Arc<InMemoryChangeNotifier>) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            procedures: Mutex::new(HashMap::new()),
            notifier,
        }
    }

    pub fn notifier(&self) -> Arc<InMemoryChangeNotifier> {
        self.notifier.clone()
    }

    /// Records of `entity`, in insertion order.
    pub fn records_of(&self, entity: &str) -> Vec<RecordRef> {
        lock(&self.records)
            .iter()
            .filter(|record| record.entity() == entity)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &RecordId) -> Option<RecordRef> {
        lock(&self.records)
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    /// Insert or replace a record by id.
    pub fn insert(&self, record: impl Into<RecordRef>) -> RecordRef {
        let record = record.into();
        {
            let mut records = lock(&self.records);
            match records.iter_mut().find(|existing| existing.id() == record.id()) {
                Some(existing) => *existing = record.clone(),
                None => records.push(record.clone()),
            }
        }
        debug!(record_id = %record.id(), entity = %record.entity(), "Record inserted");
        self.notifier.notify(&[SubscriptionTarget::Entity {
            entity: record.entity().to_string(),
        }]);
        record
    }

    /// Set one attribute of a stored record.
    ///
    /// The stored record is replaced by an updated copy; previously handed out
    /// references keep the old values. Returns `None` for an unknown id.
    pub fn update(
        &self,
        id: &RecordId,
        attribute: &str,
        value: impl Into<AttributeValue>,
    ) -> Option<RecordRef> {
        let updated = {
            let mut records = lock(&self.records);
            let slot = records.iter_mut().find(|record| record.id() == id)?;
            let mut next = slot.as_ref().clone();
            next.set(attribute, value);
            *slot = Arc::new(next);
            slot.clone()
        };
        debug!(record_id = %id, attribute, "Record updated");
        self.notifier.notify(&[
            SubscriptionTarget::Object { record: id.clone() },
            SubscriptionTarget::Attribute {
                record: id.clone(),
                attribute: attribute.to_string(),
            },
            SubscriptionTarget::Entity {
                entity: updated.entity().to_string(),
            },
        ]);
        Some(updated)
    }

    pub fn remove(&self, id: &RecordId) -> Option<RecordRef> {
        let removed = {
            let mut records = lock(&self.records);
            let index = records.iter().position(|record| record.id() == id)?;
            records.remove(index)
        };
        debug!(record_id = %id, "Record removed");
        self.notifier.notify(&[
            SubscriptionTarget::Object { record: id.clone() },
            SubscriptionTarget::Entity {
                entity: removed.entity().to_string(),
            },
        ]);
        Some(removed)
    }

    pub fn register_procedure<F>(&self, name: impl Into<String>, body: F)
    where
        F: Fn(&[RecordRef], Option<&RecordRef>) -> Vec<RecordRef> + Send + Sync + 'static,
    {
        lock(&self.procedures).insert(name.into(), Arc::new(body));
    }

    pub(crate) fn procedure(&self, name: &str) -> Option<ProcedureFn> {
        lock(&self.procedures).get(name).cloned()
    }
}
