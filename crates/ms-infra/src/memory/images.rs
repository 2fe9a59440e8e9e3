use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ms_core::ids::RecordId;
use ms_core::ports::{BackendError, MarkerImagePort};
use ms_core::record::Record;

use super::lock;

/// Marker images keyed by (record id, system image path).
#[derive(Default)]
pub struct InMemoryMarkerImages {
    images: Mutex<HashMap<(RecordId, String), String>>,
}

impl InMemoryMarkerImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: impl Into<RecordId>, path: impl Into<String>, url: impl Into<String>) {
        lock(&self.images).insert((record.into(), path.into()), url.into());
    }
}

#[async_trait]
impl MarkerImagePort for InMemoryMarkerImages {
    async fn system_image_url(&self, record: &Record, path: &str) -> Result<Option<String>, BackendError> {
        Ok(lock(&self.images)
            .get(&(record.id().clone(), path.to_string()))
            .cloned())
    }
}
