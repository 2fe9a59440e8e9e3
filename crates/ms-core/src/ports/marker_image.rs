use async_trait::async_trait;

use super::BackendError;
use crate::record::Record;

/// Looks up backend-hosted marker images.
#[async_trait]
pub trait MarkerImagePort: Send + Sync {
    /// URL of the system image reached from `record` through `path`.
    ///
    /// `Ok(None)` when the record has no image at that path.
    async fn system_image_url(&self, record: &Record, path: &str) -> Result<Option<String>, BackendError>;
}
