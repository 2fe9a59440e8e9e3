//! Side-effecting actions triggered by clicks.

use async_trait::async_trait;

use super::ActionError;
use crate::ids::RecordId;
use crate::location::PagePlacement;
use crate::record::Record;

/// Execution context bound to the clicked record (entity + identity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext {
    pub entity: String,
    pub record: RecordId,
}

impl ActionContext {
    pub fn for_record(record: &Record) -> Self {
        Self {
            entity: record.entity().to_string(),
            record: record.id().clone(),
        }
    }
}

#[async_trait]
pub trait ActionPort: Send + Sync {
    /// Invoke a server-side procedure.
    async fn invoke_procedure(&self, name: &str, context: &ActionContext) -> Result<(), ActionError>;

    /// Invoke a client-side procedure.
    async fn invoke_client_procedure(&self, name: &str, context: &ActionContext) -> Result<(), ActionError>;

    /// Open a page bound to `context`.
    async fn open_view(
        &self,
        page: &str,
        context: &ActionContext,
        placement: PagePlacement,
    ) -> Result<(), ActionError>;

    /// Show an error message to the user.
    fn report_error(&self, message: &str);
}
