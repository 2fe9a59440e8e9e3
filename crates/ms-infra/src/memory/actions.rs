use std::sync::Mutex;

use async_trait::async_trait;
use ms_core::location::PagePlacement;
use ms_core::ports::{ActionContext, ActionError, ActionPort};
use tracing::info;

use super::lock;

/// One action received by [`RecordingActions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionInvocation {
    Procedure { name: String, context: ActionContext },
    ClientProcedure { name: String, context: ActionContext },
    OpenView {
        page: String,
        context: ActionContext,
        placement: PagePlacement,
    },
}

/// [`ActionPort`] that records invocations and reported errors.
///
/// Names listed with [`fail`](Self::fail) are rejected with
/// [`ActionError::Failed`].
#[derive(Default)]
pub struct RecordingActions {
    invocations: Mutex<Vec<ActionInvocation>>,
    errors: Mutex<Vec<String>>,
    failing: Mutex<Vec<String>>,
}

impl RecordingActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, name: impl Into<String>) {
        lock(&self.failing).push(name.into());
    }

    pub fn invocations(&self) -> Vec<ActionInvocation> {
        lock(&self.invocations).clone()
    }

    pub fn reported_errors(&self) -> Vec<String> {
        lock(&self.errors).clone()
    }

    fn record(&self, name: &str, invocation: ActionInvocation) -> Result<(), ActionError> {
        lock(&self.invocations).push(invocation);
        if lock(&self.failing).iter().any(|failing| failing == name) {
            return Err(ActionError::Failed(format!("{name} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl ActionPort for RecordingActions {
    async fn invoke_procedure(&self, name: &str, context: &ActionContext) -> Result<(), ActionError> {
        self.record(
            name,
            ActionInvocation::Procedure {
                name: name.to_string(),
                context: context.clone(),
            },
        )
    }

    async fn invoke_client_procedure(&self, name: &str, context: &ActionContext) -> Result<(), ActionError> {
        self.record(
            name,
            ActionInvocation::ClientProcedure {
                name: name.to_string(),
                context: context.clone(),
            },
        )
    }

    async fn open_view(
        &self,
        page: &str,
        context: &ActionContext,
        placement: PagePlacement,
    ) -> Result<(), ActionError> {
        self.record(
            page,
            ActionInvocation::OpenView {
                page: page.to_string(),
                context: context.clone(),
                placement,
            },
        )
    }

    fn report_error(&self, message: &str) {
        info!(message, "User-visible error reported");
        lock(&self.errors).push(message.to_string());
    }
}
