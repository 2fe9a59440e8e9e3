//! Click dispatch
//!
//! 点击分发：把渲染层的点击映射回原始记录，并执行配置的动作。
//!
//! ## Behavior / 行为
//!
//! - Marker clicks look up the first rendered location whose latitude equals
//!   the clicked latitude. Longitude is not compared.
//! - A location without an owning record (static source) does nothing.
//! - Action failures go to the user-visible error channel and the log; they
//!   never propagate.

use std::sync::Arc;

use ms_core::location::{ClickAction, Coordinate, LocationSourceDescriptor, ResolvedLocation};
use ms_core::ports::{ActionContext, ActionPort};
use ms_core::record::{Record, RecordRef};
use tracing::{debug, error, info_span, Instrument};

pub struct ActionDispatcher {
    actions: Arc<dyn ActionPort>,
    friendly_id: String,
}

impl ActionDispatcher {
    pub fn new(actions: Arc<dyn ActionPort>, friendly_id: impl Into<String>) -> Self {
        Self {
            actions,
            friendly_id: friendly_id.into(),
        }
    }

    /// Run the click action of `descriptor` against the record rendered at `clicked`.
    pub async fn dispatch_marker_click(
        &self,
        locations: &[ResolvedLocation],
        clicked: Coordinate,
        descriptor: &LocationSourceDescriptor,
    ) {
        let span = info_span!(
            "usecase.dispatch_action.marker",
            friendly_id = %self.friendly_id,
            latitude = clicked.latitude,
            action = ?descriptor.on_click,
        );

        async {
            let Some(location) = locations
                .iter()
                .find(|location| location.latitude == clicked.latitude)
            else {
                debug!("No rendered location at clicked latitude");
                return;
            };
            let Some(record) = location.record.as_ref() else {
                debug!("Clicked location has no owning record");
                return;
            };

            self.execute(&descriptor.on_click, record).await;
        }
        .instrument(span)
        .await
    }

    /// Call the geo-shape click procedure, if one is configured.
    pub async fn dispatch_shape_click(&self, record: &RecordRef, procedure: Option<&str>) {
        let Some(procedure) = procedure.filter(|name| !name.is_empty()) else {
            return;
        };
        let span = info_span!(
            "usecase.dispatch_action.shape",
            friendly_id = %self.friendly_id,
            record_id = %record.id(),
            procedure = %procedure,
        );

        async {
            let context = ActionContext::for_record(record);
            if let Err(err) = self.actions.invoke_procedure(procedure, &context).await {
                self.report(format!(
                    "Error while executing on click microflow {procedure} : {err}"
                ));
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, action: &ClickAction, record: &Record) {
        let context = ActionContext::for_record(record);
        let failure = match action {
            ClickAction::CallProcedure { procedure } if !procedure.is_empty() => self
                .actions
                .invoke_procedure(procedure, &context)
                .await
                .err()
                .map(|err| format!("Error while executing on click microflow {procedure} : {err}")),
            ClickAction::CallClientProcedure { procedure } if !procedure.is_empty() => self
                .actions
                .invoke_client_procedure(procedure, &context)
                .await
                .err()
                .map(|err| format!("Error while executing on click nanoflow: {err}")),
            ClickAction::ShowPage { page, placement } if !page.is_empty() => self
                .actions
                .open_view(page, &context, *placement)
                .await
                .err()
                .map(|err| format!("Error while opening page {page}: {err}")),
            _ => None,
        };

        if let Some(message) = failure {
            self.report(message);
        }
    }

    fn report(&self, message: String) {
        error!("{}: {}", self.friendly_id, message);
        self.actions.report_error(&message);
    }
}
