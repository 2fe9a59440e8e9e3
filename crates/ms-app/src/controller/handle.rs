use std::sync::Arc;

use ms_core::config::MapsConfig;
use ms_core::location::{Coordinate, LocationSourceDescriptor, ResolutionOutcome};
use ms_core::ports::ActionPort;
use ms_core::record::RecordRef;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

use super::ControllerCommand;
use crate::usecases::ActionDispatcher;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("container controller is no longer running")]
    Stopped,
}

/// Cloneable front end of a running [`ContainerController`](super::ContainerController).
///
/// Host code feeds configuration through it; the rendering boundary reads
/// outcome snapshots and reports clicks through it.
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::UnboundedSender<ControllerCommand>,
    outcome: watch::Receiver<Arc<ResolutionOutcome>>,
    config: watch::Receiver<Option<Arc<MapsConfig>>>,
    actions: Arc<dyn ActionPort>,
}

impl ControllerHandle {
    pub(super) fn new(
        commands: mpsc::UnboundedSender<ControllerCommand>,
        outcome: watch::Receiver<Arc<ResolutionOutcome>>,
        config: watch::Receiver<Option<Arc<MapsConfig>>>,
        actions: Arc<dyn ActionPort>,
    ) -> Self {
        Self {
            commands,
            outcome,
            config,
            actions,
        }
    }

    /// Deliver a configuration and the current anchor record.
    pub fn configure(
        &self,
        config: impl Into<Arc<MapsConfig>>,
        anchor: Option<RecordRef>,
    ) -> Result<(), ControllerError> {
        self.send(ControllerCommand::Configure {
            config: config.into(),
            anchor,
        })
    }

    pub fn refresh(&self) -> Result<(), ControllerError> {
        self.send(ControllerCommand::Refresh)
    }

    /// Stop the controller; resolves once every subscription is released.
    pub async fn dispose(&self) -> Result<(), ControllerError> {
        let (done, acknowledged) = oneshot::channel();
        self.send(ControllerCommand::Dispose { done })?;
        acknowledged.await.map_err(|_| ControllerError::Stopped)
    }

    /// Latest published snapshot.
    pub fn outcome(&self) -> Arc<ResolutionOutcome> {
        self.outcome.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe_outcome(&self) -> watch::Receiver<Arc<ResolutionOutcome>> {
        self.outcome.clone()
    }

    /// Marker click from the rendering boundary.
    pub async fn on_marker_clicked(&self, clicked: Coordinate, descriptor: &LocationSourceDescriptor) {
        let Some(config) = self.applied_config() else {
            return;
        };
        let snapshot = self.outcome();
        ActionDispatcher::new(self.actions.clone(), config.friendly_id.clone())
            .dispatch_marker_click(&snapshot.locations, clicked, descriptor)
            .await;
    }

    /// Geo-shape click from the rendering boundary.
    pub async fn on_shape_clicked(&self, record: &RecordRef) {
        let Some(config) = self.applied_config() else {
            return;
        };
        let procedure = config
            .geo_shapes
            .as_ref()
            .and_then(|shapes| shapes.on_click_procedure.as_deref());
        ActionDispatcher::new(self.actions.clone(), config.friendly_id.clone())
            .dispatch_shape_click(record, procedure)
            .await;
    }

    fn applied_config(&self) -> Option<Arc<MapsConfig>> {
        self.config.borrow().clone()
    }

    fn send(&self, command: ControllerCommand) -> Result<(), ControllerError> {
        self.commands
            .send(command)
            .map_err(|_| ControllerError::Stopped)
    }
}
