//! Container controller
//!
//! 容器控制器：持有配置、锚点、当前结果快照和当前订阅代，以 actor 方式串行处理所有事件。
//!
//! # Event loop / 事件循环
//!
//! ```text
//!  ControllerHandle ──Configure/Refresh/Dispose──┐
//!  subscription callback ──Changed{generation}───┼─> mpsc ─> run() ──> at most one in-flight pass
//!                                                │                         │
//!                                                │              settle: publish outcome (watch)
//!                                                │                         │
//!                                                └─────── pending? start exactly one follow-up
//! ```
//!
//! The pass future is polled inside the actor task, so all state is owned by
//! one task and no locking is needed.

mod handle;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::FutureExt;
use ms_core::config::MapsConfig;
use ms_core::ids::GenerationId;
use ms_core::location::{ResolutionOutcome, ResolutionWarning};
use ms_core::ports::{ActionPort, ChangeNotificationPort, DataSourcePort, MarkerImagePort};
use ms_core::record::RecordRef;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::usecases::{GenerationSink, LocationResolutionPipeline, SubscriptionManager};

pub use handle::{ControllerError, ControllerHandle};

type PassFuture = Pin<Box<dyn Future<Output = ResolutionOutcome> + Send>>;

/// Whether a pass may use the anchor snapshot as delivered or must re-read it.
#[derive(Debug, Clone, Copy)]
enum AnchorState {
    Delivered,
    Reload,
}

/// Messages processed by the controller task.
#[derive(Debug)]
pub enum ControllerCommand {
    /// New configuration and/or anchor from the host.
    Configure {
        config: Arc<MapsConfig>,
        anchor: Option<RecordRef>,
    },
    /// A subscription of `generation` reported a change.
    Changed { generation: GenerationId },
    /// Manual refresh from the rendering boundary.
    Refresh,
    /// Release everything and stop; `done` fires once subscriptions are gone.
    Dispose { done: oneshot::Sender<()> },
}

/// Host collaborators the controller is wired with.
#[derive(Clone)]
pub struct ControllerDeps {
    pub data_source: Arc<dyn DataSourcePort>,
    pub notifier: Arc<dyn ChangeNotificationPort>,
    pub images: Arc<dyn MarkerImagePort>,
    pub actions: Arc<dyn ActionPort>,
}

pub struct ContainerController {
    pipeline: Arc<LocationResolutionPipeline>,
    subscriptions: SubscriptionManager,
    commands: mpsc::UnboundedReceiver<ControllerCommand>,
    outcome_tx: watch::Sender<Arc<ResolutionOutcome>>,
    config_tx: watch::Sender<Option<Arc<MapsConfig>>>,
    config: Option<Arc<MapsConfig>>,
    anchor: Option<RecordRef>,
    in_flight: Option<PassFuture>,
    pending: bool,
    disposed: bool,
}

impl ContainerController {
    pub fn new(deps: ControllerDeps) -> (Self, ControllerHandle) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = watch::channel(Arc::new(ResolutionOutcome::default()));
        let (config_tx, config_rx) = watch::channel(None);

        // Callbacks hold a weak sender so dropping every handle still ends `run`.
        let weak_tx = command_tx.downgrade();
        let sink: GenerationSink = Arc::new(move |generation| {
            let Some(tx) = weak_tx.upgrade() else {
                return;
            };
            if let Err(err) = tx.send(ControllerCommand::Changed { generation }) {
                debug!(error = %err, "Controller gone, dropping change notification");
            }
        });

        let controller = Self {
            pipeline: Arc::new(LocationResolutionPipeline::new(
                deps.data_source,
                deps.images,
            )),
            subscriptions: SubscriptionManager::new(deps.notifier, sink),
            commands,
            outcome_tx,
            config_tx,
            config: None,
            anchor: None,
            in_flight: None,
            pending: false,
            disposed: false,
        };
        let handle = ControllerHandle::new(command_tx, outcome_rx, config_rx, deps.actions);
        (controller, handle)
    }

    /// Drive the controller until disposed or every handle is dropped.
    pub async fn run(mut self) {
        info!("Container controller started");

        while !self.disposed {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        debug!("All controller handles dropped");
                        break;
                    }
                },
                outcome = next_outcome(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    self.settle(outcome);
                }
            }
        }

        self.subscriptions.release_all();
        info!("Container controller stopped");
    }

    async fn handle_command(&mut self, command: ControllerCommand) {
        match command {
            ControllerCommand::Configure { config, anchor } => {
                self.configure(config, anchor).await;
            }
            ControllerCommand::Changed { generation } => {
                if self.subscriptions.is_current(generation) {
                    debug!(generation = %generation, "Upstream change notification");
                    self.request_pass();
                } else {
                    debug!(generation = %generation, "Ignoring notification from superseded generation");
                }
            }
            ControllerCommand::Refresh => {
                debug!("Manual refresh requested");
                self.request_pass();
            }
            ControllerCommand::Dispose { done } => {
                self.in_flight = None;
                self.pending = false;
                self.subscriptions.release_all();
                self.config_tx.send_replace(None);
                self.disposed = true;
                info!("Container controller disposed");
                if done.send(()).is_err() {
                    debug!("Dispose requester went away before acknowledgement");
                }
            }
        }
    }

    async fn configure(&mut self, config: Arc<MapsConfig>, anchor: Option<RecordRef>) {
        // A new configuration supersedes whatever was in flight.
        self.in_flight = None;
        self.pending = false;

        if let Err(err) = config.validate() {
            warn!(friendly_id = %config.friendly_id, error = %err, "Invalid map configuration");
            self.subscriptions.release_all();
            self.config = None;
            self.anchor = anchor;
            self.config_tx.send_replace(None);
            self.publish(ResolutionOutcome::failed(ResolutionWarning::Configuration(
                err.to_string(),
            )));
            return;
        }

        match self
            .subscriptions
            .reconcile(anchor.as_ref(), &config.locations)
            .await
        {
            Ok(true) => debug!(
                live_handles = self.subscriptions.live_handle_count(),
                "Subscriptions rebuilt"
            ),
            Ok(false) => {}
            Err(err) => warn!(error = %err, "Failed to register change subscriptions"),
        }

        self.config = Some(config.clone());
        self.anchor = anchor;
        self.config_tx.send_replace(Some(config));
        // The host just handed over this anchor, so it is already current.
        self.start_pass(AnchorState::Delivered);
    }

    /// Start a pass now, or remember that one is owed after the current one.
    fn request_pass(&mut self) {
        if self.config.is_none() {
            return;
        }
        if self.in_flight.is_some() {
            self.pending = true;
        } else {
            self.start_pass(AnchorState::Reload);
        }
    }

    fn start_pass(&mut self, anchor_state: AnchorState) {
        let Some(config) = self.config.clone() else {
            return;
        };
        let busy = self.outcome_tx.borrow().to_busy();
        self.outcome_tx.send_replace(Arc::new(busy));

        let pipeline = self.pipeline.clone();
        let anchor = self.anchor.clone();
        self.in_flight = Some(
            async move {
                match anchor_state {
                    AnchorState::Delivered => pipeline.resolve(&config, anchor.as_ref()).await,
                    AnchorState::Reload => pipeline.resolve_current(&config, anchor.as_ref()).await,
                }
            }
            .boxed(),
        );
    }

    fn settle(&mut self, outcome: ResolutionOutcome) {
        self.publish(outcome);
        if std::mem::take(&mut self.pending) {
            debug!("Running coalesced follow-up pass");
            self.start_pass(AnchorState::Reload);
        }
    }

    fn publish(&self, outcome: ResolutionOutcome) {
        let alert = outcome.alert_message();
        if !alert.is_empty() {
            warn!(alert = %alert, "Resolution finished with warnings");
        }
        self.outcome_tx.send_replace(Arc::new(outcome));
    }
}

async fn next_outcome(in_flight: &mut Option<PassFuture>) -> ResolutionOutcome {
    match in_flight {
        Some(pass) => pass.await,
        None => std::future::pending().await,
    }
}
