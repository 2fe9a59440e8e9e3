//! Controller wiring
//!
//! 控制器装配：把端口实现注入控制器，并在 tokio 任务中运行它。

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ms_app::{ContainerController, ControllerDeps, ControllerHandle};
use ms_core::config::MapsConfig;
use ms_core::record::RecordRef;
use ms_infra::{
    FileMapsConfigRepository, InMemoryChangeNotifier, InMemoryDataSource, InMemoryMarkerImages,
    InMemoryStore, RecordingActions,
};
use tokio::task::JoinHandle;
use tracing::info;

/// A running controller and the task driving it.
pub struct RunningController {
    pub handle: ControllerHandle,
    pub task: JoinHandle<()>,
}

impl RunningController {
    /// Dispose the controller and wait for its task to end.
    pub async fn shutdown(self) -> Result<()> {
        self.handle
            .dispose()
            .await
            .context("dispose container controller failed")?;
        self.task
            .await
            .context("container controller task panicked")?;
        Ok(())
    }
}

/// Every adapter of the in-memory host, sharing one store.
pub struct InMemoryHost {
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<InMemoryChangeNotifier>,
    pub data_source: Arc<InMemoryDataSource>,
    pub images: Arc<InMemoryMarkerImages>,
    pub actions: Arc<RecordingActions>,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHost {
    pub fn new() -> Self {
        let notifier = Arc::new(InMemoryChangeNotifier::new());
        let store = Arc::new(InMemoryStore::new(notifier.clone()));
        Self {
            data_source: Arc::new(InMemoryDataSource::new(store.clone())),
            images: Arc::new(InMemoryMarkerImages::new()),
            actions: Arc::new(RecordingActions::new()),
            store,
            notifier,
        }
    }

    pub fn deps(&self) -> ControllerDeps {
        ControllerDeps {
            data_source: self.data_source.clone(),
            notifier: self.notifier.clone(),
            images: self.images.clone(),
            actions: self.actions.clone(),
        }
    }
}

/// Spawn an unconfigured controller.
///
/// Must be called from within a tokio runtime.
pub fn spawn(deps: ControllerDeps) -> RunningController {
    let (controller, handle) = ContainerController::new(deps);
    let task = tokio::spawn(controller.run());
    RunningController { handle, task }
}

/// Spawn a controller and hand it its first configuration.
pub fn launch(deps: ControllerDeps, config: MapsConfig, anchor: Option<RecordRef>) -> Result<RunningController> {
    let friendly_id = config.friendly_id.clone();
    let running = spawn(deps);

    running
        .handle
        .configure(config, anchor)
        .context("configure container controller failed")?;
    info!(friendly_id = %friendly_id, "Container controller launched");

    Ok(running)
}

/// [`launch`] with the configuration read from a TOML file.
pub async fn launch_from_file(
    deps: ControllerDeps,
    path: impl AsRef<Path>,
    anchor: Option<RecordRef>,
) -> Result<RunningController> {
    let config = FileMapsConfigRepository::new(path.as_ref()).load().await?;
    launch(deps, config, anchor)
}
