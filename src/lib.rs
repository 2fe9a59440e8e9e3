//! # MapSync
//!
//! Location-resolution and subscription-synchronization engine for map
//! containers.
//!
//! - [`domain`]: domain model, configuration and port traits
//! - [`app`]: resolution use cases and the container controller
//! - [`infra`]: in-memory host adapters and configuration files
//! - [`bootstrap`]: tracing setup and controller wiring

pub mod bootstrap;

pub use ms_app as app;
pub use ms_core as domain;
pub use ms_infra as infra;

pub use ms_app::{ContainerController, ControllerDeps, ControllerError, ControllerHandle};
pub use ms_core::{MapsConfig, ResolutionOutcome};
