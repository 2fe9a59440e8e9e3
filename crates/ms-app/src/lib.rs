//! MapSync Application Orchestration Layer
//!
//! This crate contains the resolution use cases (marker resolution, source
//! fetching, the location resolution pipeline, subscription management and
//! action dispatch) and the container controller that drives them.

pub mod controller;
pub mod usecases;

pub use controller::{
    ContainerController, ControllerCommand, ControllerDeps, ControllerError, ControllerHandle,
};
pub use usecases::{
    ActionDispatcher, LocationResolutionPipeline, MarkerResolver, SourceFetcher,
    SubscriptionManager,
};
