//! # ms-core
//!
//! Core domain models and port interfaces for MapSync.
//!
//! This crate contains pure domain logic (records, location descriptors,
//! resolution outcomes, geometry validation, configuration) without any
//! infrastructure dependencies. Backends are reached only through the traits
//! in [`ports`].

pub mod config;
pub mod ids;
pub mod location;
pub mod ports;
pub mod record;

// Re-export commonly used types at the crate root
pub use config::{ConfigError, GeoShapeSource, MapProvider, MapsConfig};
pub use ids::{GenerationId, RecordId, SubscriptionHandle};
pub use location::{
    ClickAction, Coordinate, GeoShape, LocationSource, LocationSourceDescriptor, MarkerImage,
    ResolutionOutcome, ResolutionWarning, ResolvedLocation,
};
pub use record::{AttributeValue, Record, RecordRef};
