//! Location domain: source descriptors, resolved points, geo shapes and the
//! outcome snapshot handed to the rendering boundary.

pub mod descriptor;
pub mod geometry;
pub mod outcome;
pub mod resolved;
pub mod shape;
pub mod warning;

pub use descriptor::{
    ClickAction, CoordinateAttributes, DescriptorFingerprint, LocationSource,
    LocationSourceDescriptor, MarkerImage, PagePlacement, ProcedureRef, ProcedureRuntime,
    CURRENT_OBJECT_TOKEN,
};
pub use outcome::ResolutionOutcome;
pub use resolved::{Coordinate, ResolvedLocation};
pub use shape::GeoShape;
pub use warning::ResolutionWarning;
