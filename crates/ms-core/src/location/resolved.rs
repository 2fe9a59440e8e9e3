use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{geometry, LocationSourceDescriptor};
use crate::record::RecordRef;

/// A latitude/longitude pair, as clicked or as resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        geometry::is_valid(self)
    }
}

/// A render-ready point.
///
/// Created fresh on every resolution pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Owning record; absent for static coordinates.
    pub record: Option<RecordRef>,
    pub marker_url: Option<String>,
    pub descriptor: Option<Arc<LocationSourceDescriptor>>,
}

impl ResolvedLocation {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn is_valid(&self) -> bool {
        self.coordinate().is_valid()
    }
}
