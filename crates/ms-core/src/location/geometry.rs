//! Geometry validation.

use std::ops::RangeInclusive;

use super::Coordinate;

pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// A point is valid iff both coordinates are finite and inside their ranges.
pub fn is_valid(point: &Coordinate) -> bool {
    point.latitude.is_finite()
        && point.longitude.is_finite()
        && LATITUDE_RANGE.contains(&point.latitude)
        && LONGITUDE_RANGE.contains(&point.longitude)
}
