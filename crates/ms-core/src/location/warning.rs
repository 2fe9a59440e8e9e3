use thiserror::Error;

use crate::ids::RecordId;

/// Non-fatal problem collected during one cycle.
///
/// The `Display` form is what the rendering boundary shows; the fields keep
/// enough context to diagnose the offending record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionWarning {
    #[error("invalid location: latitude '{latitude}', longitude '{longitude}'")]
    InvalidLocation {
        latitude: f64,
        longitude: f64,
        record: Option<RecordId>,
    },

    #[error("Error parsing GeoJSON for obj {record}")]
    ShapeParse {
        record: RecordId,
        attribute: String,
        reason: String,
    },

    #[error("{message}")]
    Backend { message: String },

    #[error("{0}")]
    Configuration(String),
}
