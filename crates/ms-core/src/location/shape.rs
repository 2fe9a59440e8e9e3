use serde_json::Value;

use crate::record::RecordRef;

/// A record carrying a parsed geo shape (GeoJSON) and optional style.
///
/// Records whose shape payload cannot be parsed never become a `GeoShape`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoShape {
    pub record: RecordRef,
    pub shape: Value,
    pub style: Option<Value>,
}
