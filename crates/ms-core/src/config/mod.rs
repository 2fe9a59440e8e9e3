//! Container configuration.
//!
//! One [`MapsConfig`] is delivered per configuration cycle. It is pure data:
//! [`MapsConfig::validate`] runs once when the configuration is received and
//! resolution code relies on the result instead of re-checking fields.

mod validation;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::location::{Coordinate, LocationSourceDescriptor};
use crate::record::coerce_number;

pub use validation::ConfigError;

/// Map rendering provider selected by the configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapProvider {
    #[default]
    OpenStreet,
    MapBox,
    HereMaps,
    GoogleMaps,
}

impl MapProvider {
    pub fn requires_api_token(&self) -> bool {
        matches!(self, MapProvider::MapBox | MapProvider::HereMaps)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MapProvider::OpenStreet => "OpenStreetMap",
            MapProvider::MapBox => "Mapbox",
            MapProvider::HereMaps => "HERE Maps",
            MapProvider::GoogleMaps => "Google Maps",
        }
    }
}

/// Optional geo-shape (GeoJSON) source, fetched through a procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoShapeSource {
    pub entity: String,
    pub shape_attribute: String,
    #[serde(default)]
    pub style_attribute: Option<String>,
    pub procedure: String,
    /// Procedure invoked when a shape is clicked.
    #[serde(default)]
    pub on_click_procedure: Option<String>,
}

/// One entry of the enumeration-keyed marker image mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationImage {
    pub enum_key: String,
    pub image_url: String,
}

/// Map center used when there are no locations to fit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultCenter {
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapsConfig {
    /// Name of the container instance used in logs.
    #[serde(default)]
    pub friendly_id: String,
    #[serde(default)]
    pub map_provider: MapProvider,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub default_center: DefaultCenter,
    #[serde(default)]
    pub locations: Vec<Arc<LocationSourceDescriptor>>,
    #[serde(default)]
    pub geo_shapes: Option<GeoShapeSource>,
    #[serde(default)]
    pub marker_images: Vec<EnumerationImage>,
}

impl MapsConfig {
    pub fn with_locations(locations: Vec<LocationSourceDescriptor>) -> Self {
        Self {
            locations: locations.into_iter().map(Arc::new).collect(),
            ..Self::default()
        }
    }

    /// Parse a configuration document in TOML form.
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// API token with all spaces removed, or `None` when blank.
    pub fn api_token(&self) -> Option<String> {
        self.api_token
            .as_deref()
            .map(|token| token.replace(' ', ""))
            .filter(|token| !token.is_empty())
    }

    /// Parsed default center; `None` when unset or not a valid point.
    pub fn default_center(&self) -> Option<Coordinate> {
        let center = Coordinate::new(
            coerce_number(&self.default_center.latitude),
            coerce_number(&self.default_center.longitude),
        );
        center.is_valid().then_some(center)
    }
}
