//! Location source descriptors.
//!
//! One descriptor configures one source of points together with its marker
//! image strategy and click action. Every variant carries only the fields
//! that apply to its source kind, so resolution code never has to check
//! whether an optional field "should" be present.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Constraint placeholder that binds a query to the current anchor record.
pub const CURRENT_OBJECT_TOKEN: &str = "[%CurrentObject%]";

/// One configured location source plus its marker and click settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSourceDescriptor {
    pub source: LocationSource,
    #[serde(default)]
    pub marker: MarkerImage,
    #[serde(default)]
    pub on_click: ClickAction,
}

impl LocationSourceDescriptor {
    pub fn new(source: LocationSource) -> Self {
        Self {
            source,
            marker: MarkerImage::default(),
            on_click: ClickAction::default(),
        }
    }

    pub fn with_marker(mut self, marker: MarkerImage) -> Self {
        self.marker = marker;
        self
    }

    pub fn with_click_action(mut self, on_click: ClickAction) -> Self {
        self.on_click = on_click;
        self
    }

    /// Attribute names whose change alters the rendered output of this
    /// descriptor: coordinates and the marker image attribute.
    pub fn tracked_attributes(&self) -> Vec<&str> {
        let mut attributes = Vec::new();
        if let Some(coordinates) = self.source.coordinates() {
            attributes.push(coordinates.latitude.as_str());
            attributes.push(coordinates.longitude.as_str());
        }
        if let Some(attribute) = self.marker.attribute() {
            attributes.push(attribute);
        }
        attributes
    }
}

/// Names of the two record attributes holding a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateAttributes {
    pub latitude: String,
    pub longitude: String,
}

impl CoordinateAttributes {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }
}

/// Where the server or client executes a named procedure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureRuntime {
    #[default]
    Server,
    Client,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureRef {
    pub name: String,
    #[serde(default)]
    pub runtime: ProcedureRuntime,
}

impl ProcedureRef {
    pub fn server(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runtime: ProcedureRuntime::Server,
        }
    }

    pub fn client(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runtime: ProcedureRuntime::Client,
        }
    }
}

/// The five supported source kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationSource {
    /// Literal coordinates; never touches the backend.
    Static { latitude: String, longitude: String },
    /// Constrained query over an entity.
    Query {
        entity: String,
        #[serde(default)]
        constraint: String,
        coordinates: CoordinateAttributes,
    },
    /// The anchor record itself.
    Context {
        entity: String,
        coordinates: CoordinateAttributes,
    },
    /// Named procedure receiving the anchor as its input parameter.
    ProcedureWithContext {
        entity: String,
        procedure: ProcedureRef,
        #[serde(default)]
        input_parameter_entity: String,
        coordinates: CoordinateAttributes,
    },
    /// Named procedure without input parameters.
    ProcedureWithoutContext {
        entity: String,
        procedure: ProcedureRef,
        coordinates: CoordinateAttributes,
    },
}

impl LocationSource {
    /// Backing entity, absent for static sources.
    pub fn entity(&self) -> Option<&str> {
        match self {
            LocationSource::Static { .. } => None,
            LocationSource::Query { entity, .. }
            | LocationSource::Context { entity, .. }
            | LocationSource::ProcedureWithContext { entity, .. }
            | LocationSource::ProcedureWithoutContext { entity, .. } => Some(entity),
        }
    }

    pub fn coordinates(&self) -> Option<&CoordinateAttributes> {
        match self {
            LocationSource::Static { .. } => None,
            LocationSource::Query { coordinates, .. }
            | LocationSource::Context { coordinates, .. }
            | LocationSource::ProcedureWithContext { coordinates, .. }
            | LocationSource::ProcedureWithoutContext { coordinates, .. } => Some(coordinates),
        }
    }

    /// Whether a backend call for this source is meaningless without an anchor.
    pub fn requires_anchor(&self) -> bool {
        match self {
            LocationSource::Static { .. } | LocationSource::ProcedureWithoutContext { .. } => false,
            LocationSource::Context { .. } | LocationSource::ProcedureWithContext { .. } => true,
            LocationSource::Query { constraint, .. } => constraint.contains(CURRENT_OBJECT_TOKEN),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            LocationSource::Static { .. } => "static",
            LocationSource::Query { .. } => "query",
            LocationSource::Context { .. } => "context",
            LocationSource::ProcedureWithContext { .. } => "procedure_with_context",
            LocationSource::ProcedureWithoutContext { .. } => "procedure_without_context",
        }
    }
}

/// Marker image strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerImage {
    /// Provider default marker; no URL.
    #[default]
    Default,
    /// Fixed image URL.
    Static { icon: String },
    /// Image resolved by the backend from a system image path.
    SystemImage { path: String },
    /// Image URL read from a record attribute.
    Attribute { attribute: String },
    /// Enumeration attribute value selects one of the configured images.
    Enumeration {
        attribute: String,
        #[serde(default)]
        fallback: String,
    },
}

impl MarkerImage {
    pub fn attribute(&self) -> Option<&str> {
        match self {
            MarkerImage::Attribute { attribute } | MarkerImage::Enumeration { attribute, .. } => {
                Some(attribute)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePlacement {
    #[default]
    Content,
    Popup,
    Modal,
}

/// What clicking a marker of this descriptor does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClickAction {
    #[default]
    DoNothing,
    CallProcedure {
        procedure: String,
    },
    CallClientProcedure {
        procedure: String,
    },
    ShowPage {
        page: String,
        #[serde(default)]
        placement: PagePlacement,
    },
}

/// Content hash of a descriptor set.
///
/// Two configurations with equal descriptors share a fingerprint, so
/// re-delivering the same configuration does not rebuild subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorFingerprint(String);

impl DescriptorFingerprint {
    pub fn of(descriptors: &[Arc<LocationSourceDescriptor>]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for descriptor in descriptors {
            // Serializing plain enums and strings cannot fail.
            let bytes = serde_json::to_vec(descriptor.as_ref()).unwrap_or_default();
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(constraint: &str) -> LocationSource {
        LocationSource::Query {
            entity: "Shop".to_string(),
            constraint: constraint.to_string(),
            coordinates: CoordinateAttributes::new("Lat", "Lng"),
        }
    }

    #[test]
    fn test_query_requires_anchor_only_with_placeholder() {
        assert!(!query("[Open = true()]").requires_anchor());
        assert!(query("[Shop_Owner = '[%CurrentObject%]']").requires_anchor());
    }

    #[test]
    fn test_procedure_kinds_anchor_requirement() {
        let with = LocationSource::ProcedureWithContext {
            entity: "Shop".to_string(),
            procedure: ProcedureRef::server("GetShops"),
            input_parameter_entity: "Owner".to_string(),
            coordinates: CoordinateAttributes::new("Lat", "Lng"),
        };
        let without = LocationSource::ProcedureWithoutContext {
            entity: "Shop".to_string(),
            procedure: ProcedureRef::client("GetShops"),
            coordinates: CoordinateAttributes::new("Lat", "Lng"),
        };
        assert!(with.requires_anchor());
        assert!(!without.requires_anchor());
    }

    #[test]
    fn test_tracked_attributes_include_marker_attribute() {
        let descriptor = LocationSourceDescriptor::new(query("")).with_marker(MarkerImage::Enumeration {
            attribute: "Category".to_string(),
            fallback: "default.png".to_string(),
        });
        assert_eq!(descriptor.tracked_attributes(), vec!["Lat", "Lng", "Category"]);
    }

    #[test]
    fn test_static_descriptor_tracks_nothing() {
        let descriptor = LocationSourceDescriptor::new(LocationSource::Static {
            latitude: "52.0".to_string(),
            longitude: "4.3".to_string(),
        });
        assert!(descriptor.tracked_attributes().is_empty());
        assert_eq!(descriptor.source.entity(), None);
    }

    #[test]
    fn test_fingerprint_is_content_based() {
        let a = vec![Arc::new(LocationSourceDescriptor::new(query("")))];
        let b = vec![Arc::new(LocationSourceDescriptor::new(query("")))];
        let c = vec![Arc::new(LocationSourceDescriptor::new(query("[Open = true()]")))];

        assert_eq!(DescriptorFingerprint::of(&a), DescriptorFingerprint::of(&b));
        assert_ne!(DescriptorFingerprint::of(&a), DescriptorFingerprint::of(&c));
    }

    #[test]
    fn test_descriptor_deserializes_tagged_variants() {
        let json = r#"{
            "source": {"kind": "procedure_with_context", "entity": "Shop",
                       "procedure": {"name": "GetShops", "runtime": "client"},
                       "coordinates": {"latitude": "Lat", "longitude": "Lng"}},
            "marker": {"kind": "static", "icon": "pin.png"},
            "on_click": {"kind": "show_page", "page": "Shop_Detail", "placement": "popup"}
        }"#;
        let descriptor: LocationSourceDescriptor = serde_json::from_str(json).unwrap();

        assert_eq!(descriptor.source.kind_name(), "procedure_with_context");
        assert_eq!(
            descriptor.on_click,
            ClickAction::ShowPage {
                page: "Shop_Detail".to_string(),
                placement: PagePlacement::Popup
            }
        );
        assert_eq!(
            descriptor.marker,
            MarkerImage::Static {
                icon: "pin.png".to_string()
            }
        );
    }
}
