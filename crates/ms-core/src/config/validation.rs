//! Configuration validation.
//!
//! Checks are ordered: the first problem found is reported, numbered from
//! one the way the configuration surface numbers its location entries.

use thiserror::Error;

use super::MapsConfig;
use crate::location::{ClickAction, LocationSource, LocationSourceDescriptor, MarkerImage};
use crate::record::coerce_number;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Location {index}: {field} is required")]
    MissingField { index: usize, field: &'static str },

    #[error("Location {index}: static coordinates must be numbers")]
    InvalidStaticCoordinates { index: usize },

    #[error("GeoJSON: {field} is required")]
    MissingShapeField { field: &'static str },

    #[error("An API token is required for {provider}")]
    ApiTokenRequired { provider: &'static str },

    #[error("Default center latitude '{latitude}' and longitude '{longitude}' are not a valid location")]
    InvalidDefaultCenter { latitude: String, longitude: String },
}

fn require(value: &str, index: usize, field: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField { index, field });
    }
    Ok(())
}

impl MapsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.map_provider.requires_api_token() && self.api_token().is_none() {
            return Err(ConfigError::ApiTokenRequired {
                provider: self.map_provider.display_name(),
            });
        }

        let center = &self.default_center;
        if !(center.latitude.trim().is_empty() && center.longitude.trim().is_empty())
            && self.default_center().is_none()
        {
            return Err(ConfigError::InvalidDefaultCenter {
                latitude: center.latitude.clone(),
                longitude: center.longitude.clone(),
            });
        }

        for (position, descriptor) in self.locations.iter().enumerate() {
            validate_descriptor(descriptor, position + 1)?;
        }

        if let Some(shapes) = &self.geo_shapes {
            if shapes.entity.trim().is_empty() {
                return Err(ConfigError::MissingShapeField { field: "entity" });
            }
            if shapes.shape_attribute.trim().is_empty() {
                return Err(ConfigError::MissingShapeField {
                    field: "shape attribute",
                });
            }
            if shapes.procedure.trim().is_empty() {
                return Err(ConfigError::MissingShapeField { field: "procedure" });
            }
        }

        Ok(())
    }
}

fn validate_descriptor(descriptor: &LocationSourceDescriptor, index: usize) -> Result<(), ConfigError> {
    match &descriptor.source {
        LocationSource::Static {
            latitude,
            longitude,
        } => {
            require(latitude, index, "static latitude")?;
            require(longitude, index, "static longitude")?;
            if coerce_number(latitude).is_nan() || coerce_number(longitude).is_nan() {
                return Err(ConfigError::InvalidStaticCoordinates { index });
            }
        }
        LocationSource::Query { entity, .. } | LocationSource::Context { entity, .. } => {
            require(entity, index, "entity")?;
        }
        LocationSource::ProcedureWithContext {
            entity,
            procedure,
            input_parameter_entity,
            ..
        } => {
            require(entity, index, "entity")?;
            require(&procedure.name, index, "data source procedure")?;
            require(input_parameter_entity, index, "input parameter entity")?;
        }
        LocationSource::ProcedureWithoutContext {
            entity, procedure, ..
        } => {
            require(entity, index, "entity")?;
            require(&procedure.name, index, "data source procedure")?;
        }
    }

    if let Some(coordinates) = descriptor.source.coordinates() {
        require(&coordinates.latitude, index, "latitude attribute")?;
        require(&coordinates.longitude, index, "longitude attribute")?;
    }

    match &descriptor.marker {
        MarkerImage::Default => {}
        MarkerImage::Static { icon } => require(icon, index, "static marker icon")?,
        MarkerImage::SystemImage { path } => require(path, index, "system image path")?,
        MarkerImage::Attribute { attribute } | MarkerImage::Enumeration { attribute, .. } => {
            require(attribute, index, "marker image attribute")?
        }
    }

    match &descriptor.on_click {
        ClickAction::DoNothing => {}
        ClickAction::CallProcedure { procedure } => require(procedure, index, "on click microflow")?,
        ClickAction::CallClientProcedure { procedure } => {
            require(procedure, index, "on click nanoflow")?
        }
        ClickAction::ShowPage { page, .. } => require(page, index, "on click page")?,
    }

    Ok(())
}
