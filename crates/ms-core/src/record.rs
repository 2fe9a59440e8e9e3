//! Backend record model.
//!
//! A [`Record`] is the core's view of a host-platform object: an identity, an
//! entity name and a bag of attribute values. Records are shared as
//! [`RecordRef`] so a resolved location keeps a reference to the exact object
//! a click action must be bound to.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ids::RecordId;

pub type RecordRef = Arc<Record>;

/// Raw attribute value as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Numeric coercion used for coordinates.
    ///
    /// Text is trimmed and parsed; blank or unparsable text yields `NaN`,
    /// which the geometry validator rejects.
    pub fn to_number(&self) -> f64 {
        match self {
            AttributeValue::Number(n) => *n,
            AttributeValue::Bool(true) => 1.0,
            AttributeValue::Bool(false) => 0.0,
            AttributeValue::Text(text) => coerce_number(text),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Parse a coordinate literal. Blank input is not a number.
pub fn coerce_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

/// Backend record (记录).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    entity: String,
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValue>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, entity: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity: entity.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn get(&self, attribute: &str) -> Option<&AttributeValue> {
        self.attributes.get(attribute)
    }

    /// Numeric value of `attribute`; a missing attribute is `NaN`.
    pub fn number(&self, attribute: &str) -> f64 {
        self.get(attribute)
            .map(AttributeValue::to_number)
            .unwrap_or(f64::NAN)
    }

    /// Text value of `attribute`, if present and textual.
    pub fn text(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).and_then(AttributeValue::as_text)
    }

    pub fn into_ref(self) -> RecordRef {
        Arc::new(self)
    }
}
