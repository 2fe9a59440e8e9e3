//! Minimal constraint evaluation for the in-memory store.
//!
//! Supports a sequence of equality predicates such as
//! `[Owner = '[%CurrentObject%]'][Open = true]`. An empty constraint matches
//! every record. The current-object token is replaced by the anchor's id.

use ms_core::location::CURRENT_OBJECT_TOKEN;
use ms_core::ports::BackendError;
use ms_core::record::{AttributeValue, Record, RecordRef};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Predicate {
    attribute: String,
    value: String,
}

impl Predicate {
    fn matches(&self, record: &Record) -> bool {
        match record.get(&self.attribute) {
            Some(AttributeValue::Text(text)) => *text == self.value,
            Some(AttributeValue::Number(number)) => self
                .value
                .parse::<f64>()
                .map(|expected| expected == *number)
                .unwrap_or(false),
            Some(AttributeValue::Bool(flag)) => self.value == flag.to_string(),
            None => false,
        }
    }
}

/// Parse `constraint`, binding the current-object token to `anchor`.
pub(crate) fn parse(constraint: &str, anchor: Option<&RecordRef>) -> Result<Vec<Predicate>, BackendError> {
    let constraint = constraint.trim();
    if constraint.is_empty() {
        return Ok(Vec::new());
    }

    let bound = if constraint.contains(CURRENT_OBJECT_TOKEN) {
        let anchor = anchor.ok_or_else(|| {
            BackendError::Rejected(format!("constraint needs a current object: {constraint}"))
        })?;
        constraint.replace(CURRENT_OBJECT_TOKEN, anchor.id().as_ref())
    } else {
        constraint.to_string()
    };

    let unsupported = || BackendError::Rejected(format!("unsupported constraint: {constraint}"));

    let mut predicates = Vec::new();
    let mut rest = bound.as_str();
    while !rest.is_empty() {
        let body = rest.strip_prefix('[').ok_or_else(unsupported)?;
        let end = body.find(']').ok_or_else(unsupported)?;
        let (attribute, value) = body[..end].split_once('=').ok_or_else(unsupported)?;
        let attribute = attribute.trim();
        if attribute.is_empty() {
            return Err(unsupported());
        }
        let value = value.trim().trim_matches('\'').trim_matches('"');
        predicates.push(Predicate {
            attribute: attribute.to_string(),
            value: value.to_string(),
        });
        rest = body[end + 1..].trim_start();
    }
    Ok(predicates)
}

pub(crate) fn matches_all(predicates: &[Predicate], record: &Record) -> bool {
    predicates.iter().all(|predicate| predicate.matches(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop(owner: &str, open: bool) -> Record {
        Record::new("shop", "Shop")
            .with_attribute("Owner", owner)
            .with_attribute("Open", open)
            .with_attribute("Rating", 4.0)
    }

    #[test]
    fn test_empty_constraint_matches_everything() {
        let predicates = parse("  ", None).unwrap();
        assert!(matches_all(&predicates, &shop("a", false)));
    }

    #[test]
    fn test_current_object_token_binds_anchor() {
        let anchor = Record::new("owner-1", "Owner").into_ref();
        let predicates = parse("[Owner = '[%CurrentObject%]'][Open = true]", Some(&anchor)).unwrap();

        assert!(matches_all(&predicates, &shop("owner-1", true)));
        assert!(!matches_all(&predicates, &shop("owner-2", true)));
        assert!(!matches_all(&predicates, &shop("owner-1", false)));
    }

    #[test]
    fn test_numeric_predicate() {
        let predicates = parse("[Rating = 4]", None).unwrap();
        assert!(matches_all(&predicates, &shop("a", true)));
    }

    #[test]
    fn test_token_without_anchor_is_rejected() {
        let result = parse("[Owner = '[%CurrentObject%]']", None);
        assert!(matches!(result, Err(BackendError::Rejected(_))));
    }

    #[test]
    fn test_malformed_constraint_is_rejected() {
        assert!(parse("Owner = 'x'", None).is_err());
        assert!(parse("[Owner 'x']", None).is_err());
        assert!(parse("[Owner = 'x'", None).is_err());
    }
}
