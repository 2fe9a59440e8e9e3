use super::{GeoShape, ResolutionWarning, ResolvedLocation};

/// Snapshot handed to the rendering boundary.
///
/// Always replaced as a whole; a pass never publishes partial results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionOutcome {
    pub locations: Vec<ResolvedLocation>,
    pub shapes: Vec<GeoShape>,
    pub warnings: Vec<ResolutionWarning>,
    pub busy: bool,
}

impl ResolutionOutcome {
    /// Settled outcome carrying only `warning` (fetch failure, invalid configuration).
    pub fn failed(warning: ResolutionWarning) -> Self {
        Self {
            warnings: vec![warning],
            ..Self::default()
        }
    }

    /// Copy of this outcome flagged busy, used while a pass is in flight.
    pub fn to_busy(&self) -> Self {
        Self {
            busy: true,
            ..self.clone()
        }
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// All warnings joined into the single display string of this cycle.
    pub fn alert_message(&self) -> String {
        self.warning_messages().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_message_joins_warnings() {
        let outcome = ResolutionOutcome {
            warnings: vec![
                ResolutionWarning::Backend {
                    message: "first".to_string(),
                },
                ResolutionWarning::Configuration("second".to_string()),
            ],
            ..ResolutionOutcome::default()
        };
        assert_eq!(outcome.alert_message(), "first, second");
    }

    #[test]
    fn test_to_busy_keeps_previous_data() {
        let outcome = ResolutionOutcome::failed(ResolutionWarning::Configuration("x".to_string()));
        let busy = outcome.to_busy();
        assert!(busy.busy);
        assert_eq!(busy.warnings, outcome.warnings);
    }

    #[test]
    fn test_default_outcome_is_idle_and_empty() {
        let outcome = ResolutionOutcome::default();
        assert!(!outcome.busy);
        assert!(outcome.alert_message().is_empty());
    }
}
