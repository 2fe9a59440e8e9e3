//! Use case for fetching the raw records of one location source
//! 获取单个位置数据源的原始记录

use std::sync::Arc;

use ms_core::location::{LocationSource, LocationSourceDescriptor};
use ms_core::ports::{BackendError, DataSourcePort, RecordQuery};
use ms_core::record::RecordRef;
use tracing::{debug, info_span, Instrument};

/// One raw item produced for a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedLocation {
    /// Coordinates given literally by a static descriptor.
    Literal { latitude: String, longitude: String },
    /// A backend record holding the coordinates in attributes.
    Record(RecordRef),
}

/// Fetches raw records for a descriptor from the right backend strategy.
///
/// ## Behavior / 行为
/// - `static` never calls the backend.
/// - `context` yields the anchor itself, or nothing without one.
/// - Anchor-requiring sources short-circuit to an empty result without an anchor.
/// - Backend errors propagate; aggregation is the pipeline's job.
pub struct SourceFetcher {
    data_source: Arc<dyn DataSourcePort>,
}

impl SourceFetcher {
    pub fn new(data_source: Arc<dyn DataSourcePort>) -> Self {
        Self { data_source }
    }

    pub async fn fetch(
        &self,
        descriptor: &LocationSourceDescriptor,
        anchor: Option<&RecordRef>,
    ) -> Result<Vec<FetchedLocation>, BackendError> {
        let source = &descriptor.source;
        let span = info_span!(
            "usecase.fetch_source.execute",
            kind = source.kind_name(),
            entity = source.entity().unwrap_or_default(),
        );

        async {
            if source.requires_anchor() && anchor.is_none() {
                debug!("Source requires an anchor record but none is present");
                return Ok(Vec::new());
            }

            let query = match source {
                LocationSource::Static {
                    latitude,
                    longitude,
                } => {
                    return Ok(vec![FetchedLocation::Literal {
                        latitude: latitude.clone(),
                        longitude: longitude.clone(),
                    }]);
                }
                LocationSource::Context { .. } => {
                    return Ok(anchor
                        .map(|record| vec![FetchedLocation::Record(record.clone())])
                        .unwrap_or_default());
                }
                LocationSource::Query {
                    entity, constraint, ..
                } => RecordQuery::Constraint {
                    entity: entity.clone(),
                    constraint: constraint.clone(),
                    anchor: anchor.cloned(),
                },
                LocationSource::ProcedureWithContext {
                    entity,
                    procedure,
                    input_parameter_entity,
                    ..
                } => RecordQuery::Procedure {
                    entity: entity.clone(),
                    procedure: procedure.clone(),
                    input_parameter_entity: Some(input_parameter_entity.clone()),
                    anchor: anchor.cloned(),
                },
                LocationSource::ProcedureWithoutContext {
                    entity, procedure, ..
                } => RecordQuery::Procedure {
                    entity: entity.clone(),
                    procedure: procedure.clone(),
                    input_parameter_entity: None,
                    anchor: None,
                },
            };

            let records = self.data_source.query_records(query).await?;
            debug!(count = records.len(), "Fetched source records");

            Ok(records.into_iter().map(FetchedLocation::Record).collect())
        }
        .instrument(span)
        .await
    }
}
