//! Location resolution pipeline
//!
//! 位置解析流水线：把所有数据源描述解析为一个完整的渲染快照。
//!
//! # Flow / 流程
//!
//! ```text
//! geo-shape source ──fetch──> parse shape/style ──────────────┐
//!                                                              │
//! descriptor 1 ──SourceFetcher──> per record: coords + marker ─┤
//! descriptor 2 ──SourceFetcher──> per record: coords + marker ─┼─> merge (source order)
//! ...                                                          │        │
//!                                                              │   geometry filter
//!                                                              ▼        ▼
//!                                                    ResolutionOutcome (busy = false)
//! ```
//!
//! Descriptors and records fan out concurrently. Localized problems (bad
//! coordinates, unparsable shapes) become warnings; a rejected backend call
//! aborts the pass and settles it with that error as the only warning.

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use ms_core::config::{EnumerationImage, GeoShapeSource, MapsConfig};
use ms_core::location::{
    GeoShape, LocationSourceDescriptor, ProcedureRef, ResolutionOutcome, ResolutionWarning,
    ResolvedLocation,
};
use ms_core::ports::{BackendError, DataSourcePort, MarkerImagePort, RecordQuery};
use ms_core::record::{coerce_number, Record, RecordRef};
use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};

use super::fetch_source::{FetchedLocation, SourceFetcher};
use super::resolve_marker::MarkerResolver;

pub struct LocationResolutionPipeline {
    data_source: Arc<dyn DataSourcePort>,
    fetcher: SourceFetcher,
    markers: MarkerResolver,
}

impl LocationResolutionPipeline {
    pub fn new(data_source: Arc<dyn DataSourcePort>, images: Arc<dyn MarkerImagePort>) -> Self {
        Self {
            fetcher: SourceFetcher::new(data_source.clone()),
            markers: MarkerResolver::new(images),
            data_source,
        }
    }

    /// Run one resolution pass.
    ///
    /// Never fails: a backend error settles the pass with empty collections
    /// and the error message as the sole warning.
    pub async fn resolve(&self, config: &MapsConfig, anchor: Option<&RecordRef>) -> ResolutionOutcome {
        let span = info_span!(
            "usecase.resolve_locations.execute",
            friendly_id = %config.friendly_id,
            descriptors = config.locations.len(),
            anchor = %anchor.map(|record| record.id().to_string()).unwrap_or_default(),
        );

        async {
            match self.try_resolve(config, anchor).await {
                Ok(outcome) => {
                    info!(
                        locations = outcome.locations.len(),
                        shapes = outcome.shapes.len(),
                        warnings = outcome.warnings.len(),
                        "Resolution pass completed"
                    );
                    outcome
                }
                Err(err) => {
                    warn!(error = %err, "Resolution pass aborted by backend error");
                    ResolutionOutcome::failed(ResolutionWarning::Backend {
                        message: err.to_string(),
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn try_resolve(
        &self,
        config: &MapsConfig,
        anchor: Option<&RecordRef>,
    ) -> Result<ResolutionOutcome, BackendError> {
        let ((shapes, mut warnings), resolved) = futures::try_join!(
            self.resolve_shapes(config.geo_shapes.as_ref()),
            self.resolve_all_locations(&config.locations, anchor, &config.marker_images),
        )?;

        let mut locations = Vec::with_capacity(resolved.len());
        for location in resolved {
            if location.is_valid() {
                locations.push(location);
            } else {
                warnings.push(ResolutionWarning::InvalidLocation {
                    latitude: location.latitude,
                    longitude: location.longitude,
                    record: location.record.as_ref().map(|record| record.id().clone()),
                });
            }
        }

        Ok(ResolutionOutcome {
            locations,
            shapes,
            warnings,
            busy: false,
        })
    }

    /// Run a pass against the anchor's current backend state.
    ///
    /// Passes triggered by change notifications or refreshes go through here
    /// so anchor-scoped sources see updates made to the anchor itself. An
    /// anchor that no longer exists falls back to the last known snapshot.
    pub async fn resolve_current(
        &self,
        config: &MapsConfig,
        anchor: Option<&RecordRef>,
    ) -> ResolutionOutcome {
        let live = match anchor {
            Some(anchor) => match self.data_source.get_record(anchor.id()).await {
                Ok(Some(live)) => Some(live),
                Ok(None) => {
                    debug!(record_id = %anchor.id(), "Anchor no longer exists, keeping last snapshot");
                    Some(anchor.clone())
                }
                Err(err) => {
                    warn!(record_id = %anchor.id(), error = %err, "Failed to reload anchor");
                    return ResolutionOutcome::failed(ResolutionWarning::Backend {
                        message: err.to_string(),
                    });
                }
            },
            None => None,
        };

        self.resolve(config, live.as_ref()).await
    }

    /// Resolve every descriptor concurrently and flatten in source order.
    async fn resolve_all_locations(
        &self,
        descriptors: &[Arc<LocationSourceDescriptor>],
        anchor: Option<&RecordRef>,
        enumeration_images: &[EnumerationImage],
    ) -> Result<Vec<ResolvedLocation>, BackendError> {
        let per_descriptor = try_join_all(
            descriptors
                .iter()
                .map(|descriptor| self.resolve_descriptor(descriptor, anchor, enumeration_images)),
        )
        .await?;

        Ok(per_descriptor.into_iter().flatten().collect())
    }

    async fn resolve_descriptor(
        &self,
        descriptor: &Arc<LocationSourceDescriptor>,
        anchor: Option<&RecordRef>,
        enumeration_images: &[EnumerationImage],
    ) -> Result<Vec<ResolvedLocation>, BackendError> {
        let fetched = self.fetcher.fetch(descriptor, anchor).await?;

        Ok(join_all(
            fetched
                .into_iter()
                .map(|item| self.resolve_item(descriptor, item, enumeration_images)),
        )
        .await)
    }

    async fn resolve_item(
        &self,
        descriptor: &Arc<LocationSourceDescriptor>,
        item: FetchedLocation,
        enumeration_images: &[EnumerationImage],
    ) -> ResolvedLocation {
        let (latitude, longitude, record) = match item {
            FetchedLocation::Literal {
                latitude,
                longitude,
            } => (coerce_number(&latitude), coerce_number(&longitude), None),
            FetchedLocation::Record(record) => {
                let (latitude, longitude) = match descriptor.source.coordinates() {
                    Some(coordinates) => (
                        record.number(&coordinates.latitude),
                        record.number(&coordinates.longitude),
                    ),
                    None => (f64::NAN, f64::NAN),
                };
                (latitude, longitude, Some(record))
            }
        };

        let marker_url = self
            .markers
            .resolve_marker_url(&descriptor.marker, record.as_deref(), enumeration_images)
            .await;

        ResolvedLocation {
            latitude,
            longitude,
            record,
            marker_url,
            descriptor: Some(descriptor.clone()),
        }
    }

    async fn resolve_shapes(
        &self,
        source: Option<&GeoShapeSource>,
    ) -> Result<(Vec<GeoShape>, Vec<ResolutionWarning>), BackendError> {
        let Some(source) = source else {
            return Ok((Vec::new(), Vec::new()));
        };

        let records = self
            .data_source
            .query_records(RecordQuery::Procedure {
                entity: source.entity.clone(),
                procedure: ProcedureRef::server(source.procedure.clone()),
                input_parameter_entity: None,
                anchor: None,
            })
            .await?;

        let mut shapes = Vec::with_capacity(records.len());
        let mut warnings = Vec::new();
        for record in records {
            match parse_shape(&record, source) {
                Ok(Some(shape)) => shapes.push(shape),
                Ok(None) => {}
                Err(warning) => warnings.push(warning),
            }
        }

        Ok((shapes, warnings))
    }
}

/// Parse the shape and style payloads of one record.
///
/// A missing, blank or `null` shape drops the record silently; a malformed
/// shape drops it with a warning; a malformed style only drops the style.
fn parse_shape(record: &RecordRef, source: &GeoShapeSource) -> Result<Option<GeoShape>, ResolutionWarning> {
    let shape = match parse_payload(record, &source.shape_attribute) {
        Ok(Some(shape)) => shape,
        Ok(None) => return Ok(None),
        Err(err) => {
            return Err(ResolutionWarning::ShapeParse {
                record: record.id().clone(),
                attribute: source.shape_attribute.clone(),
                reason: err.to_string(),
            })
        }
    };

    let style = source
        .style_attribute
        .as_deref()
        .and_then(|attribute| match parse_payload(record, attribute) {
            Ok(style) => style,
            Err(err) => {
                debug!(
                    record_id = %record.id(),
                    attribute = %attribute,
                    error = %err,
                    "Dropping unparsable shape style"
                );
                None
            }
        });

    Ok(Some(GeoShape {
        record: record.clone(),
        shape,
        style,
    }))
}

fn parse_payload(record: &Record, attribute: &str) -> Result<Option<Value>, serde_json::Error> {
    match record.text(attribute) {
        Some(text) if !text.trim().is_empty() => {
            let value: Value = serde_json::from_str(text)?;
            Ok((!value.is_null()).then_some(value))
        }
        _ => Ok(None),
    }
}
