//! Use case for resolving a marker image URL
//! 解析标记图片 URL 的用例

use std::sync::Arc;

use ms_core::config::EnumerationImage;
use ms_core::location::MarkerImage;
use ms_core::ports::MarkerImagePort;
use ms_core::record::Record;
use tracing::debug;

/// Resolves the marker image of one location.
///
/// ## Behavior / 行为
/// - Fails soft: a lookup miss or a backend error yields `None`, never an error.
/// - The enumeration strategy falls back to its fixed fallback URL when the
///   record's value has no configured image.
pub struct MarkerResolver {
    images: Arc<dyn MarkerImagePort>,
}

fn non_empty(url: &str) -> Option<String> {
    let trimmed = url.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl MarkerResolver {
    pub fn new(images: Arc<dyn MarkerImagePort>) -> Self {
        Self { images }
    }

    /// Resolve the marker URL for `record` (absent for static coordinates).
    pub async fn resolve_marker_url(
        &self,
        strategy: &MarkerImage,
        record: Option<&Record>,
        enumeration_images: &[EnumerationImage],
    ) -> Option<String> {
        match strategy {
            MarkerImage::Default => None,
            MarkerImage::Static { icon } => non_empty(icon),
            MarkerImage::SystemImage { path } => {
                let record = record?;
                match self.images.system_image_url(record, path).await {
                    Ok(url) => url.as_deref().and_then(non_empty),
                    Err(err) => {
                        debug!(
                            record_id = %record.id(),
                            path = %path,
                            error = %err,
                            "System marker image lookup failed"
                        );
                        None
                    }
                }
            }
            MarkerImage::Attribute { attribute } => record?.text(attribute).and_then(non_empty),
            MarkerImage::Enumeration {
                attribute,
                fallback,
            } => {
                let key = record.and_then(|record| record.text(attribute));
                key.and_then(|key| {
                    enumeration_images
                        .iter()
                        .find(|image| image.enum_key == key)
                        .and_then(|image| non_empty(&image.image_url))
                })
                .or_else(|| non_empty(fallback))
            }
        }
    }
}
