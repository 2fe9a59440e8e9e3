use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ms_core::config::MapsConfig;
use tokio::fs;
use tracing::debug;

/// Loads a container configuration from a TOML file.
pub struct FileMapsConfigRepository {
    path: PathBuf,
}

impl FileMapsConfigRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file.
    ///
    /// Parsing only checks the document shape; call [`MapsConfig::validate`]
    /// for the semantic checks. A missing file is an error, there is no
    /// meaningful default map.
    pub async fn load(&self) -> Result<MapsConfig> {
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read map config failed: {}", self.path.display()))?;

        let config = MapsConfig::from_toml_str(&content)
            .with_context(|| format!("parse map config failed: {}", self.path.display()))?;

        debug!(
            path = %self.path.display(),
            friendly_id = %config.friendly_id,
            locations = config.locations.len(),
            "Map config loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_core::config::MapProvider;
    use ms_core::location::LocationSource;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
        friendly_id = "depotMap"
        map_provider = "open_street"

        [[locations]]
        [locations.source]
        kind = "static"
        latitude = "52.0"
        longitude = "4.3"
    "#;

    #[tokio::test]
    async fn test_load_parses_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.toml");
        tokio::fs::write(&path, CONFIG).await.unwrap();

        let config = FileMapsConfigRepository::new(&path).load().await.unwrap();

        assert_eq!(config.friendly_id, "depotMap");
        assert_eq!(config.map_provider, MapProvider::OpenStreet);
        assert!(matches!(
            config.locations[0].source,
            LocationSource::Static { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");

        let err = FileMapsConfigRepository::new(&path).load().await.unwrap_err();

        assert!(err.to_string().contains("read map config failed"));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[tokio::test]
    async fn test_malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        tokio::fs::write(&path, "locations = 3").await.unwrap();

        let err = FileMapsConfigRepository::new(&path).load().await.unwrap_err();

        assert!(err.to_string().contains("parse map config failed"));
    }
}
