use std::time::Duration;

use anyhow::{bail, Context, Result};
use mapsync::bootstrap::{self, InMemoryHost};
use mapsync::infra::FileMapsConfigRepository;
use tracing::{info, warn};

/// Resolve a configuration once against an empty in-memory host and log the outcome.
///
/// Usage: `mapsync <config.toml>`
#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::tracing::init_tracing_subscriber()?;

    let Some(path) = std::env::args_os().nth(1) else {
        bail!("usage: mapsync <config.toml>");
    };
    let config = FileMapsConfigRepository::new(path).load().await?;

    let host = InMemoryHost::new();
    let running = bootstrap::spawn(host.deps());
    let mut outcomes = running.handle.subscribe_outcome();
    running.handle.configure(config, None)?;

    let outcome = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            outcomes.changed().await?;
            let outcome = outcomes.borrow_and_update().clone();
            if !outcome.busy {
                return anyhow::Ok(outcome);
            }
        }
    })
    .await
    .context("resolution did not settle")??;

    for location in &outcome.locations {
        info!(
            latitude = location.latitude,
            longitude = location.longitude,
            marker = location.marker_url.as_deref().unwrap_or("default"),
            "Resolved location"
        );
    }
    let alert = outcome.alert_message();
    if !alert.is_empty() {
        warn!(alert = %alert, "Resolution warnings");
    }

    running.shutdown().await
}
