//! Tracing configuration for MapSync
//!
//! ## Behavior / 行为
//!
//! - **Development**: debug level for the MapSync crates, output to stdout
//! - **Production**: info level, output to stdout
//! - **File output**: when `MAPSYNC_LOG_DIR` is set, a second non-blocking
//!   layer writes `mapsync.log` into that directory
//! - **Environment filter**: `RUST_LOG` overrides the default directives

use std::{env, fs, io, path::PathBuf, sync::OnceLock};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, registry, EnvFilter};

/// Directory for the log file; unset means stdout only.
pub const LOG_DIR_ENV: &str = "MAPSYNC_LOG_DIR";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn is_development() -> bool {
    cfg!(debug_assertions)
}

/// Default filter directives for tracing
fn build_filter_directives(is_dev: bool) -> Vec<String> {
    let crate_level = if is_dev { "debug" } else { "info" };
    vec![
        "info".to_string(),
        format!("mapsync={crate_level}"),
        format!("ms_app={crate_level}"),
        format!("ms_infra={crate_level}"),
    ]
}

/// Initialize the global tracing subscriber.
///
/// Call once, before the first controller is started:
///
/// ```ignore
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     mapsync::bootstrap::tracing::init_tracing_subscriber()?;
///     // ...
/// }
/// ```
///
/// ## Errors / 错误
///
/// Returns `Err` if a global subscriber is already registered.
pub fn init_tracing_subscriber() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(build_filter_directives(is_development()).join(",")));

    let file_writer = match env::var_os(LOG_DIR_ENV).map(PathBuf::from) {
        Some(dir) => match build_file_writer(dir) {
            Ok(writer) => Some(writer),
            Err(err) => {
                eprintln!("Failed to initialize file logging, falling back to stdout: {err}");
                None
            }
        },
        None => None,
    };

    let stdout_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
        .with_level(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)))
        .with_writer(BoxMakeWriter::new(io::stdout));

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_timer(fmt::time::ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

fn build_file_writer(dir: PathBuf) -> anyhow::Result<NonBlocking> {
    fs::create_dir_all(&dir)?;

    let file_appender = tracing_appender::rolling::never(&dir, "mapsync.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Tracing log guard already initialized"))?;

    Ok(non_blocking)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_directives() {
        let dev_directives = build_filter_directives(true);
        assert!(dev_directives.contains(&"ms_app=debug".to_string()));
        assert!(dev_directives.contains(&"ms_infra=debug".to_string()));

        let prod_directives = build_filter_directives(false);
        assert!(prod_directives.contains(&"ms_app=info".to_string()));
        assert!(prod_directives.contains(&"mapsync=info".to_string()));
        assert_eq!(prod_directives[0], "info");
    }
}
