//! Logging setup using tracing.

use tracing_subscriber::EnvFilter;

/// Initialize logging with the specified default level.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    Ok(())
}
