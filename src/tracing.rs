use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber shared by all binaries.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies (e.g.
/// `"info,distributor_feeds=debug"`).
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}
