use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging with a default filter.
///
/// `RUST_LOG` overrides the default of `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(false).init();
}
