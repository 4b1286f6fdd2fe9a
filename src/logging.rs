use tracing_subscriber::EnvFilter;

/// Initialise logging. Debug builds default to `debug`, release builds to
/// `info`; `RUST_LOG` overrides either.
pub fn init() {
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
