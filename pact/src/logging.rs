use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Installs a stdout subscriber filtered by `LOG_LEVEL` (`info` when unset). Calling it again
/// once a subscriber is installed does nothing.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .try_init();
}
