//! Logging setup
//!
//! Installs a `tracing-subscriber` registry: pretty output for debug builds,
//! JSON with the current span for release builds.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
fn default_filter(log_level: &str) -> String {
    format!(
        "{level},tutor_engine={level},tower_http={level}",
        level = log_level
    )
}

/// Initialize the tracing subscriber at `log_level`
///
/// Priority: `RUST_LOG` env var > `log_level` parameter > default "info".
/// Only the first call installs a subscriber; later calls are ignored.
pub fn init_telemetry_with_level(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(false))
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
            .ok();
    }
}

pub fn init_telemetry() {
    init_telemetry_with_level("info");
}
