//! Logger setup.
//!
//! Library code logs through the `log` facade; this installs a
//! `tracing-subscriber` formatter and bridges `log` records into it.

use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, registry};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Installs the global logger writing to stdout.
///
/// Returns `false` if a logger was already installed.
pub fn init(default_filter: &str) -> bool {
    if LogTracer::init().is_err() {
        return false;
    }
    let subscriber = registry()
        .with(env_filter(default_filter))
        .with(fmt::layer().with_target(true));
    let installed = tracing::subscriber::set_global_default(subscriber).is_ok();
    if installed {
        log::debug!("Logger initialized");
    }
    installed
}

/// Installs a logger that writes through the test harness capture.
///
/// Safe to call from every test, only the first call installs anything.
pub fn init_for_tests() {
    if LogTracer::init().is_err() {
        return;
    }
    let subscriber = registry()
        .with(env_filter("debug"))
        .with(fmt::layer().with_test_writer());
    let _ = tracing::subscriber::set_global_default(subscriber);
}
