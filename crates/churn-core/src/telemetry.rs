//! Tracing setup for the churn service binaries.
//!
//! [`init_tracing`] installs the global subscriber once. `RUST_LOG` wins over
//! the level passed in; later calls are no-ops.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// * `json` — newline-delimited JSON lines for log shippers.
/// * `level` — verbosity when `RUST_LOG` is unset.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json {
        registry
            .with(fmt::layer().with_target(false).json())
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    if installed.is_ok() {
        tracing::debug!(json, %level, "Tracing initialised");
    }
}
