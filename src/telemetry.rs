// src/telemetry.rs
//! Logging bootstrap for the binary and one-time metric descriptors.

use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "phd_agent=info,warn";
pub const ENV_LOG_JSON: &str = "PHD_LOG_JSON";

/// One-time metrics registration (so series carry descriptions once a
/// recorder is installed by the host).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("snapshot_loads_total", "Snapshot loads that parsed successfully.");
        describe_counter!(
            "snapshot_load_errors_total",
            "Snapshot loads that degraded to an empty snapshot."
        );
        describe_gauge!("snapshot_items", "Items in the most recently loaded snapshot.");
        describe_counter!(
            "profile_persist_errors_total",
            "Profile writes that failed and were kept in memory only."
        );
    });
}

/// Install the global subscriber. `RUST_LOG` wins over the default filter;
/// `PHD_LOG_JSON=1` selects JSON lines instead of the compact format.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var(ENV_LOG_JSON).ok().is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialized: {e}");
    }
}
