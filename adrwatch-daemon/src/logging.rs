//! Diagnostic log output for adrwatch-daemon.
//!
//! stdout is reserved for event lines, so every subscriber built here
//! writes to stderr. The `[general]` section picks the level and the
//! encoding; `RUST_LOG` wins over `log_level` when set.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use adrwatch_core::config::GeneralConfig;

/// Install the process-wide subscriber. Call once, before sources start.
///
/// `log_format` is `"json"` (one object per line, for log shippers) or
/// `"pretty"` (for a terminal).
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        "pretty" => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        other => anyhow::bail!("unknown log format '{other}', expected 'json' or 'pretty'"),
    };

    installed.map_err(|e| {
        anyhow::anyhow!(
            "failed to install {} diagnostic logger: {}",
            config.log_format,
            e
        )
    })
}
