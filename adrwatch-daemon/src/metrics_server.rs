//! Prometheus exposition of the per-source counters.
//!
//! Enabled by `[metrics] enabled = true`. The exporter's built-in listener
//! serves the `adrwatch_*_total` counters (labelled by `source`) on
//! `listen_addr:port`; any request path returns the same text.

use std::net::SocketAddr;

use anyhow::Result;
use adrwatch_core::config::MetricsConfig;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Resolve `listen_addr` and `port` into a bind address.
pub fn listen_addr(config: &MetricsConfig) -> Result<SocketAddr> {
    format!("{}:{}", config.listen_addr, config.port)
        .parse()
        .map_err(|e| {
            anyhow::anyhow!(
                "invalid metrics listen address '{}:{}': {}",
                config.listen_addr,
                config.port,
                e
            )
        })
}

/// Install the global recorder, bind the scrape listener and register
/// counter descriptions. Only the first call in a process can succeed.
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<()> {
    let addr = listen_addr(config)?;
    if addr.ip().is_unspecified() {
        tracing::warn!(listen_addr = %addr, "metrics listener bound on all interfaces");
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to start metrics listener on {}: {}", addr, e))?;
    adrwatch_core::metrics::describe_all();

    tracing::info!(listen_addr = %addr, "source counters exported for Prometheus");
    Ok(())
}
