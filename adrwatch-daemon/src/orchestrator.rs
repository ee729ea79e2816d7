//! Source orchestration -- assembly, event forwarding, and lifecycle management.
//!
//! The [`Orchestrator`] builds one [`AdrSource`] per configured ADR home,
//! runs each on its own task, and funnels their events into a single
//! bounded channel that is drained to an output writer as JSON lines.
//!
//! # Shutdown
//!
//! 1. A signal (or the caller) cancels the shared [`CancellationToken`]
//! 2. Each source finishes its current step and drops its sender
//! 3. The writer drains events already queued, then the channel closes
//! 4. Source tasks are joined

use std::path::Path;

use anyhow::Result;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use adrwatch_core::config::AdrwatchConfig;
use adrwatch_core::event::AdrEvent;
use adrwatch_tail::AdrSource;

use crate::metrics_server;

/// Capacity of the merged event channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: AdrwatchConfig,
    /// Sources, built but not yet running.
    sources: Vec<AdrSource>,
    /// Cancels every source task.
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or parsed
    /// - Configuration validation fails
    /// - Any source fails to start (bad ADR home, pattern, or delay)
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = AdrwatchConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    ///
    /// Every source is constructed here so that configuration errors surface
    /// before any file is tailed.
    pub fn build_from_config(config: AdrwatchConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.sources.is_empty() {
            return Err(anyhow::anyhow!(
                "no sources configured: add a [[sources]] entry or pass --adr-home"
            ));
        }

        let mut sources = Vec::with_capacity(config.sources.len());
        for source_config in &config.sources {
            let label = source_config.label();
            let source = AdrSource::new(source_config.clone())
                .map_err(|e| anyhow::anyhow!("failed to build source '{}': {}", label, e))?;
            tracing::info!(source = %label, "source initialized");
            sources.push(source);
        }

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        tracing::info!(total_sources = sources.len(), "orchestrator initialized");

        Ok(Self {
            config,
            sources,
            cancel: CancellationToken::new(),
        })
    }

    /// Number of sources that will run.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &AdrwatchConfig {
        &self.config
    }

    /// Token that stops every source when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run every source, printing events to stdout, until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let cancel = self.cancel.clone();
        let signal_task = tokio::spawn(async move {
            match wait_for_shutdown_signal().await {
                Ok(signal) => tracing::info!(signal = signal, "shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "signal handling failed, shutting down"),
            }
            cancel.cancel();
        });

        let result = self.run_with_output(tokio::io::stdout()).await;
        signal_task.abort();
        result.map(|emitted| tracing::info!(events = emitted, "all sources stopped"))
    }

    /// Run every source and write each event as a JSON line to `out`.
    ///
    /// Returns once the cancel token fires and all queued events are written.
    /// Returns the number of events written.
    pub async fn run_with_output<W>(self, mut out: W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::channel::<AdrEvent>(EVENT_CHANNEL_CAPACITY);

        let tasks: Vec<JoinHandle<()>> = self
            .sources
            .into_iter()
            .map(|source| tokio::spawn(source.run(tx.clone(), self.cancel.clone())))
            .collect();
        drop(tx);

        tracing::info!(sources = tasks.len(), "sources running");

        let mut emitted = 0u64;
        let mut write_result = Ok(());
        while let Some(event) = rx.recv().await {
            if let Err(e) = write_event(&mut out, &event).await {
                tracing::error!(error = %e, "failed to write event, shutting down");
                self.cancel.cancel();
                write_result = Err(e);
                break;
            }
            emitted += 1;
            tracing::debug!(event_id = event.event_id(), comp_id = %event.comp_id, "event written");
        }
        drop(rx);

        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "source task failed");
            }
        }

        write_result.map(|()| emitted)
    }
}

async fn write_event<W>(out: &mut W, event: &AdrEvent) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');
    out.write_all(&line).await?;
    out.flush().await?;
    Ok(())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for Ctrl-C.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to install Ctrl-C handler: {}", e))?;
    Ok("CTRL_C")
}
