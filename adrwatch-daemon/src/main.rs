use anyhow::Result;
use clap::Parser;

use adrwatch_core::config::AdrwatchConfig;
use adrwatch_daemon::cli::DaemonCli;
use adrwatch_daemon::logging;
use adrwatch_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = match &cli.config {
        Some(path) => AdrwatchConfig::load(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?,
        None => {
            let mut config = AdrwatchConfig::default();
            config.apply_env_overrides();
            config
        }
    };
    cli.apply_to(&mut config);

    if cli.validate {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
        // no listener when only validating
        config.metrics.enabled = false;
        let orchestrator = Orchestrator::build_from_config(config)?;
        println!(
            "configuration is valid ({} source(s))",
            orchestrator.source_count()
        );
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "adrwatch-daemon starting");

    let orchestrator = Orchestrator::build_from_config(config)?;
    orchestrator.run().await?;

    tracing::info!("adrwatch-daemon shut down");
    Ok(())
}
