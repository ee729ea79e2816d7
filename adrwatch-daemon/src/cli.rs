//! CLI argument definitions for adrwatch-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use adrwatch_core::config::{AdrwatchConfig, DEFAULT_PATTERN, SourceConfig};

/// Oracle ADR alert log watcher.
///
/// Tails `<adr_home>/alert/log.xml` for every configured source and prints
/// each record matching the source pattern as one JSON object per line.
#[derive(Parser, Debug)]
#[command(name = "adrwatch-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to adrwatch.toml configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// ADR home of an ad-hoc source, added to the configured sources.
    #[arg(long)]
    pub adr_home: Option<PathBuf>,

    /// Regular expression for the ad-hoc source.
    #[arg(long, default_value = DEFAULT_PATTERN, requires = "adr_home")]
    pub pattern: String,

    /// Poll interval in seconds for the ad-hoc source.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true, requires = "adr_home")]
    pub delay: i64,

    /// Match the ad-hoc source pattern case-insensitively.
    #[arg(long, requires = "adr_home")]
    pub ignore_case: bool,

    /// Read the ad-hoc source log from offset 0 instead of its end.
    #[arg(long, requires = "adr_home")]
    pub from_beginning: bool,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without starting any source.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut AdrwatchConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
        if let Some(source) = self.adhoc_source() {
            config.sources.push(source);
        }
    }

    /// The source described by `--adr-home` and its companion flags, if any.
    pub fn adhoc_source(&self) -> Option<SourceConfig> {
        let adr_home = self.adr_home.as_ref()?;
        let mut source = SourceConfig::new(adr_home);
        source.pattern = self.pattern.clone();
        source.delay = self.delay;
        source.ignore_case = self.ignore_case;
        source.from_beginning = self.from_beginning;
        Some(source)
    }
}
