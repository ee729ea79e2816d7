//! Configuration layering tests: file, environment, then CLI flags.

use adrwatch_core::config::AdrwatchConfig;
use adrwatch_daemon::cli::DaemonCli;
use clap::Parser;
use serial_test::serial;

#[test]
fn test_cli_source_appended_to_file_sources() {
    let toml_str = r#"
[general]
log_level = "warn"

[[sources]]
adr_home = "/u01/app/oracle/diag/crs/db01/crs"
"#;
    let mut config = AdrwatchConfig::parse(toml_str).expect("config should parse");
    let cli = DaemonCli::parse_from([
        "adrwatch-daemon",
        "--adr-home",
        "/u01/app/oracle/diag/tnslsnr/db01/listener",
        "--from-beginning",
        "--log-level",
        "debug",
    ]);
    cli.apply_to(&mut config);

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.sources.len(), 2);
    assert!(config.sources[1].from_beginning);
    assert!(
        config.sources[1]
            .adr_home
            .ends_with("tnslsnr/db01/listener")
    );
}

#[test]
#[serial]
fn test_cli_overrides_environment() {
    // SAFETY: serialized with the other env tests
    unsafe { std::env::set_var("ADRWATCH_GENERAL_LOG_FORMAT", "pretty") };
    let mut config = AdrwatchConfig::default();
    config.apply_env_overrides();
    assert_eq!(config.general.log_format, "pretty");

    let cli = DaemonCli::parse_from(["adrwatch-daemon", "--log-format", "json"]);
    cli.apply_to(&mut config);
    assert_eq!(config.general.log_format, "json");

    unsafe { std::env::remove_var("ADRWATCH_GENERAL_LOG_FORMAT") };
}

#[test]
fn test_invalid_cli_log_level_fails_validation() {
    let mut config = AdrwatchConfig::default();
    let cli = DaemonCli::parse_from(["adrwatch-daemon", "--log-level", "loud"]);
    cli.apply_to(&mut config);
    assert!(config.validate().is_err());
}
