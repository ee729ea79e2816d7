//! 설정 관리 -- adrwatch.toml 파싱, 호스트 인자 해석, 유효성 검증
//!
//! [`AdrwatchConfig`]는 데몬이 읽는 최상위 설정이고,
//! [`SourceConfig`]는 이벤트 소스 하나(ADR 홈 하나)의 설정입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`ADRWATCH_GENERAL_LOG_LEVEL=debug` 형식)
//! 3. 설정 파일 (`adrwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), adrwatch_core::error::AdrwatchError> {
//! use adrwatch_core::config::{AdrwatchConfig, SourceConfig};
//!
//! let config = AdrwatchConfig::load("adrwatch.toml").await?;
//!
//! // 호스트 런타임이 넘겨준 인자 딕셔너리
//! let args = serde_json::json!({ "adr_home": "/u01/app/oracle/diag/rdbms/mydb" });
//! let source = SourceConfig::from_args(&args)?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AdrwatchError, ConfigError};

/// 기본 매칭 패턴 (TNS/ORA 에러 코드)
pub const DEFAULT_PATTERN: &str = "(TNS|ORA)-[0-9]{5}";
/// 기본 폴링 간격 (초)
pub const DEFAULT_DELAY_SECS: i64 = 1;
/// 한 주기에 읽는 최대 바이트 수 기본값
pub const DEFAULT_MAX_READ_BYTES: usize = 8 * 1024 * 1024;
/// ADR 홈 아래 알림 로그 디렉토리
pub const ADR_ALERT_DIR: &str = "alert";
/// ADR XML 알림 로그 파일명
pub const ADR_LOG_FILE: &str = "log.xml";

/// adrwatch 통합 설정
///
/// `adrwatch.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdrwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 메트릭 노출 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// 감시할 ADR 소스 목록
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl AdrwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AdrwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AdrwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                AdrwatchError::Io(e)
            }
        })?;
        let mut config = Self::parse(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다 (검증 없음).
    pub fn parse(toml_str: &str) -> Result<Self, AdrwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            AdrwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `ADRWATCH_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "ADRWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "ADRWATCH_GENERAL_LOG_FORMAT");

        override_bool(&mut self.metrics.enabled, "ADRWATCH_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "ADRWATCH_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "ADRWATCH_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AdrwatchError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            )
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            )
            .into());
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::invalid("metrics.port", "must be 1-65535").into());
        }

        for source in &self.sources {
            source.validate()?;
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9108,
        }
    }
}

/// ADR 이벤트 소스 하나의 설정
///
/// 호스트 런타임이 넘기는 인자(`adr_home`, `pattern`, `delay`)와
/// 동일한 키를 사용합니다. 시작 시 한 번 검증되고 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Oracle ADR 홈 경로 (필수)
    pub adr_home: PathBuf,
    /// 메시지 텍스트에 적용할 정규식
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// 폴링 간격 (초, 양수)
    #[serde(default = "default_delay")]
    pub delay: i64,
    /// 대소문자 무시 매칭
    #[serde(default)]
    pub ignore_case: bool,
    /// 시작 시 이미 있는 로그를 처음부터 읽을지 여부
    #[serde(default)]
    pub from_beginning: bool,
    /// 한 주기에 읽는 최대 바이트 수
    #[serde(default = "default_max_read_bytes")]
    pub max_read_bytes: usize,
    /// 로그/메트릭용 이름 (없으면 adr_home)
    #[serde(default)]
    pub name: Option<String>,
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_owned()
}

fn default_delay() -> i64 {
    DEFAULT_DELAY_SECS
}

fn default_max_read_bytes() -> usize {
    DEFAULT_MAX_READ_BYTES
}

impl SourceConfig {
    /// 기본값으로 새 소스 설정을 만듭니다.
    pub fn new(adr_home: impl Into<PathBuf>) -> Self {
        Self {
            adr_home: adr_home.into(),
            pattern: default_pattern(),
            delay: DEFAULT_DELAY_SECS,
            ignore_case: false,
            from_beginning: false,
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
            name: None,
        }
    }

    /// 호스트 런타임의 인자 딕셔너리에서 설정을 해석하고 검증합니다.
    pub fn from_args(args: &serde_json::Value) -> Result<Self, AdrwatchError> {
        if !args.is_object() {
            return Err(ConfigError::ParseFailed {
                reason: "source arguments must be a mapping".to_owned(),
            }
            .into());
        }
        if args.get("adr_home").is_none_or(|v| v.is_null()) {
            return Err(ConfigError::invalid("adr_home", "required argument is missing").into());
        }
        let config: Self =
            serde_json::from_value(args.clone()).map_err(|e| ConfigError::ParseFailed {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// 감시 대상 XML 로그 파일 경로 (`<adr_home>/alert/log.xml`)
    pub fn log_path(&self) -> PathBuf {
        self.adr_home.join(ADR_ALERT_DIR).join(ADR_LOG_FILE)
    }

    /// 로그와 메트릭에 쓰는 소스 이름
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.adr_home.display().to_string(),
        }
    }

    /// 폴링 간격. [`validate`](Self::validate)를 통과한 설정에서만 의미가 있습니다.
    pub fn delay_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.delay.max(1).unsigned_abs())
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 파일을 열기 전에 호출되며, 실패는 시작 단계의 치명적 에러입니다.
    pub fn validate(&self) -> Result<(), AdrwatchError> {
        if self.delay <= 0 {
            return Err(ConfigError::invalid(
                "delay",
                format!("must be a positive number of seconds, got {}", self.delay),
            )
            .into());
        }

        if self.max_read_bytes == 0 {
            return Err(ConfigError::invalid("max_read_bytes", "must be greater than 0").into());
        }

        if self.adr_home.as_os_str().is_empty() {
            return Err(ConfigError::invalid("adr_home", "must not be empty").into());
        }

        let metadata = std::fs::metadata(&self.adr_home).map_err(|e| {
            ConfigError::invalid(
                "adr_home",
                format!("'{}' is not accessible: {e}", self.adr_home.display()),
            )
        })?;
        if !metadata.is_dir() {
            return Err(ConfigError::invalid(
                "adr_home",
                format!("'{}' is not a directory", self.adr_home.display()),
            )
            .into());
        }
        std::fs::read_dir(&self.adr_home).map_err(|e| {
            ConfigError::invalid(
                "adr_home",
                format!("'{}' is not readable: {e}", self.adr_home.display()),
            )
        })?;

        Ok(())
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_defaults() {
        let config = SourceConfig::new("/u01/app/oracle/diag/tnslsnr/db01/listener");
        assert_eq!(config.pattern, DEFAULT_PATTERN);
        assert_eq!(config.delay, 1);
        assert!(!config.ignore_case);
        assert!(!config.from_beginning);
        assert_eq!(config.max_read_bytes, DEFAULT_MAX_READ_BYTES);
    }

    #[test]
    fn log_path_points_at_alert_log() {
        let config = SourceConfig::new("/logs/cman");
        assert_eq!(config.log_path(), PathBuf::from("/logs/cman/alert/log.xml"));
    }

    #[test]
    fn label_prefers_name() {
        let mut config = SourceConfig::new("/logs/cman");
        assert_eq!(config.label(), "/logs/cman");
        config.name = Some("cman".to_owned());
        assert_eq!(config.label(), "cman");
    }

    #[test]
    fn from_args_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SourceConfig::from_args(&json!({ "adr_home": dir.path() })).unwrap();
        assert_eq!(config.pattern, DEFAULT_PATTERN);
        assert_eq!(config.delay, 1);
        assert_eq!(config.adr_home, dir.path());
    }

    #[test]
    fn from_args_reads_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let config = SourceConfig::from_args(&json!({
            "adr_home": dir.path(),
            "pattern": "TNS-[0-9]{5}",
            "delay": 3,
        }))
        .unwrap();
        assert_eq!(config.pattern, "TNS-[0-9]{5}");
        assert_eq!(config.delay_duration(), std::time::Duration::from_secs(3));
    }

    #[test]
    fn from_args_requires_adr_home() {
        let err = SourceConfig::from_args(&json!({ "pattern": "ORA-" })).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("adr_home"));
    }

    #[test]
    fn from_args_rejects_non_mapping() {
        assert!(SourceConfig::from_args(&json!(["adr_home"])).is_err());
    }

    #[test]
    fn zero_and_negative_delay_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for delay in [0, -1, -60] {
            let err =
                SourceConfig::from_args(&json!({ "adr_home": dir.path(), "delay": delay }))
                    .unwrap_err();
            assert!(err.to_string().contains("delay"), "delay {delay} accepted");
        }
    }

    #[test]
    fn delay_checked_before_adr_home() {
        let mut config = SourceConfig::new("/nonexistent/adr/home");
        config.delay = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("delay"));
    }

    #[test]
    fn missing_adr_home_rejected() {
        let config = SourceConfig::new("/nonexistent/adr/home");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("adr_home"));
    }

    #[test]
    fn adr_home_must_be_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = SourceConfig::new(file.path());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn default_config_is_valid() {
        AdrwatchConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_rejects_bad_log_level() {
        let config = AdrwatchConfig::parse("[general]\nlog_level = \"loud\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_rejects_invalid_toml() {
        let err = AdrwatchConfig::parse("[general\nlog_level = ").unwrap_err();
        assert!(err.is_config());
    }
}
