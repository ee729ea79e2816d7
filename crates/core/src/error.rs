//! 에러 타입 -- 도메인별 에러 정의
//!
//! 시작 시점에 호스트로 전달되는 에러는 [`ConfigError`]뿐입니다.
//! 폴링 중의 I/O 에러는 각 소스 안에서 기록되고 다음 주기에 재시도됩니다.

/// adrwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum AdrwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdrwatchError {
    /// 시작을 중단시켜야 하는 설정 에러인지 확인합니다.
    pub fn is_config(&self) -> bool {
        matches!(self, AdrwatchError::Config(_))
    }
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    /// `InvalidValue` 에러를 만듭니다.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
