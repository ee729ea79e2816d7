//! 이벤트 소스 에러 타입
//!
//! [`TailError`]는 ADR 로그 tail 엔진 내부에서 발생하는 에러를 표현합니다.
//! `From<TailError> for AdrwatchError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.
//!
//! 시작 단계 밖으로 나가는 것은 설정 에러뿐이고,
//! 나머지는 폴링 루프 안에서 기록된 뒤 다음 주기에 재시도됩니다.

use adrwatch_core::error::{AdrwatchError, ConfigError};

/// ADR tail 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum TailError {
    /// 설정 에러 (치명적, 시작 시점)
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 정규식 컴파일 에러 (치명적, 시작 시점)
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        /// 설정된 패턴 문자열
        pattern: String,
        /// regex 컴파일 에러
        #[source]
        source: regex::Error,
    },

    /// 레코드 파싱 실패 (레코드 단위로 버려짐)
    #[error("malformed record at {path}: {reason}")]
    MalformedRecord {
        /// 로그 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// I/O 에러 (복구 가능, 다음 주기에 재시도)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TailError {
    /// 시작을 중단시켜야 하는 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TailError::Config { .. } | TailError::Pattern { .. })
    }
}

impl From<TailError> for AdrwatchError {
    fn from(err: TailError) -> Self {
        match err {
            TailError::Config { field, reason } => {
                AdrwatchError::Config(ConfigError::InvalidValue { field, reason })
            }
            TailError::Pattern { pattern, source } => AdrwatchError::Config(
                ConfigError::invalid("pattern", format!("'{pattern}' does not compile: {source}")),
            ),
            TailError::Io(e) => AdrwatchError::Io(e),
            err @ TailError::MalformedRecord { .. } => AdrwatchError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                err.to_string(),
            )),
        }
    }
}
