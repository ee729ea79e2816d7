//! adrwatch 공통 크레이트
//!
//! 이벤트 소스 크레이트(`adrwatch-tail`)와 데몬이 공유하는
//! 에러 타입, 이벤트 스키마, 설정, 메트릭 이름을 정의합니다.
//!
//! # 모듈 구성
//!
//! - [`config`]: `adrwatch.toml` 파싱, 호스트 인자 해석, 검증
//! - [`error`]: 에러 분류 (설정 에러만 시작 단계 밖으로 전파)
//! - [`event`]: 호스트 런타임에 전달되는 이벤트 스키마
//! - [`metrics`]: 메트릭 이름 상수와 설명 등록

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;

// --- 주요 타입 re-export ---

// 에러
pub use error::{AdrwatchError, ConfigError};

// 설정
pub use config::{AdrwatchConfig, GeneralConfig, MetricsConfig, SourceConfig};

// 이벤트
pub use event::{AdrEvent, EventMeta, EventSourceInfo};
