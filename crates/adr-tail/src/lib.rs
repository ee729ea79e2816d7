//! adrwatch-tail -- Oracle ADR 알림 로그 이벤트 소스
//!
//! `<adr_home>/alert/log.xml`을 주기적으로 tail하여, 설정된 정규식에 매칭되는
//! 레코드를 구조화된 [`AdrEvent`](adrwatch_core::AdrEvent)로 방출합니다.
//! 로그 로테이션(파일 교체)과 truncation을 감지하여 중복 없이 이어 읽습니다.
//!
//! # 모듈 구성
//!
//! - [`tracker`]: 읽기 오프셋과 파일 식별자, 로테이션/truncation 판별
//! - [`assembler`]: 바이트 청크를 완결된 레코드로 조립 (XML / 텍스트 자동 감지)
//! - [`record`]: ADR XML 레코드와 텍스트 줄 파싱
//! - [`matcher`]: 정규식 매칭
//! - [`builder`]: 이벤트 생성 (UUID, 수집 시각)
//! - [`source`]: 폴링 루프 오케스트레이션
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! PositionTracker -> read [offset, end) -> RecordAssembler -> PatternMatcher -> EventBuilder -> mpsc
//!       |                                        |
//!  inode / size 비교                      partial record 보관
//! ```
//!
//! # 사용 예시
//!
//! ```ignore
//! let config = SourceConfig::new("/u01/app/oracle/diag/tnslsnr/db01/listener");
//! let source = AdrSource::new(config)?;
//! let cancel = CancellationToken::new();
//! let (mut rx, handle) = source.spawn(1024, cancel.clone())?;
//! while let Some(event) = rx.recv().await {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! ```

pub mod assembler;
pub mod builder;
pub mod error;
pub mod matcher;
pub mod record;
pub mod source;
pub mod tracker;

use adrwatch_core::config::SourceConfig;
use adrwatch_core::error::AdrwatchError;
use adrwatch_core::event::AdrEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// --- 주요 타입 re-export ---

// 소스
pub use source::{AdrSource, PollState};

// 에러
pub use error::TailError;

// 파이프라인 단계
pub use assembler::RecordAssembler;
pub use builder::EventBuilder;
pub use matcher::PatternMatcher;
pub use record::{LogRecord, RecordKind};
pub use tracker::{FileChange, FileCursor, FileIdentity, PositionTracker};

/// 호스트 런타임 진입점.
///
/// 인자 매핑(`adr_home`, `pattern`, `delay` 등)을 해석하고 검증한 뒤
/// 취소될 때까지 이벤트를 `tx`로 보냅니다.
/// 에러는 시작 단계의 설정 에러뿐이며, 이 경우 파일은 열리지 않습니다.
pub async fn run_source(
    args: &serde_json::Value,
    tx: mpsc::Sender<AdrEvent>,
    cancel: CancellationToken,
) -> Result<(), AdrwatchError> {
    let config = SourceConfig::from_args(args)?;
    let source = AdrSource::new(config)?;
    source.run(tx, cancel).await;
    Ok(())
}
