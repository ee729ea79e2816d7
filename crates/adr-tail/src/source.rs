//! 폴링 루프 -- 확인/읽기/조립/매칭/방출 한 주기를 반복합니다.
//!
//! [`AdrSource`]는 ADR 홈 하나를 감시하는 독립된 이벤트 소스입니다.
//! 소스마다 tokio 태스크 하나가 돌며, 소스끼리 공유하는 가변 상태는 없습니다.
//!
//! # 상태 전이
//! ```text
//! Idle -> Checking -> Reading -> Assembling -> Matching -> Emitting -> Sleeping -> Checking ...
//!                                                                   \-> Stopped (취소)
//! ```
//!
//! 주기는 겹치지 않으며, 대기 시간은 이전 주기 작업이 끝난 시점부터 잽니다.
//! 이벤트는 bounded 채널로 하나씩 보내므로 소비자가 느리면 다음 주기가 늦어집니다.

use std::ops::Range;
use std::path::PathBuf;

use metrics::counter;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use adrwatch_core::config::SourceConfig;
use adrwatch_core::error::AdrwatchError;
use adrwatch_core::event::AdrEvent;
use adrwatch_core::metrics::{
    BYTES_READ_TOTAL, EVENTS_EMITTED_TOTAL, LABEL_SOURCE, READ_ERRORS_TOTAL,
    RECORDS_DROPPED_TOTAL, RECORDS_TOTAL, ROTATIONS_TOTAL, TRUNCATIONS_TOTAL,
};

use crate::assembler::RecordAssembler;
use crate::builder::EventBuilder;
use crate::error::TailError;
use crate::matcher::PatternMatcher;
use crate::tracker::{FileChange, FileIdentity, PositionTracker};

/// 한 주기 안에서 로테이션/truncation 후 다시 확인하는 최대 횟수
const MAX_RECHECKS: usize = 2;

/// 폴링 루프 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// 아직 시작하지 않음
    Idle,
    /// 파일 상태 확인 중
    Checking,
    /// 추가된 바이트 읽는 중
    Reading,
    /// 레코드 조립 중
    Assembling,
    /// 패턴 매칭 중
    Matching,
    /// 이벤트 전달 중
    Emitting,
    /// 다음 주기 대기 중
    Sleeping,
    /// 종료됨
    Stopped,
}

/// 열린 읽기 전용 파일 핸들과 그 식별자
struct TailReader {
    file: File,
    identity: FileIdentity,
}

/// ADR 알림 로그 이벤트 소스
pub struct AdrSource {
    config: SourceConfig,
    label: String,
    log_path: PathBuf,
    tracker: PositionTracker,
    assembler: RecordAssembler,
    matcher: PatternMatcher,
    builder: EventBuilder,
    reader: Option<TailReader>,
    state: PollState,
}

impl AdrSource {
    /// 설정을 검증하고 패턴을 컴파일하여 소스를 만듭니다.
    ///
    /// 파일은 아직 열지 않습니다. 실패는 모두 설정 에러입니다.
    pub fn new(config: SourceConfig) -> Result<Self, AdrwatchError> {
        config.validate()?;
        let matcher = PatternMatcher::new(&config.pattern, config.ignore_case)?;

        let log_path = config.log_path();
        let label = config.label();
        let path_str = log_path.display().to_string();

        Ok(Self {
            tracker: PositionTracker::new(
                &log_path,
                !config.from_beginning,
                config.max_read_bytes,
            ),
            assembler: RecordAssembler::new(path_str),
            builder: EventBuilder::new(config.adr_home.display().to_string(), &config.pattern),
            matcher,
            reader: None,
            state: PollState::Idle,
            config,
            label,
            log_path,
        })
    }

    /// 소스 설정
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// 현재 상태
    pub fn state(&self) -> PollState {
        self.state
    }

    /// 감시 중인 로그 파일 경로
    pub fn log_path(&self) -> &std::path::Path {
        &self.log_path
    }

    /// 별도 태스크에서 소스를 실행하고 이벤트 수신 채널을 돌려줍니다.
    pub fn spawn(
        self,
        capacity: usize,
        cancel: CancellationToken,
    ) -> Result<(mpsc::Receiver<AdrEvent>, JoinHandle<()>), TailError> {
        if capacity == 0 {
            return Err(TailError::Config {
                field: "channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        let (tx, rx) = mpsc::channel(capacity);
        let handle = tokio::spawn(self.run(tx, cancel));
        Ok((rx, handle))
    }

    /// 취소되거나 소비자가 사라질 때까지 폴링합니다.
    ///
    /// 첫 주기는 바로 실행되고, 이후 주기 사이에 `delay`초를 쉽니다.
    /// 취소는 주기 사이와 대기 중에만 확인하므로, 한 주기에서 매칭된 이벤트는
    /// 소비자가 남아 있는 한 모두 전달됩니다. I/O 에러로 스스로 종료하지 않습니다.
    pub async fn run(mut self, tx: mpsc::Sender<AdrEvent>, cancel: CancellationToken) {
        let delay = self.config.delay_duration();
        info!(
            source = self.label.as_str(),
            path = %self.log_path.display(),
            pattern = self.matcher.as_str(),
            delay_secs = delay.as_secs(),
            "ADR source started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let events = self.poll_once().await;

            // 이미 커밋된 오프셋의 이벤트이므로 취소와 경쟁시키지 않고 모두 보냅니다.
            self.state = PollState::Emitting;
            let mut consumer_closed = false;
            for event in events {
                if tx.send(event).await.is_err() {
                    consumer_closed = true;
                    break;
                }
                counter!(EVENTS_EMITTED_TOTAL, LABEL_SOURCE => self.label.clone()).increment(1);
            }
            if consumer_closed {
                info!(source = self.label.as_str(), "event consumer closed, stopping");
                break;
            }
            if cancel.is_cancelled() {
                break;
            }

            self.state = PollState::Sleeping;
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.reader = None;
        self.state = PollState::Stopped;
        info!(source = self.label.as_str(), "ADR source stopped");
    }

    /// 한 주기(확인부터 매칭까지)를 실행하고 이번 주기에 만든 이벤트를 반환합니다.
    ///
    /// 복구 가능한 에러는 여기서 기록되고 빈 결과로 끝납니다.
    pub async fn poll_once(&mut self) -> Vec<AdrEvent> {
        self.state = PollState::Checking;
        let mut change = self.tracker.check().await;

        for _ in 0..MAX_RECHECKS {
            match change {
                FileChange::Rotated => {
                    counter!(ROTATIONS_TOTAL, LABEL_SOURCE => self.label.clone()).increment(1);
                    self.discard_pending("rotation");
                }
                FileChange::Truncated => {
                    counter!(TRUNCATIONS_TOTAL, LABEL_SOURCE => self.label.clone()).increment(1);
                    self.discard_pending("truncation");
                }
                _ => break,
            }
            self.reader = None;
            change = self.tracker.check().await;
        }

        let range = match change {
            FileChange::Appended(range) => range,
            _ => {
                if let Err(e) = self.ensure_reader().await {
                    debug!(
                        source = self.label.as_str(),
                        error = %e,
                        "could not open log file yet"
                    );
                }
                return Vec::new();
            }
        };

        self.state = PollState::Reading;
        let bytes = match self.read_range(range).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                counter!(READ_ERRORS_TOTAL, LABEL_SOURCE => self.label.clone()).increment(1);
                warn!(
                    source = self.label.as_str(),
                    path = %self.log_path.display(),
                    error = %e,
                    "failed to read log file, retrying next cycle"
                );
                self.reader = None;
                return Vec::new();
            }
        };
        self.tracker.commit(bytes.len() as u64);
        counter!(BYTES_READ_TOTAL, LABEL_SOURCE => self.label.clone())
            .increment(bytes.len() as u64);

        self.state = PollState::Assembling;
        let dropped_before = self.assembler.dropped_count();
        let records = self.assembler.feed(&bytes);
        let dropped = self.assembler.dropped_count() - dropped_before;
        counter!(RECORDS_TOTAL, LABEL_SOURCE => self.label.clone())
            .increment(records.len() as u64);
        if dropped > 0 {
            counter!(RECORDS_DROPPED_TOTAL, LABEL_SOURCE => self.label.clone()).increment(dropped);
        }

        self.state = PollState::Matching;
        let mut events = Vec::new();
        for record in records {
            if self.matcher.matches(&record) {
                events.push(self.builder.build(record));
            }
        }

        debug!(
            source = self.label.as_str(),
            bytes = bytes.len(),
            events = events.len(),
            pending = self.assembler.pending_len(),
            "poll cycle complete"
        );
        events
    }

    fn discard_pending(&mut self, cause: &str) {
        let discarded = self.assembler.reset();
        if discarded > 0 {
            warn!(
                source = self.label.as_str(),
                cause,
                discarded_bytes = discarded,
                "discarding partial record from previous file"
            );
        }
    }

    /// 현재 커서와 같은 파일을 가리키는 핸들을 준비합니다.
    ///
    /// 열린 핸들이 다른 파일이면(`stat`과 `open` 사이의 로테이션) `false`를 반환합니다.
    async fn ensure_reader(&mut self) -> Result<bool, TailError> {
        let Some(expected) = self.tracker.cursor().map(|c| c.identity) else {
            return Ok(false);
        };
        if self
            .reader
            .as_ref()
            .is_some_and(|reader| reader.identity == expected)
        {
            return Ok(true);
        }

        let file = File::open(&self.log_path).await?;
        let identity = FileIdentity::from_metadata(&file.metadata().await?);
        self.reader = Some(TailReader { file, identity });

        if identity != expected {
            debug!(
                source = self.label.as_str(),
                "opened file differs from tracked file, waiting for next check"
            );
            return Ok(false);
        }
        debug!(source = self.label.as_str(), path = %self.log_path.display(), "log file opened");
        Ok(true)
    }

    async fn read_range(&mut self, range: Range<u64>) -> Result<Option<Vec<u8>>, TailError> {
        if !self.ensure_reader().await? {
            return Ok(None);
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let len = range.end.saturating_sub(range.start);
        reader.file.seek(SeekFrom::Start(range.start)).await?;
        let mut buf = Vec::with_capacity(usize::try_from(len).unwrap_or(0));
        (&mut reader.file).take(len).read_to_end(&mut buf).await?;
        Ok(Some(buf))
    }
}
