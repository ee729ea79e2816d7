//! 파일 위치 추적 -- 오프셋과 파일 식별자 관리
//!
//! [`PositionTracker`]는 감시 중인 로그 파일의 읽기 오프셋과 식별자를 보관하고,
//! 매 주기 `stat` 결과와 비교하여 추가/로테이션/truncation을 판별합니다.
//!
//! # 판별 규칙
//! - 식별자 변경 (또는 파일이 사라졌다 다시 나타남) -> [`FileChange::Rotated`]
//! - 식별자 동일, 크기 < 오프셋 -> [`FileChange::Truncated`]
//! - 식별자 동일, 크기 > 오프셋 -> [`FileChange::Appended`]
//! - 파일 없음 -> [`FileChange::NoChange`] (다음 주기에 재시도)

use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// 파일 식별자 -- 같은 경로에 새 파일이 생겼는지 판별합니다.
///
/// Unix에서는 (device, inode), 그 외 플랫폼에서는 생성 시각을 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    primary: u64,
    secondary: u64,
}

impl FileIdentity {
    /// 파일 메타데이터에서 식별자를 만듭니다.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            primary: metadata.dev(),
            secondary: metadata.ino(),
        }
    }

    /// 파일 메타데이터에서 식별자를 만듭니다.
    #[cfg(not(unix))]
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let created = metadata
            .created()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .unwrap_or_default();
        Self {
            primary: created.as_secs(),
            secondary: u64::from(created.subsec_nanos()),
        }
    }

    #[cfg(test)]
    pub(crate) fn synthetic(primary: u64, secondary: u64) -> Self {
        Self { primary, secondary }
    }
}

/// 한 번의 `stat` 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSnapshot {
    /// 파일 식별자
    pub identity: FileIdentity,
    /// 파일 크기 (바이트)
    pub size: u64,
}

impl FileSnapshot {
    /// 파일 메타데이터에서 스냅샷을 만듭니다.
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            identity: FileIdentity::from_metadata(metadata),
            size: metadata.len(),
        }
    }
}

/// 현재 tail 위치
///
/// `offset <= size_at_last_check`가 항상 성립합니다.
/// 로테이션 시에는 수정되지 않고 새 커서로 교체됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCursor {
    /// 감시 대상 파일 경로
    pub path: PathBuf,
    /// 파일 식별자
    pub identity: FileIdentity,
    /// 다음에 읽을 바이트 오프셋
    pub offset: u64,
    /// 마지막 확인 시 파일 크기
    pub size_at_last_check: u64,
}

/// 한 번의 확인 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// 읽을 데이터 없음 (파일 없음 포함)
    NoChange,
    /// 새로 추가된 바이트 범위 `[offset, end)`
    Appended(Range<u64>),
    /// 다른 파일로 교체됨 -- 커서가 새 파일의 오프셋 0으로 재설정됨
    Rotated,
    /// 같은 파일이 줄어듦 -- 오프셋이 0으로 재설정됨
    Truncated,
}

/// 파일 위치 추적기
pub struct PositionTracker {
    /// 감시 대상 파일 경로
    path: PathBuf,
    /// 현재 커서 (파일을 처음 발견하기 전에는 None)
    cursor: Option<FileCursor>,
    /// 아직 한 번도 확인하지 않았는지 여부
    first_check: bool,
    /// 시작 시점에 이미 있는 파일을 끝에서부터 읽을지 여부
    start_at_end: bool,
    /// 마지막 확인에서 파일이 없었는지 여부
    vanished: bool,
    /// 한 번에 돌려주는 최대 범위 크기
    max_read_bytes: u64,
}

impl PositionTracker {
    /// 새 추적기를 생성합니다.
    pub fn new(path: impl Into<PathBuf>, start_at_end: bool, max_read_bytes: usize) -> Self {
        Self {
            path: path.into(),
            cursor: None,
            first_check: true,
            start_at_end,
            vanished: false,
            max_read_bytes: max_read_bytes.max(1) as u64,
        }
    }

    /// 감시 대상 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 현재 커서
    pub fn cursor(&self) -> Option<&FileCursor> {
        self.cursor.as_ref()
    }

    /// 파일 상태를 확인합니다.
    ///
    /// 파일이 없거나 `stat`이 실패하면 `NoChange`를 반환하고 다음 주기에 재시도합니다.
    pub async fn check(&mut self) -> FileChange {
        match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => self.observe(Some(FileSnapshot::from_metadata(&metadata))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.observe(None),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to stat log file, retrying next cycle"
                );
                self.first_check = false;
                FileChange::NoChange
            }
        }
    }

    /// `stat` 결과를 커서와 비교합니다. `None`은 파일이 없음을 뜻합니다.
    pub fn observe(&mut self, snapshot: Option<FileSnapshot>) -> FileChange {
        let first_check = std::mem::replace(&mut self.first_check, false);

        let Some(snapshot) = snapshot else {
            if !self.vanished {
                warn!(path = %self.path.display(), "log file missing, retrying");
                self.vanished = true;
            }
            return FileChange::NoChange;
        };

        let Some(cursor) = self.cursor.as_mut() else {
            let offset = if first_check && self.start_at_end {
                snapshot.size
            } else {
                0
            };
            info!(
                path = %self.path.display(),
                size = snapshot.size,
                offset,
                "log file discovered"
            );
            self.vanished = false;
            self.cursor = Some(FileCursor {
                path: self.path.clone(),
                identity: snapshot.identity,
                offset,
                size_at_last_check: snapshot.size,
            });
            return self.pending_range();
        };

        if self.vanished || cursor.identity != snapshot.identity {
            info!(
                path = %self.path.display(),
                previous_offset = cursor.offset,
                new_size = snapshot.size,
                "log rotation detected, following new file from offset 0"
            );
            self.vanished = false;
            self.cursor = Some(FileCursor {
                path: self.path.clone(),
                identity: snapshot.identity,
                offset: 0,
                size_at_last_check: snapshot.size,
            });
            return FileChange::Rotated;
        }

        if snapshot.size < cursor.offset {
            warn!(
                path = %self.path.display(),
                previous_offset = cursor.offset,
                current_size = snapshot.size,
                "log file truncated, re-reading from offset 0"
            );
            cursor.offset = 0;
            cursor.size_at_last_check = snapshot.size;
            return FileChange::Truncated;
        }

        cursor.size_at_last_check = snapshot.size;
        self.pending_range()
    }

    /// 성공적으로 읽은 바이트 수만큼 오프셋을 전진시킵니다.
    pub fn commit(&mut self, bytes_read: u64) {
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.offset = cursor
                .offset
                .saturating_add(bytes_read)
                .min(cursor.size_at_last_check);
            debug!(path = %self.path.display(), offset = cursor.offset, "offset committed");
        }
    }

    fn pending_range(&self) -> FileChange {
        match &self.cursor {
            Some(cursor) if cursor.size_at_last_check > cursor.offset => {
                let end = cursor
                    .size_at_last_check
                    .min(cursor.offset.saturating_add(self.max_read_bytes));
                FileChange::Appended(cursor.offset..end)
            }
            _ => FileChange::NoChange,
        }
    }
}
