//! 이벤트 스키마 -- 호스트 런타임에 전달되는 단위
//!
//! [`AdrEvent`]는 패턴에 매칭된 ADR 로그 레코드 하나를 나타냅니다.
//! 하류 소비자가 안정적인 스키마를 기대하므로 모든 문자열 필드는
//! 값이 없을 때 빈 문자열로 직렬화됩니다 (null이나 생략 없음).

use std::fmt;

use serde::{Deserialize, Serialize};

/// 이벤트 소스 식별자 (`meta.source.name`, `meta.source.type`)
pub const SOURCE_IDENTITY: &str = "oracle_adr_alertmanager";
/// 레코드에 org_id가 없을 때 쓰는 도메인 식별자
pub const DEFAULT_ORG_ID: &str = "oracle";
/// 레코드에 type이 없을 때 쓰는 분류
pub const DEFAULT_MSG_TYPE: &str = "UNKNOWN";

/// 매칭된 ADR 로그 레코드에서 만든 이벤트
///
/// 생성 후 변경되지 않으며 영속화되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdrEvent {
    /// 설정된 ADR 홈 경로
    pub adr_home: String,
    /// 매칭에 사용된 정규식 문자열
    pub pattern: String,
    /// 매칭된 레코드의 텍스트
    pub message: String,
    /// 컴포넌트 ID (예: rdbms, tnslsnr)
    pub comp_id: String,
    /// 호스트 주소
    pub host_addr: String,
    /// 호스트 ID
    pub host_id: String,
    /// 레벨
    pub level: String,
    /// 프로세스 ID
    pub pid: String,
    /// 조직 ID
    pub org_id: String,
    /// 메시지 분류
    pub msg_type: String,
    /// 로그에 기록된 시각 (원문 그대로)
    pub time: String,
    /// 수집 메타데이터
    pub meta: EventMeta,
}

/// 이벤트 수집 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    /// 수집 시각 (UTC ISO-8601, 마이크로초 정밀도)
    pub received_at: String,
    /// 이벤트 고유 ID (UUID v4)
    pub uuid: String,
    /// 이벤트 소스 식별 정보
    pub source: EventSourceInfo,
}

/// 이벤트를 만든 소스 식별 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSourceInfo {
    /// 소스 이름
    pub name: String,
    /// 소스 유형
    #[serde(rename = "type")]
    pub source_type: String,
}

impl Default for EventSourceInfo {
    fn default() -> Self {
        Self {
            name: SOURCE_IDENTITY.to_owned(),
            source_type: SOURCE_IDENTITY.to_owned(),
        }
    }
}

impl AdrEvent {
    /// 이벤트 고유 ID
    pub fn event_id(&self) -> &str {
        &self.meta.uuid
    }
}

impl fmt::Display for AdrEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AdrEvent[{}] comp={} type={} time={} {}",
            self.meta.uuid.get(..8).unwrap_or(&self.meta.uuid),
            self.comp_id,
            self.msg_type,
            self.time,
            self.message,
        )
    }
}
