//! 이벤트 생성 -- 매칭된 레코드를 [`AdrEvent`]로 변환
//!
//! 고정 필드(`adr_home`, `pattern`)는 설정에서, 나머지는 레코드에서 채웁니다.
//! `meta.uuid`는 호출마다 새로 만들고, `meta.received_at`은 호출 시각(UTC)입니다.

use adrwatch_core::event::{
    AdrEvent, DEFAULT_MSG_TYPE, DEFAULT_ORG_ID, EventMeta, EventSourceInfo,
};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::record::LogRecord;

/// 이벤트 생성기
///
/// 마지막으로 발급한 수집 시각을 기억하여, 시스템 시계가 뒤로 가더라도
/// 방출 순서대로 `received_at`이 감소하지 않게 합니다.
pub struct EventBuilder {
    adr_home: String,
    pattern: String,
    last_received_at: Option<DateTime<Utc>>,
}

impl EventBuilder {
    /// 새 생성기를 만듭니다.
    pub fn new(adr_home: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            adr_home: adr_home.into(),
            pattern: pattern.into(),
            last_received_at: None,
        }
    }

    /// 레코드를 소비하여 이벤트를 만듭니다.
    pub fn build(&mut self, record: LogRecord) -> AdrEvent {
        let received_at = self.next_received_at(Utc::now());

        AdrEvent {
            adr_home: self.adr_home.clone(),
            pattern: self.pattern.clone(),
            message: record.raw_text,
            comp_id: record.component_id,
            host_addr: record.host_addr,
            host_id: record.host_id,
            level: record.level,
            pid: record.pid,
            org_id: non_empty_or(record.org_id, DEFAULT_ORG_ID),
            msg_type: non_empty_or(record.msg_type, DEFAULT_MSG_TYPE),
            time: record.timestamp,
            meta: EventMeta {
                received_at: received_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                uuid: uuid::Uuid::new_v4().to_string(),
                source: EventSourceInfo::default(),
            },
        }
    }

    fn next_received_at(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let at = match self.last_received_at {
            Some(last) if now < last => last,
            _ => now,
        };
        self.last_received_at = Some(at);
        at
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_owned()
    } else {
        value
    }
}
