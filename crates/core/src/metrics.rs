//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 이벤트 소스는 이 상수로 `metrics::counter!()` 매크로를 호출하며,
//! 레코더가 설치되지 않았으면 호출은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `adrwatch_`
//! - 접미어: `_total` (counter)
//! - 모든 카운터는 [`LABEL_SOURCE`] 레이블로 소스를 구분합니다.

use metrics::describe_counter;

/// 소스 이름 레이블 키
pub const LABEL_SOURCE: &str = "source";

/// 읽은 바이트 수 (counter)
pub const BYTES_READ_TOTAL: &str = "adrwatch_bytes_read_total";

/// 조립된 레코드 수 (counter)
pub const RECORDS_TOTAL: &str = "adrwatch_records_total";

/// 파싱 실패 등으로 버린 레코드 수 (counter)
pub const RECORDS_DROPPED_TOTAL: &str = "adrwatch_records_dropped_total";

/// 호스트에 전달된 이벤트 수 (counter)
pub const EVENTS_EMITTED_TOTAL: &str = "adrwatch_events_emitted_total";

/// 감지된 로테이션 수 (counter)
pub const ROTATIONS_TOTAL: &str = "adrwatch_rotations_total";

/// 감지된 truncation 수 (counter)
pub const TRUNCATIONS_TOTAL: &str = "adrwatch_truncations_total";

/// 복구 가능한 읽기 에러 수 (counter)
pub const READ_ERRORS_TOTAL: &str = "adrwatch_read_errors_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    describe_counter!(BYTES_READ_TOTAL, "Total bytes read from ADR alert logs");
    describe_counter!(
        RECORDS_TOTAL,
        "Total number of complete log records assembled"
    );
    describe_counter!(
        RECORDS_DROPPED_TOTAL,
        "Total number of records dropped because they could not be parsed"
    );
    describe_counter!(
        EVENTS_EMITTED_TOTAL,
        "Total number of events delivered to the consumer"
    );
    describe_counter!(ROTATIONS_TOTAL, "Total number of log rotations detected");
    describe_counter!(
        TRUNCATIONS_TOTAL,
        "Total number of in-place truncations detected"
    );
    describe_counter!(
        READ_ERRORS_TOTAL,
        "Total number of recoverable I/O errors while polling"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        BYTES_READ_TOTAL,
        RECORDS_TOTAL,
        RECORDS_DROPPED_TOTAL,
        EVENTS_EMITTED_TOTAL,
        ROTATIONS_TOTAL,
        TRUNCATIONS_TOTAL,
        READ_ERRORS_TOTAL,
    ];

    #[test]
    fn all_metrics_use_prefix_and_counter_suffix() {
        for name in ALL_METRIC_NAMES {
            assert!(name.starts_with("adrwatch_"), "bad prefix: {name}");
            assert!(name.ends_with("_total"), "counter without _total: {name}");
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        describe_all();
    }
}
