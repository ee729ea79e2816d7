//! 패턴 매칭 -- 설정된 정규식 하나로 레코드를 거릅니다.
//!
//! 정규식은 시작 시 한 번만 컴파일합니다. 컴파일 실패는 치명적 설정 에러입니다.
//! 여러 줄 모드가 켜져 있어 `^`/`$`는 각 줄 경계에서도 매칭되며,
//! 암묵적인 앵커는 추가하지 않습니다.

use regex::{Regex, RegexBuilder};

use crate::error::TailError;
use crate::record::LogRecord;

/// 레코드 매처
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
}

impl PatternMatcher {
    /// 패턴을 컴파일합니다. 기본은 대소문자 구분입니다.
    pub fn new(pattern: &str, ignore_case: bool) -> Result<Self, TailError> {
        let regex = RegexBuilder::new(pattern)
            .multi_line(true)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|source| TailError::Pattern {
                pattern: pattern.to_owned(),
                source,
            })?;
        Ok(Self { regex })
    }

    /// 레코드 텍스트 어딘가에 패턴이 나타나는지 확인합니다.
    pub fn matches(&self, record: &LogRecord) -> bool {
        self.regex.is_match(&record.raw_text)
    }

    /// 원본 패턴 문자열
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> LogRecord {
        LogRecord::from_text_line(text.as_bytes())
    }

    #[test]
    fn default_pattern_matches_tns_and_ora() {
        let matcher = PatternMatcher::new(adrwatch_core::config::DEFAULT_PATTERN, false).unwrap();
        assert!(matcher.matches(&record("TNS-12537: TNS:connection closed")));
        assert!(matcher.matches(&record("ORA-00600: internal error code")));
        assert!(!matcher.matches(&record("INFO: heartbeat")));
        assert!(!matcher.matches(&record("ORA-123: too short")));
    }

    #[test]
    fn case_sensitive_by_default() {
        let matcher = PatternMatcher::new("ORA-[0-9]{5}", false).unwrap();
        assert!(!matcher.matches(&record("ora-00600")));
    }

    #[test]
    fn ignore_case_option() {
        let matcher = PatternMatcher::new("ora-[0-9]{5}", true).unwrap();
        assert!(matcher.matches(&record("ORA-00600: internal error code")));
    }

    #[test]
    fn matches_anywhere_in_multiline_text() {
        let mut rec = record("");
        rec.raw_text = "Errors in file /u01/trace/db_ora_123.trc:\nORA-01578: block corrupted".to_owned();
        let anchored = PatternMatcher::new("^ORA-[0-9]{5}", false).unwrap();
        assert!(anchored.matches(&rec));
        let unanchored = PatternMatcher::new("block", false).unwrap();
        assert!(unanchored.matches(&rec));
    }

    #[test]
    fn matching_is_idempotent() {
        let matcher = PatternMatcher::new("TNS-[0-9]{5}", false).unwrap();
        let rec = record("TNS-12537: TNS:connection closed");
        let first = matcher.matches(&rec);
        for _ in 0..10 {
            assert_eq!(matcher.matches(&rec), first);
        }
    }

    #[test]
    fn invalid_pattern_is_fatal() {
        let err = PatternMatcher::new("(TNS|ORA", false).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("(TNS|ORA"));
    }

    #[test]
    fn keeps_pattern_string() {
        let matcher = PatternMatcher::new("TNS-[0-9]{5}", false).unwrap();
        assert_eq!(matcher.as_str(), "TNS-[0-9]{5}");
    }
}
