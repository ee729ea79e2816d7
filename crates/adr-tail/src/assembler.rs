//! 레코드 조립 -- 추가된 바이트를 논리적 레코드로 분할
//!
//! [`RecordAssembler`]는 읽은 바이트를 대기 버퍼에 쌓고, 완성된 레코드만 꺼냅니다.
//! 경계가 아직 보이지 않는 뒷부분은 다음 주기까지 버퍼에 남습니다.
//!
//! # 경계 규칙
//! - 레코드 사이의 공백/빈 줄은 건너뜁니다.
//! - `<msg`로 시작하면 ADR XML 레코드이고 첫 `</msg>`에서 끝납니다.
//! - 그 밖에는 텍스트 레코드이고 `\n`에서 끝납니다 (`\r\n` 허용).
//!
//! 경계는 바이트 단위로 찾기 때문에 같은 바이트를 몇 번에 나눠 넣든
//! 결과 레코드 열은 동일합니다. UTF-8 디코딩은 완성된 레코드에만 적용되므로
//! 읽기 경계에서 잘린 멀티바이트 문자도 깨지지 않습니다.

use bytes::{Buf, BytesMut};
use tracing::warn;

use crate::error::TailError;
use crate::record::LogRecord;

/// 대기 버퍼 최대 크기. 경계 없이 이보다 커지면 버립니다.
pub const MAX_PENDING_BYTES: usize = 16 * 1024 * 1024;

const MSG_OPEN: &[u8] = b"<msg";
const MSG_CLOSE: &[u8] = b"</msg>";

/// 다음 레코드의 경계 판별 결과
enum Boundary {
    /// 더 많은 바이트가 필요함
    Incomplete,
    /// XML 레코드, `[0, end)`
    Xml { end: usize },
    /// 텍스트 레코드, 내용은 `[0, content_end)`, 소비는 `[0, consumed)`
    Line { content_end: usize, consumed: usize },
}

/// 레코드 조립기
pub struct RecordAssembler {
    /// 아직 경계가 보이지 않은 바이트
    pending: BytesMut,
    /// 경고 메시지용 파일 경로
    source: String,
    /// 대기 버퍼 상한
    max_pending: usize,
    /// 파싱 실패 등으로 버린 레코드 수
    dropped_count: u64,
}

impl RecordAssembler {
    /// 새 조립기를 생성합니다.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            pending: BytesMut::new(),
            source: source.into(),
            max_pending: MAX_PENDING_BYTES,
            dropped_count: 0,
        }
    }

    /// 대기 버퍼 상한을 설정합니다.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    /// 새 바이트를 넣고 완성된 레코드를 파일 순서대로 반환합니다.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<LogRecord> {
        self.pending.extend_from_slice(bytes);
        let mut records = Vec::new();

        loop {
            let leading = self
                .pending
                .iter()
                .take_while(|b| b.is_ascii_whitespace())
                .count();
            self.pending.advance(leading);
            if self.pending.is_empty() {
                break;
            }

            match next_boundary(&self.pending) {
                Boundary::Incomplete => break,
                Boundary::Xml { end } => {
                    let chunk = self.pending.split_to(end);
                    match LogRecord::from_adr_xml(&chunk) {
                        Ok(record) => records.push(record),
                        Err(reason) => {
                            self.dropped_count += 1;
                            let err = TailError::MalformedRecord {
                                path: self.source.clone(),
                                reason,
                            };
                            warn!(error = %err, "skipping ADR XML record");
                        }
                    }
                }
                Boundary::Line {
                    content_end,
                    consumed,
                } => {
                    let chunk = self.pending.split_to(consumed);
                    records.push(LogRecord::from_text_line(&chunk[..content_end]));
                }
            }
        }

        if self.pending.len() > self.max_pending {
            self.dropped_count += 1;
            warn!(
                path = self.source.as_str(),
                pending = self.pending.len(),
                limit = self.max_pending,
                "no record boundary within limit, discarding pending data"
            );
            self.pending.clear();
        }

        records
    }

    /// 대기 중인 조각을 버립니다 (로테이션/truncation 시).
    ///
    /// 버린 바이트 수를 반환합니다.
    pub fn reset(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        discarded
    }

    /// 대기 중인 바이트 수
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 지금까지 버린 레코드 수
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }
}

/// 공백이 제거된 버퍼 앞부분에서 다음 레코드 경계를 찾습니다.
fn next_boundary(buf: &[u8]) -> Boundary {
    if buf.len() <= MSG_OPEN.len() {
        // "<msg" 접두어인지 아직 판단할 수 없음
        if MSG_OPEN.starts_with(buf) {
            return Boundary::Incomplete;
        }
    } else if buf.starts_with(MSG_OPEN) && is_tag_name_end(buf[MSG_OPEN.len()]) {
        return match find(buf, MSG_CLOSE) {
            Some(idx) => Boundary::Xml {
                end: idx + MSG_CLOSE.len(),
            },
            None => Boundary::Incomplete,
        };
    }

    match buf.iter().position(|b| *b == b'\n') {
        Some(newline) => {
            let content_end = if newline > 0 && buf[newline - 1] == b'\r' {
                newline - 1
            } else {
                newline
            };
            Boundary::Line {
                content_end,
                consumed: newline + 1,
            }
        }
        None => Boundary::Incomplete,
    }
}

fn is_tag_name_end(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'>' || b == b'/'
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;
    use proptest::prelude::*;

    const MSG: &str = "<msg time='2024-01-01T00:00:00' comp_id='rdbms' pid='42'>\n <txt>ORA-00600: internal error code</txt>\n</msg>\n";

    #[test]
    fn single_complete_msg() {
        let mut assembler = RecordAssembler::new("log.xml");
        let records = assembler.feed(MSG.as_bytes());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::AdrXml);
        assert_eq!(records[0].pid, "42");
        assert_eq!(assembler.pending_len(), 0);
    }

    #[test]
    fn two_msgs_in_one_read() {
        let mut assembler = RecordAssembler::new("log.xml");
        let input = format!("{MSG}{MSG}");
        assert_eq!(assembler.feed(input.as_bytes()).len(), 2);
    }

    #[test]
    fn incomplete_msg_stays_pending() {
        let mut assembler = RecordAssembler::new("log.xml");
        let input = "<msg><txt>ORA-12345";
        assert!(assembler.feed(input.as_bytes()).is_empty());
        assert_eq!(assembler.pending_len(), input.len());
    }

    #[test]
    fn complete_then_partial() {
        let mut assembler = RecordAssembler::new("log.xml");
        let records = assembler.feed(b"<msg><txt>ORA-001</txt></msg><msg><txt>ORA-002");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_text, "ORA-001");
        assert_eq!(assembler.pending_len(), "<msg><txt>ORA-002".len());

        let records = assembler.feed(b"</txt></msg>");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_text, "ORA-002");
    }

    #[test]
    fn text_lines_need_newline() {
        let mut assembler = RecordAssembler::new("log.xml");
        assert!(assembler.feed(b"TNS-12537: TNS:connection closed").is_empty());
        let records = assembler.feed(b"\r\nINFO: heartbeat\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].raw_text, "TNS-12537: TNS:connection closed");
        assert_eq!(records[1].raw_text, "INFO: heartbeat");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut assembler = RecordAssembler::new("log.xml");
        let records = assembler.feed(b"\n\n   \nORA-00001\n\n");
        assert_eq!(records.len(), 1);
        assert_eq!(assembler.pending_len(), 0);
    }

    #[test]
    fn msg_prefix_waits_for_more_bytes() {
        let mut assembler = RecordAssembler::new("log.xml");
        assert!(assembler.feed(b"<ms").is_empty());
        assert_eq!(assembler.pending_len(), 3);
        let records = assembler.feed(b"g pid='1'>\n<txt>ORA-00001</txt>\n</msg>");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::AdrXml);
    }

    #[test]
    fn other_tags_are_text_lines() {
        let mut assembler = RecordAssembler::new("log.xml");
        let records = assembler.feed(b"<msgx>ORA-00001</msgx>\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::Text);
    }

    #[test]
    fn malformed_msg_is_dropped_and_counted() {
        let mut assembler = RecordAssembler::new("log.xml");
        let records = assembler.feed(b"<msg pid=1><txt>ORA-00001</txt></msg>\nORA-00002\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_text, "ORA-00002");
        assert_eq!(assembler.dropped_count(), 1);
    }

    #[test]
    fn unterminated_txt_is_dropped_and_counted() {
        let mut assembler = RecordAssembler::new("log.xml");
        let records = assembler.feed(
            b"<msg comp_id='rdbms'><txt>ORA-00600: cut short\n</msg>\n<msg><txt>ORA-00001</txt></msg>\n",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_text, "ORA-00001");
        assert_eq!(assembler.dropped_count(), 1);
    }

    #[test]
    fn multibyte_split_across_reads() {
        let mut assembler = RecordAssembler::new("log.xml");
        let line = "ORA-00001: 테이블 없음\n".as_bytes();
        // 한글 첫 글자(3바이트) 중간에서 자름
        let split = "ORA-00001: ".len() + 1;
        assert!(assembler.feed(&line[..split]).is_empty());
        let records = assembler.feed(&line[split..]);
        assert_eq!(records[0].raw_text, "ORA-00001: 테이블 없음");
    }

    #[test]
    fn reset_discards_pending() {
        let mut assembler = RecordAssembler::new("log.xml");
        assembler.feed(b"<msg><txt>partial");
        assert_eq!(assembler.reset(), "<msg><txt>partial".len());
        assert_eq!(assembler.pending_len(), 0);
        let records = assembler.feed(b"ORA-00001\n");
        assert_eq!(records[0].raw_text, "ORA-00001");
    }

    #[test]
    fn oversized_pending_is_discarded() {
        let mut assembler = RecordAssembler::new("log.xml").with_max_pending(16);
        assert!(assembler.feed(&[b'x'; 32]).is_empty());
        assert_eq!(assembler.pending_len(), 0);
        assert_eq!(assembler.dropped_count(), 1);
    }

    fn corpus() -> impl Strategy<Value = Vec<u8>> {
        let record = prop_oneof![
            Just(MSG.to_owned()),
            Just("<msg comp_id='tnslsnr'>\r\n<txt>TNS-12537: 연결 종료</txt></msg>".to_owned()),
            Just("INFO: heartbeat\n".to_owned()),
            Just("\n\n".to_owned()),
            "[A-Z]{3}-[0-9]{5}: [a-z ]{0,12}\n",
        ];
        prop::collection::vec(record, 0..12).prop_map(|parts| parts.concat().into_bytes())
    }

    proptest! {
        #[test]
        fn assembly_is_split_invariant(
            bytes in corpus(),
            cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
        ) {
            let mut whole = RecordAssembler::new("log.xml");
            let expected = whole.feed(&bytes);

            let mut points: Vec<usize> = cuts.iter().map(|c| c.index(bytes.len() + 1)).collect();
            points.sort_unstable();

            let mut split = RecordAssembler::new("log.xml");
            let mut actual = Vec::new();
            let mut start = 0;
            for point in points.into_iter().chain(std::iter::once(bytes.len())) {
                actual.extend(split.feed(&bytes[start..point]));
                start = point;
            }

            prop_assert_eq!(actual, expected);
            prop_assert_eq!(split.pending_len(), whole.pending_len());
        }
    }
}
