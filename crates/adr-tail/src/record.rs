//! 로그 레코드 -- ADR XML `<msg>` 또는 일반 텍스트 한 줄
//!
//! ADR 알림 로그(`alert/log.xml`)의 레코드는 다음과 같은 형태입니다.
//!
//! ```text
//! <msg time='2024-01-01T00:00:00.000+00:00' org_id='oracle' comp_id='rdbms'
//!  type='UNKNOWN' level='16' host_id='db01' host_addr='10.0.0.5' pid='12345'>
//!  <txt>ORA-00600: internal error code, arguments: [kdsgrp1]
//!  </txt>
//! </msg>
//! ```
//!
//! 여는 태그의 속성과 `<txt>` 본문만 추출하며, 그 밖의 XML 구조는 해석하지 않습니다.

use std::borrow::Cow;

/// 레코드 형식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordKind {
    /// ADR XML `<msg>...</msg>`
    AdrXml,
    /// 줄바꿈으로 끝나는 일반 텍스트 한 줄
    #[default]
    Text,
}

/// 논리적 로그 레코드 하나
///
/// 값을 추출할 수 없는 필드는 빈 문자열입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogRecord {
    /// 레코드 형식
    pub kind: RecordKind,
    /// 매칭 대상 텍스트 (XML은 `<txt>` 본문, 텍스트는 줄 전체)
    pub raw_text: String,
    /// comp_id 속성
    pub component_id: String,
    /// host_addr 속성
    pub host_addr: String,
    /// host_id 속성
    pub host_id: String,
    /// level 속성
    pub level: String,
    /// pid 속성
    pub pid: String,
    /// time 속성 (원문 그대로)
    pub timestamp: String,
    /// org_id 속성
    pub org_id: String,
    /// type 속성
    pub msg_type: String,
}

impl LogRecord {
    /// 텍스트 한 줄(줄바꿈 제외)로 레코드를 만듭니다.
    pub fn from_text_line(line: &[u8]) -> Self {
        Self {
            kind: RecordKind::Text,
            raw_text: String::from_utf8_lossy(line).into_owned(),
            ..Self::default()
        }
    }

    /// `<msg ...>...</msg>` 바이트를 파싱합니다.
    ///
    /// 잘못된 UTF-8은 대체 문자로 바뀌며, 태그 구조가 깨진 경우에만 실패합니다.
    pub fn from_adr_xml(raw: &[u8]) -> Result<Self, String> {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim();

        let rest = text
            .strip_prefix("<msg")
            .ok_or_else(|| "record does not start with <msg".to_owned())?;
        let tag_end = find_tag_end(rest).ok_or_else(|| "unterminated <msg> tag".to_owned())?;

        let (attrs, self_closing) = match rest[..tag_end].strip_suffix('/') {
            Some(attrs) => (attrs, true),
            None => (&rest[..tag_end], false),
        };

        let mut record = Self {
            kind: RecordKind::AdrXml,
            ..Self::default()
        };
        for (name, value) in parse_attributes(attrs)? {
            let slot = match name {
                "time" => &mut record.timestamp,
                "org_id" => &mut record.org_id,
                "comp_id" => &mut record.component_id,
                "type" => &mut record.msg_type,
                "level" => &mut record.level,
                "host_id" => &mut record.host_id,
                "host_addr" => &mut record.host_addr,
                "pid" => &mut record.pid,
                _ => continue,
            };
            *slot = value.into_owned();
        }

        if !self_closing {
            let body = &rest[tag_end + 1..];
            if let Some(txt) = extract_txt(body)? {
                record.raw_text = unescape_xml(txt).trim().to_owned();
            }
        }

        Ok(record)
    }
}

/// 따옴표 밖의 첫 `>` 위치를 찾습니다.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (idx, ch) in s.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '>') => return Some(idx),
            (None, _) => {}
        }
    }
    None
}

/// `name='value' name2="value2"` 형식의 속성 목록을 파싱합니다.
fn parse_attributes(s: &str) -> Result<Vec<(&str, Cow<'_, str>)>, String> {
    let mut attrs = Vec::new();
    let mut rest = s.trim_start();

    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| format!("attribute without value near '{}'", truncate(rest)))?;
        let name = rest[..eq].trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(format!("malformed attribute name near '{}'", truncate(rest)));
        }

        let after_eq = rest[eq + 1..].trim_start();
        let quote = after_eq
            .chars()
            .next()
            .filter(|c| *c == '"' || *c == '\'')
            .ok_or_else(|| format!("unquoted value for attribute '{name}'"))?;
        let value_and_rest = &after_eq[1..];
        let close = value_and_rest
            .find(quote)
            .ok_or_else(|| format!("unterminated value for attribute '{name}'"))?;

        attrs.push((name, unescape_xml(&value_and_rest[..close])));
        rest = value_and_rest[close + 1..].trim_start();
    }

    Ok(attrs)
}

/// `<txt>` 자식 요소의 본문을 찾습니다.
///
/// `<txt>`가 없으면 `None`, 열렸지만 `</txt>`로 닫히지 않으면 에러입니다.
fn extract_txt(body: &str) -> Result<Option<&str>, String> {
    let mut search = body;
    loop {
        let Some(start) = search.find("<txt") else {
            return Ok(None);
        };
        let after_name = &search[start + 4..];
        let content = match after_name.chars().next() {
            Some('>') => &after_name[1..],
            Some(c) if c.is_whitespace() => {
                let open_end =
                    find_tag_end(after_name).ok_or_else(|| "unterminated <txt> tag".to_owned())?;
                if after_name[..open_end].ends_with('/') {
                    return Ok(Some(""));
                }
                &after_name[open_end + 1..]
            }
            Some('/') => return Ok(Some("")),
            _ => {
                search = after_name;
                continue;
            }
        };
        return match content.find("</txt>") {
            Some(end) => Ok(Some(&content[..end])),
            None => Err("unterminated <txt> element".to_owned()),
        };
    }
}

/// XML 미리 정의된 엔티티와 문자 참조를 해제합니다.
///
/// 알 수 없는 엔티티는 원문 그대로 둡니다.
pub fn unescape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(32) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
