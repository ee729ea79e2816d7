//! 레코드 조립/매칭 벤치마크
//!
//! ADR XML 레코드와 텍스트 줄의 조립 처리량, 청크 크기에 따른 차이를 측정합니다.

use adrwatch_tail::{PatternMatcher, RecordAssembler};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

/// 일반적인 ADR XML 레코드
const XML_RECORD: &str = "<msg time='2024-01-15T12:00:00.123+00:00' org_id='oracle' comp_id='tnslsnr'\n type='UNKNOWN' level='16' host_id='db01.example.com'\n host_addr='10.0.0.15' pid='4711'>\n <txt>15-JAN-2024 12:00:00 * (CONNECT_DATA=(SID=ORCL)) * establish * ORCL * 12514\n TNS-12514: TNS:listener does not currently know of service requested in connect descriptor\n </txt>\n</msg>\n";

/// 매칭되지 않는 하트비트 레코드
const XML_HEARTBEAT: &str = "<msg time='2024-01-15T12:00:01.000+00:00' org_id='oracle' comp_id='tnslsnr' type='UNKNOWN' level='16' host_id='db01' host_addr='10.0.0.15' pid='4711'>\n <txt>15-JAN-2024 12:00:01 * service_update * ORCL * 0\n </txt>\n</msg>\n";

const TEXT_LINE: &str = "ORA-00600: internal error code, arguments: [kcbz_check_objd_typ], [0], [0], [1]\n";

fn build_payload(record: &str, count: usize) -> Vec<u8> {
    record.repeat(count).into_bytes()
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");

    for (name, record) in [("xml", XML_RECORD), ("text", TEXT_LINE)] {
        let payload = build_payload(record, 1000);
        group.throughput(Throughput::Elements(1000));
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut assembler = RecordAssembler::new("bench");
                assembler.feed(black_box(&payload))
            })
        });
    }

    group.finish();
}

fn bench_chunked(c: &mut Criterion) {
    let payload = build_payload(XML_RECORD, 1000);
    let mut group = c.benchmark_group("assemble_chunked");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for chunk_size in [64usize, 4096, 65536] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            &chunk_size,
            |b, &size| {
                b.iter(|| {
                    let mut assembler = RecordAssembler::new("bench");
                    let mut total = 0;
                    for chunk in payload.chunks(size) {
                        total += assembler.feed(black_box(chunk)).len();
                    }
                    total
                })
            },
        );
    }

    group.finish();
}

fn bench_match(c: &mut Criterion) {
    let mut payload = String::new();
    for i in 0..1000 {
        payload.push_str(if i % 10 == 0 { XML_RECORD } else { XML_HEARTBEAT });
    }
    let records = RecordAssembler::new("bench").feed(payload.as_bytes());
    let matcher = PatternMatcher::new("(TNS|ORA)-[0-9]{5}", false).unwrap();

    let mut group = c.benchmark_group("match");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("mixed_1000", |b| {
        b.iter(|| records.iter().filter(|r| matcher.matches(black_box(r))).count())
    });
    group.finish();
}

criterion_group!(benches, bench_assemble, bench_chunked, bench_match);
criterion_main!(benches);
