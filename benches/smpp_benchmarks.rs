// ABOUTME: Benchmarks for the PDU codec, framing and short message text encodings
// ABOUTME: Measures frame checks, decode, encode and GSM 7-bit packing across message sizes

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use smpp_session::client::split_segments;
use smpp_session::datatypes::{CommandId, Tlv, TlvTag};
use smpp_session::pdutext::{Text, gsm7};
use smpp_session::{Encodable, FieldName, Pdu, frame};
use std::io::Cursor;
use std::time::Duration;

fn sample_submit_sm(message: &str) -> Pdu {
    let mut pdu = Pdu::new(CommandId::SubmitSm);
    pdu.set_sequence(1);
    pdu.set(FieldName::SourceAddr, "12345").unwrap();
    pdu.set(FieldName::DestinationAddr, "67890").unwrap();
    pdu.set(FieldName::ShortMessage, Text::raw(message)).unwrap();
    pdu
}

fn sample_deliver_sm() -> Pdu {
    let mut pdu = Pdu::new(CommandId::DeliverSm);
    pdu.set_sequence(2);
    pdu.set(FieldName::SourceAddr, "67890").unwrap();
    pdu.set(FieldName::DestinationAddr, "12345").unwrap();
    pdu.set(FieldName::EsmClass, 0x04u8).unwrap();
    pdu.set(
        FieldName::ShortMessage,
        Text::raw("id:0000000001 sub:001 dlvrd:001 submit date:2402291345 done date:2402291345 stat:DELIVRD err:000 text:hello"),
    )
    .unwrap();
    pdu.set_tlv(Tlv::new(TlvTag::ReceiptedMessageId, b"0000000001".to_vec()));
    pdu
}

fn sample_enquire_link() -> Pdu {
    let mut pdu = Pdu::new(CommandId::EnquireLink);
    pdu.set_sequence(3);
    pdu
}

fn bytes_of(pdu: &Pdu) -> Vec<u8> {
    pdu.to_bytes().unwrap().to_vec()
}

fn bench_frame_check(c: &mut Criterion) {
    let submit = bytes_of(&sample_submit_sm("Hello World"));
    let enquire = bytes_of(&sample_enquire_link());

    let mut group = c.benchmark_group("frame_check");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("submit_sm", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(black_box(submit.as_slice()));
            frame::check(&mut cursor).unwrap()
        })
    });

    group.bench_function("enquire_link", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(black_box(enquire.as_slice()));
            frame::check(&mut cursor).unwrap()
        })
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let samples = [
        ("submit_sm", bytes_of(&sample_submit_sm("Hello World"))),
        ("deliver_sm", bytes_of(&sample_deliver_sm())),
        ("enquire_link", bytes_of(&sample_enquire_link())),
    ];

    let mut group = c.benchmark_group("decode");
    group.measurement_time(Duration::from_secs(10));
    for (name, bytes) in &samples {
        group.bench_function(*name, |b| b.iter(|| Pdu::decode(black_box(bytes)).unwrap()));
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let submit = sample_submit_sm("Hello World");
    let deliver = sample_deliver_sm();

    let mut group = c.benchmark_group("encode");
    group.measurement_time(Duration::from_secs(10));
    group.bench_function("submit_sm", |b| b.iter(|| black_box(&submit).to_bytes().unwrap()));
    group.bench_function("deliver_sm", |b| {
        b.iter(|| black_box(&deliver).to_bytes().unwrap())
    });
    group.finish();
}

fn bench_message_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_sizes");
    group.measurement_time(Duration::from_secs(10));

    for size in [10usize, 50, 100, 160, 255] {
        let pdu = sample_submit_sm(&"A".repeat(size));
        let bytes = bytes_of(&pdu);
        group.bench_with_input(BenchmarkId::new("roundtrip", size), &bytes, |b, bytes| {
            b.iter(|| {
                let pdu = Pdu::decode(black_box(bytes)).unwrap();
                pdu.to_bytes().unwrap()
            })
        });
    }
    group.finish();
}

fn bench_gsm7(c: &mut Criterion) {
    let text = "The quick brown fox jumps over the lazy dog {with} escapes [and] more";
    let septets = gsm7::to_septets(text).unwrap();
    let packed = gsm7::pack(&septets, 0);
    let long = Text::gsm7_packed("x".repeat(600));

    let mut group = c.benchmark_group("gsm7");
    group.bench_function("to_septets", |b| b.iter(|| gsm7::to_septets(black_box(text)).unwrap()));
    group.bench_function("pack", |b| b.iter(|| gsm7::pack(black_box(&septets), 0)));
    group.bench_function("unpack", |b| b.iter(|| gsm7::unpack(black_box(&packed), 0)));
    group.bench_function("split_segments", |b| {
        b.iter(|| split_segments(black_box(&long)).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_frame_check,
    bench_decode,
    bench_encode,
    bench_message_sizes,
    bench_gsm7
);
criterion_main!(benches);
