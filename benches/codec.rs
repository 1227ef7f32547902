//! Codec benchmarks for sszkit
//!
//! Measures marshal/unmarshal throughput over representative shapes: a
//! fixed container, a container with variable fields, and a list of
//! variable-size elements.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sszkit::{marshal, unmarshal, Field, Schema, Value};

fn attestation_schema() -> Schema {
    Schema::with_types(vec![
        Field::container(
            "Checkpoint",
            vec![Field::uint64("epoch"), Field::bytevector("root", 32)],
        ),
        Field::container(
            "AttestationData",
            vec![
                Field::uint64("slot"),
                Field::uint64("index"),
                Field::bytevector("beacon_block_root", 32),
                Field::reference("source", "Checkpoint"),
                Field::reference("target", "Checkpoint"),
            ],
        ),
        Field::container(
            "Attestation",
            vec![
                Field::bitlist("aggregation_bits", 2048),
                Field::reference("data", "AttestationData"),
                Field::bytevector("signature", 96),
            ],
        ),
    ])
}

fn attestation_value() -> Value {
    let checkpoint =
        |epoch: u64| Value::Container(vec![Value::Uint64(epoch), Value::Bytes(vec![0xAB; 32])]);
    Value::Container(vec![
        Value::Bytes(vec![0xFF; 128]),
        Value::Container(vec![
            Value::Uint64(123456),
            Value::Uint64(7),
            Value::Bytes(vec![0x11; 32]),
            checkpoint(100),
            checkpoint(101),
        ]),
        Value::Bytes(vec![0x44; 96]),
    ])
}

fn bench_marshal(c: &mut Criterion) {
    let schema = attestation_schema();
    let info = schema.resolve("Attestation").unwrap();
    let value = attestation_value();

    let mut group = c.benchmark_group("marshal");
    group.bench_function("attestation", |b| {
        b.iter(|| marshal(black_box(&value), &info).unwrap())
    });
    group.finish();
}

fn bench_unmarshal(c: &mut Criterion) {
    let schema = attestation_schema();
    let info = schema.resolve("Attestation").unwrap();
    let bytes = marshal(&attestation_value(), &info).unwrap();

    let mut group = c.benchmark_group("unmarshal");
    group.bench_function("attestation", |b| {
        b.iter(|| unmarshal(black_box(&bytes), &info).unwrap())
    });
    group.finish();
}

fn bench_variable_lists(c: &mut Criterion) {
    let schema = Schema::with_types(vec![Field::list(
        "Blobs",
        4096,
        Field::bytelist("element", 1024),
    )]);
    let info = schema.resolve("Blobs").unwrap();

    let mut group = c.benchmark_group("variable_list");
    for count in [16usize, 256, 1024] {
        let value = Value::List(
            (0..count)
                .map(|i| Value::Bytes(vec![i as u8; 64]))
                .collect(),
        );
        let bytes = marshal(&value, &info).unwrap();
        group.bench_with_input(BenchmarkId::new("marshal", count), &value, |b, value| {
            b.iter(|| marshal(black_box(value), &info).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("unmarshal", count), &bytes, |b, bytes| {
            b.iter(|| unmarshal(black_box(bytes), &info).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_marshal, bench_unmarshal, bench_variable_lists);
criterion_main!(benches);
