#![allow(missing_docs)]

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use userial::{Codec, Reflect};

#[derive(Clone, Reflect, Debug)]
struct BenchOwner {
    name: String,
    score: f64,
}

#[derive(Clone, Reflect, Debug)]
struct BenchItem {
    id: i64,
    label: String,
    payload: Vec<i32>,
    #[userial(parent)]
    owner: BenchOwner,
}

fn generate_data(count: usize) -> Vec<BenchItem> {
    (0..count)
        .map(|i| BenchItem {
            id: i as i64,
            label: format!("item-{i}"),
            payload: vec![i as i32; 32],
            owner: BenchOwner {
                name: "bench".into(),
                score: i as f64 * 0.5,
            },
        })
        .collect()
}

// --- BENCHMARKS ---

fn bench_encode(c: &mut Criterion) {
    let item_count = 10_000;
    let data = generate_data(item_count);
    let codec = Codec::for_type::<Vec<BenchItem>>().expect("Failed to build codec");
    let size = codec.encode(&data).expect("Failed to encode").len();

    println!("Encode item count: {item_count}, stream size: {size} bytes");

    let mut group = c.benchmark_group("Encode");
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_function("encode_vec", |b| {
        b.iter(|| codec.encode(black_box(&data)).expect("Failed to encode"));
    });

    group.bench_function("encode_batch", |b| {
        b.iter(|| {
            codec
                .encode_batch(black_box(&data))
                .expect("Failed to encode batch")
        });
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let item_count = 10_000;
    let data = generate_data(item_count);
    let codec = Codec::for_type::<Vec<BenchItem>>().expect("Failed to build codec");
    let bytes = codec.encode(&data).expect("Failed to encode");
    let batch = codec.encode_batch(&data).expect("Failed to encode batch");

    let mut group = c.benchmark_group("Decode");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("decode_dynamic", |b| {
        b.iter(|| codec.decode(black_box(&bytes)).expect("Failed to decode"));
    });

    group.bench_function("decode_typed", |b| {
        b.iter(|| {
            let _res: Vec<BenchItem> = codec
                .decode_as(black_box(&bytes))
                .expect("Failed to decode");
        });
    });

    group.bench_function("decode_batch", |b| {
        b.iter(|| {
            codec
                .decode_batch(black_box(&batch))
                .expect("Failed to decode batch")
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
