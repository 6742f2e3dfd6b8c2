// Read performance benchmarks for blockcompress

use blockcompress::{ContainerReader, ContainerWriter};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::hint::black_box;
use std::io::Cursor;

const BLOCK_SIZE: usize = 4096;

fn build_container(count: usize, zero_ratio: f64) -> Vec<u8> {
    let mut rng = rand::rng();
    let logical_size = (count * BLOCK_SIZE) as u64;
    let mut writer = ContainerWriter::create(Vec::new(), BLOCK_SIZE as u32, logical_size).unwrap();

    let mut block = vec![0u8; BLOCK_SIZE];
    for _ in 0..count {
        if rng.random_bool(zero_ratio) {
            block.fill(0);
        } else {
            rng.fill(&mut block[..]);
        }
        writer.write(&block).unwrap();
    }
    writer.finish().unwrap().1
}

fn benchmark_sequential_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_read");

    for zero_ratio in [0.0, 0.5, 0.9].iter() {
        let bytes = build_container(1024, *zero_ratio);
        group.throughput(Throughput::Bytes((1024 * BLOCK_SIZE) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(zero_ratio), &bytes, |b, bytes| {
            b.iter(|| {
                let mut reader = ContainerReader::open(Cursor::new(bytes.as_slice())).unwrap();
                let mut out = vec![0u8; BLOCK_SIZE];
                while let Some(kind) = reader.read(&mut out).unwrap() {
                    black_box(kind);
                }
            });
        });
    }

    group.finish();
}

fn benchmark_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("open");

    for count in [1024, 65536].iter() {
        let bytes = build_container(*count, 1.0);
        group.bench_with_input(BenchmarkId::from_parameter(count), &bytes, |b, bytes| {
            b.iter(|| {
                let reader = ContainerReader::open(Cursor::new(bytes.as_slice())).unwrap();
                black_box(reader.index().len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sequential_read, benchmark_open);
criterion_main!(benches);
