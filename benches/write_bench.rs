// Write performance benchmarks for blockcompress

use blockcompress::{ContainerWriter, Options};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::hint::black_box;
use tempfile::TempDir;

const BLOCK_SIZE: usize = 4096;

/// Build `count` blocks where roughly `zero_ratio` of them are all-zero
fn make_blocks(count: usize, zero_ratio: f64) -> Vec<Vec<u8>> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| {
            if rng.random_bool(zero_ratio) {
                vec![0u8; BLOCK_SIZE]
            } else {
                let mut block = vec![0u8; BLOCK_SIZE];
                rng.fill(&mut block[..]);
                block
            }
        })
        .collect()
}

fn benchmark_write_in_memory(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_in_memory");

    for zero_ratio in [0.0, 0.5, 0.9, 1.0].iter() {
        let blocks = make_blocks(1024, *zero_ratio);
        group.throughput(Throughput::Bytes((blocks.len() * BLOCK_SIZE) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(zero_ratio), &blocks, |b, blocks| {
            b.iter(|| {
                let logical_size = (blocks.len() * BLOCK_SIZE) as u64;
                let mut writer =
                    ContainerWriter::create(Vec::new(), BLOCK_SIZE as u32, logical_size).unwrap();
                for block in blocks {
                    writer.write(block).unwrap();
                }
                black_box(writer.finish().unwrap());
            });
        });
    }

    group.finish();
}

fn benchmark_write_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_file");
    let blocks = make_blocks(4096, 0.7);
    group.throughput(Throughput::Bytes((blocks.len() * BLOCK_SIZE) as u64));

    group.bench_function("sparse_16mb", |b| {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bench.gbcm");
        let options = Options::default().sync_on_close(false);

        b.iter(|| {
            let logical_size = (blocks.len() * BLOCK_SIZE) as u64;
            let mut writer = ContainerWriter::create_file(&path, logical_size, &options).unwrap();
            for block in &blocks {
                writer.write(block).unwrap();
            }
            black_box(writer.close_file(false).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_write_in_memory, benchmark_write_file);
criterion_main!(benches);
