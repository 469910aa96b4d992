//! Segment rotation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spanio_bench::{discarding_factory, patterned_data};
use spanio_stream::{FileSegmentFactory, SegmentNaming, SpanConfig, SpanWriter, WriteStream};
use tempfile::TempDir;

/// Benchmark writes that never leave the first segment.
fn bench_span_no_rotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("span_no_rotation");

    for size in [64, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut writer = SpanWriter::new(
                SegmentNaming::default().generator(),
                u64::MAX,
                discarding_factory(),
            );
            let data = patterned_data(size);

            b.iter(|| writer.write(black_box(&data)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark writes that rotate every `per_segment` payloads.
fn bench_span_rotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("span_rotation");
    let size = 256;

    for per_segment in [1u64, 4, 16].iter() {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(per_segment),
            per_segment,
            |b, &per_segment| {
                let mut writer = SpanWriter::new(
                    SegmentNaming::default().generator(),
                    per_segment * size as u64,
                    discarding_factory(),
                );
                let data = patterned_data(size);

                b.iter(|| writer.write(black_box(&data)).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark splitting into segment files on disk.
fn bench_span_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("span_files");

    // Use larger sample size for file operations
    group.sample_size(20);

    let total = 64 * 1024;
    group.throughput(Throughput::Bytes(total as u64));
    for segment_size in [4096u64, 16384].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(segment_size),
            segment_size,
            |b, &segment_size| {
                let data = patterned_data(1024);
                b.iter(|| {
                    let temp_dir = TempDir::new().unwrap();
                    let config = SpanConfig::new()
                        .max_segment_bytes(segment_size)
                        .sync_on_close(false);
                    let factory = FileSegmentFactory::from_config(temp_dir.path(), &config);
                    let mut writer = SpanWriter::with_config(&config, factory.into_factory());
                    for _ in 0..total / data.len() {
                        writer.write(black_box(&data)).unwrap();
                    }
                    writer.close().unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_span_no_rotation,
    bench_span_rotation,
    bench_span_files
);
criterion_main!(benches);
