use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use region_profiler::RegionProfiler;

pub fn criterion_benchmark(c: &mut Criterion) {
    let profiler = RegionProfiler::new();

    c.bench_function("enter and exit a named region", |bencher| {
        bencher.iter(|| drop(profiler.region(black_box("bench"))));
    });

    c.bench_function("enter and exit a nested region", |bencher| {
        let _outer = profiler.region("outer");
        bencher.iter(|| drop(profiler.region(black_box("inner"))));
    });

    c.bench_function("enter and exit a call site region", |bencher| {
        bencher.iter(|| drop(profiler.auto_region()));
    });

    c.bench_function("iterate 1000 wrapped elements", |bencher| {
        let data: Vec<u64> = (0..1000).collect();
        bencher.iter(|| {
            profiler
                .iter_wrap(black_box(&data), Some("pull"), false)
                .sum::<u64>()
        });
    });

    c.bench_function("iterate 1000 plain elements", |bencher| {
        let data: Vec<u64> = (0..1000).collect();
        bencher.iter(|| black_box(&data).iter().sum::<u64>());
    });
}

criterion_group!(region_benches, criterion_benchmark);
criterion_main!(region_benches);
