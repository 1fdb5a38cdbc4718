// 试除法负载基准
// Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use native_fixtures::workload::{testfunc_narrow, testfunc_wide, SilentTrace};

fn bench_narrow(c: &mut Criterion) {
    c.bench_function("testfunc narrow 2000", |b| {
        b.iter(|| {
            let result = testfunc_narrow(black_box(2_000), &mut SilentTrace);
            black_box(result)
        });
    });
}

fn bench_wide(c: &mut Criterion) {
    c.bench_function("testfunc wide 2000", |b| {
        b.iter(|| {
            let result = testfunc_wide(black_box(2_000), &mut SilentTrace);
            black_box(result)
        });
    });
}

criterion_group!(benches, bench_narrow, bench_wide);
criterion_main!(benches);
