use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use sizeclass::{DEFAULT_BATCH, SizeClassAlloc};

fn reuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("reuse");

    for size in [8, 64, 128] {
        let mut allocator = SizeClassAlloc::new();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let block = allocator.allocate(black_box(size)).unwrap();
                unsafe { allocator.deallocate(block, size).unwrap() };
            });
        });
    }

    group.finish();
}

fn fill(c: &mut Criterion) {
    c.bench_function("fresh allocator, one batch of each class", |b| {
        b.iter(|| {
            let mut allocator = SizeClassAlloc::new();

            for size in (8..=128).step_by(8) {
                for _ in 0..DEFAULT_BATCH {
                    black_box(allocator.allocate(size).unwrap());
                }
            }
        });
    });
}

criterion_group!(benches, reuse, fill);
criterion_main!(benches);
