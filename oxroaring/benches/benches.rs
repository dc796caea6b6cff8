use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use oxroaring::{Bitmap, Portable, Treemap};

fn new(c: &mut Criterion) {
    c.bench_function("new", |b| b.iter(Bitmap::new));

    c.bench_function("with_container_capacity", |b| {
        b.iter(|| Bitmap::with_container_capacity(16))
    });
}

fn add(c: &mut Criterion) {
    c.bench_function("add", |b| {
        let mut bitmap = Bitmap::new();

        b.iter(|| bitmap.add(10000));
    });
}

fn add_many(c: &mut Criterion) {
    c.bench_function("add_many", |b| {
        let mut bitmap = Bitmap::new();
        let int_slice = &[10, 100, 10_000, 1_000_000, 10_000_000];

        b.iter(|| bitmap.add_many(black_box(int_slice)));
    });
}

fn remove(c: &mut Criterion) {
    c.bench_function("remove", |b| {
        let mut bitmap = Bitmap::new();

        b.iter(|| bitmap.remove(10000));
    });
}

fn contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains");
    group.bench_function("true", |b| {
        let mut bitmap = Bitmap::new();

        bitmap.add(5);

        b.iter(|| bitmap.contains(5));
    });

    group.bench_function("false", |b| {
        let bitmap = Bitmap::new();

        b.iter(|| bitmap.contains(5));
    });
}

fn cardinality(c: &mut Criterion) {
    let mut group = c.benchmark_group("cardinality");

    for &size in &[100_000u32, 1_000_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let bitmap: Bitmap = (0..size).collect();

            b.iter(|| bitmap.cardinality());
        });
    }
}

fn binops(c: &mut Criterion) {
    let bitmap1 = Bitmap::of(&[500, 1000]);
    let bitmap2 = Bitmap::of(&[1000, 2000]);

    macro_rules! bench_op {
        ($new:ident, $inplace:ident) => {{
            let mut group = c.benchmark_group(stringify!($new));

            group.bench_function("new", |b| {
                b.iter(|| bitmap1.$new(&bitmap2));
            });
            group.bench_function("inplace", |b| {
                b.iter_batched(
                    || bitmap1.clone(),
                    |mut lhs| {
                        lhs.$inplace(&bitmap2);
                        lhs
                    },
                    criterion::BatchSize::SmallInput,
                );
            });

            group.finish();
        }};
    }

    bench_op!(and, and_inplace);
    bench_op!(or, or_inplace);
    bench_op!(xor, xor_inplace);
    bench_op!(andnot, andnot_inplace);
}

fn fast_or(c: &mut Criterion) {
    let mut group = c.benchmark_group("fast_or");
    let inputs: Vec<Bitmap> = (0..100u32)
        .map(|i| (i * 1000..i * 1000 + 50_000).collect())
        .collect();
    let refs: Vec<&Bitmap> = inputs.iter().collect();

    group.bench_function("lazy", |b| {
        b.iter(|| Bitmap::fast_or(black_box(&refs)));
    });
    group.bench_function("heap", |b| {
        b.iter(|| Bitmap::fast_or_heap(black_box(&refs)));
    });
    group.finish();
}

fn iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    for &size in &[100_000u32, 1_000_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let bitmap: Bitmap = (0..size).collect();

            b.iter(|| bitmap.iter().sum::<u32>());
        });
    }
}

fn serialization(c: &mut Criterion) {
    let bitmap: Bitmap = (0..1_000_000u32).step_by(3).collect();
    let serialized = bitmap.serialize::<Portable>();

    let mut group = c.benchmark_group("serialization");
    group.bench_function("serialize", |b| {
        b.iter(|| bitmap.serialize::<Portable>());
    });
    group.bench_function("deserialize", |b| {
        b.iter(|| Bitmap::deserialize::<Portable>(black_box(&serialized)));
    });
    group.finish();
}

fn treemap_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("treemap");

    group.bench_function("add_spread", |b| {
        let mut treemap = Treemap::new();
        let mut i = 0u64;
        b.iter(|| {
            i = i.wrapping_add(0x9E37_79B9_7F4A_7C15);
            treemap.add(i);
        });
    });

    let treemap1: Treemap = (0..1_000_000u64).map(|i| i << 20).collect();
    let treemap2: Treemap = (500_000..1_500_000u64).map(|i| i << 20).collect();
    group.bench_function("or", |b| {
        b.iter(|| treemap1.or(&treemap2));
    });
    group.bench_function("rank", |b| {
        b.iter(|| treemap1.rank(black_box(1 << 39)));
    });
    group.finish();
}

criterion_group!(
    benches,
    new,
    add,
    add_many,
    remove,
    contains,
    cardinality,
    binops,
    fast_or,
    iterate,
    serialization,
    treemap_ops,
);
criterion_main!(benches);
