use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pose_match::data::synthetic::{random_parameters, random_points, TransformRanges};
use pose_match::{apply, estimate, similarity};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_estimate(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let params = random_parameters(&mut rng, &TransformRanges::default()).unwrap();

    let mut group = c.benchmark_group("similarity");
    // 18 matches a full body keypoint model
    for n in [2usize, 18, 1000] {
        let source = random_points(&mut rng, n, 640.0);
        let target = apply(&source, &params);

        group.bench_with_input(BenchmarkId::new("estimate", n), &n, |b, _| {
            b.iter(|| estimate(black_box(&source), black_box(&target)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("apply_and_score", n), &n, |b, _| {
            b.iter(|| {
                let moved = apply(black_box(&source), &params);
                similarity::error(&moved, &target).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_estimate);
criterion_main!(benches);
