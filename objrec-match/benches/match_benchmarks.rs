use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use objrec_core::{Descriptor, MatchMetric};
use objrec_match::{BruteForceMatcher, MatchFilter};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_descriptors(count: usize, seed: u64) -> Vec<Descriptor> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen()).collect()
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("brute_force_matching");
    for &count in &[100usize, 500, 1000] {
        let query = random_descriptors(count, 1);
        let train = random_descriptors(count, 2);
        for metric in [MatchMetric::Hamming, MatchMetric::Hamming2] {
            let matcher = BruteForceMatcher::new(metric);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", metric), count),
                &(&query, &train),
                |b, (query, train)| b.iter(|| matcher.match_descriptors(black_box(query), black_box(train))),
            );
        }
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let query = random_descriptors(500, 3);
    let train = random_descriptors(500, 4);
    let matches = BruteForceMatcher::default().match_descriptors(&query, &train);
    let filter = MatchFilter::default();
    c.bench_function("ratio_filter_500", |b| b.iter(|| filter.filter(black_box(&matches))));
}

criterion_group!(benches, bench_matching, bench_filter);
criterion_main!(benches);
