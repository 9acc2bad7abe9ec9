use criterion::*;
use ucr_bench::dataset::TimeSeriesSet;
use ucr_bench::distance::DistanceMatrix;
use ucr_bench::dtw::*;
use ucr_bench::kmedoids::*;

fn waves(n: usize, len: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            let step = 0.1 + (i % 7) as f64 * 0.02;
            (0..len).map(|t| (t as f64 * step).sin()).collect()
        })
        .collect()
}

fn dtw_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("dtw");

    for len in [100, 250, 500].iter() {
        let s = waves(2, *len);

        group.bench_with_input(BenchmarkId::new("dtw_full", len), len, |b, &_len| {
            b.iter(|| dtw_full(&s[0], &s[1], Cost::Absolute));
        });

        group.bench_with_input(BenchmarkId::new("dtw_linear", len), len, |b, &_len| {
            b.iter(|| dtw_linear(&s[0], &s[1], Cost::Absolute));
        });

        group.bench_with_input(BenchmarkId::new("dtw_banded_10", len), len, |b, &_len| {
            b.iter(|| dtw_banded(&s[0], &s[1], 10, Cost::Absolute));
        });
    }

    group.finish();
}

fn cluster_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster");
    group.sample_size(10);

    for size in [50, 100, 200].iter() {
        let set = TimeSeriesSet::new("waves", waves(*size, 128));
        let dtw = Dtw::default();

        group.bench_with_input(BenchmarkId::new("distance_matrix", size), size, |b, &_size| {
            b.iter(|| DistanceMatrix::fill(&set.series, &dtw));
        });

        let distances = DistanceMatrix::fill(&set.series, &dtw);
        for method in [Method::Alternating, Method::FasterPam, Method::Pam] {
            let km = KMedoids::default().method(method);
            let name = format!("{:?}", method);
            group.bench_with_input(BenchmarkId::new(name, size), size, |b, &_size| {
                b.iter(|| km.fit(&distances, "waves", &[0, 1, 2, 3, 4, 5, 6]));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, dtw_bench, cluster_bench);
criterion_main!(benches);
