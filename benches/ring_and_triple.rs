use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use duoram::pairing::sample_triple;
use duoram::ring::{dot, vec_add, Ring};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn bench_dot(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let mut group = c.benchmark_group("ring_dot");
    for e in 3..=12 {
        let dim: usize = 1 << e;
        let a: Vec<Ring> = (0..dim).map(|_| Ring::new(rng.gen())).collect();
        let b: Vec<Ring> = (0..dim).map(|_| Ring::new(rng.gen())).collect();
        group.throughput(Throughput::Elements(dim as u64));
        group.bench_with_input(BenchmarkId::new("elements", dim), &dim, |bencher, _| {
            bencher.iter(|| dot(&a, &b));
        });
    }
    group.finish();
}

fn bench_vec_add(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let mut group = c.benchmark_group("ring_vec_add");
    for e in 3..=12 {
        let dim: usize = 1 << e;
        let a: Vec<Ring> = (0..dim).map(|_| Ring::new(rng.gen())).collect();
        let b: Vec<Ring> = (0..dim).map(|_| Ring::new(rng.gen())).collect();
        group.throughput(Throughput::Elements(dim as u64));
        group.bench_with_input(BenchmarkId::new("elements", dim), &dim, |bencher, _| {
            bencher.iter(|| vec_add(&a, &b));
        });
    }
    group.finish();
}

fn bench_triple_generation(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let mut group = c.benchmark_group("triple_generation");
    for e in 3..=10 {
        let dim: usize = 1 << e;
        group.throughput(Throughput::Elements(dim as u64));
        group.bench_with_input(BenchmarkId::new("dim", dim), &dim, |bencher, &dim| {
            bencher.iter(|| sample_triple(dim, &mut rng));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dot, bench_vec_add, bench_triple_generation);
criterion_main!(benches);
