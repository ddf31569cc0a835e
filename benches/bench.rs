use cdt2d::{Cdt, CdtConfig, HPoint, IntegerGeometry};
use criterion::{criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion, PlotConfiguration, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::iter::repeat_with;

const COUNTS: &[usize] = &[100, 1000, 10_000, 100_000];
// Intersections of chords between points below 2^12 fit the coordinate limit.
const SIZE: i64 = 1 << 12;

fn new_cdt() -> Cdt<IntegerGeometry> {
    let config = CdtConfig {
        seed: Some(0),
        ..CdtConfig::default()
    };
    let mut cdt = Cdt::with_config(IntegerGeometry::new(), config);
    cdt.create_enclosing_rectangle(0, 0, SIZE, SIZE).unwrap();
    cdt
}

fn bench(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let all_points: Vec<_> = repeat_with(|| HPoint::new(rng.gen_range(1..SIZE), rng.gen_range(1..SIZE)))
        .take(*COUNTS.last().unwrap())
        .collect();

    let mut group = c.benchmark_group("insert");
    // need to override to a small sample size,
    // otherwise 100 000 elems takes 1-2 mins
    group
        .sample_size(20)
        .plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for &count in COUNTS {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &all_points[..count], |b, points| {
            b.iter(|| {
                let mut cdt = new_cdt();
                for &point in points {
                    cdt.insert(point).unwrap();
                }
                cdt
            })
        });
    }
    group.finish();

    // Random chords between the points, each one crossing many others.
    let mut group = c.benchmark_group("insert_constraint");
    group.sample_size(20);
    for &count in &COUNTS[..3] {
        let pairs: Vec<(usize, usize)> = repeat_with(|| (rng.gen_range(0..count), rng.gen_range(0..count)))
            .filter(|(i, j)| i != j)
            .take(count / 100 + 1)
            .collect();
        group.throughput(Throughput::Elements(pairs.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &pairs, |b, pairs| {
            b.iter(|| {
                let mut cdt = new_cdt();
                let vertices: Vec<usize> = all_points[..count].iter().map(|&p| cdt.insert(p).unwrap()).collect();
                for &(i, j) in pairs {
                    if vertices[i] != vertices[j] {
                        cdt.insert_constraint(vertices[i], vertices[j]).unwrap();
                    }
                }
                cdt
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench);
criterion_main!(benches);
