use criterion::{black_box, AxisScale, BenchmarkId, Criterion, PlotConfiguration, Throughput};

use tabulon::Index;

use super::SIZES;

const SAMPLE_SIZE: usize = 10;

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("index/add");
    for &len in SIZES.iter() {
        group
            .bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
                b.iter(|| {
                    let mut index = Index::<u32>::new();
                    for key in 0..len as u32 {
                        index.add(key).unwrap();
                    }
                    black_box(index);
                })
            })
            .throughput(Throughput::Elements(len as u64))
            .plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic))
            .sample_size(SAMPLE_SIZE);
    }
    group.finish();
}

fn bench_get_ordinal_for_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("index/get_ordinal_for_key");
    for &len in SIZES.iter() {
        let index = Index::<u32>::from_keys(0..len as u32).unwrap();
        group
            .bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
                b.iter(|| {
                    for key in 0..len as u32 {
                        black_box(index.get_ordinal_for_key(&key).unwrap());
                    }
                })
            })
            .throughput(Throughput::Elements(len as u64))
            .plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic))
            .sample_size(SAMPLE_SIZE);
    }
    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("index/sort");
    for &len in SIZES.iter() {
        group
            .bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
                b.iter_with_setup(
                    || Index::<u32>::from_keys((0..len as u32).rev()).unwrap(),
                    |mut index| {
                        index.sort(true).unwrap();
                        black_box(index);
                    },
                )
            })
            .throughput(Throughput::Elements(len as u64))
            .plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic))
            .sample_size(SAMPLE_SIZE);
    }
    group.finish();
}

pub fn bench_index(c: &mut Criterion) {
    bench_add(c);
    bench_get_ordinal_for_key(c);
    bench_sort(c);
}
