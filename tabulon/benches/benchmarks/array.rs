use criterion::{
    black_box, AxisScale, BenchmarkId, Criterion, PlotConfiguration, Throughput,
};

use tabulon::TypedArray;

use super::SIZES;

const SAMPLE_SIZE: usize = 10;

fn dense_array(len: usize) -> TypedArray<f64> {
    let mut array = TypedArray::<f64>::dense(len);
    for i in 0..len {
        array.set(i, i as f64).unwrap();
    }
    array
}

fn bench_dense_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("array/dense_get");
    for &len in SIZES.iter() {
        let array = dense_array(len);
        group
            .bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
                b.iter(|| {
                    for i in 0..len {
                        black_box(array.get(i).unwrap());
                    }
                })
            })
            .throughput(Throughput::Elements(len as u64))
            .plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic))
            .sample_size(SAMPLE_SIZE);
    }
    group.finish();
}

fn bench_dense_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("array/dense_sort");
    for &len in SIZES.iter() {
        group
            .bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
                b.iter_with_setup(
                    || {
                        let mut array = dense_array(len);
                        array.shuffle(42).unwrap();
                        array
                    },
                    |mut array| {
                        array.sort(true, 0..len).unwrap();
                        black_box(array);
                    },
                )
            })
            .throughput(Throughput::Elements(len as u64))
            .plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic))
            .sample_size(SAMPLE_SIZE);
    }
    group.finish();
}

fn bench_binary_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("array/binary_search");
    for &len in SIZES.iter() {
        let array = dense_array(len);
        group
            .bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
                b.iter(|| {
                    black_box(array.binary_search(&((len / 2) as f64), 0..len).unwrap());
                })
            })
            .throughput(Throughput::Elements(len as u64))
            .plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic))
            .sample_size(SAMPLE_SIZE);
    }
    group.finish();
}

pub fn bench_array(c: &mut Criterion) {
    bench_dense_get(c);
    bench_dense_sort(c);
    bench_binary_search(c);
}
