use criterion::{black_box, AxisScale, BenchmarkId, Criterion, PlotConfiguration, Throughput};

use tabulon::{Frame, TypeCode};

use super::SIZES;

const SAMPLE_SIZE: usize = 10;

fn sample_frame(len: usize) -> Frame<u32, &'static str> {
    let mut frame = Frame::<u32, &str>::from_uniform(0..len as u32, ["c0"], TypeCode::Float64).unwrap();
    for row in 0..len as u32 {
        frame.set_f64(&row, &"c0", row as f64).unwrap();
    }
    frame
}

fn bench_numeric_column(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame/numeric_column");
    for &len in SIZES.iter() {
        let frame = sample_frame(len);
        group
            .bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
                b.iter(|| black_box(frame.numeric_column(&"c0").unwrap()))
            })
            .throughput(Throughput::Elements(len as u64))
            .plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic))
            .sample_size(SAMPLE_SIZE);
    }
    group.finish();
}

fn bench_describe(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame/describe");
    for &len in SIZES.iter() {
        let frame = sample_frame(len);
        group
            .bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
                b.iter(|| black_box(frame.describe(&"c0").unwrap()))
            })
            .throughput(Throughput::Elements(len as u64))
            .plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic))
            .sample_size(SAMPLE_SIZE);
    }
    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame/rank");
    for &len in SIZES.iter() {
        let frame = sample_frame(len);
        group
            .bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
                b.iter(|| black_box(frame.rank(&"c0").unwrap()))
            })
            .throughput(Throughput::Elements(len as u64))
            .plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic))
            .sample_size(SAMPLE_SIZE);
    }
    group.finish();
}

pub fn bench_frame(c: &mut Criterion) {
    bench_numeric_column(c);
    bench_describe(c);
    bench_rank(c);
}
