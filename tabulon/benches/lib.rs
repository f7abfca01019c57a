use criterion::{criterion_group, criterion_main};

use crate::benchmarks::{array::bench_array, frame::bench_frame, index::bench_index};

mod benchmarks;

criterion_group!(benches, bench_array, bench_index, bench_frame);
criterion_main!(benches);
