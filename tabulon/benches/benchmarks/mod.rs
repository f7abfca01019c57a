pub mod array;
pub mod frame;
pub mod index;

#[cfg(not(feature = "long_benchmarks"))]
pub(crate) const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

#[cfg(feature = "long_benchmarks")]
pub(crate) const SIZES: [usize; 4] = [1_000, 10_000, 100_000, 1_000_000];
