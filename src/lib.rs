//! Timing and peak memory benchmarks of DTW clustering over the UCR
//! time-series archive.

pub mod archive;
pub mod benchmark;
pub mod centroids;
pub mod clustering;
pub mod dataset;
pub mod distance;
pub mod dtw;
pub mod error;
pub mod file;
pub mod kmeans;
pub mod kmedoids;
pub mod memory;
pub mod scores;
pub mod settings;
pub mod summary;
pub mod timer;

pub use error::{BenchError, Result};
