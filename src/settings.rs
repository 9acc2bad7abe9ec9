//! Default locations and algorithm constants.
//!
//! Paths are relative to the working directory, the same layout the
//! benchmark scripts have always been run from.

pub const SUMMARY_PATH: &str = "../data/benchmark/UCR_DataSummary.csv";
pub const ARCHIVE_PATH: &str = "../data/benchmark/UCRArchive_2018/";
pub const CENTROIDS_PATH: &str = "../data/benchmark/UCR_centroids/init_centroids.csv";
pub const RESULTS_FOLDER: &str = "../results/benchmark";

pub const TEST_SUFFIX: &str = "_TEST.tsv";

/// Seed for the initial centroid draw.
pub const CENTROID_SEED: u64 = 10;
/// Seed for random restarts and k-means++.
pub const CLUSTER_SEED: u64 = 5;

/// Sakoe-Chiba band, 0 for unconstrained.
pub const BAND: usize = 0;

pub const DEFAULT_MAX_ITER: usize = 100;
pub const DEFAULT_REPETITIONS: usize = 2;
/// Datasets with more series than this are skipped by the PAM benchmark.
pub const DEFAULT_MAX_SIZE: usize = 1000;

pub const KMEANS_MAX_ITER: usize = 50;
pub const KMEANS_MAX_ITER_BARYCENTER: usize = 100;
pub const KMEANS_TOL: f64 = 1e-6;
