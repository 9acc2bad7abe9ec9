//! The benchmark loop: for every dataset of the archive, time one call into
//! a clustering routine and log the result.

use std::path::PathBuf;

use crate::archive::Archive;
use crate::centroids::InitialCentroids;
use crate::clustering::{Clusterer, Clustering};
use crate::dataset::TimeSeriesSet;
use crate::distance::DistanceMatrix;
use crate::error::Result;
use crate::file::{write_pairs, ResultLog};
use crate::kmedoids::{KMedoids, Method};
use crate::memory::MemorySampler;
use crate::scores::{silhouette, write_silhouettes};
use crate::summary::DataSummary;
use crate::timer::{MinSec, Timer};

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    pub name: String,
    pub seconds: f64,
    /// Peak heap bytes during the call, when sampled.
    pub peak_bytes: Option<u64>,
}

impl BenchmarkResult {
    /// `name, seconds, bytes`, with `NA` when memory was not sampled.
    pub fn line(&self) -> String {
        let memory = self
            .peak_bytes
            .map_or_else(|| "NA".to_owned(), |b| b.to_string());
        format!("{}, {}, {}", self.name, self.seconds, memory)
    }
}

#[derive(Debug, Clone)]
pub struct BenchmarkOptions {
    pub summary: PathBuf,
    pub archive: PathBuf,
    /// Table of initial centroids. Without it the clusterer picks its own.
    pub centroids: Option<PathBuf>,
    pub results: PathBuf,
    pub title: String,
    pub track_memory: bool,
    /// Skip datasets with missing values instead of stripping the padding.
    pub skip_missing: bool,
    /// Restrict the run to these datasets. Empty means all.
    pub only: Vec<String>,
    /// Write `<prefix>_timings.csv` and `<prefix>_memory.csv` when the run
    /// completes.
    pub dump_prefix: Option<PathBuf>,
}

/// Times a single clustering call, sampling peak memory around it when
/// asked to.
pub fn run_one<C: Clusterer>(
    clusterer: &C,
    set: &TimeSeriesSet,
    n_clusters: usize,
    initial: Option<&[usize]>,
    track_memory: bool,
) -> Result<(BenchmarkResult, Clustering)> {
    let sampler = track_memory.then(MemorySampler::start);
    let timer = Timer::start(format!("{} {}", clusterer.name(), set.name));

    let clustering = clusterer.cluster(set, n_clusters, initial)?;

    let seconds = timer.end().as_secs_f64();
    let peak_bytes = sampler.map(MemorySampler::stop);

    Ok((
        BenchmarkResult {
            name: set.name.clone(),
            seconds,
            peak_bytes,
        },
        clustering,
    ))
}

/// Runs `clusterer` over every dataset directory of the archive, in name
/// order. Each result is appended to the log as soon as it is known; any
/// error stops the run.
pub fn run<C: Clusterer>(clusterer: &C, options: &BenchmarkOptions) -> Result<Vec<BenchmarkResult>> {
    let summary = DataSummary::load(&options.summary)?;
    let archive = Archive::new(&options.archive);
    let centroids = options
        .centroids
        .as_ref()
        .map(InitialCentroids::load)
        .transpose()?;

    let log = ResultLog::create(&options.results, &options.title)?;
    let mut results = Vec::new();

    for entry in archive.datasets()? {
        let name = entry.name.as_str();
        if !options.only.is_empty() && !options.only.iter().any(|o| o == name) {
            continue;
        }

        let mut set = entry.load()?;
        let n_clusters = summary.n_clusters(name)?;

        if set.has_missing() {
            if options.skip_missing {
                log::info!("{} has missing values, skipping", name);
                continue;
            }
            set.strip_padding()?;
        }

        let initial = match &centroids {
            Some(c) => Some(c.get(name)?),
            None => None,
        };

        let (result, clustering) = run_one(clusterer, &set, n_clusters, initial, options.track_memory)?;
        clustering.log_summary(name);
        log.append(&result.line())?;
        log::info!("{}", result.line());
        results.push(result);
    }

    if let Some(prefix) = &options.dump_prefix {
        dump_results(prefix, &results)?;
    }
    Ok(results)
}

pub fn dump_results(prefix: &std::path::Path, results: &[BenchmarkResult]) -> Result<()> {
    let with_suffix = |suffix: &str| {
        let mut name = prefix.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    };
    write_pairs(
        with_suffix("_timings.csv"),
        results.iter().map(|r| (r.name.as_str(), r.seconds)),
    )?;
    write_pairs(
        with_suffix("_memory.csv"),
        results
            .iter()
            .filter_map(|r| r.peak_bytes.map(|b| (r.name.as_str(), b))),
    )
}

#[derive(Debug, Clone)]
pub struct PamOptions {
    pub summary: PathBuf,
    pub archive: PathBuf,
    pub out_folder: PathBuf,
    pub clusterer: KMedoids,
    /// Larger datasets are skipped.
    pub max_size: usize,
}

/// Cumulative seconds at each checkpoint of one PAM dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct PamTiming {
    pub name: String,
    pub distances: f64,
    pub clustering: f64,
    pub silhouettes: f64,
}

/// Every `*_TEST.tsv` below the archive root: fill the distance matrix,
/// run PAM with random restarts, and write the matrix, the clusters and the
/// silhouettes. Checkpoint times go to `timing_all.csv`.
pub fn run_pam(options: &PamOptions) -> Result<Vec<PamTiming>> {
    let summary = DataSummary::load(&options.summary)?;
    let archive = Archive::new(&options.archive);
    let out = &options.out_folder;
    std::fs::create_dir_all(out).map_err(|e| crate::error::BenchError::io(out, e))?;

    let timing_log = ResultLog::create(
        out.join("timing_all.csv"),
        "Name,fillDistanceMatrix,clustering,writeSilhouettes",
    )?;
    let clusterer = options.clusterer.clone().method(Method::Pam);

    let mut timings = Vec::new();
    for (solved, entry) in archive.test_files()?.into_iter().enumerate() {
        let stem = format!("{}_TEST", entry.name);
        log::info!("Now, number {} {} is being solved.", solved, entry.test_path.display());

        let mut set = entry.load()?;
        if set.len() > options.max_size {
            log::info!("{} has {} series, skipping", entry.name, set.len());
            continue;
        }
        set.strip_padding()?;
        let n_clusters = summary.n_clusters(&entry.name)?;
        let problem = format!("sqr_{}", stem);

        let clock = Timer::start(problem.clone());

        let distances = DistanceMatrix::fill(&set.series, &clusterer.dtw);
        let t1 = clock.seconds();
        log::info!("Finished calculating distances {}", MinSec(clock.elapsed()));
        log::info!("Band used {}", clusterer.dtw.band);

        let clustering = clusterer.fit_repeated(&distances, &entry.name, n_clusters)?;
        let t2 = clock.seconds();
        log::info!("Finished clustering {}", MinSec(clock.elapsed()));

        clustering.log_summary(&entry.name);
        distances.write(out.join(format!("{}_distances.csv", problem)))?;
        clustering.write(out.join(format!("{}_Nc_{}.csv", problem, n_clusters)))?;
        let s = silhouette(&distances, &clustering.assignments, clustering.n_clusters());
        write_silhouettes(out.join(format!("{}_silhouettes_Nc_{}.csv", problem, n_clusters)), &s)?;

        let t3 = clock.seconds();
        clock.end();

        timing_log.append(&format!("{},{},{},{}", stem, t1, t2, t3))?;
        timings.push(PamTiming {
            name: stem,
            distances: t1,
            clustering: t2,
            silhouettes: t3,
        });
    }
    Ok(timings)
}
