use std::path::PathBuf;

use anyhow::Context;
use clap::{arg, value_parser, ArgAction, ArgMatches, Command};

use ucr_bench::archive::Archive;
use ucr_bench::benchmark::{self, BenchmarkOptions, PamOptions};
use ucr_bench::centroids::InitialCentroids;
use ucr_bench::clustering::Clusterer;
use ucr_bench::dtw::{Cost, Dtw};
use ucr_bench::file;
use ucr_bench::kmeans::TimeSeriesKMeans;
use ucr_bench::kmedoids::{KMedoids, Method};
use ucr_bench::settings;
use ucr_bench::summary::DataSummary;
use ucr_bench::time_it;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[cfg(not(feature = "dhat-heap"))]
#[global_allocator]
static ALLOC: ucr_bench::memory::PeakAlloc = ucr_bench::memory::PeakAlloc::new();

fn archive_args(cmd: Command) -> Command {
    cmd.arg(arg!(--summary <CSV> "UCR data summary table").default_value(settings::SUMMARY_PATH))
        .arg(arg!(--archive <DIR> "UCR archive root").default_value(settings::ARCHIVE_PATH))
}

fn run_args(cmd: Command, results: &'static str) -> Command {
    archive_args(cmd)
        .arg(arg!(--results <FILE> "text file the results are appended to").default_value(results))
        .arg(arg!(--"no-memory" "do not sample peak memory"))
        .arg(arg!(--"skip-missing" "skip datasets containing missing values"))
        .arg(arg!(--only <NAME> "only run this dataset, may be repeated").action(ArgAction::Append))
        .arg(arg!(--"dump-csv" <PREFIX> "write PREFIX_timings.csv and PREFIX_memory.csv at the end"))
}

fn band_arg() -> clap::Arg {
    arg!(--band <N> "Sakoe-Chiba band, 0 for none").value_parser(value_parser!(usize))
}

fn cli() -> Command {
    Command::new("ucr_bench")
        .about("Time and memory benchmarks of DTW clustering on the UCR archive")
        .subcommand_required(true)
        .subcommand(
            archive_args(Command::new("centroids"))
                .about("Draw random initial centroids for every dataset of the summary")
                .arg(arg!(--output <CSV> "where to write the table").default_value(settings::CENTROIDS_PATH))
                .arg(
                    arg!(--seed <SEED> "random seed").value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            run_args(Command::new("kmedoids"), "results_dtai.txt")
                .about("k-medoids with a DTW distance matrix, seeded from the centroid table")
                .arg(arg!(--centroids <CSV> "initial centroid table").default_value(settings::CENTROIDS_PATH))
                .arg(
                    arg!(--method <METHOD> "medoid search")
                        .value_parser(["alternating", "fasterpam", "pam"])
                        .default_value("alternating"),
                )
                .arg(band_arg()),
        )
        .subcommand(
            run_args(Command::new("kmeans"), "results_ts.txt")
                .about("k-means with DTW barycenters")
                .arg(
                    arg!(--seed <SEED> "random seed for k-means++").value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            archive_args(Command::new("pam"))
                .about("Distance matrix, PAM and silhouettes for every *_TEST.tsv, with checkpoint timings")
                .arg(arg!(--out <DIR> "output folder").default_value(settings::RESULTS_FOLDER))
                .arg(
                    arg!(--"max-size" <N> "skip datasets with more series than this")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    arg!(--repetitions <N> "random restarts").value_parser(value_parser!(usize)),
                )
                .arg(band_arg()),
        )
        .subcommand(
            Command::new("cluster")
                .about("Cluster one file of series (.tsv, .csv or .json), dump the clustering as json")
                .arg(arg!(<SERIES_FILE> "input file"))
                .arg(arg!(<CLUSTER_FILE> "output file"))
                .arg(
                    arg!(-k --clusters <N> "number of clusters")
                        .value_parser(value_parser!(usize))
                        .required(true),
                )
                .arg(
                    arg!(--"skip-rows" <N> "rows to skip at the top of the file")
                        .value_parser(value_parser!(usize))
                        .default_value("0"),
                )
                .arg(arg!(--"max-series" <N> "read at most this many series").value_parser(value_parser!(usize)))
                .arg(
                    arg!(--method <METHOD> "clustering routine")
                        .value_parser(["kmedoids", "kmeans"])
                        .default_value("kmedoids"),
                ),
        )
}

macro_rules! get_arg {
    ($matches:expr, $id:literal) => {
        $matches
            .get_one::<String>($id)
            .map(|s| s.as_str())
            .expect("Expected arg...")
    };
    ($matches:expr, $id:literal, $t:ty) => {
        *$matches.get_one::<$t>($id).expect("Expected arg...")
    };
    ($matches:expr, $id:literal, $t:ty, $default:expr) => {
        $matches.get_one::<$t>($id).copied().unwrap_or($default)
    };
}

fn bench_options(m: &ArgMatches, title: &str) -> BenchmarkOptions {
    BenchmarkOptions {
        summary: PathBuf::from(get_arg!(m, "summary")),
        archive: PathBuf::from(get_arg!(m, "archive")),
        centroids: None,
        results: PathBuf::from(get_arg!(m, "results")),
        title: title.to_owned(),
        track_memory: !m.get_flag("no-memory"),
        skip_missing: m.get_flag("skip-missing"),
        only: m
            .get_many::<String>("only")
            .map(|v| v.cloned().collect())
            .unwrap_or_default(),
        dump_prefix: m.get_one::<String>("dump-csv").map(PathBuf::from),
    }
}

fn method(name: &str) -> Method {
    match name {
        "fasterpam" => Method::FasterPam,
        "pam" => Method::Pam,
        _ => Method::Alternating,
    }
}

fn main() -> anyhow::Result<()> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("centroids", m)) => {
            let summary = DataSummary::load(get_arg!(m, "summary"))?;
            let archive = Archive::new(get_arg!(m, "archive"));
            let seed = get_arg!(m, "seed", u64, settings::CENTROID_SEED);
            time_it!(
                "generating initial centroids",
                let centroids = InitialCentroids::generate(&summary, &archive, seed)?;
            );
            centroids.write(get_arg!(m, "output"))?;
        }

        Some(("kmedoids", m)) => {
            let mut options = bench_options(m, "DTAI Results ");
            options.centroids = Some(PathBuf::from(get_arg!(m, "centroids")));
            let clusterer = KMedoids {
                dtw: Dtw::new(get_arg!(m, "band", usize, settings::BAND), Cost::SquaredEuclidean),
                ..KMedoids::default()
            }
            .method(method(get_arg!(m, "method")));
            benchmark::run(&clusterer, &options).context("k-medoids benchmark failed")?;
        }

        Some(("kmeans", m)) => {
            let options = bench_options(m, "TSlearn Results ");
            let clusterer = TimeSeriesKMeans {
                seed: get_arg!(m, "seed", u64, settings::CLUSTER_SEED),
                ..TimeSeriesKMeans::default()
            };
            benchmark::run(&clusterer, &options).context("k-means benchmark failed")?;
        }

        Some(("pam", m)) => {
            let options = PamOptions {
                summary: PathBuf::from(get_arg!(m, "summary")),
                archive: PathBuf::from(get_arg!(m, "archive")),
                out_folder: PathBuf::from(get_arg!(m, "out")),
                clusterer: KMedoids {
                    dtw: Dtw::new(get_arg!(m, "band", usize, settings::BAND), Cost::Absolute),
                    ..KMedoids::default()
                }
                .repetitions(get_arg!(m, "repetitions", usize, settings::DEFAULT_REPETITIONS)),
                max_size: get_arg!(m, "max-size", usize, settings::DEFAULT_MAX_SIZE),
            };
            time_it!(
                "benchmarking",
                benchmark::run_pam(&options).context("PAM benchmark failed")?;
            );
        }

        Some(("cluster", m)) => {
            let input = get_arg!(m, "SERIES_FILE");
            let output = get_arg!(m, "CLUSTER_FILE");
            let k = get_arg!(m, "clusters", usize);

            let skip = get_arg!(m, "skip-rows", usize);
            let limit = m.get_one::<usize>("max-series").copied();

            let mut set = file::load_series(input, skip, limit)?;
            set.strip_padding()?;

            let clusterer: Box<dyn Clusterer> = match get_arg!(m, "method") {
                "kmeans" => Box::new(TimeSeriesKMeans::default()),
                _ => Box::new(KMedoids::default()),
            };
            time_it!(
                "main_cluster",
                let clustering = clusterer.cluster(&set, k, None)?;
            );
            clustering.log_summary(&set.name);
            file::dump_as_json(output, &clustering)?;
        }

        _ => unreachable!(),
    }

    Ok(())
}
