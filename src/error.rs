use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BenchError>;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("could not open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{path}, row {row}: cannot parse {value:?} as a number")]
    Parse {
        path: PathBuf,
        row: usize,
        value: String,
    },
    #[error("dataset {0} is not listed in the summary table")]
    UnknownDataset(String),
    #[error("no initial centroids for dataset {0}")]
    MissingCentroids(String),
    #[error("dataset {name}: {reason}")]
    InvalidCentroids { name: String, reason: String },
    #[error("cannot make {k} clusters out of {n} series")]
    TooManyClusters { k: usize, n: usize },
    #[error("number of clusters cannot be 0")]
    NoClusters,
    #[error("dataset {0} contains missing values")]
    MissingValues(String),
    #[error("dataset {0} has no series")]
    EmptyDataset(String),
}

impl BenchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> BenchError {
        BenchError::Io {
            path: path.into(),
            source,
        }
    }
}
