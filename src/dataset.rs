use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{BenchError, Result};

pub type Series = Vec<f64>;

/// One dataset of the archive: a table of series, one per row.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesSet {
    pub name: String,
    pub series: Vec<Series>,
    /// Class label of each row, or the row number when the file has none.
    pub labels: Vec<String>,
}

impl TimeSeriesSet {
    pub fn new(name: impl Into<String>, series: Vec<Series>) -> TimeSeriesSet {
        let labels = (1..=series.len()).map(|i| i.to_string()).collect();
        TimeSeriesSet {
            name: name.into(),
            series,
            labels,
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn has_missing(&self) -> bool {
        self.series.iter().flatten().any(|v| v.is_nan())
    }

    /// Variable length datasets are padded with NaN up to the longest
    /// series. Drops that padding, and errors if a gap is left inside a
    /// series.
    pub fn strip_padding(&mut self) -> Result<()> {
        for s in self.series.iter_mut() {
            while s.last().map_or(false, |v| v.is_nan()) {
                s.pop();
            }
            if s.iter().any(|v| v.is_nan()) {
                return Err(BenchError::MissingValues(self.name.clone()));
            }
        }
        Ok(())
    }
}

/// Loader for delimited series files. Chain the setters, then `load`.
#[derive(Debug, Clone)]
pub struct DataLoader {
    path: PathBuf,
    start_col: usize,
    start_row: usize,
    n_data: Option<usize>,
    delimiter: u8,
}

impl DataLoader {
    pub fn new(path: impl Into<PathBuf>) -> DataLoader {
        let path = path.into();
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some("tsv") => b'\t',
            _ => b',',
        };
        DataLoader {
            path,
            start_col: 0,
            start_row: 0,
            n_data: None,
            delimiter,
        }
    }

    /// Loader for an archive `*_TEST.tsv` file: tab separated, class label in
    /// the first column.
    pub fn ucr(path: impl Into<PathBuf>) -> DataLoader {
        DataLoader::new(path).start_column(1).delimiter(b'\t')
    }

    pub fn start_column(mut self, n: usize) -> DataLoader {
        self.start_col = n;
        self
    }

    pub fn start_row(mut self, n: usize) -> DataLoader {
        self.start_row = n;
        self
    }

    pub fn n_data(mut self, n: usize) -> DataLoader {
        self.n_data = Some(n);
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> DataLoader {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, name: impl Into<String>) -> Result<TimeSeriesSet> {
        let file = File::open(&self.path).map_err(|e| BenchError::io(&self.path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(file);

        let mut set = TimeSeriesSet {
            name: name.into(),
            ..Default::default()
        };

        for (row, record) in reader.records().enumerate().skip(self.start_row) {
            if self.n_data.map_or(false, |n| set.len() >= n) {
                break;
            }
            let record = record?;

            let mut series = Vec::with_capacity(record.len().saturating_sub(self.start_col));
            for field in record.iter().skip(self.start_col) {
                series.push(self.parse(field, row)?);
            }

            let label = if self.start_col > 0 {
                record.get(0).unwrap_or_default().trim().to_owned()
            } else {
                (set.len() + 1).to_string()
            };

            if series.is_empty() {
                log::warn!("{}: row {} is empty", self.path.display(), row);
            }
            set.series.push(series);
            set.labels.push(label);
        }

        log::debug!("{} time-series data are read from {}", set.len(), self.path.display());
        Ok(set)
    }

    fn parse(&self, field: &str, row: usize) -> Result<f64> {
        let field = field.trim();
        if field.is_empty() {
            return Ok(f64::NAN);
        }
        field.parse::<f64>().map_err(|_| BenchError::Parse {
            path: self.path.clone(),
            row,
            value: field.to_owned(),
        })
    }
}
