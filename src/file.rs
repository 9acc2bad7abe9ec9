use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::dataset::{DataLoader, Series, TimeSeriesSet};
use crate::error::{BenchError, Result};
use crate::time_it;

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
    }
    File::create(path).map_err(|e| BenchError::io(path, e))
}

pub fn dump_as_json<T>(path: impl AsRef<Path>, data: &T) -> Result<()>
where
    T: serde::ser::Serialize,
{
    let path = path.as_ref();
    time_it!(
        "dumping json",
        let file = create(path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), data)?;
    );
    Ok(())
}

pub fn load_vectors_from_json(path: impl AsRef<Path>) -> Result<Vec<Series>> {
    let path = path.as_ref();
    time_it!(
        "reading vectors from json",
        let file = File::open(path).map_err(|e| BenchError::io(path, e))?;
        let vectors = serde_json::from_reader(std::io::BufReader::new(file))?;
    );
    Ok(vectors)
}

/// Reads a set of series from a `.json` list of vectors or from a delimited
/// file in the archive layout, skipping the first `skip` rows and keeping at
/// most `limit` series.
pub fn load_series(path: impl AsRef<Path>, skip: usize, limit: Option<usize>) -> Result<TimeSeriesSet> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let loader = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let vectors = load_vectors_from_json(path)?
                .into_iter()
                .skip(skip)
                .take(limit.unwrap_or(usize::MAX))
                .collect();
            return Ok(TimeSeriesSet::new(name, vectors));
        }
        Some("tsv") => DataLoader::ucr(path),
        _ => DataLoader::new(path),
    };
    let loader = loader.start_row(skip);
    match limit {
        Some(n) => loader.n_data(n).load(name),
        None => loader.load(name),
    }
}

/// Plain text log with one result per line. The file is truncated and given
/// a title line when created, then reopened in append mode for every line so
/// that finished datasets survive a crash later in the run.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn create(path: impl Into<PathBuf>, title: &str) -> Result<ResultLog> {
        let path = path.into();
        let mut file = create(&path)?;
        writeln!(file, "{}", title).map_err(|e| BenchError::io(&path, e))?;
        Ok(ResultLog { path })
    }

    pub fn append(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| BenchError::io(&self.path, e))?;
        writeln!(file, "{}", line).map_err(|e| BenchError::io(&self.path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Writes `name,value` rows with no header.
pub fn write_pairs<'a, V, I>(path: impl AsRef<Path>, rows: I) -> Result<()>
where
    V: ToString,
    I: IntoIterator<Item = (&'a str, V)>,
{
    let path = path.as_ref();
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(create(path)?);
    for (name, value) in rows {
        w.write_record([name.to_owned(), value.to_string()])?;
    }
    w.flush().map_err(|e| BenchError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_it_can_round_trip_vectors_through_json() {
        let dir = TempDir::new("file").unwrap();
        let path = dir.path().join("vectors.json");
        let vectors = vec![vec![1.0, 2.0], vec![3.5]];
        dump_as_json(&path, &vectors).unwrap();

        let set = load_series(&path, 0, None).unwrap();
        assert_eq!("vectors", set.name);
        assert_eq!(vectors, set.series);

        let set = load_series(&path, 1, Some(5)).unwrap();
        assert_eq!(vec![vec![3.5]], set.series);
    }

    #[test]
    fn test_it_can_load_a_slice_of_a_ucr_file() {
        let dir = TempDir::new("file").unwrap();
        let path = dir.path().join("Toy_TEST.tsv");
        std::fs::write(&path, "1\t0.5\t1.5\n2\t2.5\t3.5\n1\t4.5\t5.5\n2\t6.5\t7.5\n").unwrap();

        let set = load_series(&path, 1, Some(2)).unwrap();
        assert_eq!("Toy_TEST", set.name);
        assert_eq!(vec![vec![2.5, 3.5], vec![4.5, 5.5]], set.series);
        assert_eq!(vec!["2", "1"], set.labels);
    }

    #[test]
    fn test_it_can_append_to_a_result_log() {
        let dir = TempDir::new("file").unwrap();
        let log = ResultLog::create(dir.path().join("out").join("results.txt"), "DTAI Results ").unwrap();
        log.append("Adiac, 1.5, NA").unwrap();
        log.append("Beef, 0.25, 1024").unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!("DTAI Results \nAdiac, 1.5, NA\nBeef, 0.25, 1024\n", text);

        // creating again starts over
        let log = ResultLog::create(log.path().to_path_buf(), "again").unwrap();
        assert_eq!("again\n", std::fs::read_to_string(log.path()).unwrap());
    }

    #[test]
    fn test_it_can_write_name_value_pairs() {
        let dir = TempDir::new("file").unwrap();
        let path = dir.path().join("timings.csv");
        write_pairs(&path, vec![("Adiac", 1.5), ("Beef", 2.0)]).unwrap();
        assert_eq!("Adiac,1.5\nBeef,2\n", std::fs::read_to_string(&path).unwrap());
    }
}
