use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use crate::archive::Archive;
use crate::error::{BenchError, Result};
use crate::summary::DataSummary;

/// Initial centroid indices per dataset, in the order they were added.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InitialCentroids {
    columns: Vec<(String, Vec<usize>)>,
    index: HashMap<String, usize>,
}

/// Draws `k` distinct row indices out of `0..n_rows`, uniformly.
pub fn sample_indices(rng: &mut Xoshiro256Plus, n_rows: usize, k: usize) -> Result<Vec<usize>> {
    if k == 0 {
        return Err(BenchError::NoClusters);
    }
    if k > n_rows {
        return Err(BenchError::TooManyClusters { k, n: n_rows });
    }
    Ok(rand::seq::index::sample(rng, n_rows, k).into_vec())
}

/// Checks a centroid set against the dataset it will seed.
pub fn validate(name: &str, indices: &[usize], n_rows: usize, k: usize) -> Result<()> {
    let invalid = |reason: String| BenchError::InvalidCentroids {
        name: name.to_owned(),
        reason,
    };
    if indices.len() != k {
        return Err(invalid(format!("expected {} centroids, found {}", k, indices.len())));
    }
    if let Some(i) = indices.iter().find(|&&i| i >= n_rows) {
        return Err(invalid(format!("index {} is out of range for {} series", i, n_rows)));
    }
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return Err(invalid("indices are not distinct".to_owned()));
    }
    Ok(())
}

impl InitialCentroids {
    /// One draw per dataset of the summary, in summary order, from a single
    /// generator seeded with `seed`. `n_rows` reports the size of a dataset.
    pub fn generate_with<F>(summary: &DataSummary, seed: u64, mut n_rows: F) -> Result<InitialCentroids>
    where
        F: FnMut(&str) -> Result<usize>,
    {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        let mut centroids = InitialCentroids::default();

        for entry in summary.iter() {
            let rows = n_rows(&entry.name)?;
            let indices = sample_indices(&mut rng, rows, entry.n_clusters)?;
            log::debug!("{}: {} centroids out of {} series", entry.name, indices.len(), rows);
            centroids.insert(entry.name.clone(), indices);
        }
        Ok(centroids)
    }

    pub fn generate(summary: &DataSummary, archive: &Archive, seed: u64) -> Result<InitialCentroids> {
        InitialCentroids::generate_with(summary, seed, |name| Ok(archive.load(name)?.len()))
    }

    pub fn insert(&mut self, name: impl Into<String>, indices: Vec<usize>) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.columns[i].1 = indices,
            None => {
                self.index.insert(name.clone(), self.columns.len());
                self.columns.push((name, indices));
            }
        }
    }

    pub fn get(&self, name: &str) -> Result<&[usize]> {
        self.index
            .get(name)
            .map(|&i| self.columns[i].1.as_slice())
            .ok_or_else(|| BenchError::MissingCentroids(name.to_owned()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Writes one column per dataset. The first column is the row number
    /// with an empty header; short columns are padded with empty cells.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut w = csv::Writer::from_writer(writer);

        let header = std::iter::once("").chain(self.names());
        w.write_record(header)?;

        let rows = self.columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
        for row in 0..rows {
            let mut record = vec![row.to_string()];
            record.extend(
                self.columns
                    .iter()
                    .map(|(_, c)| c.get(row).map(|i| i.to_string()).unwrap_or_default()),
            );
            w.write_record(&record)?;
        }
        w.flush().map_err(|e| BenchError::io("<centroids>", e))?;
        Ok(())
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
        }
        let file = std::fs::File::create(path).map_err(|e| BenchError::io(path, e))?;
        self.write_to(file)?;
        log::info!("wrote initial centroids for {} datasets to {}", self.len(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<InitialCentroids> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| BenchError::io(path, e))?;
        InitialCentroids::from_reader(file, path)
    }

    /// Reads the table written by `write_to`. Cells may be integers, floats
    /// with a zero fraction (`3.0`), or empty / `nan` padding.
    pub fn from_reader<R: Read>(reader: R, path: impl Into<PathBuf>) -> Result<InitialCentroids> {
        let path = path.into();
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = reader.headers()?.clone();
        let mut columns: Vec<Vec<usize>> = vec![Vec::new(); headers.len().saturating_sub(1)];

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            for (col, cell) in record.iter().enumerate().skip(1) {
                if let Some(index) = parse_index(cell).ok_or_else(|| BenchError::Parse {
                    path: path.clone(),
                    row,
                    value: cell.to_owned(),
                })? {
                    if let Some(column) = columns.get_mut(col - 1) {
                        column.push(index);
                    }
                }
            }
        }

        let mut centroids = InitialCentroids::default();
        for (name, column) in headers.iter().skip(1).zip(columns) {
            centroids.insert(name.trim(), column);
        }
        Ok(centroids)
    }
}

/// `Some(None)` for padding, `None` when the cell is not an index.
fn parse_index(cell: &str) -> Option<Option<usize>> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Some(None);
    }
    if let Ok(i) = cell.parse::<usize>() {
        return Some(Some(i));
    }
    match cell.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 => Some(Some(v as usize)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::toy_archive;

    fn summary() -> DataSummary {
        let mut s = DataSummary::default();
        s.push("Adiac", 3);
        s.push("Beef", 2);
        s.push("Coffee", 5);
        s
    }

    fn rows(name: &str) -> Result<usize> {
        Ok(match name {
            "Adiac" => 10,
            "Beef" => 2,
            _ => 40,
        })
    }

    #[test]
    fn test_it_can_reproduce_a_draw_from_the_same_seed() {
        let a = InitialCentroids::generate_with(&summary(), 10, rows).unwrap();
        let b = InitialCentroids::generate_with(&summary(), 10, rows).unwrap();
        assert_eq!(a, b);

        let c = InitialCentroids::generate_with(&summary(), 11, rows).unwrap();
        assert_ne!(a.get("Coffee").unwrap(), c.get("Coffee").unwrap());
    }

    #[test]
    fn test_it_can_draw_distinct_indices_in_range() {
        let s = summary();
        let centroids = InitialCentroids::generate_with(&s, 10, rows).unwrap();
        for entry in s.iter() {
            let indices = centroids.get(&entry.name).unwrap();
            validate(&entry.name, indices, rows(&entry.name).unwrap(), entry.n_clusters).unwrap();
        }
        // k equal to the number of rows takes every row
        let mut beef = centroids.get("Beef").unwrap().to_vec();
        beef.sort();
        assert_eq!(vec![0, 1], beef);
    }

    #[test]
    fn test_it_can_keep_summary_order_in_columns() {
        let centroids = InitialCentroids::generate_with(&summary(), 10, rows).unwrap();
        let mut out = Vec::new();
        centroids.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(",Adiac,Beef,Coffee", text.lines().next().unwrap());
        // five rows for the longest column, Beef padded after two
        assert_eq!(6, text.lines().count());
        assert!(text.lines().nth(3).unwrap().contains(",,"));
    }

    #[test]
    fn test_it_can_read_back_what_it_wrote() {
        let centroids = InitialCentroids::generate_with(&summary(), 10, rows).unwrap();
        let mut out = Vec::new();
        centroids.write_to(&mut out).unwrap();

        let back = InitialCentroids::from_reader(out.as_slice(), "mem").unwrap();
        assert_eq!(centroids, back);
    }

    #[test]
    fn test_it_can_read_float_padded_columns() {
        let table = ",Adiac,Beef\n0,3,1.0\n1,7,nan\n2,0,\n";
        let centroids = InitialCentroids::from_reader(table.as_bytes(), "mem").unwrap();
        assert_eq!(&[3, 7, 0], centroids.get("Adiac").unwrap());
        assert_eq!(&[1], centroids.get("Beef").unwrap());
        assert!(matches!(centroids.get("Coffee"), Err(BenchError::MissingCentroids(_))));
    }

    #[test]
    fn test_it_can_reject_bad_cells() {
        let table = ",Adiac\n0,1.5\n";
        assert!(matches!(
            InitialCentroids::from_reader(table.as_bytes(), "mem"),
            Err(BenchError::Parse { .. })
        ));
    }

    #[test]
    fn test_it_can_reject_too_many_clusters() {
        let mut s = DataSummary::default();
        s.push("Tiny", 4);
        let err = InitialCentroids::generate_with(&s, 10, |_| Ok(3)).unwrap_err();
        assert!(matches!(err, BenchError::TooManyClusters { k: 4, n: 3 }));
    }

    #[test]
    fn test_it_can_validate_centroid_sets() {
        assert!(validate("x", &[0, 1], 5, 2).is_ok());
        assert!(validate("x", &[0, 1], 5, 3).is_err());
        assert!(validate("x", &[0, 5], 5, 2).is_err());
        assert!(validate("x", &[2, 2], 5, 2).is_err());
    }

    #[test]
    fn test_it_can_generate_from_an_archive() {
        let dir = toy_archive(&[("Adiac", 6), ("Beef", 4)]);
        let archive = Archive::new(dir.path());
        let mut s = DataSummary::default();
        s.push("Adiac", 2);
        s.push("Beef", 3);

        let centroids = InitialCentroids::generate(&s, &archive, 10).unwrap();
        validate("Beef", centroids.get("Beef").unwrap(), 4, 3).unwrap();

        let path = dir.path().join("centroids").join("init_centroids.csv");
        centroids.write(&path).unwrap();
        assert_eq!(centroids, InitialCentroids::load(&path).unwrap());
    }
}
