use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{BenchError, Result};

#[derive(Debug, Deserialize)]
struct SummaryRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Class")]
    class: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub name: String,
    pub n_clusters: usize,
}

/// The archive's data summary: dataset name to number of classes, which is
/// used as the cluster count. Keeps the order of the file.
#[derive(Debug, Default)]
pub struct DataSummary {
    entries: Vec<SummaryEntry>,
    index: HashMap<String, usize>,
}

impl DataSummary {
    pub fn load(path: impl AsRef<Path>) -> Result<DataSummary> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| BenchError::io(path, e))?;
        let summary = DataSummary::from_reader(file)?;
        log::info!("read {} datasets from {}", summary.len(), path.display());
        Ok(summary)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<DataSummary> {
        // header cells carry trailing spaces ("Train ", "Test ")
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut summary = DataSummary::default();
        for row in reader.deserialize() {
            let row: SummaryRow = row?;
            if row.class == 0 {
                return Err(BenchError::NoClusters);
            }
            summary.push(row.name, row.class);
        }
        Ok(summary)
    }

    pub fn push(&mut self, name: impl Into<String>, n_clusters: usize) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.entries[i].n_clusters = n_clusters,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push(SummaryEntry { name, n_clusters });
            }
        }
    }

    pub fn n_clusters(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].n_clusters)
            .ok_or_else(|| BenchError::UnknownDataset(name.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SummaryEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
