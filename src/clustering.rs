use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::dataset::{Series, TimeSeriesSet};
use crate::error::{BenchError, Result};

/// Outcome of one clustering call.
#[derive(Debug, Clone, Serialize)]
pub struct Clustering {
    /// Cluster of every series, as an index into the centroids.
    pub assignments: Vec<usize>,
    /// Series chosen as centroids, for medoid based methods.
    pub medoids: Option<Vec<usize>>,
    /// Averaged centroid series, for barycenter based methods.
    pub barycenters: Option<Vec<Series>>,
    /// Sum of distances from each series to its centroid.
    pub cost: f64,
    pub iterations: usize,
}

impl Clustering {
    pub fn n_clusters(&self) -> usize {
        match (&self.medoids, &self.barycenters) {
            (Some(m), _) => m.len(),
            (None, Some(b)) => b.len(),
            (None, None) => self.assignments.iter().max().map_or(0, |m| m + 1),
        }
    }

    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.n_clusters()];
        for (i, &c) in self.assignments.iter().enumerate() {
            members[c].push(i);
        }
        members
    }

    fn centroid_name(&self, cluster: usize) -> String {
        match &self.medoids {
            Some(m) => series_name(m[cluster]),
            None => format!("centroid_{}", cluster),
        }
    }

    pub fn log_summary(&self, dataset: &str) {
        let names: Vec<String> = (0..self.n_clusters()).map(|c| self.centroid_name(c)).collect();
        log::info!("{}: clusters {} with cost {}", dataset, names.join(" "), self.cost);
        for (c, members) in self.members().iter().enumerate() {
            log::debug!("{} has {} members", names[c], members.len());
        }
    }

    /// Centroids on the first line, then one `series,its cluster` line per
    /// series, then the total cost.
    pub fn write_to<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "Clusters:")?;
        let names: Vec<String> = (0..self.n_clusters()).map(|c| self.centroid_name(c)).collect();
        writeln!(w, "{}", names.join(","))?;
        writeln!(w)?;
        writeln!(w, "Data,its cluster")?;
        for (i, &c) in self.assignments.iter().enumerate() {
            writeln!(w, "{},{}", series_name(i), names[c])?;
        }
        writeln!(w, "Procedure is completed with cost: {}", self.cost)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| BenchError::io(path, e))?;
        self.write_to(std::io::BufWriter::new(file))
            .map_err(|e| BenchError::io(path, e))
    }
}

/// Series are named by their row number, counting from 1.
fn series_name(i: usize) -> String {
    (i + 1).to_string()
}

/// A clustering routine under benchmark.
pub trait Clusterer {
    fn name(&self) -> &'static str;

    /// Clusters every series of `set` into `n_clusters` groups. `initial`
    /// fixes the starting centroids as row indices when given.
    fn cluster(&self, set: &TimeSeriesSet, n_clusters: usize, initial: Option<&[usize]>) -> Result<Clustering>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clustering() -> Clustering {
        Clustering {
            assignments: vec![0, 1, 0, 1, 1],
            medoids: Some(vec![2, 4]),
            barycenters: None,
            cost: 3.5,
            iterations: 2,
        }
    }

    #[test]
    fn test_it_can_group_members() {
        let c = clustering();
        assert_eq!(2, c.n_clusters());
        assert_eq!(vec![vec![0, 2], vec![1, 3, 4]], c.members());
    }

    #[test]
    fn test_it_can_write_the_clusters_file() {
        let mut out = Vec::new();
        clustering().write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!("Clusters:", lines[0]);
        assert_eq!("3,5", lines[1]);
        assert_eq!("Data,its cluster", lines[3]);
        assert_eq!("2,5", lines[5]);
        assert_eq!("Procedure is completed with cost: 3.5", lines[9]);
    }

    #[test]
    fn test_it_can_serialize_as_json() {
        let json = serde_json::to_value(clustering()).unwrap();
        assert_eq!(serde_json::json!([2, 4]), json["medoids"]);
        assert!(json["barycenters"].is_null());
    }
}
