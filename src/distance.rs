use std::io::Write;
use std::path::Path;

use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::dataset::Series;
use crate::dtw::Dtw;
use crate::error::{BenchError, Result};

/// Symmetric matrix of pairwise DTW distances, zero on the diagonal.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    data: Array2<f64>,
}

impl DistanceMatrix {
    /// Computes the upper triangle row by row in parallel, writing straight
    /// into the matrix, then mirrors it. No per-pair buffers are kept.
    pub fn fill(series: &[Series], dtw: &Dtw) -> DistanceMatrix {
        let n = series.len();
        let mut data = Array2::zeros((n, n));

        data.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, mut row)| {
                for j in i + 1..n {
                    row[j] = dtw.distance(&series[i], &series[j]);
                }
            });

        for i in 0..n {
            for j in i + 1..n {
                data[[j, i]] = data[[i, j]];
            }
        }
        DistanceMatrix { data }
    }

    pub fn from_array(data: Array2<f64>) -> DistanceMatrix {
        assert!(data.is_square(), "distance matrix must be square");
        DistanceMatrix { data }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[[i, j]]
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        for row in self.data.rows() {
            w.write_record(row.iter().map(|d| d.to_string()))?;
        }
        w.flush().map_err(|e| BenchError::io("<distance matrix>", e))?;
        Ok(())
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| BenchError::io(path, e))?;
        self.write_to(file)
    }
}

impl ::kmedoids::ArrayAdapter<f64> for DistanceMatrix {
    fn len(&self) -> usize {
        self.data.nrows()
    }

    fn is_square(&self) -> bool {
        self.data.is_square()
    }

    fn get(&self, x: usize, y: usize) -> f64 {
        self.data[[x, y]]
    }
}
