use std::io::Write;
use std::path::Path;

use rayon::prelude::*;

use crate::distance::DistanceMatrix;
use crate::error::{BenchError, Result};

/// Silhouette of every series: `(b - a) / max(a, b)` where `a` is the mean
/// distance to the rest of its own cluster and `b` the smallest mean
/// distance to another cluster. Members of singleton clusters score 0.
pub fn silhouette(distances: &DistanceMatrix, assignments: &[usize], n_clusters: usize) -> Vec<f64> {
    let mut sizes = vec![0usize; n_clusters];
    for &c in assignments {
        sizes[c] += 1;
    }

    (0..assignments.len())
        .into_par_iter()
        .map(|i| {
            let own = assignments[i];
            if sizes[own] <= 1 {
                return 0.0;
            }

            let mut sums = vec![0.0; n_clusters];
            for (j, &c) in assignments.iter().enumerate() {
                sums[c] += distances.get(i, j);
            }

            let a = sums[own] / (sizes[own] - 1) as f64;
            let b = (0..n_clusters)
                .filter(|&c| c != own && sizes[c] > 0)
                .map(|c| sums[c] / sizes[c] as f64)
                .fold(f64::INFINITY, f64::min);

            if !b.is_finite() {
                return 0.0;
            }
            let denom = a.max(b);
            if denom == 0.0 {
                0.0
            } else {
                (b - a) / denom
            }
        })
        .collect()
}

pub fn write_silhouettes(path: impl AsRef<Path>, silhouettes: &[f64]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(|e| BenchError::io(path, e))?;
    let mut w = std::io::BufWriter::new(file);
    let mut write = || -> std::io::Result<()> {
        writeln!(w, "Silhouettes:")?;
        for (i, s) in silhouettes.iter().enumerate() {
            writeln!(w, "{},{}", i + 1, s)?;
        }
        w.flush()
    };
    write().map_err(|e| BenchError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn two_groups() -> DistanceMatrix {
        // points 0,1 near each other, 2,3 near each other
        DistanceMatrix::from_array(array![
            [0.0, 1.0, 9.0, 10.0],
            [1.0, 0.0, 8.0, 9.0],
            [9.0, 8.0, 0.0, 1.0],
            [10.0, 9.0, 1.0, 0.0],
        ])
    }

    #[test]
    fn test_it_can_score_a_good_split() {
        let s = silhouette(&two_groups(), &[0, 0, 1, 1], 2);
        assert_abs_diff_eq!(1.0 - 1.0 / 9.5, s[0], epsilon = 1e-12);
        assert!(s.iter().all(|v| *v > 0.8 && *v <= 1.0));
    }

    #[test]
    fn test_it_can_score_a_bad_split() {
        let s = silhouette(&two_groups(), &[0, 1, 0, 1], 2);
        assert!(s.iter().all(|v| *v < 0.0 && *v >= -1.0));
    }

    #[test]
    fn test_it_can_give_singletons_zero() {
        let s = silhouette(&two_groups(), &[0, 1, 1, 1], 2);
        assert_eq!(0.0, s[0]);
    }

    #[test]
    fn test_it_can_write_silhouettes() {
        let dir = tempdir::TempDir::new("scores").unwrap();
        let path = dir.path().join("silhouettes.csv");
        write_silhouettes(&path, &[0.5, -0.25]).unwrap();
        assert_eq!("Silhouettes:\n1,0.5\n2,-0.25\n", std::fs::read_to_string(&path).unwrap());
    }
}
