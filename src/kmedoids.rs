//! k-medoids over a DTW distance matrix.
//!
//! The medoid search itself comes from the `kmedoids` crate; this module
//! checks the inputs, picks the search strategy and wraps the result.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use crate::centroids::{sample_indices, validate};
use crate::clustering::{Clusterer, Clustering};
use crate::dataset::TimeSeriesSet;
use crate::distance::DistanceMatrix;
use crate::dtw::Dtw;
use crate::error::{BenchError, Result};
use crate::settings::{CLUSTER_SEED, DEFAULT_MAX_ITER};
use crate::time_it;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Method {
    /// Voronoi iteration: assign to the nearest medoid, re-centre each
    /// cluster, repeat.
    #[default]
    Alternating,
    /// Eager swap search.
    FasterPam,
    /// Classic PAM swap, BUILD when no start is given.
    Pam,
}

#[derive(Clone, Debug)]
pub struct KMedoids {
    pub dtw: Dtw,
    pub method: Method,
    pub max_iter: usize,
    /// Random restarts used when no initial medoids are given.
    pub repetitions: usize,
    pub seed: u64,
}

impl Default for KMedoids {
    fn default() -> Self {
        KMedoids {
            dtw: Dtw::default(),
            method: Method::default(),
            max_iter: DEFAULT_MAX_ITER,
            repetitions: 1,
            seed: CLUSTER_SEED,
        }
    }
}

fn check_k(k: usize, n: usize) -> Result<()> {
    if k == 0 {
        return Err(BenchError::NoClusters);
    }
    if k > n {
        return Err(BenchError::TooManyClusters { k, n });
    }
    Ok(())
}

impl KMedoids {
    pub fn method(mut self, method: Method) -> KMedoids {
        self.method = method;
        self
    }

    pub fn repetitions(mut self, repetitions: usize) -> KMedoids {
        self.repetitions = repetitions.max(1);
        self
    }

    /// Runs the search from the given medoids.
    pub fn fit(&self, distances: &DistanceMatrix, name: &str, medoids: &[usize]) -> Result<Clustering> {
        check_k(medoids.len(), distances.len())?;
        validate(name, medoids, distances.len(), medoids.len())?;

        let mut med = medoids.to_vec();
        let (cost, assignments, iterations): (f64, Vec<usize>, usize) = match self.method {
            Method::Alternating => ::kmedoids::alternating(distances, &mut med, self.max_iter),
            Method::FasterPam => {
                let (cost, assignments, iterations, _swaps): (f64, _, _, _) =
                    ::kmedoids::fasterpam(distances, &mut med, self.max_iter);
                (cost, assignments, iterations)
            }
            Method::Pam => {
                let (cost, assignments, iterations, _swaps): (f64, _, _, _) =
                    ::kmedoids::pam_swap(distances, &mut med, self.max_iter);
                (cost, assignments, iterations)
            }
        };

        Ok(Clustering {
            assignments,
            medoids: Some(med),
            barycenters: None,
            cost,
            iterations,
        })
    }

    /// PAM BUILD followed by SWAP, no randomness involved.
    pub fn fit_build(&self, distances: &DistanceMatrix, k: usize) -> Result<Clustering> {
        check_k(k, distances.len())?;
        let (cost, assignments, medoids, iterations, _swaps): (f64, _, _, _, _) =
            ::kmedoids::pam(distances, k, self.max_iter);
        Ok(Clustering {
            assignments,
            medoids: Some(medoids),
            barycenters: None,
            cost,
            iterations,
        })
    }

    /// Restarts from `repetitions` random medoid sets and keeps the cheapest.
    pub fn fit_repeated(&self, distances: &DistanceMatrix, name: &str, k: usize) -> Result<Clustering> {
        check_k(k, distances.len())?;
        let mut rng = Xoshiro256Plus::seed_from_u64(self.seed);

        let mut best: Option<Clustering> = None;
        for rep in 0..self.repetitions.max(1) {
            let start = sample_indices(&mut rng, distances.len(), k)?;
            let clustering = self.fit(distances, name, &start)?;
            log::debug!("{}: repetition {} cost {}", name, rep, clustering.cost);
            if best.as_ref().map_or(true, |b| clustering.cost < b.cost) {
                best = Some(clustering);
            }
        }
        best.ok_or(BenchError::NoClusters)
    }
}

impl Clusterer for KMedoids {
    fn name(&self) -> &'static str {
        match self.method {
            Method::Alternating => "kmedoids",
            Method::FasterPam => "fasterpam",
            Method::Pam => "pam",
        }
    }

    /// Builds the distance matrix, then searches for medoids. Both count
    /// towards the benchmarked call.
    fn cluster(&self, set: &TimeSeriesSet, n_clusters: usize, initial: Option<&[usize]>) -> Result<Clustering> {
        if set.is_empty() {
            return Err(BenchError::EmptyDataset(set.name.clone()));
        }
        time_it!(
            format!("{} distance matrix", set.name),
            let distances = DistanceMatrix::fill(&set.series, &self.dtw);
        );
        match initial {
            Some(medoids) => {
                validate(&set.name, medoids, set.len(), n_clusters)?;
                self.fit(&distances, &set.name, medoids)
            }
            None if self.repetitions > 1 => self.fit_repeated(&distances, &set.name, n_clusters),
            None => self.fit_build(&distances, n_clusters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blobs() -> TimeSeriesSet {
        let mut series = Vec::new();
        for i in 0..6 {
            let base = if i < 3 { 0.0 } else { 20.0 };
            series.push(vec![base, base + 1.0 + i as f64 * 0.1, base + 0.5, base]);
        }
        TimeSeriesSet::new("blobs", series)
    }

    fn line() -> DistanceMatrix {
        // 0 1 2 close together, 3 4 far away
        let pos = [0.0f64, 1.0, 2.0, 10.0, 11.0];
        let mut m = ndarray::Array2::zeros((5, 5));
        for i in 0..5 {
            for j in 0..5 {
                m[[i, j]] = (pos[i] - pos[j]).abs();
            }
        }
        DistanceMatrix::from_array(m)
    }

    fn same_partition(assignments: &[usize], expected: &[usize]) -> bool {
        assignments.iter().zip(expected).all(|(a, e)| {
            assignments
                .iter()
                .zip(expected)
                .all(|(b, f)| (a == b) == (e == f))
        })
    }

    #[test]
    fn test_it_can_split_two_groups_from_given_medoids() {
        for method in [Method::Alternating, Method::FasterPam, Method::Pam] {
            let km = KMedoids::default().method(method);
            let c = km.fit(&line(), "line", &[0, 1]).unwrap();
            assert!(same_partition(&c.assignments, &[0, 0, 0, 1, 1]), "{:?}", method);
            assert_eq!(3.0, c.cost);
        }
    }

    #[test]
    fn test_it_can_build_without_a_start() {
        let c = KMedoids::default().fit_build(&line(), 2).unwrap();
        let mut medoids = c.medoids.clone().unwrap();
        medoids.sort();
        assert!(medoids == vec![1, 3] || medoids == vec![1, 4]);
        assert_eq!(3.0, c.cost);
    }

    #[test]
    fn test_it_can_keep_the_best_repetition() {
        let km = KMedoids::default().method(Method::Pam).repetitions(4);
        let c = km.fit_repeated(&line(), "line", 2).unwrap();
        assert_eq!(3.0, c.cost);
        let again = km.fit_repeated(&line(), "line", 2).unwrap();
        assert_eq!(c.medoids, again.medoids);
    }

    #[test]
    fn test_it_can_reject_bad_medoids() {
        let km = KMedoids::default();
        assert!(matches!(km.fit(&line(), "line", &[]), Err(BenchError::NoClusters)));
        assert!(matches!(
            km.fit(&line(), "line", &[0, 9]),
            Err(BenchError::InvalidCentroids { .. })
        ));
        assert!(matches!(
            km.fit_build(&line(), 6),
            Err(BenchError::TooManyClusters { k: 6, n: 5 })
        ));
    }

    #[test]
    fn test_it_can_cluster_series_end_to_end() {
        let set = blobs();
        let km = KMedoids::default();
        let c = km.cluster(&set, 2, Some(&[0, 1])).unwrap();
        assert!(same_partition(&c.assignments, &[0, 0, 0, 1, 1, 1]));
        assert_eq!(2, c.medoids.unwrap().len());

        let built = km.cluster(&set, 2, None).unwrap();
        assert!(same_partition(&built.assignments, &[0, 0, 0, 1, 1, 1]));
    }

    #[test]
    fn test_it_can_check_initial_count_against_clusters() {
        let set = blobs();
        let err = KMedoids::default().cluster(&set, 3, Some(&[0, 1])).unwrap_err();
        assert!(matches!(err, BenchError::InvalidCentroids { .. }));
    }

    #[test]
    fn test_it_can_treat_the_matrix_as_symmetric() {
        let m = DistanceMatrix::from_array(array![[0.0, 2.0], [2.0, 0.0]]);
        let c = KMedoids::default().fit(&m, "pair", &[0, 1]).unwrap();
        assert_eq!(0.0, c.cost);
    }
}
