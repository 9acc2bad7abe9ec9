//! k-means under DTW. Centroids are DTW barycenters (DBA) rather than
//! pointwise means, and inertia is the mean squared DTW distance of every
//! series to its centroid.

use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;

use crate::centroids::validate;
use crate::clustering::{Clusterer, Clustering};
use crate::dataset::{Series, TimeSeriesSet};
use crate::dtw::{dtw_linear, dtw_path, Cost};
use crate::error::{BenchError, Result};
use crate::settings::{CLUSTER_SEED, KMEANS_MAX_ITER, KMEANS_MAX_ITER_BARYCENTER, KMEANS_TOL};

#[derive(Clone, Debug)]
pub struct TimeSeriesKMeans {
    pub max_iter: usize,
    pub max_iter_barycenter: usize,
    pub tol: f64,
    pub seed: u64,
    pub cost: Cost,
}

impl Default for TimeSeriesKMeans {
    fn default() -> Self {
        TimeSeriesKMeans {
            max_iter: KMEANS_MAX_ITER,
            max_iter_barycenter: KMEANS_MAX_ITER_BARYCENTER,
            tol: KMEANS_TOL,
            seed: CLUSTER_SEED,
            cost: Cost::SquaredEuclidean,
        }
    }
}

/// Index and distance of the closest barycenter.
fn closest(series: &[f64], barycenters: &[Series], cost: Cost) -> (usize, f64) {
    barycenters
        .iter()
        .enumerate()
        .map(|(c, b)| (c, dtw_linear(series, b, cost)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// Worst fitted series that has not been taken yet.
fn farthest(dists: &[f64], taken: &[usize]) -> Option<usize> {
    dists
        .iter()
        .enumerate()
        .filter(|(i, _)| !taken.contains(i))
        .fold(None, |best: Option<(usize, f64)>, (i, &d)| match best {
            Some((_, b)) if b >= d => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}

fn k_means_pp(series: &[Series], k: usize, cost: Cost, rng: &mut impl Rng) -> Vec<Series> {
    let n = series.len();
    let mut chosen = vec![rng.gen_range(0..n)];
    let mut dists: Vec<f64> = series
        .par_iter()
        .map(|s| dtw_linear(s, &series[chosen[0]], cost).powi(2))
        .collect();

    while chosen.len() < k {
        let next = match WeightedIndex::new(dists.iter()) {
            Ok(w) => w.sample(rng),
            // every remaining series sits on a centroid already
            Err(_) => (0..n).find(|i| !chosen.contains(i)).unwrap_or(0),
        };
        chosen.push(next);
        let newest = &series[next];
        dists
            .par_iter_mut()
            .zip(series.par_iter())
            .for_each(|(d, s)| *d = d.min(dtw_linear(s, newest, cost).powi(2)));
    }

    chosen.into_iter().map(|i| series[i].clone()).collect()
}

impl TimeSeriesKMeans {
    /// One DBA run: realign every member to the barycenter and average the
    /// points mapped onto each of its positions, until it stops moving.
    pub fn barycenter(&self, members: &[&Series], start: &Series) -> Series {
        let mut barycenter = start.clone();
        if members.is_empty() || barycenter.is_empty() {
            return barycenter;
        }

        for _ in 0..self.max_iter_barycenter {
            let (sums, counts) = members
                .par_iter()
                .map(|m| {
                    let mut sums = vec![0.0; barycenter.len()];
                    let mut counts = vec![0usize; barycenter.len()];
                    for (b, s) in dtw_path(&barycenter, m, self.cost).1 {
                        sums[b] += m[s];
                        counts[b] += 1;
                    }
                    (sums, counts)
                })
                .reduce(
                    || (vec![0.0; barycenter.len()], vec![0usize; barycenter.len()]),
                    |(mut sa, mut ca), (sb, cb)| {
                        sa.iter_mut().zip(sb).for_each(|(a, b)| *a += b);
                        ca.iter_mut().zip(cb).for_each(|(a, b)| *a += b);
                        (sa, ca)
                    },
                );

            let next: Series = sums
                .iter()
                .zip(&counts)
                .zip(&barycenter)
                .map(|((s, &c), old)| if c == 0 { *old } else { s / c as f64 })
                .collect();

            let shift = next
                .iter()
                .zip(&barycenter)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            barycenter = next;
            if shift < self.tol {
                break;
            }
        }
        barycenter
    }

    fn assign(&self, series: &[Series], barycenters: &[Series]) -> (Vec<usize>, Vec<f64>) {
        series
            .par_iter()
            .map(|s| closest(s, barycenters, self.cost))
            .unzip()
    }

    pub fn fit(&self, set: &TimeSeriesSet, k: usize, initial: Option<&[usize]>) -> Result<Clustering> {
        let series = &set.series;
        let n = series.len();
        if n == 0 {
            return Err(BenchError::EmptyDataset(set.name.clone()));
        }
        if k == 0 {
            return Err(BenchError::NoClusters);
        }
        if k > n {
            return Err(BenchError::TooManyClusters { k, n });
        }

        let mut rng = Xoshiro256Plus::seed_from_u64(self.seed);
        let mut barycenters = match initial {
            Some(indices) => {
                validate(&set.name, indices, n, k)?;
                indices.iter().map(|&i| series[i].clone()).collect()
            }
            None => k_means_pp(series, k, self.cost, &mut rng),
        };

        let mut assignments: Vec<usize> = Vec::new();
        let mut inertia = f64::INFINITY;
        let mut iterations = 0;

        for iter in 0..self.max_iter {
            iterations = iter + 1;
            let (next, dists) = self.assign(series, &barycenters);
            let next_inertia = dists.iter().map(|d| d * d).sum::<f64>() / n as f64;
            log::debug!("{}: iteration {} inertia {:.6}", set.name, iter, next_inertia);

            let unchanged = next == assignments;
            let improvement = inertia - next_inertia;
            assignments = next;
            inertia = next_inertia;
            if unchanged || improvement.abs() < self.tol {
                break;
            }

            let mut members: Vec<Vec<&Series>> = vec![Vec::new(); k];
            for (s, &c) in series.iter().zip(&assignments) {
                members[c].push(s);
            }

            let mut reseeded = Vec::new();
            for c in 0..k {
                if members[c].is_empty() {
                    // restart an empty cluster from the worst fitted series
                    let far = farthest(&dists, &reseeded).unwrap_or(c % n);
                    reseeded.push(far);
                    log::warn!("{}: cluster {} is empty, restarting it from series {}", set.name, c, far);
                    barycenters[c] = series[far].clone();
                } else {
                    barycenters[c] = self.barycenter(&members[c], &barycenters[c]);
                }
            }
        }

        // the barycenters may have moved since the last assignment
        let (final_assignments, dists) = self.assign(series, &barycenters);
        if final_assignments != assignments {
            log::debug!("{}: settling points after the last update", set.name);
        }
        let assignments = final_assignments;
        let inertia = dists.iter().map(|d| d * d).sum::<f64>() / n as f64;

        Ok(Clustering {
            assignments,
            medoids: None,
            barycenters: Some(barycenters),
            cost: inertia,
            iterations,
        })
    }
}

impl Clusterer for TimeSeriesKMeans {
    fn name(&self) -> &'static str {
        "kmeans"
    }

    fn cluster(&self, set: &TimeSeriesSet, n_clusters: usize, initial: Option<&[usize]>) -> Result<Clustering> {
        self.fit(set, n_clusters, initial)
    }
}
