//! Dynamic time warping between two series.

use ndarray::Array2;

/// How two aligned points are compared, and how the accumulated cost is
/// turned into a distance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cost {
    /// `|a - b|`, summed along the path.
    #[default]
    Absolute,
    /// `(a - b)^2` summed along the path, square root of the total.
    SquaredEuclidean,
}

impl Cost {
    #[inline]
    fn point(self, a: f64, b: f64) -> f64 {
        match self {
            Cost::Absolute => (a - b).abs(),
            Cost::SquaredEuclidean => (a - b) * (a - b),
        }
    }

    #[inline]
    fn finish(self, total: f64) -> f64 {
        match self {
            Cost::Absolute => total,
            Cost::SquaredEuclidean => total.sqrt(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dtw {
    /// Sakoe-Chiba band half width, 0 for unconstrained.
    pub band: usize,
    pub cost: Cost,
}

impl Dtw {
    pub fn new(band: usize, cost: Cost) -> Dtw {
        Dtw { band, cost }
    }

    pub fn distance(&self, x: &[f64], y: &[f64]) -> f64 {
        if self.band == 0 {
            dtw_linear(x, y, self.cost)
        } else {
            dtw_banded(x, y, self.band, self.cost)
        }
    }
}

fn same(x: &[f64], y: &[f64]) -> bool {
    std::ptr::eq(x, y)
}

/// Cumulative cost matrix with a padding row and column, `D[0][0] = 0`.
fn cost_matrix(x: &[f64], y: &[f64], cost: Cost) -> Array2<f64> {
    let (n, m) = (x.len(), y.len());
    let mut d = Array2::from_elem((n + 1, m + 1), f64::INFINITY);
    d[[0, 0]] = 0.0;
    for i in 1..=n {
        for j in 1..=m {
            let best = d[[i - 1, j - 1]].min(d[[i - 1, j]]).min(d[[i, j - 1]]);
            d[[i, j]] = best + cost.point(x[i - 1], y[j - 1]);
        }
    }
    d
}

/// DTW over the full cost matrix.
pub fn dtw_full(x: &[f64], y: &[f64], cost: Cost) -> f64 {
    if same(x, y) {
        return 0.0;
    }
    if x.is_empty() || y.is_empty() {
        return f64::MAX;
    }
    let d = cost_matrix(x, y, cost);
    cost.finish(d[[x.len(), y.len()]])
}

/// Same value as [`dtw_full`], keeping two rows of the matrix.
pub fn dtw_linear(x: &[f64], y: &[f64], cost: Cost) -> f64 {
    dtw_window(x, y, None, cost)
}

/// DTW restricted to cells with `|i - j| <= band`. The band is widened to
/// the length difference so that the last cell stays reachable.
pub fn dtw_banded(x: &[f64], y: &[f64], band: usize, cost: Cost) -> f64 {
    dtw_window(x, y, Some(band), cost)
}

fn dtw_window(x: &[f64], y: &[f64], band: Option<usize>, cost: Cost) -> f64 {
    if same(x, y) {
        return 0.0;
    }
    if x.is_empty() || y.is_empty() {
        return f64::MAX;
    }

    // rows run along the longer series
    let (long, short) = if x.len() >= y.len() { (x, y) } else { (y, x) };
    let (n, m) = (long.len(), short.len());
    let window = band.map_or(n, |b| b.max(n - m));

    let mut prev = vec![f64::INFINITY; m + 1];
    let mut curr = vec![f64::INFINITY; m + 1];
    prev[0] = 0.0;

    for i in 1..=n {
        curr.fill(f64::INFINITY);
        let lo = i.saturating_sub(window).max(1);
        let hi = (i + window).min(m);
        for j in lo..=hi {
            let best = prev[j - 1].min(prev[j]).min(curr[j - 1]);
            curr[j] = best + cost.point(long[i - 1], short[j - 1]);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    cost.finish(prev[m])
}

/// Distance and optimal warping path as `(index in x, index in y)` pairs,
/// from `(0, 0)` to the last point of both series.
pub fn dtw_path(x: &[f64], y: &[f64], cost: Cost) -> (f64, Vec<(usize, usize)>) {
    if x.is_empty() || y.is_empty() {
        return (f64::MAX, Vec::new());
    }
    let d = cost_matrix(x, y, cost);
    let (mut i, mut j) = (x.len(), y.len());
    let mut path = vec![(i - 1, j - 1)];

    while (i, j) != (1, 1) {
        let diag = d[[i - 1, j - 1]];
        let up = d[[i - 1, j]];
        let left = d[[i, j - 1]];
        if diag <= up && diag <= left {
            i -= 1;
            j -= 1;
        } else if up <= left {
            i -= 1;
        } else {
            j -= 1;
        }
        path.push((i - 1, j - 1));
    }
    path.reverse();

    (cost.finish(d[[x.len(), y.len()]]), path)
}
