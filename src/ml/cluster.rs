use crate::error::{AppError, Result};
use crate::models::Hotspot;
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// K-means hotspot clusterer over incident coordinates.
///
/// Fitting runs Lloyd iterations from several k-means++ initializations and
/// keeps the lowest-inertia result; restart seeds derive from a fixed base
/// seed, so a fit over the same coordinates is reproducible. After fit the
/// clusterer is read-only: centers and assignments are queried for display,
/// and new points can be assigned to the nearest fitted center without
/// refitting.
#[derive(Debug)]
pub struct HotspotClusterer {
    k: usize,
    restarts: usize,
    max_iterations: usize,
    seed: u64,
    centers: Option<Array2<f64>>,
    assignments: Vec<usize>,
    inertia: f64,
}

impl HotspotClusterer {
    pub fn new(k: usize, restarts: usize, max_iterations: usize, seed: u64) -> Self {
        Self {
            k,
            restarts,
            max_iterations,
            seed,
            centers: None,
            assignments: Vec::new(),
            inertia: f64::INFINITY,
        }
    }

    /// Partition the coordinate set into `k` clusters.
    ///
    /// Requires at least `k` points; fewer is a configuration problem with
    /// the historical dataset, not a recoverable condition.
    pub fn fit(&mut self, coords: &Array2<f64>) -> Result<()> {
        if self.k == 0 {
            return Err(AppError::Configuration(
                "cluster count must be positive".to_string(),
            ));
        }
        let n = coords.nrows();
        if n < self.k {
            return Err(AppError::Configuration(format!(
                "cannot form {} clusters from {} incidents",
                self.k, n
            )));
        }

        let mut best: Option<(Array2<f64>, Vec<usize>, f64)> = None;
        for restart in 0..self.restarts.max(1) {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(restart as u64));
            let (centers, assignments, inertia) =
                lloyd(coords, self.k, self.max_iterations, &mut rng);
            debug!(restart, inertia, "k-means restart finished");

            if best.as_ref().map_or(true, |(_, _, b)| inertia < *b) {
                best = Some((centers, assignments, inertia));
            }
        }

        let (centers, assignments, inertia) =
            best.ok_or_else(|| AppError::Internal("k-means produced no result".to_string()))?;
        self.centers = Some(centers);
        self.assignments = assignments;
        self.inertia = inertia;

        Ok(())
    }

    /// Fitted cluster centers, one row per cluster
    pub fn centers(&self) -> Result<&Array2<f64>> {
        self.centers
            .as_ref()
            .ok_or_else(|| AppError::Untrained("hotspot clusterer".to_string()))
    }

    /// Cluster index per training point, in input order
    pub fn assignments(&self) -> Result<&[usize]> {
        if self.centers.is_none() {
            return Err(AppError::Untrained("hotspot clusterer".to_string()));
        }
        Ok(&self.assignments)
    }

    /// Sum of squared distances from each point to its assigned center
    pub fn inertia(&self) -> Result<f64> {
        if self.centers.is_none() {
            return Err(AppError::Untrained("hotspot clusterer".to_string()));
        }
        Ok(self.inertia)
    }

    pub fn is_trained(&self) -> bool {
        self.centers.is_some()
    }

    /// Nearest fitted center for a new coordinate. Never refits.
    pub fn assign(&self, latitude: f64, longitude: f64) -> Result<usize> {
        let centers = self.centers()?;
        let point = [latitude, longitude];
        let (cluster, _) = nearest_center(ArrayView1::from(&point[..]), centers);
        Ok(cluster)
    }

    /// Per-cluster summaries for display, ordered by cluster index
    pub fn hotspots(&self) -> Result<Vec<Hotspot>> {
        let centers = self.centers()?;

        let mut counts = vec![0usize; self.k];
        for &cluster in &self.assignments {
            counts[cluster] += 1;
        }

        Ok((0..self.k)
            .map(|cluster| Hotspot {
                cluster,
                center_latitude: centers[[cluster, 0]],
                center_longitude: centers[[cluster, 1]],
                incident_count: counts[cluster],
            })
            .collect())
    }
}

/// One Lloyd run from a k-means++ initialization.
fn lloyd(
    coords: &Array2<f64>,
    k: usize,
    max_iterations: usize,
    rng: &mut StdRng,
) -> (Array2<f64>, Vec<usize>, f64) {
    let n = coords.nrows();
    let dim = coords.ncols();
    let mut centers = init_centers(coords, k, rng);
    let mut assignments = vec![0usize; n];

    for _ in 0..max_iterations {
        let mut changed = false;
        for i in 0..n {
            let (cluster, _) = nearest_center(coords.row(i), &centers);
            if assignments[i] != cluster {
                assignments[i] = cluster;
                changed = true;
            }
        }

        let mut sums = Array2::<f64>::zeros((k, dim));
        let mut counts = vec![0usize; k];
        for i in 0..n {
            counts[assignments[i]] += 1;
            for j in 0..dim {
                sums[[assignments[i], j]] += coords[[i, j]];
            }
        }

        let mut reseeded = Vec::new();
        for c in 0..k {
            if counts[c] == 0 {
                // Reseed an emptied cluster at the point farthest from its
                // current center, skipping points already used this pass so
                // two emptied clusters never land on the same coordinate.
                let far = farthest_point(coords, &centers, &assignments, &reseeded);
                reseeded.push(far);
                for j in 0..dim {
                    centers[[c, j]] = coords[[far, j]];
                }
                changed = true;
            } else {
                for j in 0..dim {
                    centers[[c, j]] = sums[[c, j]] / counts[c] as f64;
                }
            }
        }

        if !changed {
            break;
        }
    }

    let mut inertia = 0.0;
    for i in 0..n {
        let (cluster, dist) = nearest_center(coords.row(i), &centers);
        assignments[i] = cluster;
        inertia += dist;
    }

    (centers, assignments, inertia)
}

/// k-means++ seeding: first center uniform, the rest weighted by squared
/// distance to the nearest chosen center.
fn init_centers(coords: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = coords.nrows();
    let dim = coords.ncols();
    let mut centers = Array2::zeros((k, dim));

    let first = rng.gen_range(0..n);
    centers.row_mut(0).assign(&coords.row(first));

    let mut dist_sq: Vec<f64> = (0..n)
        .map(|i| sq_dist(coords.row(i), centers.row(0)))
        .collect();

    for c in 1..k {
        let total: f64 = dist_sq.iter().sum();
        let choice = if total <= f64::EPSILON {
            // All remaining points coincide with a chosen center.
            rng.gen_range(0..n)
        } else {
            let mut target = rng.gen::<f64>() * total;
            let mut pick = n - 1;
            for (i, d) in dist_sq.iter().enumerate() {
                if target <= *d {
                    pick = i;
                    break;
                }
                target -= d;
            }
            pick
        };

        centers.row_mut(c).assign(&coords.row(choice));
        for i in 0..n {
            let d = sq_dist(coords.row(i), centers.row(c));
            if d < dist_sq[i] {
                dist_sq[i] = d;
            }
        }
    }

    centers
}

fn farthest_point(
    coords: &Array2<f64>,
    centers: &Array2<f64>,
    assignments: &[usize],
    exclude: &[usize],
) -> usize {
    let mut far = 0;
    let mut far_dist = -1.0;
    for i in 0..coords.nrows() {
        if exclude.contains(&i) {
            continue;
        }
        let d = sq_dist(coords.row(i), centers.row(assignments[i]));
        if d > far_dist {
            far_dist = d;
            far = i;
        }
    }
    far
}

fn nearest_center(point: ArrayView1<f64>, centers: &Array2<f64>) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for c in 0..centers.nrows() {
        let d = sq_dist(point, centers.row(c));
        if d < best_dist {
            best_dist = d;
            best = c;
        }
    }
    (best, best_dist)
}

fn sq_dist(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
