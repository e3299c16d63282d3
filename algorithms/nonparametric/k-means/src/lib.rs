use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::Rng;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
// Core components from the shared library
use segmenta_helpers::{Distance, Float};

/// Errors that can occur during k-means clustering.
#[derive(Debug, Clone, PartialEq)]
pub enum KMeansError {
    InvalidK,
    EmptyDataSet,
    KTooLarge,
    InvalidDistance,
    NotFitted,
}

impl Display for KMeansError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for KMeansError {}

/// A k-means clustering model over a row-per-sample feature matrix.
///
/// Centroids are initialized with k-means++ driven by a caller-supplied RNG,
/// so fitting with a seeded generator makes the whole run reproducible.
#[derive(Debug, Clone)]
pub struct KMeans<F, D>
where
    F: Float,
    D: Distance<F>,
{
    pub k: usize,
    max_iter: u32,
    tolerance: F,
    distance: D,
    centroids: Option<Array2<F>>,
}

impl<F, D> KMeans<F, D>
where
    F: Float,
    D: Distance<F>,
{
    pub fn new(k: usize, max_iter: u32, tolerance: F, distance: D) -> Self {
        Self { k, max_iter, tolerance, distance, centroids: None }
    }

    /// Partitions the rows of `data` into `k` clusters and returns the
    /// cluster index of every row, in row order.
    ///
    /// Iterates assignment/update rounds until no assignment changes or the
    /// largest centroid shift drops below the tolerance, capped at `max_iter`.
    pub fn fit<R: Rng>(
        &mut self,
        data: ArrayView2<F>,
        rng: &mut R,
    ) -> Result<Vec<usize>, KMeansError> {
        if self.k == 0 {
            return Err(KMeansError::InvalidK);
        }
        let n_samples = data.nrows();
        if n_samples == 0 {
            return Err(KMeansError::EmptyDataSet);
        }
        if self.k > n_samples {
            return Err(KMeansError::KTooLarge);
        }

        let n_features = data.ncols();

        // K-Means++ initialization: choose centroids probabilistically to be far apart
        let mut centroids = Array2::zeros((self.k, n_features));
        self.kmeans_plus_plus_init(data, &mut centroids, rng);

        let mut assignments = vec![0; n_samples];
        let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();

        for _ in 0..self.max_iter {
            // Assignment step
            let mut changes = 0;
            for (i, point) in data.rows().into_iter().enumerate() {
                let old = assignments[i];
                let mut best_idx = 0;
                let mut best_dist = F::infinity();
                for (c, centroid) in centroids.rows().into_iter().enumerate() {
                    let d = self.distance.rdistance(point, centroid);
                    if d.is_nan() {
                        return Err(KMeansError::InvalidDistance);
                    }
                    if d < best_dist {
                        best_dist = d;
                        best_idx = c;
                    }
                }
                assignments[i] = best_idx;
                if old != best_idx {
                    changes += 1;
                }
            }
            if changes == 0 {
                break;
            }

            // Update step
            clusters.clear();
            for (i, &a) in assignments.iter().enumerate() {
                clusters.entry(a).or_default().push(i);
            }

            let mut new_centroids = Array2::zeros((self.k, n_features));
            for c in 0..self.k {
                if let Some(members) = clusters.get(&c) {
                    if !members.is_empty() {
                        let mut sum = Array1::zeros(n_features);
                        for &i in members {
                            sum += &data.row(i);
                        }
                        sum /= F::from(members.len()).unwrap();
                        new_centroids.row_mut(c).assign(&sum);
                        continue;
                    }
                }
                // empty cluster: keep old
                new_centroids.row_mut(c).assign(&centroids.row(c));
            }

            // Check convergence by max shift
            let mut max_shift = F::zero();
            for (old, new) in centroids.rows().into_iter().zip(new_centroids.rows()) {
                let shift = self.distance.distance(old, new);
                if shift.is_nan() {
                    return Err(KMeansError::InvalidDistance);
                }
                if shift > max_shift {
                    max_shift = shift;
                }
            }

            centroids = new_centroids;
            if max_shift < self.tolerance {
                break;
            }
        }

        self.centroids = Some(centroids);
        Ok(assignments)
    }

    pub fn predict(&self, point: ArrayView1<F>) -> Result<usize, KMeansError> {
        let centroids = self.centroids.as_ref().ok_or(KMeansError::NotFitted)?;
        let mut best = F::infinity();
        let mut idx = 0;
        for (i, c) in centroids.rows().into_iter().enumerate() {
            let d = self.distance.rdistance(point, c);
            if d.is_nan() {
                return Err(KMeansError::InvalidDistance);
            }
            if d < best {
                best = d;
                idx = i;
            }
        }
        Ok(idx)
    }

    pub fn centroids(&self) -> Result<ndarray::ArrayView2<F>, KMeansError> {
        self.centroids
            .as_ref()
            .map(|c| c.view())
            .ok_or(KMeansError::NotFitted)
    }

    /// K-Means++ initialization for better clustering results.
    /// Chooses centroids probabilistically to be far apart from each other.
    fn kmeans_plus_plus_init<R: Rng>(
        &self,
        data: ArrayView2<F>,
        centroids: &mut Array2<F>,
        rng: &mut R,
    ) {
        // Step 1: Choose the first centroid uniformly at random
        let first_idx = rng.random_range(0..data.nrows());
        centroids.row_mut(0).assign(&data.row(first_idx));

        // Step 2: For each remaining centroid
        for k in 1..self.k {
            // Squared distance from each point to its nearest chosen centroid
            let mut distances: Vec<F> = Vec::with_capacity(data.nrows());
            let mut total_weight = F::zero();

            for point in data.rows() {
                let mut min_dist_sq = F::infinity();

                for j in 0..k {
                    let centroid = centroids.row(j);
                    let dist = self.distance.distance(point, centroid);
                    let dist_sq = dist * dist;
                    if dist_sq < min_dist_sq {
                        min_dist_sq = dist_sq;
                    }
                }

                distances.push(min_dist_sq);
                total_weight = total_weight + min_dist_sq;
            }

            // Choose the next centroid with probability proportional to squared distance
            if total_weight > F::zero() {
                let target = F::from(rng.random::<f64>()).unwrap() * total_weight;
                let mut cumulative = F::zero();

                for (i, &dist_sq) in distances.iter().enumerate() {
                    cumulative = cumulative + dist_sq;
                    if cumulative >= target {
                        centroids.row_mut(k).assign(&data.row(i));
                        break;
                    }
                }
            } else {
                // Fallback: if all distances are zero, choose randomly
                let idx = rng.random_range(0..data.nrows());
                centroids.row_mut(k).assign(&data.row(idx));
            }
        }
    }
}
