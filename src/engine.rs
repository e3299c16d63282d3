use ndarray::{Array2, ArrayView2, arr1};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::error::Error;

use k_means::KMeans;
use segmenta_helpers::{Distance, Float, L2Dist};

use crate::dataset::Dataset;
use crate::record::{CustomerRecord, ValidationError};

/// Number of clusters the original application always requested.
pub const DEFAULT_K: usize = 5;
/// Seed fixing the centroid initialization, so repeated runs agree.
pub const DEFAULT_SEED: u64 = 42;

const MAX_ITER: u32 = 300;
const TOLERANCE: f64 = 1e-4;

/// The clustering seam: anything that can label the rows of a feature
/// matrix. Implementations must be deterministic for a fixed `seed`.
pub trait Clusterer<F: Float> {
    type Error: Error;

    /// Partitions the rows of `features` into `k` groups and returns one
    /// group id in `[0, k)` per row, in row order.
    fn fit_predict(
        &self,
        features: ArrayView2<'_, F>,
        k: usize,
        seed: u64,
    ) -> Result<Vec<usize>, Self::Error>;
}

/// The default clusterer: k-means++ initialization from a seeded
/// `Xoshiro256PlusPlus`, then Lloyd relocation until convergence.
#[derive(Debug, Clone)]
pub struct KMeansClusterer<D = L2Dist> {
    max_iter: u32,
    tolerance: f64,
    distance: D,
}

impl KMeansClusterer<L2Dist> {
    pub fn new() -> Self {
        Self { max_iter: MAX_ITER, tolerance: TOLERANCE, distance: L2Dist }
    }
}

impl Default for KMeansClusterer<L2Dist> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Distance<f64>> KMeansClusterer<D> {
    pub fn with_distance(distance: D, max_iter: u32, tolerance: f64) -> Self {
        Self { max_iter, tolerance, distance }
    }
}

impl<D: Distance<f64>> Clusterer<f64> for KMeansClusterer<D> {
    type Error = k_means::KMeansError;

    fn fit_predict(
        &self,
        features: ArrayView2<'_, f64>,
        k: usize,
        seed: u64,
    ) -> Result<Vec<usize>, Self::Error> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut model = KMeans::new(k, self.max_iter, self.tolerance, self.distance.clone());
        model.fit(features, &mut rng)
    }
}

/// Per-record cluster ids, indexed like the merged input: stored dataset
/// records first, the newly entered record last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAssignment {
    ids: Vec<usize>,
    k: usize,
}

impl ClusterAssignment {
    fn new(ids: Vec<usize>, k: usize) -> Self {
        Self { ids, k }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The number of clusters the ids range over.
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn get(&self, index: usize) -> Option<usize> {
        self.ids.get(index).copied()
    }

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// The cluster of the newly entered record (always the last position).
    pub fn new_record_cluster(&self) -> usize {
        *self.ids.last().expect("assignment covers at least the new record")
    }
}

/// The result handed to the display collaborator: the merged feature matrix
/// plus its cluster assignment. This crate does no rendering.
#[derive(Debug, Clone)]
pub struct Segmentation {
    features: Array2<f64>,
    assignment: ClusterAssignment,
}

impl Segmentation {
    /// One row per record, stored dataset first, the new record last.
    /// Columns: age, annual income, spending score.
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    pub fn assignment(&self) -> &ClusterAssignment {
        &self.assignment
    }

    pub fn new_record_cluster(&self) -> usize {
        self.assignment.new_record_cluster()
    }

    /// Record count per cluster id.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.assignment.k()];
        for &id in self.assignment.ids() {
            sizes[id] += 1;
        }
        sizes
    }
}

/// Merges the stored dataset with one new record and partitions the result.
///
/// Holds no state between calls: every `segment` builds a fresh feature
/// matrix and re-runs the clusterer from its seeded initialization, so
/// identical inputs produce identical assignments.
#[derive(Debug, Clone)]
pub struct SegmentationEngine<C = KMeansClusterer> {
    clusterer: C,
    k: usize,
    seed: u64,
}

impl SegmentationEngine<KMeansClusterer> {
    /// The original application's fixed configuration: k-means with five
    /// clusters, seed 42.
    pub fn new() -> Self {
        Self { clusterer: KMeansClusterer::new(), k: DEFAULT_K, seed: DEFAULT_SEED }
    }
}

impl Default for SegmentationEngine<KMeansClusterer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clusterer<f64>> SegmentationEngine<C> {
    pub fn with_clusterer(clusterer: C, k: usize, seed: u64) -> Self {
        Self { clusterer, k, seed }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Clusters the stored dataset plus `new_record`.
    ///
    /// The merged input is always (dataset records, in stored order) followed
    /// by exactly the one new record; its cluster is read from the last
    /// position of the assignment.
    ///
    /// # Errors
    ///
    /// `EmptyDataset` if the dataset holds no records, `TooManyClusters` if
    /// `k` exceeds the merged record count.
    pub fn segment(
        &self,
        dataset: &Dataset,
        new_record: &CustomerRecord,
    ) -> Result<Segmentation, ValidationError> {
        if dataset.is_empty() {
            return Err(ValidationError::EmptyDataset);
        }
        let merged = dataset.len() + 1;
        if self.k > merged {
            return Err(ValidationError::TooManyClusters { k: self.k, records: merged });
        }

        let mut features = Array2::zeros((merged, 3));
        for (i, record) in dataset.iter().enumerate() {
            features.row_mut(i).assign(&arr1(&record.features()));
        }
        features.row_mut(merged - 1).assign(&arr1(&new_record.features()));

        let ids = self
            .clusterer
            .fit_predict(features.view(), self.k, self.seed)
            .map_err(|e| ValidationError::Clustering(e.to_string()))?;

        Ok(Segmentation { features, assignment: ClusterAssignment::new(ids, self.k) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    // The five-record sample the original app's dataset opens with.
    fn sample_dataset() -> Dataset {
        let rows = [(19, 15, 39), (21, 15, 81), (20, 16, 6), (23, 16, 77), (31, 17, 40)];
        Dataset::from_records(
            rows.iter()
                .map(|&(age, income, score)| CustomerRecord::new(None, age, income, score).unwrap())
                .collect(),
        )
    }

    fn new_record() -> CustomerRecord {
        CustomerRecord::new(None, 25, 50, 50).unwrap()
    }

    #[test]
    fn segment_labels_every_record() {
        let dataset = sample_dataset();
        let engine = SegmentationEngine::new();
        let segmentation = engine.segment(&dataset, &new_record()).unwrap();

        let assignment = segmentation.assignment();
        assert_eq!(assignment.len(), dataset.len() + 1);
        assert!(assignment.ids().iter().all(|&id| id < engine.k()));
        assert_eq!(segmentation.features().nrows(), 6);
    }

    #[test]
    fn segment_is_deterministic() {
        let dataset = sample_dataset();
        let engine = SegmentationEngine::new();

        let first = engine.segment(&dataset, &new_record()).unwrap();
        let second = engine.segment(&dataset, &new_record()).unwrap();
        assert_eq!(first.assignment(), second.assignment());
    }

    #[test]
    fn merged_matrix_keeps_fixed_order() {
        let dataset = sample_dataset();
        let engine = SegmentationEngine::new();
        let segmentation = engine.segment(&dataset, &new_record()).unwrap();

        let features = segmentation.features();
        assert_eq!(features.row(0).to_vec(), vec![19.0, 15.0, 39.0]);
        assert_eq!(features.row(5).to_vec(), vec![25.0, 50.0, 50.0]);
        assert_eq!(
            segmentation.new_record_cluster(),
            segmentation.assignment().get(5).unwrap()
        );
    }

    #[test]
    fn k_may_equal_merged_record_count() {
        let dataset = sample_dataset();
        let engine = SegmentationEngine::with_clusterer(KMeansClusterer::new(), 6, DEFAULT_SEED);
        let segmentation = engine.segment(&dataset, &new_record()).unwrap();
        assert_eq!(segmentation.assignment().len(), 6);
        assert!(segmentation.assignment().ids().iter().all(|&id| id < 6));
    }

    #[test]
    fn k_beyond_merged_record_count_is_rejected() {
        let dataset = sample_dataset();
        let engine = SegmentationEngine::with_clusterer(KMeansClusterer::new(), 7, DEFAULT_SEED);
        let err = engine.segment(&dataset, &new_record()).unwrap_err();
        assert_eq!(err, ValidationError::TooManyClusters { k: 7, records: 6 });
    }

    #[test]
    fn empty_dataset_is_rejected_before_clustering() {
        let dataset = Dataset::from_records(Vec::new());
        let engine = SegmentationEngine::new();
        let err = engine.segment(&dataset, &new_record()).unwrap_err();
        assert_eq!(err, ValidationError::EmptyDataset);
    }

    #[test]
    fn cluster_sizes_sum_to_record_count() {
        let dataset = sample_dataset();
        let engine = SegmentationEngine::new();
        let segmentation = engine.segment(&dataset, &new_record()).unwrap();

        let sizes = segmentation.cluster_sizes();
        assert_eq!(sizes.len(), DEFAULT_K);
        assert_eq!(sizes.iter().sum::<usize>(), 6);
    }

    #[test]
    fn clusterer_accepts_other_distance_metrics() {
        use segmenta_helpers::L1Dist;

        let dataset = sample_dataset();
        let clusterer = KMeansClusterer::with_distance(L1Dist, 300, 1e-4);
        let engine = SegmentationEngine::with_clusterer(clusterer, 2, DEFAULT_SEED);
        let segmentation = engine.segment(&dataset, &new_record()).unwrap();
        assert_eq!(segmentation.assignment().len(), 6);
        assert!(segmentation.assignment().ids().iter().all(|&id| id < 2));
    }

    // A stand-in clusterer proving the engine only depends on the seam.
    struct RoundRobin;

    impl Clusterer<f64> for RoundRobin {
        type Error = Infallible;

        fn fit_predict(
            &self,
            features: ArrayView2<'_, f64>,
            k: usize,
            _seed: u64,
        ) -> Result<Vec<usize>, Self::Error> {
            Ok((0..features.nrows()).map(|i| i % k).collect())
        }
    }

    #[test]
    fn alternative_clusterers_plug_into_the_engine() {
        let dataset = sample_dataset();
        let engine = SegmentationEngine::with_clusterer(RoundRobin, 2, DEFAULT_SEED);
        let segmentation = engine.segment(&dataset, &new_record()).unwrap();
        assert_eq!(segmentation.assignment().ids().to_vec(), vec![0, 1, 0, 1, 0, 1]);
        assert_eq!(segmentation.new_record_cluster(), 1);
    }
}
