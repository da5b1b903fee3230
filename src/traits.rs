//! Provide traits for different classes of algorithms
//!

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::dataset::{Dataset, Float};
use crate::error::Error;

/// Fittable algorithms
///
/// A fittable algorithm takes a dataset and creates a concept of some kind about it. For example
/// in *KMeans* this would be the mean values for each class, or in *RandomForest* the collection
/// of fitted trees.
pub trait Fit<F, T, E: std::error::Error + From<Error>> {
    type Object;

    fn fit(&self, dataset: &Dataset<F, T>) -> Result<Self::Object, E>;
}

/// Predict with model
///
/// This trait assumes the `PredictInplace` pattern is not needed: every model in the workspace
/// produces small owned outputs.
pub trait Predict<R, T> {
    fn predict(&self, x: R) -> T;
}

/// Result of partitioning a set of observations
#[derive(Clone, Debug, PartialEq)]
pub struct Clustering<F> {
    /// Cluster index of each observation, in `[0, n_clusters)`
    pub memberships: Array1<usize>,
    /// Cluster centers with shape `(n_clusters, n_features)`, row `i` belongs to cluster `i`
    pub centroids: Array2<F>,
}

impl<F: Float> Clustering<F> {
    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }
}

/// Spatial clustering capability
///
/// Hotspot detection only needs a partition of the observations and the matching centers, so
/// any algorithm producing both can stand in for k-means.
pub trait Clusterer<F: Float> {
    type Error: std::error::Error;

    /// Partitions `observations` with shape `(n_samples, n_features)`
    fn cluster(&self, observations: ArrayView2<F>) -> Result<Clustering<F>, Self::Error>;
}

/// Fitted classification capability
///
/// Maps a single feature vector onto an integer class code in `[0, n_classes)`.
pub trait Classifier<F: Float> {
    /// Number of distinct codes the model was trained on
    fn n_classes(&self) -> usize;

    /// Number of features expected in every observation
    fn n_features(&self) -> usize;

    fn classify(&self, observation: ArrayView1<F>) -> usize;
}
