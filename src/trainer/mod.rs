//! Clustering collaborator.
//!
//! The labeling stages only see centroids and predictions through the traits
//! here. [`kmeans`] provides the concrete trainer used by the CLI.

use thiserror::Error;

use crate::model::cluster_id::ClusterId;
use crate::model::features::FeatureVector;

pub mod kmeans;

/// Per-feature mean of one cluster, in schema order.
pub type Centroid = Vec<f32>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("empty input")]
    EmptyInput,
    #[error("invalid cluster count: requested {requested}, but dataset has {n_items} items")]
    InvalidClusterCount { requested: usize, n_items: usize },
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("k-means fit failed: {0}")]
    Fit(#[from] linfa_clustering::KMeansError),
    #[error("training matrix: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("model JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output of one predictor call.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub predicted: ClusterId,
    /// Squared Euclidean distance to every centroid, by centroid index.
    pub distances: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct TrainedClusters<M> {
    pub model: M,
    pub assignments: Vec<ClusterId>,
    /// Sum of squared distances from each session to its assigned centroid.
    pub inertia: f32,
}

pub trait ClusterTrainer {
    type Model: ClusterModel;

    fn n_clusters(&self) -> usize;

    fn fit(&self, data: &[FeatureVector]) -> Result<TrainedClusters<Self::Model>, ModelError>;
}

pub trait ClusterModel {
    fn centroids(&self) -> &[Centroid];

    fn n_clusters(&self) -> usize {
        self.centroids().len()
    }

    /// Hands out a fresh predictor. Predictors are cheap; create one per worker.
    fn predictor(&self) -> Box<dyn ClusterPredictor + '_>;
}

/// Nearest-centroid predictor.
///
/// `predict` takes `&mut self`: a predictor owns scratch state and must not be
/// shared between threads. Use one predictor per worker or guard a shared one
/// with a lock.
pub trait ClusterPredictor {
    fn predict(&mut self, sample: &FeatureVector) -> Result<Prediction, ModelError>;
}
