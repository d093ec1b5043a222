//! Seeded k-means backed by `linfa-clustering`.
//!
//! linfa fits the centroids (k-means++ seeding, Lloyd iterations). Training
//! assignments are then recomputed here with the same lowest-index tie rule
//! the predictor uses, so assignments and later predictions agree for
//! identical inputs.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use linfa::DatasetBase;
use linfa::traits::Fit;
use linfa_clustering::{KMeans, KMeansInit};
use ndarray::Array2;
use rand_xoshiro::Xoshiro256Plus;
use rand_xoshiro::rand_core::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::model::cluster_id::{ClusterId, MAX_CLUSTERS};
use crate::model::features::{FeatureSchema, FeatureVector, SchemaError};
use crate::trainer::{
    Centroid, ClusterModel, ClusterPredictor, ClusterTrainer, ModelError, Prediction,
    TrainedClusters,
};

pub const DEFAULT_MAX_ITER: usize = 300;
pub const DEFAULT_TOLERANCE: f32 = 1e-4;
pub const ALGORITHM_NAME: &str = "kmeans";
pub const MODEL_FILE_NAME: &str = "kmeans_model.json";

#[derive(Debug, Clone)]
pub struct Kmeans {
    k: usize,
    max_iter: usize,
    tolerance: f32,
    seed: u64,
}

impl Kmeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: DEFAULT_MAX_ITER,
            tolerance: DEFAULT_TOLERANCE,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn check_input(&self, data: &[FeatureVector]) -> Result<usize, ModelError> {
        if data.is_empty() {
            return Err(ModelError::EmptyInput);
        }
        if self.k == 0 || self.k > data.len() || self.k > MAX_CLUSTERS {
            return Err(ModelError::InvalidClusterCount {
                requested: self.k,
                n_items: data.len(),
            });
        }
        let dim = data[0].len();
        if dim == 0 {
            return Err(ModelError::EmptyInput);
        }
        for point in data {
            if point.len() != dim {
                return Err(ModelError::DimensionMismatch {
                    expected: dim,
                    found: point.len(),
                });
            }
        }
        Ok(dim)
    }

    /// k-means++ needs at least `k` distinct points to draw from; below that
    /// the initial centroids are sampled uniformly instead.
    fn init_method(&self, data: &[FeatureVector]) -> KMeansInit<f64> {
        if distinct_points(data) < self.k {
            KMeansInit::Random
        } else {
            KMeansInit::KMeansPlusPlus
        }
    }
}

impl ClusterTrainer for Kmeans {
    type Model = KmeansModel;

    fn n_clusters(&self) -> usize {
        self.k
    }

    fn fit(&self, data: &[FeatureVector]) -> Result<TrainedClusters<KmeansModel>, ModelError> {
        let dim = self.check_input(data)?;
        let flat: Vec<f64> = data
            .iter()
            .flat_map(|p| p.values.iter().map(|&v| v as f64))
            .collect();
        let records = Array2::from_shape_vec((data.len(), dim), flat)?;
        let dataset = DatasetBase::from(records);

        let rng = Xoshiro256Plus::seed_from_u64(self.seed);
        let fitted = KMeans::params_with_rng(self.k, rng)
            .init_method(self.init_method(data))
            .max_n_iterations(self.max_iter as u64)
            .tolerance(self.tolerance as f64)
            .fit(&dataset)?;

        let centroids: Vec<Centroid> = fitted
            .centroids()
            .outer_iter()
            .map(|row| row.iter().map(|&v| v as f32).collect())
            .collect();
        let (assignments, inertia) = assign(data, &centroids);

        Ok(TrainedClusters {
            model: KmeansModel {
                algorithm: ALGORITHM_NAME.to_string(),
                n_clusters: self.k,
                n_features: dim,
                seed: self.seed,
                centroids,
            },
            assignments,
            inertia,
        })
    }
}

/// Persisted k-means model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmeansModel {
    pub algorithm: String,
    pub n_clusters: usize,
    pub n_features: usize,
    pub seed: u64,
    pub centroids: Vec<Centroid>,
}

impl KmeansModel {
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut w, self)?;
        writeln!(w)?;
        w.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let reader = BufReader::new(File::open(path)?);
        let model: KmeansModel = serde_json::from_reader(reader)?;
        model.check()?;
        Ok(model)
    }

    fn check(&self) -> Result<(), ModelError> {
        if self.algorithm != ALGORITHM_NAME {
            return Err(ModelError::InvalidModel(format!(
                "unsupported algorithm {:?}",
                self.algorithm
            )));
        }
        if self.n_clusters > MAX_CLUSTERS {
            return Err(ModelError::InvalidModel(format!(
                "{} clusters exceeds the supported maximum",
                self.n_clusters
            )));
        }
        if self.n_clusters == 0 || self.centroids.len() != self.n_clusters {
            return Err(ModelError::InvalidModel(format!(
                "expected {} centroids, found {}",
                self.n_clusters,
                self.centroids.len()
            )));
        }
        for (idx, centroid) in self.centroids.iter().enumerate() {
            if centroid.len() != self.n_features {
                return Err(ModelError::InvalidModel(format!(
                    "centroid {} has {} features, expected {}",
                    idx,
                    centroid.len(),
                    self.n_features
                )));
            }
        }
        Ok(())
    }

    /// Checks the model width against the telemetry schema it will score.
    pub fn check_schema(&self, schema: &FeatureSchema) -> Result<(), SchemaError> {
        schema.check_len(self.n_features)?;
        for centroid in &self.centroids {
            schema.check_len(centroid.len())?;
        }
        Ok(())
    }
}

impl ClusterModel for KmeansModel {
    fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    fn predictor(&self) -> Box<dyn ClusterPredictor + '_> {
        Box::new(KmeansPredictor::new(self))
    }
}

pub struct KmeansPredictor<'a> {
    model: &'a KmeansModel,
    distances: Vec<f32>,
}

impl<'a> KmeansPredictor<'a> {
    pub fn new(model: &'a KmeansModel) -> Self {
        Self {
            model,
            distances: Vec::with_capacity(model.n_clusters),
        }
    }
}

impl ClusterPredictor for KmeansPredictor<'_> {
    fn predict(&mut self, sample: &FeatureVector) -> Result<Prediction, ModelError> {
        if sample.len() != self.model.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.model.n_features,
                found: sample.len(),
            });
        }
        self.distances.clear();
        self.distances.extend(
            self.model
                .centroids
                .iter()
                .map(|c| squared_euclidean(sample.as_slice(), c)),
        );
        let (best, _) = nearest(&self.distances);
        Ok(Prediction {
            predicted: ClusterId::from_index(best),
            distances: self.distances.clone(),
        })
    }
}

#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Lowest-index minimum. NaN distances never win.
fn nearest(distances: &[f32]) -> (usize, f32) {
    let mut best = 0usize;
    let mut best_d = f32::INFINITY;
    for (idx, &d) in distances.iter().enumerate() {
        if d < best_d {
            best = idx;
            best_d = d;
        }
    }
    (best, best_d)
}

fn assign(data: &[FeatureVector], centroids: &[Centroid]) -> (Vec<ClusterId>, f32) {
    let mut inertia = 0f64;
    let mut labels = Vec::with_capacity(data.len());
    let mut distances = Vec::with_capacity(centroids.len());
    for point in data {
        distances.clear();
        distances.extend(
            centroids
                .iter()
                .map(|c| squared_euclidean(point.as_slice(), c)),
        );
        let (best, d) = nearest(&distances);
        labels.push(ClusterId::from_index(best));
        if d.is_finite() {
            inertia += d as f64;
        }
    }
    (labels, inertia as f32)
}

fn distinct_points(data: &[FeatureVector]) -> usize {
    data.iter()
        .map(|p| {
            // -0.0 and 0.0 coincide
            p.values
                .iter()
                .map(|v| (v + 0.0).to_bits())
                .collect::<Vec<u32>>()
        })
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
#[path = "../../tests/src_inline/trainer/kmeans.rs"]
mod tests;
