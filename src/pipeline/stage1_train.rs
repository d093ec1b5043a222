use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;
use crate::input::{TelemetryOptions, TelemetrySet, load_telemetry};
use crate::model::cluster_id::ClusterId;
use crate::model::features::FeatureSchema;
use crate::trainer::{ClusterModel, ClusterTrainer, TrainedClusters};

#[derive(Debug, Clone)]
pub struct Stage1Params<'a> {
    pub input: &'a Path,
    pub schema: &'a FeatureSchema,
    pub options: TelemetryOptions,
}

#[derive(Debug)]
pub struct Stage1Output<M> {
    pub telemetry: TelemetrySet,
    pub trained: TrainedClusters<M>,
}

pub fn run_stage1<T: ClusterTrainer>(
    params: &Stage1Params<'_>,
    trainer: &T,
) -> Result<Stage1Output<T::Model>> {
    let telemetry = load_telemetry(params.input, params.schema, params.options)?;
    let trained = trainer.fit(&telemetry.sessions)?;

    info!(
        clusters = trainer.n_clusters(),
        sessions = telemetry.len(),
        inertia = trained.inertia,
        "trained cluster model"
    );
    for (idx, centroid) in trained.model.centroids().iter().enumerate() {
        debug!(centroid = idx, values = ?centroid, "centroid values");
    }

    Ok(Stage1Output { telemetry, trained })
}

pub fn cluster_sizes(assignments: &[ClusterId], k: usize) -> Vec<usize> {
    let mut sizes = vec![0usize; k];
    for id in assignments {
        if let Some(slot) = sizes.get_mut(id.index()) {
            *slot += 1;
        }
    }
    sizes
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_train.rs"]
mod tests;
