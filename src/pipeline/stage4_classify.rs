use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::model::category::{SkillCategory, category_order};
use crate::model::cluster_id::ClusterId;
use crate::model::features::FeatureVector;
use crate::model::label_context::{ContextRangeError, LabelContext};
use crate::trainer::{ClusterPredictor, ModelError, Prediction};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ContextRangeError),
    #[error("no usable centroid distances")]
    NoDistances,
    #[error("predicted cluster {predicted} outside 1..={n_clusters}")]
    PredictionOutOfRange {
        predicted: ClusterId,
        n_clusters: usize,
    },
    #[error("session {session}: {source}")]
    Predict {
        session: usize,
        #[source]
        source: ModelError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub cluster: ClusterId,
    pub category: SkillCategory,
    pub distances: Vec<f32>,
}

/// Lowest-index nearest centroid. NaN distances are never selected.
pub fn nearest_cluster(distances: &[f32]) -> Option<ClusterId> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &d) in distances.iter().enumerate() {
        if d.is_nan() {
            continue;
        }
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((idx, d)),
        }
    }
    best.map(|(idx, _)| ClusterId::from_index(idx))
}

pub fn classify_distances(
    distances: &[f32],
    ctx: &LabelContext,
) -> Result<Classification, ClassifyError> {
    if distances.is_empty() {
        return Err(ClassifyError::NoDistances);
    }
    ctx.validate(distances.len())?;
    let cluster = nearest_cluster(distances).ok_or(ClassifyError::NoDistances)?;
    Ok(Classification {
        cluster,
        category: ctx.category_of(cluster),
        distances: distances.to_vec(),
    })
}

/// Maps a trainer prediction, trusting the trainer's own predicted id.
///
/// A predicted id that is not the nearest centroid is kept but logged.
pub fn classify_prediction(
    prediction: Prediction,
    ctx: &LabelContext,
) -> Result<Classification, ClassifyError> {
    let nearest = classify_distances(&prediction.distances, ctx)?;
    let n_clusters = nearest.distances.len();
    let predicted = prediction.predicted;
    if !predicted.within(n_clusters) {
        return Err(ClassifyError::PredictionOutOfRange {
            predicted,
            n_clusters,
        });
    }
    if predicted == nearest.cluster {
        return Ok(nearest);
    }

    warn!(
        predicted = %predicted,
        nearest = %nearest.cluster,
        "predicted cluster is not the nearest centroid"
    );
    Ok(Classification {
        cluster: predicted,
        category: ctx.category_of(predicted),
        distances: nearest.distances,
    })
}

pub fn run_stage4(
    predictor: &mut dyn ClusterPredictor,
    sessions: &[FeatureVector],
    ctx: &LabelContext,
) -> Result<Vec<Classification>, ClassifyError> {
    let mut out = Vec::with_capacity(sessions.len());
    for (session, sample) in sessions.iter().enumerate() {
        let prediction = predictor
            .predict(sample)
            .map_err(|source| ClassifyError::Predict { session, source })?;
        out.push(classify_prediction(prediction, ctx)?);
    }
    Ok(out)
}

pub fn category_counts(classifications: &[Classification]) -> Vec<(SkillCategory, usize)> {
    category_order()
        .iter()
        .map(|&category| {
            let count = classifications
                .iter()
                .filter(|c| c.category == category)
                .count();
            (category, count)
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_classify.rs"]
mod tests;
