//! Centroid labeling.
//!
//! Each cluster gets two aggregates: the sum of its centroid over the
//! increasing-with-skill features and the sum over the decreasing-with-skill
//! features. The good cluster is the one that tops the increasing aggregate
//! while bottoming the decreasing one; the bad cluster is the mirror image.
//! When the two signals disagree the decreasing aggregate alone decides and
//! the role is tagged [`Resolution::Fallback`]. Ties go to the lowest index.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::cluster_id::ClusterId;
use crate::model::features::{FeatureSchema, SchemaError};
use crate::model::label_context::LabelContext;
use crate::trainer::Centroid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LabelError {
    #[error("no centroids to label")]
    NoCentroids,
    #[error("centroid {cluster}: {source}")]
    SchemaMismatch {
        cluster: usize,
        #[source]
        source: SchemaError,
    },
    #[error("centroid {cluster} feature {feature} is not finite")]
    NonFiniteCentroid { cluster: usize, feature: usize },
    #[error("labeling ambiguity: good and bad both resolve to cluster {0}")]
    Ambiguous(ClusterId),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterAggregate {
    pub increasing: f32,
    pub decreasing: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Both aggregates agree on the cluster.
    Clear,
    /// Aggregates disagree; chosen by the decreasing aggregate alone.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedCluster {
    pub index: usize,
    pub resolution: Resolution,
}

impl ResolvedCluster {
    pub fn id(self) -> ClusterId {
        ClusterId::from_index(self.index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelResolution {
    pub aggregates: Vec<ClusterAggregate>,
    pub good: ResolvedCluster,
    pub bad: ResolvedCluster,
}

impl LabelResolution {
    pub fn context(&self) -> LabelContext {
        LabelContext::new(self.good.id(), self.bad.id())
    }

    pub fn is_clear(&self) -> bool {
        self.good.resolution == Resolution::Clear && self.bad.resolution == Resolution::Clear
    }
}

pub fn run_stage2(
    centroids: &[Centroid],
    schema: &FeatureSchema,
) -> Result<LabelResolution, LabelError> {
    let resolution = resolve_labels(centroids, schema)?;
    log_resolution(&resolution);
    Ok(resolution)
}

pub fn resolve_labels(
    centroids: &[Centroid],
    schema: &FeatureSchema,
) -> Result<LabelResolution, LabelError> {
    let aggregates = cluster_aggregates(centroids, schema)?;
    let increasing: Vec<f32> = aggregates.iter().map(|a| a.increasing).collect();
    let decreasing: Vec<f32> = aggregates.iter().map(|a| a.decreasing).collect();

    let inc_max = argmax_first(&increasing);
    let inc_min = argmin_first(&increasing);
    let dec_max = argmax_first(&decreasing);
    let dec_min = argmin_first(&decreasing);

    let good = pick(inc_max, dec_min);
    let bad = pick(inc_min, dec_max);
    if good.index == bad.index {
        return Err(LabelError::Ambiguous(good.id()));
    }

    Ok(LabelResolution {
        aggregates,
        good,
        bad,
    })
}

fn pick(by_increasing: usize, by_decreasing: usize) -> ResolvedCluster {
    if by_increasing == by_decreasing {
        ResolvedCluster {
            index: by_increasing,
            resolution: Resolution::Clear,
        }
    } else {
        ResolvedCluster {
            index: by_decreasing,
            resolution: Resolution::Fallback,
        }
    }
}

pub fn cluster_aggregates(
    centroids: &[Centroid],
    schema: &FeatureSchema,
) -> Result<Vec<ClusterAggregate>, LabelError> {
    if centroids.is_empty() {
        return Err(LabelError::NoCentroids);
    }

    let mut out = Vec::with_capacity(centroids.len());
    for (cluster, centroid) in centroids.iter().enumerate() {
        schema
            .check_len(centroid.len())
            .map_err(|source| LabelError::SchemaMismatch { cluster, source })?;
        if let Some(feature) = centroid.iter().position(|v| !v.is_finite()) {
            return Err(LabelError::NonFiniteCentroid { cluster, feature });
        }
        out.push(ClusterAggregate {
            increasing: centroid[schema.increasing()].iter().sum(),
            decreasing: centroid[schema.decreasing()].iter().sum(),
        });
    }
    Ok(out)
}

/// Index of the first maximum. `values` must be non-empty.
pub fn argmax_first(values: &[f32]) -> usize {
    let mut best = 0usize;
    for (idx, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = idx;
        }
    }
    best
}

/// Index of the first minimum. `values` must be non-empty.
pub fn argmin_first(values: &[f32]) -> usize {
    let mut best = 0usize;
    for (idx, &v) in values.iter().enumerate().skip(1) {
        if v < values[best] {
            best = idx;
        }
    }
    best
}

fn log_resolution(resolution: &LabelResolution) {
    for (idx, agg) in resolution.aggregates.iter().enumerate() {
        debug!(
            cluster = %ClusterId::from_index(idx),
            increasing = agg.increasing,
            decreasing = agg.decreasing,
            "cluster aggregates"
        );
    }

    if resolution.is_clear() {
        info!(
            good = %resolution.good.id(),
            bad = %resolution.bad.id(),
            "clear good and bad clusters"
        );
        return;
    }
    for (role, resolved) in [("good", resolution.good), ("bad", resolution.bad)] {
        match resolved.resolution {
            Resolution::Clear => info!(cluster = %resolved.id(), role, "clear cluster"),
            Resolution::Fallback => warn!(
                cluster = %resolved.id(),
                role,
                "no clear cluster; decreasing features decide, as the stronger skill signal"
            ),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_label.rs"]
mod tests;
