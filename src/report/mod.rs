pub mod json;
pub mod text;

use serde::Serialize;

use crate::model::category::SkillCategory;
use crate::model::cluster_id::ClusterId;
use crate::model::features::FeatureGroup;
use crate::pipeline::stage2_label::Resolution;

#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub cluster: ClusterId,
    pub category: SkillCategory,
    pub sessions: usize,
    pub fraction: f32,
    pub increasing_sum: f32,
    pub decreasing_sum: f32,
    pub centroid: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureSummary {
    pub name: &'static str,
    pub group: FeatureGroup,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryStat {
    pub name: &'static str,
    pub count: usize,
    pub fraction: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelSummary {
    pub good: ClusterId,
    pub good_resolution: Resolution,
    pub bad: ClusterId,
    pub bad_resolution: Resolution,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub tool_name: String,
    pub tool_version: String,
    pub input: String,

    pub n_sessions: usize,
    pub n_clusters: usize,
    pub n_features: usize,
    pub split_index: usize,
    pub features: Vec<FeatureSummary>,

    pub seed: u64,
    pub max_iter: usize,
    pub inertia: f32,

    pub labels: LabelSummary,
    pub clusters: Vec<ClusterSummary>,
    pub categories: Vec<CategoryStat>,
}

pub fn format_f32_6(v: f32) -> String {
    format!("{:.6}", v)
}

pub fn fraction(count: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    count as f32 / total as f32
}

pub fn resolution_name(resolution: Resolution) -> &'static str {
    match resolution {
        Resolution::Clear => "clear",
        Resolution::Fallback => "fallback",
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
