use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::input::TelemetrySet;
use crate::model::cluster_id::ClusterId;
use crate::model::features::FeatureSchema;
use crate::pipeline::stage1_train::cluster_sizes;
use crate::pipeline::stage2_label::LabelResolution;
use crate::pipeline::stage4_classify::{Classification, category_counts};
use crate::report::json::render_summary_json;
use crate::report::text::render_report_text;
use crate::report::{
    CategoryStat, ClusterSummary, FeatureSummary, LabelSummary, SummaryData, format_f32_6,
    fraction,
};
use crate::trainer::Centroid;

pub const ASSIGNMENTS_FILE_NAME: &str = "assignments.tsv";
pub const SUMMARY_FILE_NAME: &str = "summary.json";
pub const REPORT_FILE_NAME: &str = "report.txt";

#[derive(Debug, Clone)]
pub struct Stage5Input<'a> {
    pub telemetry: &'a TelemetrySet,
    pub schema: &'a FeatureSchema,
    pub centroids: &'a [Centroid],
    pub resolution: &'a LabelResolution,
    /// Training assignments, one per session.
    pub assignments: &'a [ClusterId],
    pub classifications: &'a [Classification],

    pub seed: u64,
    pub max_iter: usize,
    pub inertia: f32,

    pub tool_name: String,
    pub tool_version: String,
}

pub fn write_reports(input: &Stage5Input<'_>, out_dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(out_dir)?;

    let assignments_path = out_dir.join(ASSIGNMENTS_FILE_NAME);
    write_assignments_tsv(
        &assignments_path,
        &input.telemetry.lines,
        input.classifications,
    )?;

    let summary = build_summary(input);
    let json = render_summary_json(&summary).map_err(std::io::Error::other)?;
    write_text(&out_dir.join(SUMMARY_FILE_NAME), &json)?;

    let report = render_report_text(&summary);
    write_text(&out_dir.join(REPORT_FILE_NAME), &report)?;

    info!(out_dir = %out_dir.display(), "wrote reports");
    Ok(())
}

pub fn build_summary(input: &Stage5Input<'_>) -> SummaryData {
    let ctx = input.resolution.context();
    let n_sessions = input.classifications.len();
    let sizes = cluster_sizes(input.assignments, input.centroids.len());
    let drift = input
        .assignments
        .iter()
        .zip(input.classifications.iter())
        .filter(|(assigned, c)| **assigned != c.cluster)
        .count();
    if drift > 0 {
        warn!(
            sessions = drift,
            "training assignments differ from the saved model's predictions"
        );
    }

    let clusters = input
        .centroids
        .iter()
        .zip(input.resolution.aggregates.iter())
        .enumerate()
        .map(|(idx, (centroid, agg))| {
            let cluster = ClusterId::from_index(idx);
            ClusterSummary {
                cluster,
                category: ctx.category_of(cluster),
                sessions: sizes[idx],
                fraction: fraction(sizes[idx], n_sessions),
                increasing_sum: agg.increasing,
                decreasing_sum: agg.decreasing,
                centroid: centroid.clone(),
            }
        })
        .collect();

    let schema = input.schema;
    let features = schema
        .names()
        .iter()
        .enumerate()
        .filter_map(|(idx, &name)| {
            schema
                .group_of(idx)
                .map(|group| FeatureSummary { name, group })
        })
        .collect();

    let categories = category_counts(input.classifications)
        .into_iter()
        .map(|(category, count)| CategoryStat {
            name: category.as_str(),
            count,
            fraction: fraction(count, n_sessions),
        })
        .collect();

    SummaryData {
        tool_name: input.tool_name.clone(),
        tool_version: input.tool_version.clone(),
        input: input.telemetry.path.display().to_string(),
        n_sessions,
        n_clusters: input.centroids.len(),
        n_features: input.schema.n_features(),
        split_index: input.schema.split_index(),
        features,
        seed: input.seed,
        max_iter: input.max_iter,
        inertia: input.inertia,
        labels: LabelSummary {
            good: ctx.good,
            good_resolution: input.resolution.good.resolution,
            bad: ctx.bad,
            bad_resolution: input.resolution.bad.resolution,
        },
        clusters,
        categories,
    }
}

pub fn write_assignments_tsv(
    path: &Path,
    lines: &[usize],
    classifications: &[Classification],
) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    let n_clusters = classifications
        .first()
        .map(|c| c.distances.len())
        .unwrap_or(0);

    let mut header = vec![
        "session".to_string(),
        "line".to_string(),
        "cluster".to_string(),
        "category".to_string(),
    ];
    for cluster in 0..n_clusters {
        header.push(format!("distance_{}", ClusterId::from_index(cluster)));
    }
    writeln!(w, "{}", header.join("\t"))?;

    for (session, c) in classifications.iter().enumerate() {
        let line = lines.get(session).copied().unwrap_or(0);
        let mut row = vec![
            session.to_string(),
            line.to_string(),
            c.cluster.to_string(),
            c.category.as_str().to_string(),
        ];
        row.extend(c.distances.iter().map(|d| format_f32_6(*d)));
        writeln!(w, "{}", row.join("\t"))?;
    }

    w.flush()
}

pub fn format_session_line(session: usize, c: &Classification) -> String {
    let distances = c
        .distances
        .iter()
        .map(|d| format_f32_6(*d))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{}\t{}\t{}\t{}",
        session,
        c.cluster,
        c.category.as_str(),
        distances
    )
}

fn write_text(path: &Path, content: &str) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(content.as_bytes())?;
    w.flush()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_report.rs"]
mod tests;
