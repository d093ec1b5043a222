use crate::model::category::SkillCategory;
use crate::model::features::FeatureGroup;
use crate::pipeline::stage2_label::Resolution;
use crate::report::{ClusterSummary, SummaryData, format_f32_6, resolution_name};

pub fn render_report_text(data: &SummaryData) -> String {
    let mut out = String::new();

    out.push_str("Player Skill Clustering Report\n");
    out.push_str("==============================\n\n");

    out.push_str("1. Training\n");
    out.push_str(&format!("Input: {}\n", data.input));
    out.push_str(&format!("Sessions: {}\n", data.n_sessions));
    out.push_str(&format!(
        "Features: {} (increasing-with-skill: {}, decreasing-with-skill: {})\n",
        data.n_features,
        data.split_index,
        data.n_features - data.split_index
    ));
    out.push_str(&format!(
        "Increasing: {}\nDecreasing: {}\n",
        feature_list(data, FeatureGroup::Increasing),
        feature_list(data, FeatureGroup::Decreasing)
    ));
    out.push_str(&format!(
        "Clusters: {}, seed: {}, max iterations: {}, inertia: {}\n\n",
        data.n_clusters,
        data.seed,
        data.max_iter,
        format_f32_6(data.inertia)
    ));

    out.push_str("2. Centroids\n");
    for cluster in &data.clusters {
        out.push_str(&centroid_line(cluster));
    }
    out.push('\n');

    out.push_str("3. Cluster interpretation\n");
    out.push_str(&format!(
        "{}\n",
        resolution_statement("good", data.labels.good_resolution)
    ));
    out.push_str(&format!(
        "{}\n",
        resolution_statement("bad", data.labels.bad_resolution)
    ));
    out.push_str(&format!(
        "Good cluster: {} ({})\nBad cluster: {} ({})\n\n",
        data.labels.good,
        resolution_name(data.labels.good_resolution),
        data.labels.bad,
        resolution_name(data.labels.bad_resolution)
    ));

    out.push_str("4. Sessions by category\n");
    for stat in &data.categories {
        out.push_str(&format!(
            "{}: {} ({})\n",
            stat.name,
            stat.count,
            format_f32_6(stat.fraction)
        ));
    }
    if data
        .clusters
        .iter()
        .any(|c| c.category == SkillCategory::Average && c.sessions == 0)
    {
        out.push_str("Note: an average cluster received no sessions.\n");
    }

    out
}

fn feature_list(data: &SummaryData, group: FeatureGroup) -> String {
    let names = data
        .features
        .iter()
        .filter(|f| f.group == group)
        .map(|f| f.name)
        .collect::<Vec<_>>();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

fn centroid_line(cluster: &ClusterSummary) -> String {
    let values = cluster
        .centroid
        .iter()
        .map(|v| format_f32_6(*v))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Cluster {} [{}] sessions={} increasing_sum={} decreasing_sum={}\n  {}\n",
        cluster.cluster,
        cluster.category.as_str(),
        cluster.sessions,
        format_f32_6(cluster.increasing_sum),
        format_f32_6(cluster.decreasing_sum),
        values
    )
}

fn resolution_statement(role: &str, resolution: Resolution) -> String {
    match resolution {
        Resolution::Clear => format!("Clear {} cluster.", role),
        Resolution::Fallback => format!(
            "No clear {} cluster; decreasing features decided, as the stronger skill signal.",
            role
        ),
    }
}
