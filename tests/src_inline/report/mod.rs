use super::json::render_summary_json;
use super::text::render_report_text;
use super::*;

fn id(v: u32) -> ClusterId {
    ClusterId::new(v).unwrap()
}

fn summary() -> SummaryData {
    SummaryData {
        tool_name: "kira-playerskill".to_string(),
        tool_version: "0.1.0".to_string(),
        input: "Data/FakeData.csv".to_string(),
        n_sessions: 4,
        n_clusters: 3,
        n_features: 2,
        split_index: 1,
        features: vec![
            FeatureSummary {
                name: "kills",
                group: FeatureGroup::Increasing,
            },
            FeatureSummary {
                name: "deaths",
                group: FeatureGroup::Decreasing,
            },
        ],
        seed: 0,
        max_iter: 300,
        inertia: 0.5,
        labels: LabelSummary {
            good: id(1),
            good_resolution: Resolution::Clear,
            bad: id(2),
            bad_resolution: Resolution::Fallback,
        },
        clusters: vec![
            ClusterSummary {
                cluster: id(1),
                category: SkillCategory::Good,
                sessions: 2,
                fraction: 0.5,
                increasing_sum: 8.0,
                decreasing_sum: 0.0,
                centroid: vec![8.0, 0.0],
            },
            ClusterSummary {
                cluster: id(2),
                category: SkillCategory::Bad,
                sessions: 2,
                fraction: 0.5,
                increasing_sum: 0.0,
                decreasing_sum: 8.0,
                centroid: vec![0.0, 8.0],
            },
            ClusterSummary {
                cluster: id(3),
                category: SkillCategory::Average,
                sessions: 0,
                fraction: 0.0,
                increasing_sum: 4.0,
                decreasing_sum: 4.0,
                centroid: vec![4.0, 4.0],
            },
        ],
        categories: vec![
            CategoryStat {
                name: "Good",
                count: 2,
                fraction: 0.5,
            },
            CategoryStat {
                name: "Average",
                count: 0,
                fraction: 0.0,
            },
            CategoryStat {
                name: "Bad",
                count: 2,
                fraction: 0.5,
            },
        ],
    }
}

#[test]
fn test_fraction() {
    assert_eq!(fraction(1, 4), 0.25);
    assert_eq!(fraction(3, 0), 0.0);
}

#[test]
fn test_format_f32_6() {
    assert_eq!(format_f32_6(0.5), "0.500000");
}

#[test]
fn test_summary_json_fields() {
    let json = render_summary_json(&summary()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["labels"]["good"], 1);
    assert_eq!(value["labels"]["bad"], 2);
    assert_eq!(value["labels"]["good_resolution"], "clear");
    assert_eq!(value["labels"]["bad_resolution"], "fallback");
    assert_eq!(value["clusters"][2]["category"], "Average");
    assert_eq!(value["categories"][0]["name"], "Good");
    assert_eq!(value["n_sessions"], 4);
    assert_eq!(value["features"][1]["group"], "decreasing");
}

#[test]
fn test_report_text_mentions_resolution() {
    let text = render_report_text(&summary());
    assert!(text.contains("Clear good cluster."));
    assert!(text.contains("No clear bad cluster"));
    assert!(text.contains("Good cluster: 1 (clear)\nBad cluster: 2 (fallback)\n"));
    assert!(text.contains("Increasing: kills\nDecreasing: deaths\n"));
    assert!(text.contains("max iterations: 300"));
    assert!(text.contains("Cluster 3 [Average] sessions=0"));
    assert!(text.contains("Note: an average cluster received no sessions."));
    assert_eq!(resolution_name(Resolution::Fallback), "fallback");
}
