use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::model::cluster_id::ClusterId;
use crate::model::label_context::LabelContext;
use crate::pipeline::stage5_report::{REPORT_FILE_NAME, SUMMARY_FILE_NAME};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_playerskill_main_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn session_row(increasing: f32, decreasing: f32, jitter: f32) -> String {
    let mut values = Vec::with_capacity(18);
    for _ in 0..8 {
        values.push(format!("{}", increasing + jitter));
    }
    for _ in 8..18 {
        values.push(format!("{}", decreasing + jitter));
    }
    values.join(",")
}

fn write_sessions(path: &Path) {
    let mut rows = Vec::new();
    for jitter in [0.0, 0.1, 0.2] {
        rows.push(session_row(10.0, 0.0, jitter));
        rows.push(session_row(0.0, 10.0, jitter));
        rows.push(session_row(5.0, 5.0, jitter));
    }
    fs::write(path, rows.join("\n") + "\n").unwrap();
}

fn id(v: u32) -> ClusterId {
    ClusterId::new(v).unwrap()
}

#[test]
fn test_parse_train_defaults() {
    let cli = Cli::try_parse_from(["kira-playerskill", "train", "--input", "s.csv", "--out", "out"])
        .unwrap();
    let Command::Train(args) = cli.command else {
        panic!("expected train");
    };
    let config = TrainConfig::from(args);
    assert_eq!(config.input, PathBuf::from("s.csv"));
    assert_eq!(config.out_dir, PathBuf::from("out"));
    assert_eq!(config.clusters, 3);
    assert_eq!(config.seed, 0);
    assert_eq!(config.max_iter, DEFAULT_MAX_ITER);
    assert!(!config.options.has_header);
    assert!(config.write_reports);
}

#[test]
fn test_parse_train_flags() {
    let cli = Cli::try_parse_from([
        "kira-playerskill",
        "train",
        "--input",
        "s.csv.gz",
        "--out",
        "out",
        "--clusters",
        "4",
        "--seed",
        "42",
        "--max-iter",
        "10",
        "--has-header",
        "--no-reports",
    ])
    .unwrap();
    let Command::Train(args) = cli.command else {
        panic!("expected train");
    };
    let config = TrainConfig::from(args);
    assert_eq!(config.clusters, 4);
    assert_eq!(config.seed, 42);
    assert_eq!(config.max_iter, 10);
    assert!(config.options.has_header);
    assert!(!config.write_reports);
}

#[test]
fn test_parse_classify() {
    let cli = Cli::try_parse_from([
        "kira-playerskill",
        "classify",
        "--model",
        "m.json",
        "--context",
        "ctx.txt",
        "--input",
        "s.csv",
    ])
    .unwrap();
    let Command::Classify(args) = cli.command else {
        panic!("expected classify");
    };
    let config = ClassifyConfig::from(args);
    assert_eq!(config.model, PathBuf::from("m.json"));
    assert_eq!(config.context, PathBuf::from("ctx.txt"));
    assert_eq!(config.out_dir, None);
}

#[test]
fn test_parse_missing_input_fails() {
    assert!(Cli::try_parse_from(["kira-playerskill", "train", "--out", "out"]).is_err());
    assert!(Cli::try_parse_from(["kira-playerskill", "classify", "--model", "m.json"]).is_err());
}

#[test]
fn test_train_then_classify() {
    let dir = make_temp_dir();
    let input = dir.join("sessions.csv");
    write_sessions(&input);
    let out_dir = dir.join("out");

    let train = TrainConfig {
        input: input.clone(),
        out_dir: out_dir.clone(),
        clusters: 3,
        seed: 0,
        max_iter: DEFAULT_MAX_ITER,
        tolerance: DEFAULT_TOLERANCE,
        options: TelemetryOptions::default(),
        write_reports: true,
    };
    run_train(&train).unwrap();

    for name in [
        MODEL_FILE_NAME,
        CONTEXT_FILE_NAME,
        ASSIGNMENTS_FILE_NAME,
        SUMMARY_FILE_NAME,
        REPORT_FILE_NAME,
    ] {
        assert!(out_dir.join(name).exists(), "missing {name}");
    }

    let model = KmeansModel::load(&out_dir.join(MODEL_FILE_NAME)).unwrap();
    let ctx = load_context(&out_dir.join(CONTEXT_FILE_NAME)).unwrap();
    assert_eq!(model.n_clusters(), 3);
    assert!(ctx.validate(3).is_ok());
    assert!(model.centroids()[ctx.good.index()][0] > 9.0);
    assert!(model.centroids()[ctx.bad.index()][17] > 9.0);

    let classify_out = dir.join("classified");
    let classify = ClassifyConfig {
        model: out_dir.join(MODEL_FILE_NAME),
        context: out_dir.join(CONTEXT_FILE_NAME),
        input,
        options: TelemetryOptions::default(),
        out_dir: Some(classify_out.clone()),
    };
    run_classify(&classify).unwrap();

    let tsv = fs::read_to_string(classify_out.join(ASSIGNMENTS_FILE_NAME)).unwrap();
    let rows: Vec<&str> = tsv.lines().collect();
    assert_eq!(rows.len(), 10);
    assert!(rows[1].contains("\tGood\t"));
    assert!(rows[2].contains("\tBad\t"));
    assert!(rows[3].contains("\tAverage\t"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_classify_rejects_context_outside_model() {
    let dir = make_temp_dir();
    let input = dir.join("sessions.csv");
    write_sessions(&input);
    let out_dir = dir.join("out");

    run_train(&TrainConfig {
        input: input.clone(),
        out_dir: out_dir.clone(),
        clusters: 3,
        seed: 0,
        max_iter: DEFAULT_MAX_ITER,
        tolerance: DEFAULT_TOLERANCE,
        options: TelemetryOptions::default(),
        write_reports: false,
    })
    .unwrap();
    assert!(!out_dir.join(SUMMARY_FILE_NAME).exists());

    let context = dir.join("bad_context.txt");
    save_context(&LabelContext::new(id(1), id(7)), &context).unwrap();

    let err = run_classify(&ClassifyConfig {
        model: out_dir.join(MODEL_FILE_NAME),
        context,
        input,
        options: TelemetryOptions::default(),
        out_dir: None,
    })
    .unwrap_err();
    assert!(matches!(
        err,
        crate::error::Error::Classify(ClassifyError::Configuration(_))
    ));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_classify_rejects_model_of_other_width() {
    let dir = make_temp_dir();
    let input = dir.join("sessions.csv");
    write_sessions(&input);

    let model_path = dir.join(MODEL_FILE_NAME);
    KmeansModel {
        algorithm: "kmeans".to_string(),
        n_clusters: 3,
        n_features: 2,
        seed: 0,
        centroids: vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]],
    }
    .save(&model_path)
    .unwrap();
    let context = dir.join(CONTEXT_FILE_NAME);
    save_context(&LabelContext::new(id(1), id(2)), &context).unwrap();

    let err = run_classify(&ClassifyConfig {
        model: model_path,
        context,
        input,
        options: TelemetryOptions::default(),
        out_dir: None,
    })
    .unwrap_err();
    assert!(matches!(
        err,
        crate::error::Error::Schema(crate::model::features::SchemaError::Mismatch {
            expected: 18,
            found: 2
        })
    ));

    fs::remove_dir_all(&dir).unwrap();
}
